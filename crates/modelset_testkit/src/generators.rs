//! Property-based test generators using proptest.
//!
//! Strategies generate raw attribute maps and operation scripts rather
//! than live models, so failing cases shrink cleanly.

use modelset_core::Attrs;
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for persistent ids drawn from a small pool, so scripts hit
/// both the add and the merge path of reconciliation.
pub fn model_id_strategy() -> impl Strategy<Value = String> {
    (0u32..16).prop_map(|n| format!("id-{n}"))
}

/// Strategy for candidate attribute maps carrying `id`, `name`, and a
/// numeric `rank` usable as a sort key.
pub fn attrs_strategy() -> impl Strategy<Value = Attrs> {
    (model_id_strategy(), "[a-z]{1,8}", 0i64..100).prop_map(|(id, name, rank)| {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(id));
        map.insert("name".into(), Value::String(name));
        map.insert("rank".into(), Value::from(rank));
        map
    })
}

/// Strategy for attribute maps without an `id`, exercising the
/// cid-only index path.
pub fn anonymous_attrs_strategy() -> impl Strategy<Value = Attrs> {
    ("[a-z]{1,8}", 0i64..100).prop_map(|(name, rank)| {
        let mut map = Map::new();
        map.insert("name".into(), Value::String(name));
        map.insert("rank".into(), Value::from(rank));
        map
    })
}

/// Strategy for candidate batches.
pub fn attrs_batch_strategy(max_len: usize) -> impl Strategy<Value = Vec<Attrs>> {
    prop::collection::vec(attrs_strategy(), 0..max_len)
}

/// A scripted collection operation.
#[derive(Debug, Clone)]
pub enum CollectionOp {
    /// Full reconciliation against a candidate batch.
    Set {
        /// Candidate attribute maps.
        batch: Vec<Attrs>,
    },
    /// Add-only reconciliation.
    Add {
        /// Candidate attribute maps.
        batch: Vec<Attrs>,
    },
    /// Remove the member at a position (modulo current length).
    RemoveAt {
        /// Position seed; reduced modulo the live length.
        seed: usize,
    },
    /// Replace all members.
    Reset {
        /// Candidate attribute maps.
        batch: Vec<Attrs>,
    },
    /// Mutate the rank of the member at a position.
    Rerank {
        /// Position seed; reduced modulo the live length.
        seed: usize,
        /// New rank value.
        rank: i64,
    },
    /// Give the member at a position a fresh persistent id.
    Reidentify {
        /// Position seed; reduced modulo the live length.
        seed: usize,
        /// New id suffix.
        suffix: u32,
    },
}

/// Strategy for a single scripted operation.
pub fn collection_op_strategy() -> impl Strategy<Value = CollectionOp> {
    prop_oneof![
        3 => attrs_batch_strategy(6).prop_map(|batch| CollectionOp::Set { batch }),
        3 => attrs_batch_strategy(6).prop_map(|batch| CollectionOp::Add { batch }),
        2 => any::<usize>().prop_map(|seed| CollectionOp::RemoveAt { seed }),
        1 => attrs_batch_strategy(6).prop_map(|batch| CollectionOp::Reset { batch }),
        2 => (any::<usize>(), 0i64..100)
            .prop_map(|(seed, rank)| CollectionOp::Rerank { seed, rank }),
        1 => (any::<usize>(), 100u32..200)
            .prop_map(|(seed, suffix)| CollectionOp::Reidentify { seed, suffix }),
    ]
}

/// Strategy for a sequence of scripted operations.
pub fn op_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<CollectionOp>> {
    prop::collection::vec(collection_op_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_attrs_carry_identity(attrs in attrs_strategy()) {
            prop_assert!(attrs.get("id").is_some());
            prop_assert!(attrs.get("rank").and_then(Value::as_i64).is_some());
        }

        #[test]
        fn anonymous_attrs_have_no_identity(attrs in anonymous_attrs_strategy()) {
            prop_assert!(attrs.get("id").is_none());
        }

        #[test]
        fn batches_respect_bounds(batch in attrs_batch_strategy(6)) {
            prop_assert!(batch.len() < 6);
        }
    }
}
