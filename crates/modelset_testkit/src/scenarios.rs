//! Scenario runners and cross-cutting consistency checks.
//!
//! A scenario applies a generated operation script to a live collection
//! and verifies the structural invariants that every operation must
//! preserve: the sequence, the persistent-id index, and the
//! transient-id index never disagree.

use crate::generators::CollectionOp;
use modelset_core::{Attrs, Collection, Item, Model, SetOptions};
use serde_json::Value;
use std::collections::HashSet;

/// Asserts that the sequence and both lookup indices agree.
///
/// Panics with a description of the first inconsistency found.
pub fn check_indices(collection: &Collection) {
    let models = collection.models();
    assert_eq!(
        collection.len(),
        models.len(),
        "reported length disagrees with the sequence"
    );

    let mut cids = HashSet::new();
    let mut ids = HashSet::new();
    for model in &models {
        assert!(
            cids.insert(model.cid()),
            "member appears twice in the sequence"
        );
        assert_eq!(
            collection.get(model.cid()).as_ref(),
            Some(model),
            "member unreachable through its transient id"
        );
        if let Some(id) = model.id() {
            assert!(ids.insert(id.clone()), "duplicate persistent id");
            assert_eq!(
                collection.get(id).as_ref(),
                Some(model),
                "member unreachable through its persistent id"
            );
        }
    }
}

/// Asserts that members appear in non-decreasing order of `attr`.
pub fn check_sorted_by(collection: &Collection, attr: &str) {
    let keys: Vec<Option<Value>> = collection
        .models()
        .iter()
        .map(|model| model.get(attr))
        .collect();
    for window in keys.windows(2) {
        assert!(
            modelset_core::compare_optional_values(window[0].as_ref(), window[1].as_ref())
                != std::cmp::Ordering::Greater,
            "sequence is out of order on {attr:?}"
        );
    }
}

fn member_at_seed(collection: &Collection, seed: usize) -> Option<Model> {
    let len = collection.len();
    if len == 0 {
        return None;
    }
    collection.at(seed % len)
}

fn batch_items(batch: Vec<Attrs>) -> Vec<Item> {
    batch.into_iter().map(Item::Attrs).collect()
}

/// Applies one scripted operation to the collection.
///
/// Position seeds are reduced modulo the live length; operations on an
/// empty collection are no-ops. `Reidentify` skips suffixes already in
/// use, since persistent ids are unique among members.
pub fn apply_op(collection: &Collection, op: CollectionOp) {
    match op {
        CollectionOp::Set { batch } => {
            collection.set(batch_items(batch), &SetOptions::default());
        }
        CollectionOp::Add { batch } => {
            collection.add(batch_items(batch));
        }
        CollectionOp::RemoveAt { seed } => {
            if let Some(member) = member_at_seed(collection, seed) {
                collection.remove_one(&member);
            }
        }
        CollectionOp::Reset { batch } => {
            collection.reset(batch_items(batch));
        }
        CollectionOp::Rerank { seed, rank } => {
            if let Some(member) = member_at_seed(collection, seed) {
                member.set_value("rank", Value::from(rank));
            }
        }
        CollectionOp::Reidentify { seed, suffix } => {
            let id = format!("id-{suffix}");
            if collection.get(id.as_str()).is_some() {
                return;
            }
            if let Some(member) = member_at_seed(collection, seed) {
                member.set_value("id", Value::String(id));
            }
        }
    }
}

/// Runs a full script, checking index consistency after every step.
pub fn run_script(collection: &Collection, ops: Vec<CollectionOp>) {
    for op in ops {
        apply_op(collection, op);
        check_indices(collection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::people_collection;
    use crate::generators::{op_sequence_strategy, PropTestConfig};
    use modelset_core::{Comparator, CollectionConfig};
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn scripts_preserve_index_consistency(ops in op_sequence_strategy(1, 24)) {
            let collection = people_collection(4);
            run_script(&collection, ops);
        }

        #[test]
        fn sorted_collections_stay_sorted_through_reconciliation(
            ops in op_sequence_strategy(1, 24),
        ) {
            let collection = Collection::with_config(
                CollectionConfig::new().comparator(Comparator::attribute("rank")),
            );

            for op in ops {
                // A plain rank write on a member does not trigger a
                // re-sort, so those ops are skipped here.
                if matches!(op, CollectionOp::Rerank { .. }) {
                    continue;
                }
                apply_op(&collection, op);
                check_indices(&collection);
                check_sorted_by(&collection, "rank");
            }
        }

        #[test]
        fn merge_reapplication_is_stable(batch in crate::generators::attrs_batch_strategy(6)) {
            let collection = Collection::new();
            let items: Vec<_> = batch.iter().cloned().map(modelset_core::Item::Attrs).collect();

            collection.set(items.clone(), &SetOptions::default());
            let first = collection.to_json();
            check_indices(&collection);

            collection.set(items, &SetOptions::default());
            prop_assert_eq!(collection.to_json(), first);
            check_indices(&collection);
        }
    }

    #[test]
    fn removing_every_member_empties_the_collection() {
        let collection = people_collection(5);
        while let Some(member) = collection.at(0) {
            collection.remove_one(&member);
            check_indices(&collection);
        }
        assert!(collection.is_empty());
    }
}
