//! Ordering rules for collection sequences.
//!
//! A [`Comparator`] keeps a collection's sequence sorted. It mirrors the
//! three shapes a rule can take: an attribute name (ascending by that
//! attribute), a derived-key function (ascending by the key), or a full
//! two-model comparison. All sorts are stable.

use crate::model::Model;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// The ordering rule of a collection.
#[derive(Clone)]
pub enum Comparator {
    /// Ascending by the named attribute's value.
    Attribute(String),
    /// Ascending by a derived sort key.
    Key(Arc<dyn Fn(&Model) -> Value>),
    /// A full comparison between two models.
    Full(Arc<dyn Fn(&Model, &Model) -> Ordering>),
}

impl Comparator {
    /// Creates an attribute-name rule.
    #[must_use]
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute(name.into())
    }

    /// Creates a derived-key rule.
    #[must_use]
    pub fn key(f: impl Fn(&Model) -> Value + 'static) -> Self {
        Self::Key(Arc::new(f))
    }

    /// Creates a full-comparison rule.
    #[must_use]
    pub fn full(f: impl Fn(&Model, &Model) -> Ordering + 'static) -> Self {
        Self::Full(Arc::new(f))
    }

    /// Returns the attribute name when the rule is attribute-based.
    ///
    /// Reconciliation uses this to detect merges that disturb the order.
    #[must_use]
    pub fn sort_attribute(&self) -> Option<&str> {
        match self {
            Self::Attribute(name) => Some(name),
            _ => None,
        }
    }

    /// Compares two models under this rule.
    #[must_use]
    pub fn compare(&self, a: &Model, b: &Model) -> Ordering {
        match self {
            Self::Attribute(name) => {
                compare_optional_values(a.get(name).as_ref(), b.get(name).as_ref())
            }
            Self::Key(key) => compare_values(&key(a), &key(b)),
            Self::Full(cmp) => cmp(a, b),
        }
    }
}

impl std::fmt::Debug for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attribute(name) => write!(f, "Comparator::Attribute({name:?})"),
            Self::Key(_) => write!(f, "Comparator::Key(..)"),
            Self::Full(_) => write!(f, "Comparator::Full(..)"),
        }
    }
}

/// Total ordering over JSON values: by type rank (null, bool, number,
/// string, array, object), then by content. Numbers compare as `f64` with
/// total ordering; objects compare by their sorted entries.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let rank_a = type_rank(a);
    let rank_b = type_rank(b);
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xv, yv) in x.iter().zip(y.iter()) {
                let ord = compare_values(xv, yv);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            let mut xs: Vec<_> = x.iter().collect();
            let mut ys: Vec<_> = y.iter().collect();
            xs.sort_by(|(k1, _), (k2, _)| k1.cmp(k2));
            ys.sort_by(|(k1, _), (k2, _)| k1.cmp(k2));
            for ((xk, xv), (yk, yv)) in xs.iter().zip(ys.iter()) {
                let key_ord = xk.cmp(yk);
                if key_ord != Ordering::Equal {
                    return key_ord;
                }
                let val_ord = compare_values(xv, yv);
                if val_ord != Ordering::Equal {
                    return val_ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        _ => Ordering::Equal,
    }
}

/// Ordering over optional values; absent values sort first.
#[must_use]
pub fn compare_optional_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare_values(x, y),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(value: Value) -> Model {
        match value {
            Value::Object(map) => Model::new(map),
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn numbers_order_numerically() {
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!(2.5), &json!(2)), Ordering::Greater);
    }

    #[test]
    fn mixed_types_order_by_rank() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!("a"), &json!(99)), Ordering::Greater);
    }

    #[test]
    fn arrays_order_elementwise_then_by_length() {
        assert_eq!(compare_values(&json!([1, 2]), &json!([1, 3])), Ordering::Less);
        assert_eq!(compare_values(&json!([1]), &json!([1, 0])), Ordering::Less);
    }

    #[test]
    fn absent_attribute_sorts_first() {
        assert_eq!(
            compare_optional_values(None, Some(&json!(0))),
            Ordering::Less
        );
    }

    #[test]
    fn attribute_comparator() {
        let cmp = Comparator::attribute("age");
        let young = model(json!({"age": 20}));
        let old = model(json!({"age": 60}));
        assert_eq!(cmp.compare(&young, &old), Ordering::Less);
        assert_eq!(cmp.sort_attribute(), Some("age"));
    }

    #[test]
    fn key_comparator() {
        let cmp = Comparator::key(|m| json!(m.get("name").and_then(|v| v.as_str().map(str::len))));
        let short = model(json!({"name": "Al"}));
        let long = model(json!({"name": "Augusta"}));
        assert_eq!(cmp.compare(&short, &long), Ordering::Less);
        assert_eq!(cmp.sort_attribute(), None);
    }

    #[test]
    fn full_comparator() {
        let cmp = Comparator::full(|a, b| {
            compare_optional_values(b.get("rank").as_ref(), a.get("rank").as_ref())
        });
        let low = model(json!({"rank": 1}));
        let high = model(json!({"rank": 9}));
        // Descending rule.
        assert_eq!(cmp.compare(&high, &low), Ordering::Less);
    }
}
