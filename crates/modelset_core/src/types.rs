//! Identity types for models and collections.

use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Transient identity of a model.
///
/// Client ids are 128-bit UUIDs that are:
/// - Assigned once, at model creation
/// - Unique for the model's in-memory lifetime
/// - Never reused or reassigned
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cid(Uuid);

impl Cid {
    /// Creates a new random client id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Converts to the underlying UUID.
    #[must_use]
    pub fn to_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for Cid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", self.0)
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c:{}", self.0)
    }
}

impl From<Uuid> for Cid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Persistent identity of a model.
///
/// Assigned by an external authority (typically storage) and absent until
/// then. Ids are normalized to string keys: string attributes are kept
/// as-is and numeric attributes use their display form, so a numeric `1`
/// and the string `"1"` address the same index slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(String);

impl ModelId {
    /// Creates a model id from a string key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derives a model id from an attribute value.
    ///
    /// Returns `None` for values that cannot act as identities
    /// (null, booleans, arrays, objects).
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    /// Returns the string key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelId {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ModelId {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Identity of a collection instance.
///
/// Tokens are monotonically increasing and never reused. The event relay
/// uses them to tell whether a membership event originated from a given
/// collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionToken(u64);

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

impl CollectionToken {
    /// Allocates the next collection token.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw token value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CollectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cid_is_unique() {
        let c1 = Cid::new();
        let c2 = Cid::new();
        assert_ne!(c1, c2);
    }

    #[test]
    fn cid_display() {
        let cid = Cid::new();
        assert!(format!("{cid}").starts_with("c:"));
    }

    #[test]
    fn model_id_from_string_value() {
        let id = ModelId::from_value(&json!("alpha")).unwrap();
        assert_eq!(id.as_str(), "alpha");
    }

    #[test]
    fn model_id_normalizes_numbers() {
        let numeric = ModelId::from_value(&json!(7)).unwrap();
        let textual = ModelId::from_value(&json!("7")).unwrap();
        assert_eq!(numeric, textual);
    }

    #[test]
    fn model_id_rejects_non_scalars() {
        assert!(ModelId::from_value(&json!(null)).is_none());
        assert!(ModelId::from_value(&json!(true)).is_none());
        assert!(ModelId::from_value(&json!([1])).is_none());
        assert!(ModelId::from_value(&json!({"a": 1})).is_none());
    }

    #[test]
    fn tokens_are_unique() {
        let t1 = CollectionToken::next();
        let t2 = CollectionToken::next();
        assert_ne!(t1, t2);
        assert!(t2.as_u64() > t1.as_u64());
    }
}
