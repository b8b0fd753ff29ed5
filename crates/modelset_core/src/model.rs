//! The model: an observable, uniquely identified attribute bag.
//!
//! `Model` is a cheaply cloneable handle; clones refer to the same record.
//! A model exposes its attributes through `get`/`set`, tracks the previous
//! values of the most recent change (`previous`, `has_changed`), and emits
//! every event it produces on an observe-everything feed. A model belongs
//! to at most one collection at a time, through a back-reference that the
//! collection manages.

use crate::collection::{Collection, Shared};
use crate::events::{EventFeed, ModelEvent, ObserverHandle};
use crate::types::{Cid, ModelId};
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Weak};

/// Attribute map of a model: a JSON object's entries.
pub type Attrs = serde_json::Map<String, Value>;

/// Input to collection operations: a raw attribute payload or an existing
/// model.
#[derive(Clone, Debug)]
pub enum Item {
    /// Raw attributes to be materialized through the model factory.
    Attrs(Attrs),
    /// An existing model, adopted as-is.
    Model(Model),
}

impl Item {
    /// Converts a JSON value into an item.
    ///
    /// Returns `None` unless the value is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::Attrs(map)),
            _ => None,
        }
    }
}

impl From<Attrs> for Item {
    fn from(attrs: Attrs) -> Self {
        Self::Attrs(attrs)
    }
}

impl From<Model> for Item {
    fn from(model: Model) -> Self {
        Self::Model(model)
    }
}

/// Default name of the persistent-identity attribute.
pub const DEFAULT_ID_ATTRIBUTE: &str = "id";

struct ModelState {
    /// Current attributes.
    attributes: Attrs,
    /// Previous values recorded by the most recent `set`/`unset`.
    changed: Vec<(String, Option<Value>)>,
    /// Back-reference to the owning collection, if any.
    collection: Option<Weak<Shared>>,
}

struct ModelInner {
    cid: Cid,
    id_attribute: String,
    state: RwLock<ModelState>,
    feed: EventFeed<ModelEvent>,
}

/// An observable, mutable attribute bag with stable transient identity.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Creates a model with the default id attribute (`"id"`).
    #[must_use]
    pub fn new(attrs: Attrs) -> Self {
        Self::with_id_attribute(attrs, DEFAULT_ID_ATTRIBUTE)
    }

    /// Creates a model whose persistent identity lives under `id_attribute`.
    #[must_use]
    pub fn with_id_attribute(attrs: Attrs, id_attribute: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                cid: Cid::new(),
                id_attribute: id_attribute.into(),
                state: RwLock::new(ModelState {
                    attributes: attrs,
                    changed: Vec::new(),
                    collection: None,
                }),
                feed: EventFeed::new(),
            }),
        }
    }

    /// Returns the transient identity.
    #[must_use]
    pub fn cid(&self) -> Cid {
        self.inner.cid
    }

    /// Returns the name of the persistent-identity attribute.
    #[must_use]
    pub fn id_attribute(&self) -> &str {
        &self.inner.id_attribute
    }

    /// Returns the persistent identity, if assigned.
    #[must_use]
    pub fn id(&self) -> Option<ModelId> {
        let state = self.inner.state.read();
        state
            .attributes
            .get(&self.inner.id_attribute)
            .and_then(ModelId::from_value)
    }

    /// Returns a copy of the named attribute's value.
    #[must_use]
    pub fn get(&self, attr: &str) -> Option<Value> {
        self.inner.state.read().attributes.get(attr).cloned()
    }

    /// Returns a copy of all attributes.
    #[must_use]
    pub fn attributes(&self) -> Attrs {
        self.inner.state.read().attributes.clone()
    }

    /// Returns the attributes as a JSON object value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.attributes())
    }

    /// Sets attributes, emitting a `ChangeAttr` per changed attribute and
    /// one `Change` summary when anything changed.
    ///
    /// Returns the names of the attributes that changed.
    pub fn set(&self, attrs: Attrs) -> Vec<String> {
        self.apply_set(attrs, false)
    }

    /// Sets attributes without emitting any events.
    pub fn set_silent(&self, attrs: Attrs) -> Vec<String> {
        self.apply_set(attrs, true)
    }

    /// Sets a single attribute.
    pub fn set_value(&self, attr: impl Into<String>, value: Value) -> Vec<String> {
        let mut attrs = Attrs::new();
        attrs.insert(attr.into(), value);
        self.set(attrs)
    }

    /// Removes an attribute, emitting change events if it was present.
    pub fn unset(&self, attr: &str) -> bool {
        let mut events = Vec::new();
        let removed;
        {
            let mut state = self.inner.state.write();
            match state.attributes.remove(attr) {
                Some(old) => {
                    state.changed = vec![(attr.to_string(), Some(old.clone()))];
                    events.push(ModelEvent::ChangeAttr {
                        model: self.clone(),
                        attr: attr.to_string(),
                        old: Some(old),
                        new: None,
                    });
                    events.push(ModelEvent::Change {
                        model: self.clone(),
                        changed: vec![attr.to_string()],
                    });
                    removed = true;
                }
                None => {
                    state.changed = Vec::new();
                    removed = false;
                }
            }
        }
        for event in events {
            self.inner.feed.emit(event);
        }
        removed
    }

    /// Returns whether `attr` changed in the most recent `set`/`unset`.
    #[must_use]
    pub fn has_changed(&self, attr: &str) -> bool {
        self.inner
            .state
            .read()
            .changed
            .iter()
            .any(|(name, _)| name == attr)
    }

    /// Returns the names of attributes changed by the most recent
    /// `set`/`unset`.
    #[must_use]
    pub fn changed_attributes(&self) -> Vec<String> {
        self.inner
            .state
            .read()
            .changed
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Returns `attr`'s value before the most recent change.
    ///
    /// `None` when the attribute did not change, or when it changed from
    /// being absent.
    #[must_use]
    pub fn previous(&self, attr: &str) -> Option<Value> {
        self.inner
            .state
            .read()
            .changed
            .iter()
            .find(|(name, _)| name == attr)
            .and_then(|(_, old)| old.clone())
    }

    /// Announces destruction. Collections observing the model remove it.
    pub fn destroy(&self) {
        self.inner.feed.emit(ModelEvent::Destroyed {
            model: self.clone(),
        });
    }

    /// Registers an observer for every event this model emits.
    pub fn observe(&self, callback: impl Fn(&ModelEvent) + 'static) -> ObserverHandle {
        self.inner.feed.observe(callback)
    }

    /// Unregisters an observer.
    pub fn unobserve(&self, handle: ObserverHandle) -> bool {
        self.inner.feed.unobserve(handle)
    }

    /// Subscribes to this model's events through a channel.
    pub fn subscribe(&self) -> Receiver<ModelEvent> {
        self.inner.feed.subscribe()
    }

    /// Returns the collection this model currently belongs to.
    #[must_use]
    pub fn collection(&self) -> Option<Collection> {
        self.inner
            .state
            .read()
            .collection
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Collection::from_shared)
    }

    fn apply_set(&self, attrs: Attrs, silent: bool) -> Vec<String> {
        let mut events = Vec::new();
        let changed_names: Vec<String>;
        {
            let mut state = self.inner.state.write();
            let mut changes: Vec<(String, Option<Value>, Value)> = Vec::new();
            for (key, value) in attrs {
                let old = state.attributes.get(&key).cloned();
                if old.as_ref() != Some(&value) {
                    state.attributes.insert(key.clone(), value.clone());
                    changes.push((key, old, value));
                }
            }
            state.changed = changes
                .iter()
                .map(|(key, old, _)| (key.clone(), old.clone()))
                .collect();
            changed_names = changes.iter().map(|(key, _, _)| key.clone()).collect();
            if !silent && !changes.is_empty() {
                for (attr, old, new) in changes {
                    events.push(ModelEvent::ChangeAttr {
                        model: self.clone(),
                        attr,
                        old,
                        new: Some(new),
                    });
                }
                events.push(ModelEvent::Change {
                    model: self.clone(),
                    changed: changed_names.clone(),
                });
            }
        }
        for event in events {
            self.inner.feed.emit(event);
        }
        changed_names
    }

    /// Emits a membership event on behalf of a collection.
    pub(crate) fn emit(&self, event: ModelEvent) {
        self.inner.feed.emit(event);
    }

    /// Points the back-reference at `shared`, replacing any prior one.
    pub(crate) fn bind(&self, shared: &Arc<Shared>) {
        self.inner.state.write().collection = Some(Arc::downgrade(shared));
    }

    /// Clears the back-reference if it points at `shared`.
    pub(crate) fn unbind(&self, shared: &Arc<Shared>) {
        let mut state = self.inner.state.write();
        let points_here = state
            .collection
            .as_ref()
            .is_some_and(|weak| Weak::ptr_eq(weak, &Arc::downgrade(shared)));
        if points_here {
            state.collection = None;
        }
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.inner.cid == other.inner.cid
    }
}

impl Eq for Model {}

impl std::hash::Hash for Model {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.cid.hash(state);
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "Model({}, id={id})", self.cid()),
            None => write!(f, "Model({})", self.cid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attrs {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn get_and_set() {
        let model = Model::new(attrs(json!({"name": "Ada"})));
        assert_eq!(model.get("name"), Some(json!("Ada")));

        let changed = model.set(attrs(json!({"name": "Grace", "age": 36})));
        assert_eq!(changed, vec!["name".to_string(), "age".to_string()]);
        assert_eq!(model.get("age"), Some(json!(36)));
    }

    #[test]
    fn changed_names_follow_insertion_order() {
        let model = Model::new(Attrs::new());
        let rx = model.subscribe();

        // Keys deliberately out of alphabetical order; the attribute map
        // preserves insertion order.
        let changed = model.set(attrs(json!({"zeta": 1, "alpha": 2})));
        assert_eq!(changed, vec!["zeta".to_string(), "alpha".to_string()]);

        let events: Vec<ModelEvent> = rx.try_iter().collect();
        match events.last() {
            Some(ModelEvent::Change { changed, .. }) => {
                assert_eq!(changed, &["zeta".to_string(), "alpha".to_string()]);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn set_skips_equal_values() {
        let model = Model::new(attrs(json!({"name": "Ada"})));
        let changed = model.set(attrs(json!({"name": "Ada"})));
        assert!(changed.is_empty());
        assert!(!model.has_changed("name"));
    }

    #[test]
    fn change_events_fire_per_attribute_then_summary() {
        let model = Model::new(attrs(json!({"a": 1})));
        let rx = model.subscribe();

        model.set(attrs(json!({"a": 2, "b": 3})));

        let names: Vec<&str> = rx.try_iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["change:attr", "change:attr", "change"]);
    }

    #[test]
    fn change_attr_carries_old_and_new() {
        let model = Model::new(attrs(json!({"a": 1})));
        let rx = model.subscribe();

        model.set(attrs(json!({"a": 2})));

        let events: Vec<ModelEvent> = rx.try_iter().collect();
        match &events[0] {
            ModelEvent::ChangeAttr { attr, old, new, .. } => {
                assert_eq!(attr, "a");
                assert_eq!(old.as_ref(), Some(&json!(1)));
                assert_eq!(new.as_ref(), Some(&json!(2)));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn silent_set_emits_nothing() {
        let model = Model::new(attrs(json!({"a": 1})));
        let rx = model.subscribe();

        model.set_silent(attrs(json!({"a": 2})));

        assert_eq!(rx.try_iter().count(), 0);
        // State still updated and tracked.
        assert_eq!(model.get("a"), Some(json!(2)));
        assert!(model.has_changed("a"));
    }

    #[test]
    fn previous_is_scoped_to_latest_change() {
        let model = Model::new(attrs(json!({"a": 1})));

        model.set(attrs(json!({"a": 2})));
        assert_eq!(model.previous("a"), Some(json!(1)));

        model.set(attrs(json!({"b": 9})));
        assert_eq!(model.previous("a"), None);
        assert!(!model.has_changed("a"));
        assert!(model.has_changed("b"));
    }

    #[test]
    fn unset_removes_and_reports() {
        let model = Model::new(attrs(json!({"a": 1})));
        let rx = model.subscribe();

        assert!(model.unset("a"));
        assert_eq!(model.get("a"), None);
        assert_eq!(model.previous("a"), Some(json!(1)));

        let names: Vec<&str> = rx.try_iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["change:attr", "change"]);

        assert!(!model.unset("a"));
    }

    #[test]
    fn id_reads_the_id_attribute() {
        let model = Model::new(attrs(json!({"id": 5})));
        assert_eq!(model.id(), Some(ModelId::from("5")));

        let unsaved = Model::new(attrs(json!({"name": "draft"})));
        assert_eq!(unsaved.id(), None);
    }

    #[test]
    fn custom_id_attribute() {
        let model = Model::with_id_attribute(attrs(json!({"_key": "k1"})), "_key");
        assert_eq!(model.id(), Some(ModelId::from("k1")));
    }

    #[test]
    fn destroy_emits() {
        let model = Model::new(Attrs::new());
        let rx = model.subscribe();
        model.destroy();
        let names: Vec<&str> = rx.try_iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["destroy"]);
    }

    #[test]
    fn clones_share_identity_and_state() {
        let model = Model::new(attrs(json!({"a": 1})));
        let alias = model.clone();
        alias.set(attrs(json!({"a": 2})));
        assert_eq!(model.get("a"), Some(json!(2)));
        assert_eq!(model, alias);
    }

    #[test]
    fn item_from_value() {
        assert!(matches!(
            Item::from_value(json!({"id": 1})),
            Some(Item::Attrs(_))
        ));
        assert!(Item::from_value(json!(42)).is_none());
    }
}
