//! Collection fixtures and attribute helpers.
//!
//! Provides convenience functions for building test collections and
//! doubles for the persistence seam.

use modelset_core::{
    Attrs, Collection, CollectionEvent, Item, Model, ObserverHandle, Persist, SaveCallbacks,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Converts a JSON object literal into an attribute map.
///
/// Panics on non-object values; test input is always an object.
pub fn attrs(value: Value) -> Attrs {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture attrs must be an object, got {other}"),
    }
}

/// Wraps a JSON object literal as a raw candidate item.
pub fn item(value: Value) -> Item {
    Item::Attrs(attrs(value))
}

/// A person record used by the standard fixtures.
#[derive(Debug, Clone, Serialize)]
pub struct Person {
    /// Persistent identity.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Sort rank.
    pub rank: u64,
}

impl Person {
    /// Builds the nth fixture person (`id` and `rank` are `n`).
    pub fn nth(n: u64) -> Self {
        Self {
            id: n,
            name: format!("person-{n}"),
            rank: n,
        }
    }

    /// Converts the person into a candidate item.
    pub fn into_item(self) -> Item {
        let value = serde_json::to_value(&self).expect("person serializes to an object");
        Item::from_value(value).expect("person serializes to an object")
    }
}

/// Creates a collection populated with `count` fixture people, loaded
/// silently (ids `1..=count`).
pub fn people_collection(count: u64) -> Collection {
    let collection = Collection::new();
    let items = (1..=count).map(|n| Person::nth(n).into_item()).collect();
    collection.reset_silent(items);
    collection
}

/// Records every event a collection emits, in order.
pub struct EventLog {
    collection: Collection,
    handle: Option<ObserverHandle>,
    events: Rc<RefCell<Vec<CollectionEvent>>>,
}

impl EventLog {
    /// Attaches a recorder to `collection`.
    pub fn attach(collection: &Collection) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let handle = collection.observe(move |event| sink.borrow_mut().push(event.clone()));
        Self {
            collection: collection.clone(),
            handle: Some(handle),
            events,
        }
    }

    /// Returns a snapshot of the recorded events.
    pub fn events(&self) -> Vec<CollectionEvent> {
        self.events.borrow().clone()
    }

    /// Returns the recorded event names, in emission order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(CollectionEvent::name).collect()
    }

    /// Discards everything recorded so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.collection.unobserve(handle);
        }
    }
}

/// Persistence double that settles every save successfully, right away.
pub struct ImmediatePersist {
    /// Response payload handed to the success continuation.
    pub response: Value,
}

impl ImmediatePersist {
    /// Creates a double that responds with `{"ok": true}`.
    pub fn new() -> Self {
        Self {
            response: json!({"ok": true}),
        }
    }
}

impl Default for ImmediatePersist {
    fn default() -> Self {
        Self::new()
    }
}

impl Persist for ImmediatePersist {
    fn save(&self, model: &Model, callbacks: SaveCallbacks) {
        callbacks.succeed(model, self.response.clone());
    }
}

/// Persistence double that fails every save, right away.
pub struct FailingPersist {
    /// Error payload handed to the error continuation.
    pub error: Value,
}

impl FailingPersist {
    /// Creates a double that fails with the given message.
    pub fn with_message(message: &str) -> Self {
        Self {
            error: json!(message),
        }
    }
}

impl Persist for FailingPersist {
    fn save(&self, model: &Model, callbacks: SaveCallbacks) {
        callbacks.fail(model, self.error.clone());
    }
}

/// Persistence double that holds callbacks until the test settles them.
///
/// Used to exercise deferred-add semantics (`wait`) where the outcome of
/// a save must land after `create` has returned.
pub struct HeldPersist {
    pending: RefCell<Vec<(Model, SaveCallbacks)>>,
}

impl HeldPersist {
    /// Creates a double with no pending saves.
    pub fn new() -> Self {
        Self {
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Number of saves waiting for settlement.
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Settles all pending saves successfully with `response`.
    pub fn settle_all(&self, response: Value) {
        for (model, callbacks) in self.pending.borrow_mut().drain(..) {
            callbacks.succeed(&model, response.clone());
        }
    }

    /// Fails all pending saves with `error`.
    pub fn fail_all(&self, error: Value) {
        for (model, callbacks) in self.pending.borrow_mut().drain(..) {
            callbacks.fail(&model, error.clone());
        }
    }
}

impl Default for HeldPersist {
    fn default() -> Self {
        Self::new()
    }
}

impl Persist for HeldPersist {
    fn save(&self, model: &Model, callbacks: SaveCallbacks) {
        self.pending.borrow_mut().push((model.clone(), callbacks));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelset_core::{CreateOptions, ModelId};

    #[test]
    fn people_collection_is_populated_and_silent() {
        let people = people_collection(3);
        assert_eq!(people.len(), 3);
        assert_eq!(
            people.get("2").unwrap().get("name"),
            Some(json!("person-2"))
        );
    }

    #[test]
    fn event_log_records_in_order() {
        let people = people_collection(1);
        let log = EventLog::attach(&people);

        people.add(vec![item(json!({"id": 9}))]);
        people.remove_one("9");

        assert_eq!(log.names(), vec!["add", "remove"]);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn event_log_detaches_on_drop() {
        let people = people_collection(1);
        {
            let _log = EventLog::attach(&people);
        }
        // No panic on later emission; the observer is gone.
        people.add(vec![item(json!({"id": 9}))]);
    }

    #[test]
    fn held_persist_defers_settlement() {
        let people = Collection::new();
        let persist = HeldPersist::new();

        let model = people
            .create(item(json!({"id": 1})), CreateOptions::new().wait(), &persist)
            .unwrap();

        assert_eq!(persist.pending_count(), 1);
        assert!(people.is_empty());
        persist.settle_all(json!({}));
        assert_eq!(people.get(&model), Some(model.clone()));
        assert_eq!(model.id(), Some(ModelId::from("1")));
    }
}
