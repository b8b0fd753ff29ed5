//! Event feeds for observing models and collections.
//!
//! Every model and every collection carries an [`EventFeed`]: a typed
//! publish/subscribe channel that delivers every event the object produces.
//! Two consumption styles are supported:
//!
//! - [`EventFeed::observe`] registers a callback and returns an
//!   [`ObserverHandle`]; the caller unregisters with that handle.
//! - [`EventFeed::subscribe`] returns an `mpsc::Receiver` that accumulates
//!   cloned events for later draining. Disconnected receivers are pruned on
//!   the next emission.
//!
//! Emission snapshots the observer list before delivery and holds no lock
//! while callbacks run, so a callback may freely mutate the object that
//! emitted the event. Observers registered during delivery only see later
//! events.

use crate::error::ValidationError;
use crate::model::Model;
use crate::types::CollectionToken;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Handle to a registered observer callback.
///
/// Returned by [`EventFeed::observe`]; pass it to [`EventFeed::unobserve`]
/// to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "dropping the handle does not unregister the observer"]
pub struct ObserverHandle(u64);

type Callback<E> = Arc<dyn Fn(&E)>;

/// A typed event feed with callback observers and channel subscribers.
pub struct EventFeed<E> {
    /// Callback observers, keyed by handle id.
    observers: RwLock<Vec<(u64, Callback<E>)>>,
    /// Channel subscribers.
    senders: RwLock<Vec<Sender<E>>>,
    /// Next observer handle id.
    next_id: AtomicU64,
}

impl<E: Clone> EventFeed<E> {
    /// Creates an empty feed.
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            senders: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers an observer callback for every event on this feed.
    pub fn observe(&self, callback: impl Fn(&E) + 'static) -> ObserverHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers.write().push((id, Arc::new(callback)));
        ObserverHandle(id)
    }

    /// Unregisters the observer behind `handle`.
    ///
    /// Returns `true` if an observer was removed.
    pub fn unobserve(&self, handle: ObserverHandle) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(id, _)| *id != handle.0);
        observers.len() != before
    }

    /// Subscribes to the feed through a channel.
    ///
    /// The receiver accumulates every future event; drain it with
    /// `try_iter`. Dropping the receiver detaches it on the next emission.
    pub fn subscribe(&self) -> Receiver<E> {
        let (tx, rx) = mpsc::channel();
        self.senders.write().push(tx);
        rx
    }

    /// Emits an event to all observers and subscribers.
    ///
    /// Callbacks run on the emitting thread with no feed lock held.
    pub fn emit(&self, event: E) {
        let callbacks: Vec<Callback<E>> = self
            .observers
            .read()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(&event);
        }
        let mut senders = self.senders.write();
        senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns the number of registered callback observers.
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }
}

impl<E: Clone> Default for EventFeed<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// An event produced by a model.
///
/// Membership events (`Added`, `Removed`) carry the token of the collection
/// that produced them so relays can filter out events that originated in a
/// different collection.
#[derive(Clone)]
pub enum ModelEvent {
    /// One attribute changed value. Fired once per changed attribute,
    /// before the summary [`ModelEvent::Change`].
    ChangeAttr {
        /// The model that changed.
        model: Model,
        /// The attribute name.
        attr: String,
        /// The attribute's previous value, if it was set.
        old: Option<Value>,
        /// The attribute's new value; `None` when the attribute was unset.
        new: Option<Value>,
    },
    /// A `set` or `unset` changed at least one attribute.
    Change {
        /// The model that changed.
        model: Model,
        /// Names of the attributes that changed, in attribute order.
        changed: Vec<String>,
    },
    /// The model joined a collection.
    Added {
        /// The model that was added.
        model: Model,
        /// The collection that added it.
        origin: CollectionToken,
    },
    /// The model left a collection.
    Removed {
        /// The model that was removed.
        model: Model,
        /// The collection that removed it.
        origin: CollectionToken,
        /// The model's position in the sequence before removal.
        index: usize,
    },
    /// The model was destroyed. Collections observing it remove it.
    Destroyed {
        /// The destroyed model.
        model: Model,
    },
}

impl ModelEvent {
    /// Returns the event's name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChangeAttr { .. } => "change:attr",
            Self::Change { .. } => "change",
            Self::Added { .. } => "add",
            Self::Removed { .. } => "remove",
            Self::Destroyed { .. } => "destroy",
        }
    }

    /// Returns the model the event concerns.
    pub fn model(&self) -> &Model {
        match self {
            Self::ChangeAttr { model, .. }
            | Self::Change { model, .. }
            | Self::Added { model, .. }
            | Self::Removed { model, .. }
            | Self::Destroyed { model } => model,
        }
    }
}

impl std::fmt::Debug for ModelEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ModelEvent::{}({})", self.name(), self.model().cid())
    }
}

/// An event produced by a collection.
///
/// Beyond its own lifecycle events, a collection re-emits every event its
/// members produce (wrapped in [`CollectionEvent::Model`]), so observing a
/// collection observes every member.
#[derive(Clone)]
pub enum CollectionEvent {
    /// A model joined the collection.
    Add {
        /// The added model.
        model: Model,
    },
    /// A model left the collection.
    Remove {
        /// The removed model.
        model: Model,
        /// The model's position before removal.
        index: usize,
    },
    /// The sequence was re-sorted, or a caller-supplied order was adopted.
    Sort,
    /// The collection was bulk-replaced.
    Reset {
        /// The full member list before the reset.
        previous: Vec<Model>,
    },
    /// A candidate was rejected by the model factory.
    Invalid {
        /// The factory's rejection.
        error: ValidationError,
    },
    /// A member-level event, forwarded verbatim.
    Model(ModelEvent),
}

impl CollectionEvent {
    /// Returns the event's name (forwarded member events keep their own).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Sort => "sort",
            Self::Reset { .. } => "reset",
            Self::Invalid { .. } => "invalid",
            Self::Model(event) => event.name(),
        }
    }
}

impl std::fmt::Debug for CollectionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model(event) => write!(f, "CollectionEvent::model({event:?})"),
            other => write!(f, "CollectionEvent::{}", other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn observe_and_emit() {
        let feed: EventFeed<u32> = EventFeed::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        let _handle = feed.observe(move |e| sink.borrow_mut().push(*e));

        feed.emit(1);
        feed.emit(2);

        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn unobserve_stops_delivery() {
        let feed: EventFeed<u32> = EventFeed::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        let handle = feed.observe(move |e| sink.borrow_mut().push(*e));

        feed.emit(1);
        assert!(feed.unobserve(handle));
        feed.emit(2);

        assert_eq!(*seen.borrow(), vec![1]);
        assert!(!feed.unobserve(handle));
    }

    #[test]
    fn subscribe_accumulates() {
        let feed: EventFeed<u32> = EventFeed::new();
        let rx = feed.subscribe();

        feed.emit(7);
        feed.emit(8);

        let events: Vec<u32> = rx.try_iter().collect();
        assert_eq!(events, vec![7, 8]);
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let feed: EventFeed<u32> = EventFeed::new();
        let rx = feed.subscribe();
        drop(rx);

        // Prunes on the next emission without failing.
        feed.emit(1);
        let rx2 = feed.subscribe();
        feed.emit(2);
        assert_eq!(rx2.try_iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn observer_registered_during_delivery_sees_later_events() {
        let feed: Rc<EventFeed<u32>> = Rc::new(EventFeed::new());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let feed_clone = Rc::clone(&feed);
        let sink = Rc::clone(&seen);
        let _handle = feed.observe(move |e| {
            if *e == 1 {
                let inner_sink = Rc::clone(&sink);
                let _ = feed_clone.observe(move |e| inner_sink.borrow_mut().push(*e));
            }
        });

        feed.emit(1);
        feed.emit(2);

        // The inner observer missed the event that registered it.
        assert_eq!(*seen.borrow(), vec![2]);
    }

    #[test]
    fn observer_count_tracks_registration() {
        let feed: EventFeed<u32> = EventFeed::new();
        assert_eq!(feed.observer_count(), 0);
        let handle = feed.observe(|_| {});
        assert_eq!(feed.observer_count(), 1);
        feed.unobserve(handle);
        assert_eq!(feed.observer_count(), 0);
    }
}
