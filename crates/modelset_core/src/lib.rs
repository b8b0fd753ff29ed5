//! # modelset_core
//!
//! Indexed, observable, self-reconciling collections of model records.
//!
//! This crate provides:
//! - [`Model`]: an observable attribute bag with stable transient identity
//!   (`cid`), optional persistent identity (`id`), and change tracking
//! - [`Collection`]: an ordered container with dual lookup indices, an
//!   optional ordering rule, and diff-based bulk reconciliation ([`set`])
//! - Fine-grained lifecycle events (`add`, `remove`, `sort`, `reset`,
//!   `invalid`, per-attribute `change`) on typed event feeds
//! - A fire-and-forget persistence seam ([`Persist`]) for
//!   creation-with-save
//!
//! [`set`]: Collection::set
//!
//! # Example
//!
//! ```rust,ignore
//! use modelset_core::{Collection, Item, SetOptions};
//! use serde_json::json;
//!
//! let people = Collection::new();
//! let events = people.subscribe();
//!
//! let attrs = |v: serde_json::Value| match v {
//!     serde_json::Value::Object(map) => Item::Attrs(map),
//!     _ => unreachable!(),
//! };
//!
//! people.set(
//!     vec![attrs(json!({"id": 1, "name": "Ada"}))],
//!     &SetOptions::default(),
//! );
//! assert_eq!(people.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod error;
mod events;
mod model;
mod order;
mod persist;
mod types;

pub use collection::{
    Collection, CollectionConfig, CreateOptions, Lookup, ModelFactory, ResponseParser, SetOptions,
};
pub use error::{CollectionError, CollectionResult, ValidationError};
pub use events::{CollectionEvent, EventFeed, ModelEvent, ObserverHandle};
pub use model::{Attrs, Item, Model, DEFAULT_ID_ATTRIBUTE};
pub use order::{compare_optional_values, compare_values, Comparator};
pub use persist::{Persist, SaveCallbacks, SaveContinuation};
pub use types::{Cid, CollectionToken, ModelId};
