//! Indexed, observable collections of models.
//!
//! The collection owns an ordered sequence of models, two lookup indices
//! (persistent id and transient id), and an optional ordering rule. Its
//! core operation, [`Collection::set`], reconciles the membership against a
//! candidate list in one diff-based pass.

mod options;
mod store;

pub use options::{CollectionConfig, CreateOptions, ModelFactory, ResponseParser, SetOptions};
pub use store::{Collection, Lookup};

pub(crate) use store::Shared;
