//! # modelset Testkit
//!
//! Test utilities for modelset.
//!
//! This crate provides:
//! - Collection fixtures and attribute helpers
//! - An event recorder for asserting on notification sequences
//! - Persistence doubles with immediate, held, and failing settlement
//! - Property-based test generators using proptest
//! - Scenario runners that check index consistency after operation
//!   sequences
//!
//! ## Usage
//!
//! ```rust,ignore
//! use modelset_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_people() {
//!     let people = people_collection(3);
//!     let log = EventLog::attach(&people);
//!     people.remove_one("1");
//!     assert_eq!(log.names(), vec!["remove"]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod scenarios;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::scenarios::*;
}

pub use fixtures::*;
pub use generators::*;
pub use scenarios::*;
