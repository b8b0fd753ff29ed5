//! Configuration and per-call options for collections.

use crate::error::ValidationError;
use crate::model::{Attrs, Item, Model};
use crate::order::Comparator;
use crate::persist::SaveContinuation;
use serde_json::Value;
use std::sync::Arc;

/// Builds a model from raw attributes, or rejects the candidate.
pub type ModelFactory = Arc<dyn Fn(Attrs) -> Result<Model, ValidationError>>;

/// Converts a raw response payload into candidate items.
pub type ResponseParser = Arc<dyn Fn(Value) -> Vec<Item>>;

/// Configuration for constructing a collection.
///
/// Recognized options mirror the collection's constructor contract: a model
/// factory override, an ordering rule, plus the id attribute used to
/// resolve raw candidates and an optional response parser.
#[derive(Default)]
pub struct CollectionConfig {
    pub(crate) factory: Option<ModelFactory>,
    pub(crate) comparator: Option<Comparator>,
    pub(crate) parser: Option<ResponseParser>,
    pub(crate) id_attribute: Option<String>,
}

impl CollectionConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the model factory.
    ///
    /// The factory decides the concrete model variant and may reject
    /// candidates with a [`ValidationError`]; rejections surface as
    /// `Invalid` events, never as batch failures.
    #[must_use]
    pub fn factory(mut self, f: impl Fn(Attrs) -> Result<Model, ValidationError> + 'static) -> Self {
        self.factory = Some(Arc::new(f));
        self
    }

    /// Sets the ordering rule.
    #[must_use]
    pub fn comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = Some(comparator);
        self
    }

    /// Sets the response parser used by parse-enabled operations.
    #[must_use]
    pub fn parser(mut self, parser: impl Fn(Value) -> Vec<Item> + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Sets the attribute holding persistent identity (default `"id"`).
    ///
    /// Used both to resolve raw candidates against the id index and by the
    /// default factory when building models.
    #[must_use]
    pub fn id_attribute(mut self, attr: impl Into<String>) -> Self {
        self.id_attribute = Some(attr.into());
        self
    }
}

impl std::fmt::Debug for CollectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionConfig")
            .field("factory", &self.factory.is_some())
            .field("comparator", &self.comparator)
            .field("parser", &self.parser.is_some())
            .field("id_attribute", &self.id_attribute)
            .finish()
    }
}

/// Options for the `set` reconciliation.
///
/// Defaults enable `add`, `remove`, and `merge` — a full synchronization
/// against the candidate list.
#[derive(Debug, Clone)]
pub struct SetOptions {
    /// Materialize and insert candidates not already present.
    pub add: bool,
    /// Remove current members absent from the candidate list.
    pub remove: bool,
    /// Apply candidate attributes onto existing members in place.
    pub merge: bool,
    /// Insert newly added models at this position; disables auto-sort for
    /// the call.
    pub at: Option<usize>,
    /// Force (`Some(true)`) or suppress (`Some(false)`) the final re-sort.
    pub sort: Option<bool>,
    /// Suppress all notifications for this call.
    pub silent: bool,
    /// Preprocess raw response payloads through the configured parser.
    pub parse: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            add: true,
            remove: true,
            merge: true,
            at: None,
            sort: None,
            silent: false,
            parse: false,
        }
    }
}

impl SetOptions {
    /// Full-synchronization defaults (`add`, `remove`, `merge` enabled).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add-only defaults: insert new candidates, leave members untouched.
    #[must_use]
    pub fn adding() -> Self {
        Self {
            add: true,
            remove: false,
            merge: false,
            ..Self::default()
        }
    }

    /// Enables or disables adding.
    #[must_use]
    pub const fn add(mut self, value: bool) -> Self {
        self.add = value;
        self
    }

    /// Enables or disables removal of absent members.
    #[must_use]
    pub const fn remove(mut self, value: bool) -> Self {
        self.remove = value;
        self
    }

    /// Enables or disables in-place merging.
    #[must_use]
    pub const fn merge(mut self, value: bool) -> Self {
        self.merge = value;
        self
    }

    /// Splices newly added models in at `index`.
    #[must_use]
    pub const fn at(mut self, index: usize) -> Self {
        self.at = Some(index);
        self
    }

    /// Forces or suppresses the final re-sort.
    #[must_use]
    pub const fn sort(mut self, value: bool) -> Self {
        self.sort = Some(value);
        self
    }

    /// Suppresses all notifications.
    #[must_use]
    pub const fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Runs raw payloads through the configured response parser.
    #[must_use]
    pub const fn parse(mut self) -> Self {
        self.parse = true;
        self
    }
}

/// Options for `create`.
pub struct CreateOptions {
    /// Defer the add until the persistence collaborator confirms success.
    pub wait: bool,
    /// Suppress notifications for the add.
    pub silent: bool,
    /// Insert position for the add.
    pub at: Option<usize>,
    pub(crate) success: Option<SaveContinuation>,
    pub(crate) error: Option<SaveContinuation>,
}

impl CreateOptions {
    /// Creates default options: immediate add, notifications enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            wait: false,
            silent: false,
            at: None,
            success: None,
            error: None,
        }
    }

    /// Waits for persistence confirmation before adding.
    #[must_use]
    pub const fn wait(mut self) -> Self {
        self.wait = true;
        self
    }

    /// Suppresses notifications for the add.
    #[must_use]
    pub const fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Inserts the created model at `index`.
    #[must_use]
    pub const fn at(mut self, index: usize) -> Self {
        self.at = Some(index);
        self
    }

    /// Sets the caller's success continuation, invoked after any deferred
    /// add has been applied.
    #[must_use]
    pub fn on_success(mut self, f: impl FnOnce(&Model, Value) + 'static) -> Self {
        self.success = Some(Box::new(f));
        self
    }

    /// Sets the caller's error continuation; passed through untouched.
    #[must_use]
    pub fn on_error(mut self, f: impl FnOnce(&Model, Value) + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CreateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateOptions")
            .field("wait", &self.wait)
            .field("silent", &self.silent)
            .field("at", &self.at)
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_defaults_enable_everything() {
        let options = SetOptions::default();
        assert!(options.add);
        assert!(options.remove);
        assert!(options.merge);
        assert_eq!(options.at, None);
        assert_eq!(options.sort, None);
        assert!(!options.silent);
    }

    #[test]
    fn adding_disables_remove_and_merge() {
        let options = SetOptions::adding();
        assert!(options.add);
        assert!(!options.remove);
        assert!(!options.merge);
    }

    #[test]
    fn builder_chain() {
        let options = SetOptions::new().at(3).sort(false).silent();
        assert_eq!(options.at, Some(3));
        assert_eq!(options.sort, Some(false));
        assert!(options.silent);
    }

    #[test]
    fn create_defaults() {
        let options = CreateOptions::new();
        assert!(!options.wait);
        assert!(options.success.is_none());
    }
}
