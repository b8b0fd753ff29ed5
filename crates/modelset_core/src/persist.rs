//! Persistence collaborator contract.
//!
//! `Collection::create` delegates saving to an externally supplied
//! [`Persist`] implementation. The collection treats the save as
//! fire-and-forget: it wires continuations and never inspects transport
//! details. Retry, timeout, and cancellation are the collaborator's
//! responsibility.

use crate::model::Model;
use serde_json::Value;

/// A one-shot continuation invoked when a save settles.
///
/// The second argument is an opaque payload: the backend response on
/// success, the backend's error description on failure.
pub type SaveContinuation = Box<dyn FnOnce(&Model, Value)>;

/// Continuations for a single save operation.
pub struct SaveCallbacks {
    success: Option<SaveContinuation>,
    error: Option<SaveContinuation>,
}

impl SaveCallbacks {
    /// Creates an empty callback set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            success: None,
            error: None,
        }
    }

    /// Sets the success continuation.
    #[must_use]
    pub fn on_success(mut self, f: impl FnOnce(&Model, Value) + 'static) -> Self {
        self.success = Some(Box::new(f));
        self
    }

    /// Sets the error continuation.
    #[must_use]
    pub fn on_error(mut self, f: impl FnOnce(&Model, Value) + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    /// Settles the save successfully, invoking the success continuation.
    pub fn succeed(self, model: &Model, response: Value) {
        if let Some(success) = self.success {
            success(model, response);
        }
    }

    /// Settles the save with a failure, invoking the error continuation.
    pub fn fail(self, model: &Model, error: Value) {
        if let Some(error_cb) = self.error {
            error_cb(model, error);
        }
    }
}

impl Default for SaveCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SaveCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveCallbacks")
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// An external persistence backend.
pub trait Persist {
    /// Saves a model, settling `callbacks` when the operation completes.
    ///
    /// Implementations may settle synchronously or hold the callbacks for
    /// later completion.
    fn save(&self, model: &Model, callbacks: SaveCallbacks);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attrs;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct ImmediatePersist;

    impl Persist for ImmediatePersist {
        fn save(&self, model: &Model, callbacks: SaveCallbacks) {
            callbacks.succeed(model, json!({"ok": true}));
        }
    }

    #[test]
    fn success_continuation_runs() {
        let model = Model::new(Attrs::new());
        let seen = Rc::new(RefCell::new(None));

        let sink = Rc::clone(&seen);
        let callbacks = SaveCallbacks::new().on_success(move |_, resp| {
            *sink.borrow_mut() = Some(resp);
        });

        ImmediatePersist.save(&model, callbacks);
        assert_eq!(*seen.borrow(), Some(json!({"ok": true})));
    }

    #[test]
    fn fail_skips_success() {
        let model = Model::new(Attrs::new());
        let succeeded = Rc::new(RefCell::new(false));
        let failed = Rc::new(RefCell::new(false));

        let s = Rc::clone(&succeeded);
        let f = Rc::clone(&failed);
        let callbacks = SaveCallbacks::new()
            .on_success(move |_, _| *s.borrow_mut() = true)
            .on_error(move |_, _| *f.borrow_mut() = true);

        callbacks.fail(&model, json!("boom"));
        assert!(!*succeeded.borrow());
        assert!(*failed.borrow());
    }

    #[test]
    fn empty_callbacks_settle_quietly() {
        let model = Model::new(Attrs::new());
        SaveCallbacks::new().succeed(&model, json!(null));
        SaveCallbacks::new().fail(&model, json!(null));
    }
}
