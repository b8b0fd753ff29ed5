//! The indexed, observable, self-reconciling collection.

use crate::collection::options::{
    CollectionConfig, CreateOptions, ModelFactory, ResponseParser, SetOptions,
};
use crate::error::{CollectionError, CollectionResult, ValidationError};
use crate::events::{CollectionEvent, EventFeed, ModelEvent, ObserverHandle};
use crate::model::{Attrs, Item, Model, DEFAULT_ID_ATTRIBUTE};
use crate::order::Comparator;
use crate::persist::{Persist, SaveCallbacks};
use crate::types::{Cid, CollectionToken, ModelId};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{debug, trace};

/// A value that resolves to a member: a persistent id, a transient id, or
/// a model (looked up by its own identities).
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Resolve through the persistent-id index.
    Id(ModelId),
    /// Resolve through the transient-id index.
    Cid(Cid),
    /// Resolve the model's own id, then its cid.
    Model(Model),
}

impl From<ModelId> for Lookup {
    fn from(id: ModelId) -> Self {
        Self::Id(id)
    }
}

impl From<Cid> for Lookup {
    fn from(cid: Cid) -> Self {
        Self::Cid(cid)
    }
}

impl From<Model> for Lookup {
    fn from(model: Model) -> Self {
        Self::Model(model)
    }
}

impl From<&Model> for Lookup {
    fn from(model: &Model) -> Self {
        Self::Model(model.clone())
    }
}

impl From<&str> for Lookup {
    fn from(key: &str) -> Self {
        Self::Id(ModelId::from(key))
    }
}

impl From<String> for Lookup {
    fn from(key: String) -> Self {
        Self::Id(ModelId::from(key))
    }
}

struct State {
    /// Authoritative order.
    models: Vec<Model>,
    /// Persistent-id index; only models that currently have an id.
    by_id: HashMap<ModelId, Model>,
    /// Transient-id index; every member.
    by_cid: HashMap<Cid, Model>,
    /// The observe-everything subscription held on each member.
    relays: HashMap<Cid, ObserverHandle>,
    /// Optional ordering rule.
    comparator: Option<Comparator>,
    /// Builds models from raw attributes.
    factory: ModelFactory,
    /// Optional raw-response preprocessor.
    parser: Option<ResponseParser>,
    /// Attribute holding persistent identity, for raw-candidate resolution.
    id_attribute: String,
}

pub(crate) struct Shared {
    token: CollectionToken,
    state: RwLock<State>,
    feed: EventFeed<CollectionEvent>,
}

/// An ordered, dually indexed, observable container of models.
///
/// `Collection` is a cheaply cloneable handle; clones refer to the same
/// collection. It maintains:
///
/// - an ordered sequence of members (insertion order, or sorted when a
///   comparator is configured),
/// - a persistent-id index and a transient-id index,
/// - an observe-everything subscription on every member, re-emitting each
///   member event on the collection's own feed.
///
/// The core operation is [`Collection::set`]: a diff-based merge of the
/// current membership against a candidate list that adds, removes, and
/// merges in one pass, emitting the minimal set of notifications.
///
/// # Example
///
/// ```rust,ignore
/// use modelset_core::{Collection, Item, SetOptions};
/// use serde_json::json;
///
/// let todos = Collection::new();
/// let rx = todos.subscribe();
///
/// let item = Item::from_value(json!({"id": 1, "title": "write docs"})).unwrap();
/// todos.set(vec![item], &SetOptions::default());
/// for event in rx.try_iter() {
///     println!("{event:?}");
/// }
/// ```
///
/// # Concurrency
///
/// The collection is designed for a single logical mutator. All index and
/// sequence mutation completes, and all interior locks are released, before
/// any notification is delivered, so an observer may re-enter the same
/// collection from its callback.
#[derive(Clone)]
pub struct Collection {
    shared: Arc<Shared>,
}

impl Collection {
    /// Creates an empty collection with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CollectionConfig::new())
    }

    /// Creates an empty collection from a configuration.
    #[must_use]
    pub fn with_config(config: CollectionConfig) -> Self {
        let id_attribute = config
            .id_attribute
            .unwrap_or_else(|| DEFAULT_ID_ATTRIBUTE.to_string());
        let factory = config.factory.unwrap_or_else(|| {
            let id_attr = id_attribute.clone();
            Arc::new(move |attrs| Ok(Model::with_id_attribute(attrs, id_attr.clone())))
        });
        Self {
            shared: Arc::new(Shared {
                token: CollectionToken::next(),
                state: RwLock::new(State {
                    models: Vec::new(),
                    by_id: HashMap::new(),
                    by_cid: HashMap::new(),
                    relays: HashMap::new(),
                    comparator: config.comparator,
                    factory,
                    parser: config.parser,
                    id_attribute,
                }),
                feed: EventFeed::new(),
            }),
        }
    }

    /// Creates a collection pre-loaded with `items`.
    ///
    /// The initial load is a silent full reset: no notifications fire.
    #[must_use]
    pub fn from_items(items: Vec<Item>, config: CollectionConfig) -> Self {
        let collection = Self::with_config(config);
        collection.reset_silent(items);
        collection
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Returns this instance's token.
    #[must_use]
    pub fn token(&self) -> CollectionToken {
        self.shared.token
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.read().models.len()
    }

    /// Returns whether the collection has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.state.read().models.is_empty()
    }

    /// Returns an owned snapshot of the sequence.
    ///
    /// This is the read-only view of the internal order; use standard
    /// iterator adapters on it for filtering, mapping, and folding.
    #[must_use]
    pub fn models(&self) -> Vec<Model> {
        self.shared.state.read().models.clone()
    }

    /// Resolves a member by persistent id, transient id, or model identity.
    #[must_use]
    pub fn get(&self, lookup: impl Into<Lookup>) -> Option<Model> {
        let state = self.shared.state.read();
        match lookup.into() {
            Lookup::Id(id) => state.by_id.get(&id).cloned(),
            Lookup::Cid(cid) => state.by_cid.get(&cid).cloned(),
            Lookup::Model(model) => model
                .id()
                .and_then(|id| state.by_id.get(&id).cloned())
                .or_else(|| state.by_cid.get(&model.cid()).cloned()),
        }
    }

    /// Returns the member at `index`, or `None` out of range.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<Model> {
        self.shared.state.read().models.get(index).cloned()
    }

    /// Returns all members whose attributes equal every entry of `attrs`.
    ///
    /// Empty criteria match nothing.
    #[must_use]
    pub fn matching(&self, attrs: &Attrs) -> Vec<Model> {
        if attrs.is_empty() {
            return Vec::new();
        }
        self.models()
            .into_iter()
            .filter(|model| attrs_match(model, attrs))
            .collect()
    }

    /// Returns the first member whose attributes equal every entry of
    /// `attrs`; empty criteria match nothing.
    #[must_use]
    pub fn first_matching(&self, attrs: &Attrs) -> Option<Model> {
        if attrs.is_empty() {
            return None;
        }
        self.models()
            .into_iter()
            .find(|model| attrs_match(model, attrs))
    }

    /// Returns each member's value for `attr` (`null` where absent).
    #[must_use]
    pub fn pluck(&self, attr: &str) -> Vec<Value> {
        self.models()
            .iter()
            .map(|model| model.get(attr).unwrap_or(Value::Null))
            .collect()
    }

    /// Returns the members' attributes as a JSON array.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(self.models().iter().map(Model::to_json).collect())
    }

    /// Registers an observer for every event this collection emits,
    /// including forwarded member events.
    pub fn observe(&self, callback: impl Fn(&CollectionEvent) + 'static) -> ObserverHandle {
        self.shared.feed.observe(callback)
    }

    /// Unregisters an observer.
    pub fn unobserve(&self, handle: ObserverHandle) -> bool {
        self.shared.feed.unobserve(handle)
    }

    /// Subscribes to this collection's events through a channel.
    pub fn subscribe(&self) -> Receiver<CollectionEvent> {
        self.shared.feed.subscribe()
    }

    /// Installs or clears the ordering rule.
    ///
    /// Installing a rule does not re-sort by itself; call
    /// [`Collection::sort`] or let the next reconciliation do it.
    pub fn set_comparator(&self, comparator: Option<Comparator>) {
        self.shared.state.write().comparator = comparator;
    }

    /// Returns whether an ordering rule is configured.
    #[must_use]
    pub fn has_comparator(&self) -> bool {
        self.shared.state.read().comparator.is_some()
    }

    /// Reconciles the membership against a candidate list.
    ///
    /// In one pass: merges candidates that match existing members (when
    /// `merge`), materializes and inserts unknown candidates (when `add`),
    /// removes members absent from the list (when `remove`), then restores
    /// ordering. When no comparator governs, no explicit position was
    /// given, and both `add` and `remove` are enabled, the caller's
    /// candidate order becomes the authoritative sequence. With `add` only,
    /// new models append; existing members keep their positions.
    ///
    /// Candidates rejected by the factory emit `Invalid` and are skipped;
    /// the batch never aborts. Notifications: one `Add` per inserted model
    /// (in insertion order), one `Remove` per removed member (carrying its
    /// pre-removal position), then at most one `Sort`.
    ///
    /// Returns the resolved members in candidate order, rejected candidates
    /// omitted.
    pub fn set(&self, items: Vec<Item>, options: &SetOptions) -> Vec<Model> {
        let items = if options.parse {
            self.parse_items(items)
        } else {
            items
        };

        let (comparator, id_attribute) = {
            let state = self.shared.state.read();
            (state.comparator.clone(), state.id_attribute.clone())
        };
        let sort_attr = comparator
            .as_ref()
            .and_then(|c| c.sort_attribute().map(String::from));
        let sortable = comparator.is_some() && options.at.is_none() && options.sort != Some(false);
        let mut needs_sort = comparator.is_some() && options.sort == Some(true);

        let mut resolved: Vec<Model> = Vec::new();
        let mut to_add: Vec<Model> = Vec::new();
        let mut kept: HashSet<Cid> = HashSet::new();
        let mut order: Option<Vec<Model>> =
            (!sortable && options.add && options.remove).then(Vec::new);
        let mut merged = 0usize;

        // Resolve candidates against the indices: merge duplicates into the
        // existing member, materialize unknown candidates through the
        // factory. New models are indexed and relay-subscribed here,
        // before any notification fires.
        for item in items {
            let existing = {
                let state = self.shared.state.read();
                match &item {
                    Item::Attrs(attrs) => attrs
                        .get(&id_attribute)
                        .and_then(ModelId::from_value)
                        .and_then(|id| state.by_id.get(&id).cloned()),
                    Item::Model(model) => model
                        .id()
                        .and_then(|id| state.by_id.get(&id).cloned())
                        .or_else(|| state.by_cid.get(&model.cid()).cloned()),
                }
            };

            if let Some(existing) = existing {
                if options.remove {
                    kept.insert(existing.cid());
                }
                if options.merge {
                    let attrs = match &item {
                        Item::Attrs(attrs) => attrs.clone(),
                        Item::Model(model) => model.attributes(),
                    };
                    let changed = if options.silent {
                        existing.set_silent(attrs)
                    } else {
                        existing.set(attrs)
                    };
                    if !changed.is_empty() {
                        merged += 1;
                    }
                    if sortable && !needs_sort {
                        if let Some(attr) = &sort_attr {
                            if existing.has_changed(attr) {
                                needs_sort = true;
                            }
                        }
                    }
                }
                if let Some(order) = &mut order {
                    push_unique(order, &existing);
                }
                resolved.push(existing);
            } else if options.add {
                match self.prepare_model(item) {
                    Ok(model) => {
                        self.register(&model);
                        to_add.push(model.clone());
                        if let Some(order) = &mut order {
                            push_unique(order, &model);
                        }
                        resolved.push(model);
                    }
                    Err(error) => {
                        debug!(%error, "candidate rejected by factory");
                        self.shared.feed.emit(CollectionEvent::Invalid { error });
                    }
                }
            }
        }

        // Members not marked as kept are casualties of the reconcile.
        let mut removed = 0usize;
        if options.remove {
            let to_remove: Vec<Model> = {
                let state = self.shared.state.read();
                state
                    .models
                    .iter()
                    .filter(|model| !kept.contains(&model.cid()))
                    .cloned()
                    .collect()
            };
            removed = to_remove.len();
            if !to_remove.is_empty() {
                self.remove_members(&to_remove, options.silent);
            }
        }

        // Splice in the additions, adopt the caller's order where it is
        // authoritative, and restore sorting.
        let mut applied_order = false;
        {
            let mut state = self.shared.state.write();
            let order_len = order.as_ref().map_or(0, Vec::len);
            if !to_add.is_empty() || order_len > 0 {
                if sortable {
                    needs_sort = true;
                }
                if let Some(at) = options.at {
                    let at = at.min(state.models.len());
                    for (offset, model) in to_add.iter().enumerate() {
                        state.models.insert(at + offset, model.clone());
                    }
                } else if let Some(order) = order {
                    state.models.clear();
                    state.models.extend(order);
                    applied_order = true;
                } else {
                    state.models.extend(to_add.iter().cloned());
                }
            }
            if needs_sort {
                if let Some(comparator) = &comparator {
                    state.models.sort_by(|a, b| comparator.compare(a, b));
                }
            }
        }

        if !options.silent {
            for model in &to_add {
                model.emit(ModelEvent::Added {
                    model: model.clone(),
                    origin: self.shared.token,
                });
            }
            if needs_sort || applied_order {
                self.shared.feed.emit(CollectionEvent::Sort);
            }
        }

        debug!(
            token = %self.shared.token,
            added = to_add.len(),
            removed,
            merged,
            sorted = needs_sort,
            "reconciled collection"
        );
        resolved
    }

    /// Reconciles a single candidate; returns the resolved member.
    pub fn set_one(&self, item: impl Into<Item>, options: &SetOptions) -> Option<Model> {
        self.set(vec![item.into()], options).into_iter().next()
    }

    /// Adds candidates without removing or merging.
    pub fn add(&self, items: Vec<Item>) -> Vec<Model> {
        self.set(items, &SetOptions::adding())
    }

    /// Adds candidates with explicit options; `add` is forced on and
    /// `remove` off.
    pub fn add_with(&self, items: Vec<Item>, options: &SetOptions) -> Vec<Model> {
        let options = options.clone().add(true).remove(false);
        self.set(items, &options)
    }

    /// Adds a single candidate; returns the resolved member.
    pub fn add_one(&self, item: impl Into<Item>) -> Option<Model> {
        self.add(vec![item.into()]).into_iter().next()
    }

    /// Removes members, resolving each lookup and skipping misses.
    ///
    /// Each removal deletes both index entries, splices the sequence, emits
    /// `Remove` with the pre-removal position, then severs the membership
    /// link (back-reference and relay subscription).
    pub fn remove(&self, lookups: Vec<Lookup>) -> Vec<Model> {
        self.remove_with(lookups, false)
    }

    /// Removes members without notifications.
    pub fn remove_silent(&self, lookups: Vec<Lookup>) -> Vec<Model> {
        self.remove_with(lookups, true)
    }

    /// Removes a single member; returns it if it was resolved.
    pub fn remove_one(&self, lookup: impl Into<Lookup>) -> Option<Model> {
        self.remove(vec![lookup.into()]).into_iter().next()
    }

    /// Bulk-replaces the membership.
    ///
    /// All current members leave without individual notifications, the new
    /// items load silently, then a single `Reset` fires carrying the
    /// previous member list. Returns the new members.
    pub fn reset(&self, items: Vec<Item>) -> Vec<Model> {
        self.reset_with(items, false)
    }

    /// Bulk-replaces the membership with no notification at all.
    pub fn reset_silent(&self, items: Vec<Item>) -> Vec<Model> {
        self.reset_with(items, true)
    }

    /// Re-sorts the sequence per the ordering rule and emits `Sort`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::MissingComparator`] when no rule is
    /// configured.
    pub fn sort(&self) -> CollectionResult<()> {
        self.sort_with(false)
    }

    /// Re-sorts without emitting `Sort`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::MissingComparator`] when no rule is
    /// configured.
    pub fn sort_silent(&self) -> CollectionResult<()> {
        self.sort_with(true)
    }

    /// Adds a model to the end of the sequence.
    pub fn push(&self, item: impl Into<Item>) -> Option<Model> {
        let options = SetOptions::adding().at(self.len());
        self.set_one(item, &options)
    }

    /// Removes and returns the last member.
    pub fn pop(&self) -> Option<Model> {
        let last = self.at(self.len().checked_sub(1)?)?;
        self.remove_one(last)
    }

    /// Adds a model to the beginning of the sequence.
    pub fn unshift(&self, item: impl Into<Item>) -> Option<Model> {
        let options = SetOptions::adding().at(0);
        self.set_one(item, &options)
    }

    /// Removes and returns the first member.
    pub fn shift(&self) -> Option<Model> {
        let first = self.at(0)?;
        self.remove_one(first)
    }

    /// Creates a new collection over the same members and configuration.
    #[must_use]
    pub fn clone_collection(&self) -> Collection {
        let (factory, comparator, parser, id_attribute) = {
            let state = self.shared.state.read();
            (
                Arc::clone(&state.factory),
                state.comparator.clone(),
                state.parser.clone(),
                state.id_attribute.clone(),
            )
        };
        let clone = Self::with_config(CollectionConfig::new().id_attribute(id_attribute));
        {
            let mut state = clone.shared.state.write();
            state.factory = factory;
            state.comparator = comparator;
            state.parser = parser;
        }
        clone.reset_silent(self.models().into_iter().map(Item::from).collect());
        clone
    }

    /// Creates a model through the factory and saves it via `persist`.
    ///
    /// The model joins the collection immediately unless `wait` is set, in
    /// which case it joins when the success continuation fires. The error
    /// continuation is passed through to the collaborator untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Validation`] (after emitting `Invalid`)
    /// when the factory rejects the candidate. Persistence failures are
    /// not errors of this call; they surface only through the error
    /// continuation.
    pub fn create(
        &self,
        item: impl Into<Item>,
        options: CreateOptions,
        persist: &dyn Persist,
    ) -> CollectionResult<Model> {
        let model = match self.prepare_model(item.into()) {
            Ok(model) => model,
            Err(error) => {
                self.shared.feed.emit(CollectionEvent::Invalid {
                    error: error.clone(),
                });
                return Err(CollectionError::Validation(error));
            }
        };

        let add_options = {
            let mut set_options = SetOptions::adding();
            set_options.silent = options.silent;
            set_options.at = options.at;
            set_options
        };
        if !options.wait {
            self.set(vec![model.clone().into()], &add_options);
        }

        debug!(token = %self.shared.token, cid = %model.cid(), wait = options.wait, "creating model");

        let collection = self.clone();
        let wait = options.wait;
        let user_success = options.success;
        let mut callbacks = SaveCallbacks::new().on_success(move |saved: &Model, response| {
            if wait {
                collection.set(vec![saved.clone().into()], &add_options);
            }
            if let Some(success) = user_success {
                success(saved, response);
            }
        });
        if let Some(error) = options.error {
            callbacks = callbacks.on_error(error);
        }

        persist.save(&model, callbacks);
        Ok(model)
    }

    fn sort_with(&self, silent: bool) -> CollectionResult<()> {
        {
            let mut state = self.shared.state.write();
            let comparator = state
                .comparator
                .clone()
                .ok_or(CollectionError::MissingComparator)?;
            state.models.sort_by(|a, b| comparator.compare(a, b));
        }
        if !silent {
            self.shared.feed.emit(CollectionEvent::Sort);
        }
        Ok(())
    }

    fn reset_with(&self, items: Vec<Item>, silent: bool) -> Vec<Model> {
        let (previous, relays) = {
            let mut state = self.shared.state.write();
            state.by_id.clear();
            state.by_cid.clear();
            (
                std::mem::take(&mut state.models),
                std::mem::take(&mut state.relays),
            )
        };
        for model in &previous {
            model.unbind(&self.shared);
            if let Some(handle) = relays.get(&model.cid()) {
                model.unobserve(*handle);
            }
        }

        let mut load = SetOptions::adding();
        load.silent = true;
        let added = self.set(items, &load);

        debug!(
            token = %self.shared.token,
            dropped = previous.len(),
            loaded = added.len(),
            "reset collection"
        );
        if !silent {
            self.shared.feed.emit(CollectionEvent::Reset { previous });
        }
        added
    }

    fn remove_with(&self, lookups: Vec<Lookup>, silent: bool) -> Vec<Model> {
        let members: Vec<Model> = lookups
            .into_iter()
            .filter_map(|lookup| self.get(lookup))
            .collect();
        self.remove_members(&members, silent);
        members
    }

    /// Removes resolved members one at a time: indices first, then the
    /// notification, then severance.
    fn remove_members(&self, models: &[Model], silent: bool) {
        for model in models {
            let (index, handle) = {
                let mut state = self.shared.state.write();
                let Some(index) = state.models.iter().position(|member| member == model) else {
                    continue;
                };
                if let Some(id) = model.id() {
                    if state.by_id.get(&id).is_some_and(|member| member == model) {
                        state.by_id.remove(&id);
                    }
                }
                state.by_cid.remove(&model.cid());
                state.models.remove(index);
                (index, state.relays.remove(&model.cid()))
            };
            if !silent {
                model.emit(ModelEvent::Removed {
                    model: model.clone(),
                    origin: self.shared.token,
                    index,
                });
            }
            model.unbind(&self.shared);
            if let Some(handle) = handle {
                model.unobserve(handle);
            }
        }
    }

    /// Turns an item into a model, binding adopted models to this
    /// collection.
    fn prepare_model(&self, item: Item) -> Result<Model, ValidationError> {
        match item {
            Item::Model(model) => Ok(model),
            Item::Attrs(attrs) => {
                let factory = Arc::clone(&self.shared.state.read().factory);
                factory(attrs)
            }
        }
    }

    /// Indexes a new member and subscribes the event relay.
    fn register(&self, model: &Model) {
        {
            let mut state = self.shared.state.write();
            state.by_cid.insert(model.cid(), model.clone());
            if let Some(id) = model.id() {
                state.by_id.insert(id, model.clone());
            }
        }
        let handle = model.observe(Self::relay(&self.shared));
        self.shared.state.write().relays.insert(model.cid(), handle);
        model.bind(&self.shared);
    }

    fn relay(shared: &Arc<Shared>) -> impl Fn(&ModelEvent) + 'static {
        let weak = Arc::downgrade(shared);
        move |event| {
            if let Some(shared) = weak.upgrade() {
                Collection::from_shared(shared).on_model_event(event);
            }
        }
    }

    /// Bookkeeping and forwarding for member events.
    ///
    /// Membership events from other collections are swallowed; `destroy`
    /// removes the model here; an id-attribute change re-keys the
    /// persistent-id index before anything is re-emitted.
    fn on_model_event(&self, event: &ModelEvent) {
        match event {
            ModelEvent::Added { origin, .. } | ModelEvent::Removed { origin, .. }
                if *origin != self.shared.token =>
            {
                return;
            }
            _ => {}
        }

        if let ModelEvent::Destroyed { model } = event {
            self.remove_members(std::slice::from_ref(model), false);
        }

        if let ModelEvent::ChangeAttr {
            model,
            attr,
            old,
            new,
        } = event
        {
            if attr == model.id_attribute() {
                let mut state = self.shared.state.write();
                if let Some(old_id) = old.as_ref().and_then(ModelId::from_value) {
                    if state.by_id.get(&old_id).is_some_and(|member| member == model) {
                        state.by_id.remove(&old_id);
                    }
                }
                if let Some(new_id) = new.as_ref().and_then(ModelId::from_value) {
                    state.by_id.insert(new_id.clone(), model.clone());
                    trace!(token = %self.shared.token, cid = %model.cid(), id = %new_id, "re-keyed id index");
                }
            }
        }

        let forwarded = match event {
            ModelEvent::Added { model, .. } => CollectionEvent::Add {
                model: model.clone(),
            },
            ModelEvent::Removed { model, index, .. } => CollectionEvent::Remove {
                model: model.clone(),
                index: *index,
            },
            other => CollectionEvent::Model(other.clone()),
        };
        self.shared.feed.emit(forwarded);
    }

    fn parse_items(&self, items: Vec<Item>) -> Vec<Item> {
        let parser = self.shared.state.read().parser.clone();
        match parser {
            Some(parser) => items
                .into_iter()
                .flat_map(|item| match item {
                    Item::Attrs(attrs) => parser(Value::Object(attrs)),
                    model => vec![model],
                })
                .collect(),
            None => items,
        }
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("token", &self.shared.token)
            .field("len", &self.len())
            .finish()
    }
}

fn attrs_match(model: &Model, attrs: &Attrs) -> bool {
    attrs
        .iter()
        .all(|(key, value)| model.get(key).as_ref() == Some(value))
}

/// Pushes `model` unless it is already present (duplicate candidates in
/// one call resolve to the same member).
fn push_unique(order: &mut Vec<Model>, model: &Model) {
    if !order.iter().any(|member| member == model) {
        order.push(model.clone());
    }
}
