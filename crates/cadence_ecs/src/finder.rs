//! Snapshot queries over an [`EntityStore`].
//!
//! A [`Finder`] starts from every live entity and narrows the candidate set
//! with chained, consuming filters. Because it borrows the store, the store
//! cannot be structurally modified while a finder is alive — a snapshot can
//! never go stale.

use crate::entity::{EntityId, EntityRef};
use crate::store::EntityStore;

/// A narrowing query over the entities of one store.
///
/// Candidates are held in ascending id order, so results — including
/// [`Finder::get_one`] — are deterministic.
///
/// # Examples
///
/// ```rust
/// # use std::any::Any;
/// # use cadence_ecs::{Component, ComponentTag, EntityStore};
/// # struct Marker(ComponentTag);
/// # impl Component for Marker {
/// #     fn tag(&self) -> ComponentTag { self.0 }
/// #     fn as_any(&self) -> &dyn Any { self }
/// #     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// # }
/// let mut store = EntityStore::new();
/// store.spawn(vec![Marker("position").into_shared(), Marker("velocity").into_shared()]);
/// store.spawn(vec![Marker("position").into_shared()]);
///
/// let movers = store.find().has(&["position", "velocity"]).get_many();
/// assert_eq!(movers.len(), 1);
/// ```
#[must_use]
pub struct Finder<'a> {
    store: &'a EntityStore,
    ids: Vec<EntityId>,
}

impl<'a> Finder<'a> {
    pub(crate) fn new(store: &'a EntityStore) -> Self {
        Self {
            store,
            ids: store.entity_ids(),
        }
    }

    /// Keep only entities that carry every one of `tags`.
    ///
    /// An empty list keeps everything. Chaining `has` calls intersects the
    /// filters, so the result set can only shrink.
    #[must_use]
    pub fn has(mut self, tags: &[&str]) -> Self {
        let store = self.store;
        self.ids
            .retain(|id| tags.iter().all(|tag| store.has(*id, tag)));
        self
    }

    /// Keep only entities whose handle satisfies `predicate`.
    #[must_use]
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(EntityRef<'_>) -> bool,
    {
        let store = self.store;
        self.ids.retain(|id| predicate(EntityRef::new(*id, store)));
        self
    }

    /// Handles to every surviving entity, ascending by id.
    #[must_use]
    pub fn get_many(self) -> Vec<EntityRef<'a>> {
        let Finder { store, ids } = self;
        ids.into_iter()
            .map(|id| EntityRef::new(id, store))
            .collect()
    }

    /// The surviving entity with the lowest id, or `None` if the query
    /// matched nothing.
    #[must_use]
    pub fn get_one(self) -> Option<EntityRef<'a>> {
        let Finder { store, ids } = self;
        ids.first().map(|id| EntityRef::new(*id, store))
    }

    /// The surviving entity ids, ascending.
    #[must_use]
    pub fn ids(self) -> Vec<EntityId> {
        self.ids
    }

    /// How many entities currently survive the filters.
    #[must_use]
    pub fn count(&self) -> usize {
        self.ids.len()
    }
}

impl std::fmt::Debug for Finder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finder")
            .field("candidates", &self.ids.len())
            .finish_non_exhaustive()
    }
}
