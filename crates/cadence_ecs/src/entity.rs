//! Entity identifiers and handles.
//!
//! An [`EntityId`] is a lightweight `u64` identifier with no inherent data.
//! Ids are allocated by the owning [`EntityStore`] from a monotonic counter
//! and are never reused within that store, even after the entity is
//! despawned.
//!
//! [`EntityRef`] and [`EntityMut`] are borrowed handles pairing an id with
//! the store it lives in, so call sites can work with "an entity" without
//! threading `(store, id)` pairs around by hand.

use crate::component::{ComponentTag, SharedComponent};
use crate::error::EcsError;
use crate::store::EntityStore;

/// A unique entity identifier.
///
/// Entities are pure identifiers — they carry no data of their own.
/// Components are attached to entities to give them meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Create an id from a raw `u64`.
    ///
    /// Useful in tests and debug tooling; live ids normally come out of
    /// [`EntityStore::spawn`].
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A read-only handle to one entity in an [`EntityStore`].
///
/// Cheap to copy; borrows the store, so the store cannot be structurally
/// modified while the handle is alive.
#[derive(Debug, Clone, Copy)]
pub struct EntityRef<'a> {
    id: EntityId,
    store: &'a EntityStore,
}

impl<'a> EntityRef<'a> {
    pub(crate) fn new(id: EntityId, store: &'a EntityStore) -> Self {
        Self { id, store }
    }

    /// The entity's id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns `true` if the entity carries a component with `tag`.
    #[must_use]
    pub fn has(&self, tag: &str) -> bool {
        self.store.has(self.id, tag)
    }

    /// Returns `true` if the entity carries every one of `tags`.
    #[must_use]
    pub fn has_all(&self, tags: &[&str]) -> bool {
        tags.iter().all(|tag| self.has(tag))
    }

    /// The component with `tag`, if attached.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<SharedComponent> {
        self.store.get(self.id, tag)
    }

    /// Every component attached to the entity, sorted by tag.
    #[must_use]
    pub fn components(&self) -> Vec<SharedComponent> {
        self.store.components_of(self.id).unwrap_or_default()
    }

    /// The tags attached to the entity, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<ComponentTag> {
        self.store.tags_of(self.id)
    }
}

/// An exclusive handle to one entity in an [`EntityStore`].
///
/// Adds attach/detach on top of the read operations. Returned by
/// [`EntityStore::spawn`] and [`EntityStore::entity_mut`].
#[derive(Debug)]
pub struct EntityMut<'a> {
    id: EntityId,
    store: &'a mut EntityStore,
}

impl<'a> EntityMut<'a> {
    pub(crate) fn new(id: EntityId, store: &'a mut EntityStore) -> Self {
        Self { id, store }
    }

    /// The entity's id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Downgrade to a read-only handle.
    #[must_use]
    pub fn as_ref(&self) -> EntityRef<'_> {
        EntityRef::new(self.id, self.store)
    }

    /// Attach a component to the entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateComponent`] if a component with the same
    /// tag is already attached.
    pub fn attach(&mut self, component: SharedComponent) -> Result<(), EcsError> {
        self.store.attach(self.id, component)
    }

    /// Detach the component with `tag`. Returns `false` if it was absent.
    pub fn detach(&mut self, tag: &str) -> bool {
        self.store.detach(self.id, tag)
    }

    /// Returns `true` if the entity carries a component with `tag`.
    #[must_use]
    pub fn has(&self, tag: &str) -> bool {
        self.store.has(self.id, tag)
    }

    /// The component with `tag`, if attached.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<SharedComponent> {
        self.store.get(self.id, tag)
    }

    /// Every component attached to the entity, sorted by tag.
    #[must_use]
    pub fn components(&self) -> Vec<SharedComponent> {
        self.store.components_of(self.id).unwrap_or_default()
    }

    /// The tags attached to the entity, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<ComponentTag> {
        self.store.tags_of(self.id)
    }
}
