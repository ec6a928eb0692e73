//! Dual-indexed entity-component storage.
//!
//! The [`EntityStore`] keeps every component in two indices at once:
//!
//! - `by_type`: component tag → entity id → component
//! - `by_entity`: entity id → component tag → component
//!
//! Both indices hold clones of the same [`SharedComponent`] cell, so
//! "all entities with a position" and "everything on entity 3" resolve to
//! the same instances. Mutations go through both indices together; the pair
//! never disagrees.
//!
//! `by_entity` doubles as the entity registry: a live entity always has a
//! bucket there, possibly an empty one.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::warn;

use crate::component::{ComponentTag, SharedComponent};
use crate::entity::{EntityId, EntityMut, EntityRef};
use crate::error::EcsError;
use crate::finder::Finder;
use crate::observer::Observer;

/// Entity-component storage with symmetric by-type and by-entity indices.
///
/// Entity ids come from a monotonic counter starting at 0 and are never
/// reused, so a despawned entity's id stays dead for the lifetime of the
/// store.
pub struct EntityStore {
    next_id: u64,
    by_type: HashMap<ComponentTag, HashMap<EntityId, SharedComponent>>,
    by_entity: HashMap<EntityId, HashMap<ComponentTag, SharedComponent>>,
    observers: Vec<Rc<dyn Observer>>,
}

impl EntityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            by_type: HashMap::new(),
            by_entity: HashMap::new(),
            observers: Vec::new(),
        }
    }

    // -- Entity lifecycle --

    /// Spawn a new entity carrying `components`.
    ///
    /// Never fails: a tag that appears twice in the list keeps its first
    /// occurrence and the rest are skipped with a warning. Attach hooks and
    /// observer notifications fire for every component that lands.
    pub fn spawn(&mut self, components: Vec<SharedComponent>) -> EntityMut<'_> {
        let id = EntityId::from_raw(self.next_id);
        self.next_id += 1;
        self.by_entity.insert(id, HashMap::new());

        for component in components {
            if let Err(err) = self.attach(id, component) {
                warn!(%err, "skipping component in spawn list");
            }
        }
        EntityMut::new(id, self)
    }

    /// Spawn a new entity with no components.
    pub fn spawn_empty(&mut self) -> EntityMut<'_> {
        self.spawn(Vec::new())
    }

    /// Despawn an entity, detaching all its components first.
    ///
    /// Components are detached in sorted tag order, with the usual detach
    /// hooks and observer notifications. Returns `false` if the id does not
    /// name a live entity.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(bucket) = self.by_entity.get(&id) else {
            return false;
        };
        let mut tags: Vec<ComponentTag> = bucket.keys().copied().collect();
        tags.sort_unstable();

        for tag in tags {
            self.detach(id, tag);
        }
        self.by_entity.remove(&id);
        true
    }

    /// Returns `true` if `id` names a live entity.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.by_entity.contains_key(&id)
    }

    /// The number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    /// Returns `true` if no entities are alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }

    // -- Component operations --

    /// Attach a component to entity `id`.
    ///
    /// On success the component is written to both indices, its attach hook
    /// runs, and then observers watching its tag are notified.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] if `id` is not live;
    /// [`EcsError::DuplicateComponent`] if the entity already carries the
    /// tag. On error nothing is attached and no hooks fire.
    pub fn attach(&mut self, id: EntityId, component: SharedComponent) -> Result<(), EcsError> {
        let tag = component.borrow().tag();
        let Some(bucket) = self.by_entity.get(&id) else {
            return Err(EcsError::EntityNotFound(id));
        };
        if bucket.contains_key(tag) {
            return Err(EcsError::DuplicateComponent { entity: id, tag });
        }

        self.insert_cell(id, tag, Rc::clone(&component));
        self.run_attach_hook(id, &component);
        self.notify_attached(tag, id);
        Ok(())
    }

    /// Attach a batch of components to entity `id`, all or nothing.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] if `id` is not live;
    /// [`EcsError::DuplicateComponent`] if any tag is already on the entity
    /// or appears twice within the batch. On error the entity is untouched.
    pub fn attach_to(
        &mut self,
        id: EntityId,
        components: Vec<SharedComponent>,
    ) -> Result<(), EcsError> {
        let Some(bucket) = self.by_entity.get(&id) else {
            return Err(EcsError::EntityNotFound(id));
        };
        let mut incoming: HashSet<ComponentTag> = HashSet::new();
        for component in &components {
            let tag = component.borrow().tag();
            if bucket.contains_key(tag) || !incoming.insert(tag) {
                return Err(EcsError::DuplicateComponent { entity: id, tag });
            }
        }

        for component in components {
            let tag = component.borrow().tag();
            self.insert_cell(id, tag, Rc::clone(&component));
            self.run_attach_hook(id, &component);
            self.notify_attached(tag, id);
        }
        Ok(())
    }

    /// Detach the component with `tag` from entity `id`.
    ///
    /// The detach hook and observer notifications fire while the component
    /// is still reachable through the entity; only then is it removed from
    /// both indices. Returns `false` (with no hooks and no notifications)
    /// if the entity does not carry the tag.
    pub fn detach(&mut self, id: EntityId, tag: &str) -> bool {
        let Some(cell) = self.by_entity.get(&id).and_then(|bucket| bucket.get(tag)).cloned()
        else {
            return false;
        };
        let tag = cell.borrow().tag();

        {
            let mut guard = cell.borrow_mut();
            if let Some(hooks) = guard.hooks() {
                hooks.on_detach();
            }
        }
        self.notify_detached(tag, id);

        if let Some(bucket) = self.by_entity.get_mut(&id) {
            bucket.remove(tag);
        }
        let now_empty = match self.by_type.get_mut(tag) {
            Some(bucket) => {
                bucket.remove(&id);
                bucket.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.by_type.remove(tag);
        }
        true
    }

    /// Detach several tags from entity `id`. Absent tags are skipped.
    pub fn detach_from(&mut self, id: EntityId, tags: &[&str]) {
        for tag in tags {
            self.detach(id, tag);
        }
    }

    fn insert_cell(&mut self, id: EntityId, tag: ComponentTag, cell: SharedComponent) {
        self.by_type
            .entry(tag)
            .or_default()
            .insert(id, Rc::clone(&cell));
        self.by_entity.entry(id).or_default().insert(tag, cell);
    }

    fn run_attach_hook(&self, id: EntityId, cell: &SharedComponent) {
        let mut guard = cell.borrow_mut();
        if let Some(hooks) = guard.hooks() {
            hooks.on_attach(EntityRef::new(id, self));
        }
    }

    // -- Reads --

    /// The component with `tag` on entity `id`, if both exist.
    #[must_use]
    pub fn get(&self, id: EntityId, tag: &str) -> Option<SharedComponent> {
        self.by_entity.get(&id)?.get(tag).cloned()
    }

    /// Returns `true` if entity `id` carries a component with `tag`.
    #[must_use]
    pub fn has(&self, id: EntityId, tag: &str) -> bool {
        self.by_entity
            .get(&id)
            .is_some_and(|bucket| bucket.contains_key(tag))
    }

    /// Every component on entity `id`, sorted by tag. `None` if the id does
    /// not name a live entity; an empty vec if it is alive but bare.
    #[must_use]
    pub fn components_of(&self, id: EntityId) -> Option<Vec<SharedComponent>> {
        let bucket = self.by_entity.get(&id)?;
        let mut entries: Vec<(ComponentTag, SharedComponent)> = bucket
            .iter()
            .map(|(tag, cell)| (*tag, Rc::clone(cell)))
            .collect();
        entries.sort_unstable_by_key(|(tag, _)| *tag);
        Some(entries.into_iter().map(|(_, cell)| cell).collect())
    }

    /// The component tags on entity `id`, sorted. Empty for unknown ids.
    #[must_use]
    pub fn tags_of(&self, id: EntityId) -> Vec<ComponentTag> {
        let mut tags: Vec<ComponentTag> = self
            .by_entity
            .get(&id)
            .map(|bucket| bucket.keys().copied().collect())
            .unwrap_or_default();
        tags.sort_unstable();
        tags
    }

    /// All live entity ids, ascending.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.by_entity.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Handles to all live entities, ascending by id.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityRef<'_>> {
        self.entity_ids()
            .into_iter()
            .map(|id| EntityRef::new(id, self))
            .collect()
    }

    /// Handles to the entities carrying `tag`, ascending by id. This is the
    /// read path the by-type index exists for.
    #[must_use]
    pub fn entities_with(&self, tag: &str) -> Vec<EntityRef<'_>> {
        let mut ids: Vec<EntityId> = self
            .by_type
            .get(tag)
            .map(|bucket| bucket.keys().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids.into_iter().map(|id| EntityRef::new(id, self)).collect()
    }

    /// A read handle to entity `id`, if alive.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        self.contains(id).then(|| EntityRef::new(id, self))
    }

    /// An exclusive handle to entity `id`, if alive.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        if self.contains(id) {
            Some(EntityMut::new(id, self))
        } else {
            None
        }
    }

    /// Start a [`Finder`] query over a snapshot of the current entities.
    #[must_use]
    pub fn find(&self) -> Finder<'_> {
        Finder::new(self)
    }

    // -- Observers --

    /// Register an observer for structural-change notifications.
    pub fn add_observer(&mut self, observer: Rc<dyn Observer>) {
        self.observers.push(observer);
    }

    /// Unregister an observer by identity ([`Rc::ptr_eq`]). Returns `false`
    /// if it was never registered. Registration order of the remaining
    /// observers is preserved.
    pub fn remove_observer(&mut self, observer: &Rc<dyn Observer>) -> bool {
        match self
            .observers
            .iter()
            .position(|candidate| Rc::ptr_eq(candidate, observer))
        {
            Some(index) => {
                self.observers.remove(index);
                true
            }
            None => false,
        }
    }

    fn notify_attached(&self, tag: ComponentTag, id: EntityId) {
        for observer in &self.observers {
            if observer.observed_tags().contains(&tag) {
                observer.component_attached(tag, EntityRef::new(id, self));
            }
        }
    }

    fn notify_detached(&self, tag: ComponentTag, id: EntityId) {
        for observer in &self.observers {
            if observer.observed_tags().contains(&tag) {
                observer.component_detached(tag, EntityRef::new(id, self));
            }
        }
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("entities", &self.by_entity.len())
            .field("component_types", &self.by_type.len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::cell::RefCell;

    use super::*;
    use crate::component::{Component, ComponentHooks};

    type Log = Rc<RefCell<Vec<String>>>;

    fn new_log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    struct Marker(ComponentTag);

    impl Component for Marker {
        fn tag(&self) -> ComponentTag {
            self.0
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct Probe {
        tag: ComponentTag,
        log: Log,
        owner: Option<EntityId>,
    }

    impl Probe {
        fn new(tag: ComponentTag, log: &Log) -> Self {
            Self {
                tag,
                log: Rc::clone(log),
                owner: None,
            }
        }
    }

    impl Component for Probe {
        fn tag(&self) -> ComponentTag {
            self.tag
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn hooks(&mut self) -> Option<&mut dyn ComponentHooks> {
            Some(self)
        }
    }

    impl ComponentHooks for Probe {
        fn on_attach(&mut self, owner: EntityRef<'_>) {
            self.owner = Some(owner.id());
            self.log.borrow_mut().push(format!("hook:attach:{}", self.tag));
        }
        fn on_detach(&mut self) {
            self.log.borrow_mut().push(format!("hook:detach:{}", self.tag));
        }
    }

    struct RecordingObserver {
        watched: Vec<ComponentTag>,
        log: Log,
    }

    impl Observer for RecordingObserver {
        fn observed_tags(&self) -> &[ComponentTag] {
            &self.watched
        }
        fn component_attached(&self, tag: ComponentTag, entity: EntityRef<'_>) {
            self.log.borrow_mut().push(format!(
                "observer:attach:{tag}@{}:{}",
                entity.id(),
                entity.has(tag)
            ));
        }
        fn component_detached(&self, tag: ComponentTag, entity: EntityRef<'_>) {
            self.log.borrow_mut().push(format!(
                "observer:detach:{tag}@{}:{}",
                entity.id(),
                entity.has(tag)
            ));
        }
    }

    fn recording_observer(watched: &[ComponentTag], log: &Log) -> Rc<dyn Observer> {
        Rc::new(RecordingObserver {
            watched: watched.to_vec(),
            log: Rc::clone(log),
        })
    }

    #[test]
    fn test_spawn_assigns_sequential_ids() {
        let mut store = EntityStore::new();
        let a = store.spawn_empty().id();
        let b = store.spawn_empty().id();
        let c = store.spawn(vec![Marker("position").into_shared()]).id();

        assert_eq!(a.raw(), 0);
        assert_eq!(b.raw(), 1);
        assert_eq!(c.raw(), 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_ids_not_reused_after_despawn() {
        let mut store = EntityStore::new();
        let a = store.spawn_empty().id();
        assert!(store.despawn(a));
        let b = store.spawn_empty().id();

        assert_ne!(a, b);
        assert_eq!(b.raw(), 1);
        assert!(!store.contains(a));
    }

    #[test]
    fn test_attach_indexes_same_cell_twice() {
        let mut store = EntityStore::new();
        let id = store.spawn_empty().id();
        store
            .attach(id, Marker("position").into_shared())
            .unwrap();

        let from_type = store.by_type.get("position").unwrap().get(&id).unwrap();
        let from_entity = store.by_entity.get(&id).unwrap().get("position").unwrap();
        assert!(Rc::ptr_eq(from_type, from_entity));
    }

    #[test]
    fn test_attach_unknown_entity_is_error() {
        let mut store = EntityStore::new();
        let ghost = EntityId::from_raw(99);
        let err = store
            .attach(ghost, Marker("position").into_shared())
            .unwrap_err();

        assert!(matches!(err, EcsError::EntityNotFound(id) if id == ghost));
        assert!(store.by_type.is_empty());
    }

    #[test]
    fn test_attach_duplicate_tag_rejected() {
        let mut store = EntityStore::new();
        let id = store.spawn_empty().id();
        let first = Marker("position").into_shared();
        store.attach(id, Rc::clone(&first)).unwrap();

        let err = store
            .attach(id, Marker("position").into_shared())
            .unwrap_err();
        assert!(matches!(err, EcsError::DuplicateComponent { .. }));

        // The first cell is still the one attached.
        let current = store.get(id, "position").unwrap();
        assert!(Rc::ptr_eq(&current, &first));
    }

    #[test]
    fn test_attach_to_is_atomic() {
        let mut store = EntityStore::new();
        let id = store.spawn_empty().id();

        let err = store
            .attach_to(
                id,
                vec![
                    Marker("position").into_shared(),
                    Marker("velocity").into_shared(),
                    Marker("position").into_shared(),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, EcsError::DuplicateComponent { tag: "position", .. }));
        assert!(store.tags_of(id).is_empty());

        store
            .attach_to(id, vec![Marker("position").into_shared()])
            .unwrap();
        let err = store
            .attach_to(
                id,
                vec![
                    Marker("velocity").into_shared(),
                    Marker("position").into_shared(),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, EcsError::DuplicateComponent { tag: "position", .. }));
        assert_eq!(store.tags_of(id), vec!["position"]);
    }

    #[test]
    fn test_spawn_duplicate_tag_first_wins() {
        let mut store = EntityStore::new();
        let first = Marker("position").into_shared();
        let id = store
            .spawn(vec![Rc::clone(&first), Marker("position").into_shared()])
            .id();

        assert_eq!(store.tags_of(id), vec!["position"]);
        let current = store.get(id, "position").unwrap();
        assert!(Rc::ptr_eq(&current, &first));
    }

    #[test]
    fn test_detach_absent_tag_is_noop() {
        let log = new_log();
        let mut store = EntityStore::new();
        store.add_observer(recording_observer(&["position"], &log));
        let id = store.spawn_empty().id();

        assert!(!store.detach(id, "position"));
        assert!(!store.detach(EntityId::from_raw(99), "position"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_detach_prunes_empty_type_bucket() {
        let mut store = EntityStore::new();
        let id = store.spawn(vec![Marker("position").into_shared()]).id();

        assert!(store.detach(id, "position"));
        assert!(!store.by_type.contains_key("position"));
        assert!(store.contains(id));
        assert_eq!(store.entities_with("position").len(), 0);
    }

    #[test]
    fn test_despawn_detaches_everything() {
        let log = new_log();
        let mut store = EntityStore::new();
        store.add_observer(recording_observer(&["alpha", "beta"], &log));
        let id = store
            .spawn(vec![
                Probe::new("beta", &log).into_shared(),
                Probe::new("alpha", &log).into_shared(),
            ])
            .id();
        log.borrow_mut().clear();

        assert!(store.despawn(id));
        // Sorted tag order, hook before observer for each component.
        assert_eq!(
            *log.borrow(),
            vec![
                "hook:detach:alpha".to_string(),
                format!("observer:detach:alpha@{id}:true"),
                "hook:detach:beta".to_string(),
                format!("observer:detach:beta@{id}:true"),
            ]
        );
        assert!(!store.contains(id));
        assert!(store.components_of(id).is_none());
        assert!(!store.despawn(id));
    }

    #[test]
    fn test_hook_sees_owner_and_runs_before_observer() {
        let log = new_log();
        let mut store = EntityStore::new();
        store.add_observer(recording_observer(&["probe"], &log));
        let id = store.spawn_empty().id();

        store
            .attach(id, Probe::new("probe", &log).into_shared())
            .unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "hook:attach:probe".to_string(),
                format!("observer:attach:probe@{id}:true"),
            ]
        );

        let cell = store.get(id, "probe").unwrap();
        let guard = cell.borrow();
        let probe = guard.as_any().downcast_ref::<Probe>().unwrap();
        assert_eq!(probe.owner, Some(id));
    }

    #[test]
    fn test_detach_notifies_while_still_reachable() {
        let log = new_log();
        let mut store = EntityStore::new();
        store.add_observer(recording_observer(&["probe"], &log));
        let id = store.spawn(vec![Probe::new("probe", &log).into_shared()]).id();
        log.borrow_mut().clear();

        assert!(store.detach(id, "probe"));
        // ":true" — the observer still saw the component on the entity.
        assert_eq!(
            *log.borrow(),
            vec![
                "hook:detach:probe".to_string(),
                format!("observer:detach:probe@{id}:true"),
            ]
        );
        assert!(!store.has(id, "probe"));
    }

    #[test]
    fn test_observer_only_hears_watched_tags() {
        let log = new_log();
        let mut store = EntityStore::new();
        store.add_observer(recording_observer(&["position"], &log));

        let id = store.spawn(vec![Marker("velocity").into_shared()]).id();
        assert!(log.borrow().is_empty());

        store.attach(id, Marker("position").into_shared()).unwrap();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_remove_observer_by_identity() {
        let log = new_log();
        let mut store = EntityStore::new();
        let observer = recording_observer(&["position"], &log);
        let stranger = recording_observer(&["position"], &log);
        store.add_observer(Rc::clone(&observer));

        assert!(!store.remove_observer(&stranger));
        assert!(store.remove_observer(&observer));
        assert!(!store.remove_observer(&observer));

        store.spawn(vec![Marker("position").into_shared()]);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_entities_sorted_and_entities_with() {
        let mut store = EntityStore::new();
        let a = store.spawn(vec![Marker("position").into_shared()]).id();
        let b = store.spawn_empty().id();
        let c = store.spawn(vec![Marker("position").into_shared()]).id();

        let all: Vec<EntityId> = store.entities().iter().map(EntityRef::id).collect();
        assert_eq!(all, vec![a, b, c]);

        let with: Vec<EntityId> = store
            .entities_with("position")
            .iter()
            .map(EntityRef::id)
            .collect();
        assert_eq!(with, vec![a, c]);
        assert!(store.entities_with("velocity").is_empty());
    }

    #[test]
    fn test_handle_ops() {
        let mut store = EntityStore::new();
        let id = store.spawn_empty().id();

        let mut entity = store.entity_mut(id).unwrap();
        entity.attach(Marker("position").into_shared()).unwrap();
        entity.attach(Marker("velocity").into_shared()).unwrap();
        assert!(matches!(
            entity.attach(Marker("position").into_shared()),
            Err(EcsError::DuplicateComponent { .. })
        ));

        assert!(entity.has("position"));
        assert_eq!(entity.tags(), vec!["position", "velocity"]);
        assert_eq!(entity.components().len(), 2);
        assert!(entity.as_ref().has_all(&["position", "velocity"]));

        assert!(entity.detach("velocity"));
        assert!(!entity.detach("velocity"));
        assert_eq!(entity.tags(), vec!["position"]);

        assert!(store.entity(EntityId::from_raw(99)).is_none());
        assert!(store.entity_mut(EntityId::from_raw(99)).is_none());
    }

    #[test]
    fn test_components_of_distinguishes_empty_and_missing() {
        let mut store = EntityStore::new();
        let id = store.spawn_empty().id();

        assert_eq!(store.components_of(id).unwrap().len(), 0);
        assert!(store.components_of(EntityId::from_raw(99)).is_none());
    }
}
