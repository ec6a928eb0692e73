//! Structural-change observers and the system notification bridge.
//!
//! An [`Observer`] registered on an [`EntityStore`](crate::EntityStore)
//! hears about attachments and detachments of the component tags it watches.
//! [`SystemObserver`] is the bundled implementation: it forwards those
//! events to named systems in a [`SystemStore`], delivering to whichever of
//! them expose the [`ComponentWatcher`](crate::ComponentWatcher) capability.
//!
//! Delivery is strictly best-effort. A dropped registry, a registry the
//! caller still holds mutably, an unregistered target, a target without the
//! watcher capability, or a target that is currently executing — each is
//! skipped, never an error.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::component::ComponentTag;
use crate::entity::EntityRef;
use crate::scheduler::SystemStore;
use crate::system::SystemTag;

/// Receives attach/detach notifications for watched component tags.
///
/// Notifications are synchronous and carry a read-only handle to the
/// affected entity. On detach, the component is still reachable through the
/// handle.
pub trait Observer {
    /// The component tags this observer wants notifications for.
    fn observed_tags(&self) -> &[ComponentTag];

    /// A watched component was attached to `entity`.
    fn component_attached(&self, tag: ComponentTag, entity: EntityRef<'_>);

    /// A watched component was detached from `entity`.
    fn component_detached(&self, tag: ComponentTag, entity: EntityRef<'_>);
}

/// Routes structural-change notifications to registered systems.
///
/// Holds a non-owning handle to the [`SystemStore`]: targets are resolved by
/// tag at delivery time, so the observer never keeps a system (or the
/// registry) alive and never goes stale when systems come and go.
///
/// Configured with a consuming builder and then registered:
///
/// ```rust
/// # use std::rc::Rc;
/// # use cadence_ecs::{Ecs, SystemObserver};
/// let mut ecs = Ecs::new();
/// let observer = Rc::new(
///     SystemObserver::new(&ecs.system_store)
///         .watch(&["position"])
///         .notify(&["report"]),
/// );
/// ecs.entity_store.add_observer(observer);
/// ```
pub struct SystemObserver {
    registry: Weak<RefCell<SystemStore>>,
    watched: Vec<ComponentTag>,
    targets: Vec<SystemTag>,
}

impl SystemObserver {
    /// Create a bridge over `registry`, initially watching nothing and
    /// notifying nobody.
    #[must_use]
    pub fn new(registry: &Rc<RefCell<SystemStore>>) -> Self {
        Self {
            registry: Rc::downgrade(registry),
            watched: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Add component tags to watch.
    #[must_use]
    pub fn watch(mut self, tags: &[ComponentTag]) -> Self {
        self.watched.extend_from_slice(tags);
        self
    }

    /// Add systems to notify, by tag.
    #[must_use]
    pub fn notify(mut self, systems: &[SystemTag]) -> Self {
        self.targets.extend_from_slice(systems);
        self
    }

    /// The system tags this bridge delivers to.
    #[must_use]
    pub fn notified_systems(&self) -> &[SystemTag] {
        &self.targets
    }

    fn dispatch(&self, tag: ComponentTag, entity: EntityRef<'_>, attached: bool) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        for &target in &self.targets {
            // Resolve through the registry without holding its borrow while
            // the target runs.
            let resolved = {
                let Ok(registry) = registry.try_borrow() else {
                    // The caller still holds the registry mutably; no
                    // target can be resolved.
                    warn!(tag, "system registry busy, dropping notification");
                    return;
                };
                registry.get(target)
            };
            let Some(system) = resolved else {
                debug!(system = target, "notification target not registered, skipping");
                continue;
            };
            let Ok(mut guard) = system.try_borrow_mut() else {
                // The target is mid-process and triggered this change itself.
                warn!(system = target, tag, "notification target busy, skipping");
                continue;
            };
            if let Some(watcher) = guard.watcher() {
                if attached {
                    watcher.component_attached(tag, entity);
                } else {
                    watcher.component_detached(tag, entity);
                }
            }
        }
    }
}

impl Observer for SystemObserver {
    fn observed_tags(&self) -> &[ComponentTag] {
        &self.watched
    }

    fn component_attached(&self, tag: ComponentTag, entity: EntityRef<'_>) {
        self.dispatch(tag, entity, true);
    }

    fn component_detached(&self, tag: ComponentTag, entity: EntityRef<'_>) {
        self.dispatch(tag, entity, false);
    }
}

impl std::fmt::Debug for SystemObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemObserver")
            .field("watched", &self.watched)
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}
