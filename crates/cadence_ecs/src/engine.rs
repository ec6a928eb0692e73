//! The assembled runtime: entity storage plus scheduled system execution.
//!
//! [`Ecs`] pairs an [`EntityStore`] with a shared [`SystemStore`] and drives
//! the system lifecycle. The driver loop itself lives outside — callers
//! decide when ticks happen and simply call [`Ecs::process`] at their own
//! cadence; per-system frequency gating happens in here.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use tracing::debug;

use crate::scheduler::SystemStore;
use crate::store::EntityStore;
use crate::system::SharedSystem;

/// Shared handle to the system registry.
///
/// Systems and observers that need to reach back into the registry (to
/// unregister themselves, say) hold clones of this; the [`Ecs`] value is the
/// conventional owner.
pub type SharedSystemStore = Rc<RefCell<SystemStore>>;

/// The runtime façade.
///
/// Both stores are public: systems receive the entity store during
/// `process`, and callers wire systems and observers through the fields
/// directly.
///
/// ```rust
/// # use std::any::Any;
/// # use std::time::Duration;
/// # use cadence_ecs::{Component, ComponentTag, Ecs, EntityStore, System, SystemTag};
/// # struct Pulse;
/// # impl System for Pulse {
/// #     fn tag(&self) -> SystemTag { "pulse" }
/// #     fn process(&mut self, _store: &mut EntityStore, _dt: Duration) {}
/// #     fn as_any(&self) -> &dyn Any { self }
/// #     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// # }
/// let mut ecs = Ecs::new();
/// ecs.system_store.borrow_mut().add(Pulse.into_shared()).unwrap();
/// ecs.setup();
/// ecs.process();
/// ecs.cleanup();
/// ```
#[derive(Debug)]
pub struct Ecs {
    /// Entity-component storage.
    pub entity_store: EntityStore,
    /// System registry and schedule state.
    pub system_store: SharedSystemStore,
}

impl Ecs {
    /// Create a runtime with empty stores.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entity_store: EntityStore::new(),
            system_store: Rc::new(RefCell::new(SystemStore::new())),
        }
    }

    /// Run every registered system's `setup` hook once, in execution order.
    pub fn setup(&mut self) {
        for system in self.ordered_systems() {
            system.borrow_mut().setup(&mut self.entity_store);
        }
    }

    /// Run one scheduler tick.
    ///
    /// The clock is sampled once; each system in the execution order then
    /// runs if it has never run before, or if the time since its last run
    /// meets its current `frequency()`. `dt` passed to the system is that
    /// elapsed time. The tick completes synchronously before this returns.
    ///
    /// The order is snapshotted up front: systems registered while the tick
    /// runs are first considered on the next tick, and systems unregistered
    /// mid-tick are skipped.
    pub fn process(&mut self) {
        let now = Instant::now();
        let order = self.system_store.borrow().priority().to_vec();
        debug!(systems = order.len(), "tick start");

        for entry in order {
            let tag = entry.tag();
            let (system, state) = {
                let registry = self.system_store.borrow();
                match (registry.get(tag), registry.call_state(tag)) {
                    (Some(system), Some(state)) => (system, state),
                    // Unregistered since the snapshot was taken.
                    _ => continue,
                }
            };

            let elapsed = now.duration_since(state.stamp);
            if state.ran && elapsed < system.borrow().frequency() {
                continue;
            }

            debug!(system = tag, elapsed_ms = elapsed.as_millis() as u64, "running system");
            // No registry borrow is held here, so the system may add or
            // remove systems through a SharedSystemStore of its own.
            system.borrow_mut().process(&mut self.entity_store, elapsed);
            self.system_store.borrow_mut().note_run(tag, now);
        }
    }

    /// Run every registered system's `cleanup` hook once, in execution order.
    pub fn cleanup(&mut self) {
        for system in self.ordered_systems() {
            system.borrow_mut().cleanup(&mut self.entity_store);
        }
    }

    fn ordered_systems(&self) -> Vec<SharedSystem> {
        self.system_store.borrow().systems()
    }
}

impl Default for Ecs {
    fn default() -> Self {
        Self::new()
    }
}
