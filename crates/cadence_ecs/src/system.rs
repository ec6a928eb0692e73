//! Core [`System`] trait and scheduling metadata.
//!
//! A system is a unit of per-tick behaviour with a stable tag, a scheduling
//! priority, and a minimum call interval. Systems live in a
//! [`SystemStore`](crate::SystemStore) and are driven by
//! [`Ecs::process`](crate::Ecs::process).

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::component::ComponentTag;
use crate::entity::EntityRef;
use crate::store::EntityStore;

/// Stable string tag identifying a system.
pub type SystemTag = &'static str;

/// A reference-counted, interior-mutable system cell.
///
/// The registry and the scheduler resolve systems through clones of this
/// cell, so a system can mutate the registry it lives in from inside its own
/// `process` call (for example to unregister itself).
pub type SharedSystem = Rc<RefCell<dyn System>>;

/// The core system contract.
///
/// Lifecycle: [`setup`](System::setup) once before the first tick,
/// [`process`](System::process) on every tick the scheduler deems the system
/// eligible for, [`cleanup`](System::cleanup) once at shutdown. Only
/// `process` has no default body.
///
/// Component-watch callbacks are an optional capability surfaced through
/// [`System::watcher`], mirroring [`Component::hooks`](crate::Component::hooks).
pub trait System: 'static {
    /// The stable tag identifying this system.
    fn tag(&self) -> SystemTag;

    /// Scheduling priority. Higher values run earlier within a tick; equal
    /// values run in registration order. Sampled once, at registration.
    fn priority(&self) -> i32 {
        0
    }

    /// Minimum interval between `process` calls. [`Duration::ZERO`] (the
    /// default) means every tick. Re-read on every tick, so a system may
    /// change its own cadence at runtime.
    fn frequency(&self) -> Duration {
        Duration::ZERO
    }

    /// One-time initialisation, called by [`Ecs::setup`](crate::Ecs::setup).
    fn setup(&mut self, _store: &mut EntityStore) {}

    /// Per-tick work. `dt` is the time elapsed since this system last ran,
    /// or since its registration if it has never run.
    fn process(&mut self, store: &mut EntityStore, dt: Duration);

    /// One-time teardown, called by [`Ecs::cleanup`](crate::Ecs::cleanup).
    fn cleanup(&mut self, _store: &mut EntityStore) {}

    /// Upcast for concrete-type reads via [`Any::downcast_ref`].
    fn as_any(&self) -> &dyn Any;

    /// Upcast for concrete-type writes via [`Any::downcast_mut`].
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Structural-change callbacks, if this system wants to be notified
    /// about watched component attachments.
    ///
    /// The default is `None`; systems that implement [`ComponentWatcher`]
    /// return `Some(self)`. Notifications only arrive when a
    /// [`SystemObserver`](crate::SystemObserver) routes them here.
    fn watcher(&mut self) -> Option<&mut dyn ComponentWatcher> {
        None
    }

    /// Wrap this system into the shared cell form the registry works with.
    fn into_shared(self) -> SharedSystem
    where
        Self: Sized,
    {
        Rc::new(RefCell::new(self))
    }
}

/// Structural-change callbacks delivered through a registered
/// [`SystemObserver`](crate::SystemObserver).
///
/// `entity` is a read-only handle: a notification can inspect the store but
/// not structurally change it.
pub trait ComponentWatcher {
    /// A watched component was attached to `entity`.
    fn component_attached(&mut self, tag: ComponentTag, entity: EntityRef<'_>);

    /// A watched component was detached from `entity`. The component is
    /// still reachable through `entity` at this point.
    fn component_detached(&mut self, tag: ComponentTag, entity: EntityRef<'_>);
}
