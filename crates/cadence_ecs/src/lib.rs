//! # cadence_ecs
//!
//! A small, single-threaded entity-component-system runtime built around
//! string-tagged components, priority- and frequency-aware system
//! scheduling, and structural-change observers.
//!
//! - [`EntityStore`] — dual-indexed component storage (by type and by
//!   entity) with attach/detach lifecycle hooks.
//! - [`Finder`] — snapshot queries over the store's entities.
//! - [`SystemStore`] — system registry with a stable descending priority
//!   order and per-system call records.
//! - [`SystemObserver`] — bridges watched component changes to systems'
//!   [`ComponentWatcher`] hooks.
//! - [`Ecs`] — the assembled façade: `setup`, `process`, `cleanup`.
//!
//! The runtime owns scheduling *within* a tick; when ticks happen is the
//! caller's business. All execution is synchronous and `!Send` by
//! construction — the shared-cell types are `Rc`-based.
//!
//! ## Usage
//!
//! ```rust
//! use std::any::Any;
//! use std::time::Duration;
//!
//! use cadence_ecs::{Component, ComponentTag, Ecs, EntityStore, System, SystemTag};
//!
//! struct Position {
//!     x: f32,
//! }
//!
//! impl Component for Position {
//!     fn tag(&self) -> ComponentTag {
//!         "position"
//!     }
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!     fn as_any_mut(&mut self) -> &mut dyn Any {
//!         self
//!     }
//! }
//!
//! struct Drift;
//!
//! impl System for Drift {
//!     fn tag(&self) -> SystemTag {
//!         "drift"
//!     }
//!     fn process(&mut self, store: &mut EntityStore, _dt: Duration) {
//!         for entity in store.find().has(&["position"]).get_many() {
//!             if let Some(cell) = entity.get("position") {
//!                 let mut guard = cell.borrow_mut();
//!                 let position = guard.as_any_mut().downcast_mut::<Position>().unwrap();
//!                 position.x += 1.0;
//!             }
//!         }
//!     }
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!     fn as_any_mut(&mut self) -> &mut dyn Any {
//!         self
//!     }
//! }
//!
//! let mut ecs = Ecs::new();
//! let id = ecs.entity_store.spawn(vec![Position { x: 0.0 }.into_shared()]).id();
//! ecs.system_store.borrow_mut().add(Drift.into_shared()).unwrap();
//!
//! ecs.setup();
//! ecs.process();
//! ecs.cleanup();
//!
//! let cell = ecs.entity_store.get(id, "position").unwrap();
//! let guard = cell.borrow();
//! assert_eq!(guard.as_any().downcast_ref::<Position>().unwrap().x, 1.0);
//! ```

pub mod component;
pub mod engine;
pub mod entity;
pub mod error;
pub mod finder;
pub mod observer;
pub mod scheduler;
pub mod store;
pub mod system;

pub use component::{Component, ComponentHooks, ComponentTag, SharedComponent};
pub use engine::{Ecs, SharedSystemStore};
pub use entity::{EntityId, EntityMut, EntityRef};
pub use error::EcsError;
pub use finder::Finder;
pub use observer::{Observer, SystemObserver};
pub use scheduler::{PriorityEntry, SystemStore};
pub use store::EntityStore;
pub use system::{ComponentWatcher, SharedSystem, System, SystemTag};
