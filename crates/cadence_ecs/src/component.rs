//! Core [`Component`] trait and the shared storage cell.
//!
//! Components are plain Rust values identified by a stable string tag. The
//! store keeps them behind [`SharedComponent`] cells so the same instance is
//! reachable from both of its indices and can be mutated in place while the
//! store itself is only borrowed for reading.
//!
//! The runtime is deliberately single-threaded: `Rc`/`RefCell` (rather than
//! `Arc`/`Mutex`) make every store type `!Send`, so misuse across threads is
//! a compile error instead of a data race.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::entity::EntityRef;

/// Stable string tag identifying a component type.
///
/// Tags are compared by value, so two different Rust types reporting the
/// same tag occupy the same slot on an entity.
pub type ComponentTag = &'static str;

/// A reference-counted, interior-mutable component cell.
///
/// Both store indices hold clones of the same cell, which is what makes
/// "the component you get by type and the component you get by entity are
/// the same value" literal — it can be checked with [`Rc::ptr_eq`].
pub type SharedComponent = Rc<RefCell<dyn Component>>;

/// The core component contract.
///
/// Implementors are ordinary data types with a stable [`ComponentTag`].
/// Lifecycle callbacks are an optional capability surfaced through
/// [`Component::hooks`]; most components never override it.
///
/// # Examples
///
/// ```rust
/// use std::any::Any;
/// use cadence_ecs::{Component, ComponentTag};
///
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn tag(&self) -> ComponentTag {
///         "health"
///     }
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
///     fn as_any_mut(&mut self) -> &mut dyn Any {
///         self
///     }
/// }
/// ```
pub trait Component: 'static {
    /// The stable tag identifying this component type.
    fn tag(&self) -> ComponentTag;

    /// Upcast for concrete-type reads via [`Any::downcast_ref`].
    fn as_any(&self) -> &dyn Any;

    /// Upcast for concrete-type writes via [`Any::downcast_mut`].
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Lifecycle hooks, if this component wants attach/detach callbacks.
    ///
    /// The default is `None`; components that implement [`ComponentHooks`]
    /// return `Some(self)`.
    fn hooks(&mut self) -> Option<&mut dyn ComponentHooks> {
        None
    }

    /// Wrap this component into the shared cell form the store works with.
    fn into_shared(self) -> SharedComponent
    where
        Self: Sized,
    {
        Rc::new(RefCell::new(self))
    }
}

/// Attach/detach lifecycle callbacks for a component.
///
/// Hooks run synchronously inside the store operation, while the component's
/// own cell is mutably borrowed. `owner` gives read access to the rest of
/// the entity, but resolving this same component back through `owner` will
/// panic on the cell borrow.
pub trait ComponentHooks {
    /// Called right after the component is indexed on `owner`, before any
    /// observer hears about the attachment.
    fn on_attach(&mut self, owner: EntityRef<'_>);

    /// Called when the component is about to leave its entity. Detaching a
    /// tag that is not attached does not fire this.
    fn on_detach(&mut self);
}
