//! System registry and scheduling state.
//!
//! The [`SystemStore`] owns every registered system plus the two pieces of
//! bookkeeping the scheduler needs: an execution order (descending priority,
//! stable on ties) and a last-call record per system for frequency gating.
//! The actual tick loop lives in [`Ecs::process`](crate::Ecs::process).

use std::collections::HashMap;
use std::time::Instant;

use tracing::debug;

use crate::error::EcsError;
use crate::system::{SharedSystem, SystemTag};

/// One slot in the execution order: a system tag and the priority it was
/// registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityEntry {
    priority: i32,
    tag: SystemTag,
}

impl PriorityEntry {
    /// The priority sampled at registration.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The system's tag.
    #[must_use]
    pub fn tag(&self) -> SystemTag {
        self.tag
    }
}

/// Last-call record for one registered system.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CallState {
    /// When the system last ran, or when it was registered if it never has.
    pub(crate) stamp: Instant,
    /// Whether the system has run at least once.
    pub(crate) ran: bool,
}

/// Registry of systems with priority ordering and frequency bookkeeping.
///
/// A schedule entry exists for a tag exactly as long as the tag is
/// registered; removing a system erases all trace of it.
pub struct SystemStore {
    systems: HashMap<SystemTag, SharedSystem>,
    priority: Vec<PriorityEntry>,
    schedule: HashMap<SystemTag, CallState>,
}

impl SystemStore {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            systems: HashMap::new(),
            priority: Vec::new(),
            schedule: HashMap::new(),
        }
    }

    /// Register a system.
    ///
    /// Its priority is sampled here, once; later changes to the value a
    /// system reports do not reorder the schedule. Systems registered with
    /// equal priority keep their registration order.
    ///
    /// # Errors
    ///
    /// [`EcsError::DuplicateSystem`] if the tag is already registered. The
    /// registry keeps the first registration.
    pub fn add(&mut self, system: SharedSystem) -> Result<(), EcsError> {
        let (tag, priority) = {
            let guard = system.borrow();
            (guard.tag(), guard.priority())
        };
        if self.systems.contains_key(tag) {
            return Err(EcsError::DuplicateSystem(tag));
        }

        self.systems.insert(tag, system);
        self.priority.push(PriorityEntry { priority, tag });
        // Stable sort: equal priorities stay in insertion order.
        self.priority.sort_by(|a, b| b.priority.cmp(&a.priority));
        self.schedule.insert(
            tag,
            CallState {
                stamp: Instant::now(),
                ran: false,
            },
        );

        debug!(system = tag, priority, "system registered");
        Ok(())
    }

    /// Unregister the system with `tag`, dropping its schedule state.
    /// Returns `false` if the tag was not registered.
    pub fn remove(&mut self, tag: &str) -> bool {
        if self.systems.remove(tag).is_none() {
            return false;
        }
        self.priority.retain(|entry| entry.tag != tag);
        self.schedule.remove(tag);

        debug!(system = tag, "system removed");
        true
    }

    /// The system registered under `tag`, if any.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<SharedSystem> {
        self.systems.get(tag).cloned()
    }

    /// Returns `true` if a system is registered under `tag`.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.systems.contains_key(tag)
    }

    /// The number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if no systems are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Registered systems in execution order.
    #[must_use]
    pub fn systems(&self) -> Vec<SharedSystem> {
        self.priority
            .iter()
            .filter_map(|entry| self.systems.get(entry.tag))
            .cloned()
            .collect()
    }

    /// The execution order: (priority, tag) pairs, highest priority first.
    #[must_use]
    pub fn priority(&self) -> &[PriorityEntry] {
        &self.priority
    }

    /// Debug view of when each registered system last ran (or was
    /// registered, if it never has).
    #[must_use]
    pub fn last_call_times(&self) -> HashMap<SystemTag, Instant> {
        self.schedule
            .iter()
            .map(|(tag, state)| (*tag, state.stamp))
            .collect()
    }

    pub(crate) fn call_state(&self, tag: &str) -> Option<CallState> {
        self.schedule.get(tag).copied()
    }

    /// Record a completed run. A tag that was unregistered mid-tick is left
    /// alone so no schedule entry outlives its system.
    pub(crate) fn note_run(&mut self, tag: SystemTag, now: Instant) {
        if let Some(state) = self.schedule.get_mut(tag) {
            state.stamp = now;
            state.ran = true;
        }
    }
}

impl Default for SystemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemStore")
            .field("systems", &self.systems.len())
            .field("order", &self.priority)
            .finish_non_exhaustive()
    }
}
