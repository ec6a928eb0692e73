//! Error types for store and registry operations.

use thiserror::Error;

use crate::component::ComponentTag;
use crate::entity::EntityId;
use crate::system::SystemTag;

/// Errors surfaced by [`EntityStore`](crate::EntityStore) and
/// [`SystemStore`](crate::SystemStore) operations.
///
/// Every variant is recoverable: the offending operation was rejected and
/// store state is unchanged. Plain lookups never produce these — absence is
/// reported through `Option` and `bool` returns instead.
#[derive(Debug, Error)]
pub enum EcsError {
    /// A system with the same tag is already registered. The registry keeps
    /// the system that was added first.
    #[error("system '{0}' is already registered")]
    DuplicateSystem(SystemTag),

    /// The entity already carries a component with this tag.
    #[error("component '{tag}' is already attached to entity {entity}")]
    DuplicateComponent {
        /// The entity that rejected the component.
        entity: EntityId,
        /// The tag that was already present.
        tag: ComponentTag,
    },

    /// The entity id does not name a live entity.
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
}
