//! Translator contracts between domain entities and resources.

use crate::error::Result;

/// Bidirectional mapping between a domain entity `U` and a resource `T`.
///
/// Translation is pure: no I/O, no store access. Identifiers must
/// round-trip, so `to_resource` carries the entity id onto the resource
/// and `to_entity` carries the resource id onto the entity.
pub trait Translator<U, T>: Send + Sync {
    /// Maps a domain entity to its resource representation.
    fn to_resource(&self, entity: &U) -> Result<T>;

    /// Maps a resource to a fresh domain entity.
    fn to_entity(&self, resource: &T) -> Result<U>;
}

/// A translator that can map a resource onto an *existing* entity,
/// preserving domain state the resource does not carry (audit fields,
/// internal links, soft-delete flags).
///
/// Services detect this capability at construction time and use
/// `merge_entity` instead of `to_entity` when applying updates.
pub trait ContextAwareTranslator<U, T>: Translator<U, T> {
    /// Maps `incoming` onto `existing`, consuming the existing entity and
    /// returning the merged result.
    fn merge_entity(&self, existing: U, incoming: &T) -> Result<U>;
}
