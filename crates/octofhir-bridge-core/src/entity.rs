//! Contract implemented by domain entities handled by stores and services.

use serde::Serialize;

/// A persistent domain entity with soft-delete semantics.
///
/// Data-level entities carry a *voided* flag, metadata-level entities a
/// *retired* flag; both are exposed through the same accessor pair here.
/// A flagged entity still exists in the store but is invisible to reads
/// and searches until an external process clears the flag.
///
/// Entities must serialize to a JSON object so stores can evaluate
/// predicates and resolvers can extract references without per-type code.
pub trait DomainEntity: Clone + Serialize + Send + Sync + 'static {
    /// Stable domain type name, e.g. `"Visit"`.
    fn type_name() -> &'static str;

    /// The entity identifier, absent until assigned.
    fn id(&self) -> Option<&str>;

    /// Assigns the entity identifier.
    fn set_id(&mut self, id: String);

    /// Whether the entity is voided or retired.
    fn is_voided(&self) -> bool;

    /// Sets or clears the voided/retired flag.
    fn set_voided(&mut self, voided: bool);
}
