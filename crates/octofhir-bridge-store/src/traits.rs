//! The persistence contract entity stores implement.

use async_trait::async_trait;
use octofhir_bridge_core::DomainEntity;

use crate::error::StoreError;
use crate::predicate::Predicate;
use crate::sort::SortOrder;

/// Async persistence contract for one entity type.
///
/// Implementations must be `Send + Sync` as they are shared behind `Arc`
/// across service and search pipelines. The contract is deliberately
/// id-centric: `resolve` narrows a predicate down to identifiers so that
/// paging, sorting, and loading stay separate concerns.
#[async_trait]
pub trait DomainStore<U: DomainEntity>: Send + Sync {
    /// Retrieves an entity by identifier, *including* voided entities.
    /// Callers decide visibility.
    async fn get(&self, id: &str) -> Result<Option<U>, StoreError>;

    /// Retrieves whatever subset of `ids` resolves, in input order.
    /// Unknown identifiers are silently dropped.
    async fn get_many(&self, ids: &[String]) -> Result<Vec<U>, StoreError>;

    /// Creates or replaces the entity under its identifier and returns the
    /// persisted state. Fails with [`StoreError::MissingId`] when the
    /// entity carries no identifier.
    async fn create_or_update(&self, entity: U) -> Result<U, StoreError>;

    /// Soft-deletes the entity: sets its voided/retired flag and returns
    /// the prior state, or `None` when no entity exists.
    async fn delete(&self, id: &str) -> Result<Option<U>, StoreError>;

    /// Returns the identifiers of all live (non-voided) entities matching
    /// the predicate, de-duplicated, in stable identifier order.
    async fn resolve(&self, predicate: &Predicate) -> Result<Vec<String>, StoreError>;

    /// Counts the live entities matching the predicate. Must equal
    /// `resolve(predicate).len()`.
    async fn count(&self, predicate: &Predicate) -> Result<usize, StoreError>;

    /// Loads the given identifiers, applies `sort` across the whole set,
    /// and returns the `[offset, offset + limit)` window. Identifiers that
    /// no longer resolve to live entities are skipped; without a sort the
    /// input order is kept.
    async fn fetch(
        &self,
        ids: &[String],
        offset: usize,
        limit: usize,
        sort: Option<&SortOrder>,
    ) -> Result<Vec<U>, StoreError>;
}
