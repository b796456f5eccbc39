//! # octofhir-bridge-store
//!
//! Persistence abstraction for the OctoFHIR domain bridge.
//!
//! This crate defines the contract domain stores implement, the predicate
//! model search compiles into, and an in-memory reference implementation.
//!
//! ## Overview
//!
//! The main trait is [`DomainStore`], which defines the contract for:
//! - CRUD by identifier (soft deletes included)
//! - Predicate resolution to identifier sets
//! - Sorted, windowed loading of resolved identifiers
//!
//! ## Example
//!
//! ```ignore
//! use octofhir_bridge_store::{Clause, Condition, DomainStore, Predicate};
//!
//! async fn visits_of(
//!     store: &dyn DomainStore<Visit>,
//!     patient: &str,
//! ) -> Result<Vec<String>, StoreError> {
//!     let predicate = Predicate::new().and(Clause::single(Condition::Reference {
//!         field: "patient".to_string(),
//!         targets: vec![EntityReference::typed("Patient", patient)],
//!     }));
//!     store.resolve(&predicate).await
//! }
//! ```

pub mod error;
pub mod memory;
pub mod predicate;
pub mod sort;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use predicate::{Clause, Condition, Predicate, StringComparison};
pub use sort::SortOrder;
pub use traits::DomainStore;
