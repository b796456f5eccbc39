//! Chained reference parameters.
//!
//! A chained criterion like `subject:Patient.name=smith` is resolved in
//! two steps: the chain resolver turns `Patient.name=smith` into
//! identifiers, and the outer query matches references against those
//! identifiers. Chains are validated when the query is composed, before
//! anything executes.

use std::sync::Arc;

use async_trait::async_trait;
use octofhir_bridge_core::{BridgeError, Result};

use crate::params::SearchParameterMap;

/// Resolves the inner leg of a chained reference criterion.
#[async_trait]
pub trait ChainResolver: Send + Sync {
    /// True when `parameter` can be searched on `target_type`.
    fn supports(&self, target_type: &str, parameter: &str) -> bool;

    /// Returns the identifiers of live `target_type` entities matching
    /// `parameter=value`.
    async fn resolve(
        &self,
        target_type: &str,
        parameter: &str,
        value: &str,
    ) -> Result<Vec<String>>;
}

/// Checks every chained criterion in `map` against the configured
/// resolver. Called at composition time so a bad chain never reaches
/// execution.
pub(crate) fn validate_chains(
    map: &SearchParameterMap,
    resolver: Option<&Arc<dyn ChainResolver>>,
) -> Result<()> {
    if !map.has_chains() {
        return Ok(());
    }
    let Some(resolver) = resolver else {
        return Err(BridgeError::not_supported(
            "chained search parameters are not supported by this query",
        ));
    };
    for (name, groups) in map.references() {
        for value in groups.iter().flat_map(|group| group.values()) {
            let Some(parameter) = value.chain.as_deref() else {
                continue;
            };
            if parameter.contains('.') {
                return Err(BridgeError::not_supported(format!(
                    "chain '{name}.{parameter}' is too deep: only one link is supported"
                )));
            }
            let Some(target_type) = value.target_type.as_deref() else {
                return Err(BridgeError::invalid_request(format!(
                    "chained parameter '{name}.{parameter}' needs an explicit target type"
                )));
            };
            if !resolver.supports(target_type, parameter) {
                return Err(BridgeError::invalid_request(format!(
                    "cannot chain into '{target_type}.{parameter}': unknown search parameter"
                )));
            }
        }
    }
    Ok(())
}
