//! Domain validation hook applied before entities are persisted.

use octofhir_bridge_core::Result;

/// Validates a domain entity before it is persisted.
///
/// Rejections should be raised as `UnprocessableEntity` so callers can
/// tell domain rule violations apart from malformed requests.
pub trait EntityValidator<U>: Send + Sync {
    fn validate(&self, entity: &U) -> Result<()>;
}

/// The default validator: admits everything.
pub struct AcceptAll;

impl<U> EntityValidator<U> for AcceptAll {
    fn validate(&self, _entity: &U) -> Result<()> {
        Ok(())
    }
}
