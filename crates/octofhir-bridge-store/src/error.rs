//! Error types for the storage contract.

use octofhir_bridge_core::BridgeError;

/// Errors that can occur inside a [`DomainStore`](crate::DomainStore)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The entity carries no identifier where one is required.
    #[error("Entity has no identifier")]
    MissingId,

    /// A concurrent modification was detected.
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflicting modification.
        message: String,
    },

    /// An entity could not be converted to or from its document form.
    #[error("Serialization failure: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// The storage backend failed.
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a conflict error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<StoreError> for BridgeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingId => BridgeError::invalid_request("entity has no identifier"),
            StoreError::Conflict { message } => BridgeError::conflict(message),
            StoreError::Serialization { message } | StoreError::Backend { message } => {
                BridgeError::internal(message)
            }
        }
    }
}
