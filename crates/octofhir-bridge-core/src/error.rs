//! Error taxonomy shared by every crate in the bridge.
//!
//! All operations surface a [`BridgeError`]. The variants map one-to-one onto
//! transport outcomes (HTTP status classes) without this crate knowing about
//! any transport.

use std::fmt;

/// Convenience result alias used across the bridge crates.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors surfaced by resource services, search execution, and patching.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The request is malformed or internally inconsistent.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of what made the request invalid.
        message: String,
    },

    /// No entity exists for the given identifier.
    #[error("Resource not found: {resource_type}/{id}")]
    NotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// The identifier that did not resolve.
        id: String,
    },

    /// The entity exists but has been voided or retired.
    #[error("Resource deleted: {resource_type}/{id}")]
    Gone {
        /// The type of the deleted resource.
        resource_type: String,
        /// The identifier of the deleted resource.
        id: String,
    },

    /// The entity failed domain validation.
    #[error("Unprocessable entity: {message}")]
    UnprocessableEntity {
        /// Summary of the validation failure.
        message: String,
        /// Individual validation issues, when the validator reports them.
        issues: Vec<String>,
    },

    /// Concurrent modification or state conflict.
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflicting state.
        message: String,
    },

    /// The operation or input form is not supported.
    #[error("Not supported: {message}")]
    NotSupported {
        /// What was requested and not supported.
        message: String,
    },

    /// Infrastructure failure below the domain layer.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the underlying failure.
        message: String,
    },
}

impl BridgeError {
    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Creates a new `Gone` error for a voided or retired entity.
    #[must_use]
    pub fn gone(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Gone {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Creates a new `UnprocessableEntity` error without itemized issues.
    #[must_use]
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::UnprocessableEntity {
            message: message.into(),
            issues: Vec::new(),
        }
    }

    /// Creates a new `UnprocessableEntity` error with itemized issues.
    #[must_use]
    pub fn unprocessable_with_issues(message: impl Into<String>, issues: Vec<String>) -> Self {
        Self::UnprocessableEntity {
            message: message.into(),
            issues,
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `NotSupported` error.
    #[must_use]
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the error was caused by the caller's input or state
    /// expectations rather than by this library or its infrastructure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. }
                | Self::NotFound { .. }
                | Self::Gone { .. }
                | Self::UnprocessableEntity { .. }
                | Self::Conflict { .. }
        )
    }

    /// Returns `true` if the error indicates a server-side failure or an
    /// unimplemented capability.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Returns the HTTP status code a transport layer would map this error to.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Gone { .. } => 410,
            Self::UnprocessableEntity { .. } => 422,
            Self::Conflict { .. } => 409,
            Self::NotSupported { .. } => 501,
            Self::Internal { .. } => 500,
        }
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Gone { .. } => ErrorCategory::Gone,
            Self::UnprocessableEntity { .. } => ErrorCategory::Validation,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::NotSupported { .. } => ErrorCategory::Unsupported,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of bridge errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Input or domain validation failure.
    Validation,
    /// Resource not found.
    NotFound,
    /// Resource soft-deleted.
    Gone,
    /// Conflicting state.
    Conflict,
    /// Unsupported operation.
    Unsupported,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Gone => write!(f, "gone"),
            Self::Conflict => write!(f, "conflict"),
            Self::Unsupported => write!(f, "unsupported"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
