//! Error types for the authorization engine

use thiserror::Error;

/// Authorization engine errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthzError {
    /// A role, resource, or permission identifier failed validation.
    ///
    /// The display text deliberately names only the field. The rejected
    /// value is logged at warn level and must never reach an error channel
    /// consumed by end users.
    #[error("invalid {field}: value does not match the required identifier format")]
    InvalidInput {
        /// Which argument was rejected ("role", "resource", "permission", ...)
        field: String,
    },

    /// Configuration is structurally broken (empty role set, dangling
    /// default role, malformed definition)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A role hierarchy contains a cycle
    #[error("circular hierarchy detected at role '{role}'")]
    CircularHierarchy {
        /// Role at which the cycle was detected
        role: String,
    },

    /// Query named a role the configuration does not define (strict mode)
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

impl AuthzError {
    pub(crate) fn invalid_input(field: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
        }
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
