//! Guard error types

use thiserror::Error;

use crate::rules::FieldKind;

/// Errors that can occur while loading rules or evaluating them
#[derive(Error, Debug)]
pub enum GuardError {
    /// A resolver function failed while resolving a rule field
    #[error("Failed to resolve `{field}`: {source}")]
    ResolutionFailed {
        /// Which rule field was being resolved
        field: FieldKind,
        /// The resolver's own error
        #[source]
        source: anyhow::Error,
    },

    /// Rule data has a shape that is not an identifier or a list of identifiers
    #[error("Malformed rule: {0}")]
    MalformedRule(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GuardError {
    /// Create a malformed rule error
    pub fn malformed(msg: impl Into<String>) -> Self {
        GuardError::MalformedRule(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        GuardError::InvalidConfig(msg.into())
    }

    /// Check whether this error came from a failing resolver
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, GuardError::ResolutionFailed { .. })
    }
}

/// Result type alias for guard operations
pub type GuardResult<T> = Result<T, GuardError>;
