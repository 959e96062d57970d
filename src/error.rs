// Error handling module
// Defines the error taxonomy shared by the auth manager, transport and tools

use thiserror::Error;

/// Errors raised while talking to the Taiga API
#[derive(Error, Debug)]
pub enum TaigaError {
    /// Missing or rejected credentials, unreachable or malformed auth endpoint
    #[error("{0}")]
    Authentication(String),

    /// Remote request failed; status is absent for network-level failures
    #[error("{message}")]
    Api { message: String, status: Option<u16> },

    /// Remote resource does not exist (HTTP 404)
    #[error("{resource_type} with identifier '{identifier}' not found")]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    /// Local precondition violation (bad page size, unknown status name, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl TaigaError {
    pub fn api(message: impl Into<String>, status: Option<u16>) -> Self {
        TaigaError::Api {
            message: message.into(),
            status,
        }
    }

    pub fn not_found(resource_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        TaigaError::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }

    /// HTTP status associated with the failure, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TaigaError::Api { status, .. } => *status,
            TaigaError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Short machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            TaigaError::Authentication(_) => "authentication_error",
            TaigaError::Api { .. } => "api_error",
            TaigaError::NotFound { .. } => "not_found",
            TaigaError::Validation(_) => "validation_error",
            TaigaError::Config(_) => "config_error",
            TaigaError::Internal(_) => "internal_error",
        }
    }
}

/// Result type alias for Taiga operations
pub type Result<T> = std::result::Result<T, TaigaError>;
