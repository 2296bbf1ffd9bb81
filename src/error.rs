use miette::{Diagnostic, Result};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Authentication required")]
    #[diagnostic(code(efimeries::unauthorized))]
    Unauthorized,

    #[error("Invalid {field}: {message}")]
    #[diagnostic(code(efimeries::validation))]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{entity} {id} not found")]
    #[diagnostic(code(efimeries::not_found))]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Conflict: {0}")]
    #[diagnostic(code(efimeries::conflict))]
    Conflict(String),

    #[error("Store error: {0}")]
    #[diagnostic(code(efimeries::store))]
    Store(String),

    #[error("Failed to compute current duty: {0}")]
    #[diagnostic(code(efimeries::duty))]
    DutyResolution(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(efimeries::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(efimeries::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(efimeries::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(efimeries::serialization))]
    Serialization(String),

    #[error("Template error: {0}")]
    #[diagnostic(code(efimeries::template))]
    Template(String),
}

/// Machine-stable failure category reported to API callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Unauthorized,
    ValidationFailed,
    NotFound,
    Conflict,
    InternalError,
}

impl ErrorCategory {
    /// The category string used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Unauthorized => "unauthorized",
            ErrorCategory::ValidationFailed => "validation_failed",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::InternalError => "internal_error",
        }
    }
}

impl Error {
    /// Category this error is reported under
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Unauthorized => ErrorCategory::Unauthorized,
            Error::Validation { .. } => ErrorCategory::ValidationFailed,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Conflict(_) => ErrorCategory::Conflict,
            Error::Store(_)
            | Error::DutyResolution(_)
            | Error::Environment(_)
            | Error::Config(_)
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::Template(_) => ErrorCategory::InternalError,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<askama::Error> for Error {
    fn from(err: askama::Error) -> Self {
        Error::Template(err.to_string())
    }
}

#[cfg(feature = "redis-store")]
impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Store(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type DutyResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create validation errors for a named field
pub fn validation_error(field: &'static str, message: &str) -> Error {
    Error::Validation {
        field,
        message: message.to_string(),
    }
}

/// Helper for a missing required field
pub fn missing_field(field: &'static str) -> Error {
    validation_error(field, "is required")
}

/// Helper to create not-found errors
pub fn not_found(entity: &'static str, id: Uuid) -> Error {
    Error::NotFound { entity, id }
}

/// Helper to create store errors
pub fn store_error(message: &str) -> Error {
    Error::Store(message.to_string())
}
