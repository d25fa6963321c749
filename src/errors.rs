//! Errors for the emissions recorder
use thiserror::Error;

use crate::models::Imo;

#[derive(Error, Debug)]
pub enum EmissionsError {
    #[error("Serialization error")]
    SerdeError(#[from] serde_json::Error),

    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("IO error")]
    IoError(#[from] std::io::Error),

    #[error("Invalid IMO number: {0}")]
    InvalidImo(String),

    #[error("Invalid configuration: {message}")]
    ConfigurationError { message: String },

    #[error("Database connection error: {0}")]
    DatabaseConnectionError(String),

    #[error("Database migration error")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("IMO {0} not found")]
    NotFound(Imo),
}

/// A single failed field constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Ways a record mutation can fail
#[derive(Error, Debug)]
pub enum EditError {
    #[error("There were errors in your form")]
    Validation(Vec<FieldError>),

    #[error("IMO {0} already exists")]
    Conflict(Imo),

    #[error("IMO {0} not found")]
    NotFound(Imo),

    #[error("The data store could not complete the request")]
    DataStore(#[source] sqlx::Error),
}

impl EditError {
    /// Message safe to show to the user. Never carries driver text.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<sqlx::Error> for EditError {
    fn from(err: sqlx::Error) -> Self {
        EditError::DataStore(err)
    }
}
