//! Error types for Kinetic Quotes
//!
//! Every fallible operation in the crate returns `AppError`.
//! Failures are local to the operation that raised them: nothing here
//! is retried automatically and nothing is fatal to the process.

use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying storage read or write failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Import input is not valid JSON
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Creation input rejected
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backup file I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short label used for the error metric
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Persistence(_) => "persistence",
            AppError::MalformedDocument(_) => "malformed_document",
            AppError::Validation(_) => "validation",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Internal(_) => "internal",
        }
    }

    /// Count this error in `kinetic_quotes_errors_total`
    pub(crate) fn record(self, operation: &str) -> Self {
        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[self.kind(), operation])
            .inc();
        self
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
