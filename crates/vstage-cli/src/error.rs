//! Error types for the reconcile CLI

use thiserror::Error;
use vstage_server::features::reconcile::ReconcileError;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or .env file.")]
    Config(String),

    /// Database connection failed
    #[error("Database error: {0}. Check DATABASE_URL and that PostgreSQL is reachable.")]
    Database(#[from] sqlx::Error),

    /// Object storage client could not be created
    #[error("Storage error: {0}. Check the S3_* settings.")]
    Storage(String),

    /// The reconciliation pass failed
    #[error("Reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Failed to encode JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vstage_common::VstageError;

    #[test]
    fn test_reconcile_error_message_is_kept() {
        let err = CliError::from(ReconcileError::InvalidCursor(VstageError::InvalidUuidHex));
        assert_eq!(err.to_string(), "Reconciliation failed: invalid cursor: invalid UUID hex");
    }

    #[test]
    fn test_config_error() {
        let err = CliError::config("DATABASE_URL cannot be empty");
        assert!(err.to_string().starts_with("Configuration error: DATABASE_URL"));
    }
}
