//! Guarded image status transitions
//!
//! Each call is one `UPDATE` conditioned on the row currently being `queued`
//! or `processing`. When the condition does not hold (row already terminal, or
//! no such id) zero rows change and the call still succeeds, so every
//! transition can be retried freely. Callers cannot tell "already done" apart
//! from "missing row" through this API.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ImageStatus;

/// Errors raised by status writes
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Writes worker-driven status transitions for a single image row
#[async_trait]
pub trait ImageStatusWriter: Send + Sync {
    async fn set_processing(&self, image_id: Uuid) -> Result<(), StatusError>;

    /// Fails with `InvalidArgument` when `staged_url` is empty
    async fn set_ready(&self, image_id: Uuid, staged_url: &str) -> Result<(), StatusError>;

    /// Fails with `InvalidArgument` when `message` is empty
    async fn set_error(&self, image_id: Uuid, message: &str) -> Result<(), StatusError>;
}

pub(crate) fn require_staged_url(staged_url: &str) -> Result<(), StatusError> {
    if staged_url.is_empty() {
        return Err(StatusError::InvalidArgument("staged_url is required".to_string()));
    }
    Ok(())
}

pub(crate) fn require_error_message(message: &str) -> Result<(), StatusError> {
    if message.is_empty() {
        return Err(StatusError::InvalidArgument("error message is required".to_string()));
    }
    Ok(())
}

fn writable_states() -> Vec<&'static str> {
    ImageStatus::WORKER_WRITABLE.iter().map(ImageStatus::as_str).collect()
}

/// PostgreSQL-backed status repository
#[derive(Clone)]
pub struct PgStatusRepository {
    pool: PgPool,
}

impl PgStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageStatusWriter for PgStatusRepository {
    #[tracing::instrument(skip(self))]
    async fn set_processing(&self, image_id: Uuid) -> Result<(), StatusError> {
        let result = sqlx::query(
            r#"
            UPDATE images
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            "#,
        )
        .bind(image_id)
        .bind(ImageStatus::Processing.as_str())
        .bind(writable_states())
        .execute(&self.pool)
        .await?;

        tracing::debug!(rows = result.rows_affected(), "set_processing applied");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn set_ready(&self, image_id: Uuid, staged_url: &str) -> Result<(), StatusError> {
        require_staged_url(staged_url)?;

        let result = sqlx::query(
            r#"
            UPDATE images
            SET status = $2, staged_url = $3, updated_at = NOW()
            WHERE id = $1 AND status = ANY($4)
            "#,
        )
        .bind(image_id)
        .bind(ImageStatus::Ready.as_str())
        .bind(staged_url)
        .bind(writable_states())
        .execute(&self.pool)
        .await?;

        tracing::debug!(rows = result.rows_affected(), "set_ready applied");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn set_error(&self, image_id: Uuid, message: &str) -> Result<(), StatusError> {
        require_error_message(message)?;

        let result = sqlx::query(
            r#"
            UPDATE images
            SET status = $2, error = $3, updated_at = NOW()
            WHERE id = $1 AND status = ANY($4)
            "#,
        )
        .bind(image_id)
        .bind(ImageStatus::Error.as_str())
        .bind(message)
        .bind(writable_states())
        .execute(&self.pool)
        .await?;

        tracing::debug!(rows = result.rows_affected(), "set_error applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_staged_url() {
        assert!(require_staged_url("https://b.s3.amazonaws.com/k.png").is_ok());
        let err = require_staged_url("").unwrap_err();
        assert!(matches!(err, StatusError::InvalidArgument(_)));
        assert_eq!(err.to_string(), "invalid argument: staged_url is required");
    }

    #[test]
    fn test_require_error_message() {
        assert!(require_error_message("model timed out").is_ok());
        assert!(matches!(
            require_error_message(""),
            Err(StatusError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_writable_states() {
        assert_eq!(writable_states(), vec!["queued", "processing"]);
    }
}
