//! Batch listing and corrective writes for reconciliation

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::reconcile::{ImageCorrector, ImageFilter, ImageLister};
use crate::models::{Image, ImageStatus};

/// PostgreSQL-backed image store used by the reconciler
#[derive(Clone)]
pub struct PgImageStore {
    pool: PgPool,
}

impl PgImageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Rows ordered by id, starting strictly after `filter.cursor`
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, filter: &ImageFilter) -> Result<Vec<Image>, sqlx::Error> {
        let images = sqlx::query_as::<_, Image>(
            r#"
            SELECT id, project_id, original_url, staged_url, status, error,
                   created_at, updated_at
            FROM images
            WHERE ($1::uuid IS NULL OR project_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR id > $3)
            ORDER BY id
            LIMIT $4
            "#,
        )
        .bind(filter.project_id)
        .bind(filter.status.as_deref())
        .bind(filter.cursor)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = images.len(), "Listed reconcile candidates");
        Ok(images)
    }

    /// Force `error` regardless of current state
    #[tracing::instrument(skip(self))]
    pub async fn force_error(&self, image_id: Uuid, message: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE images
            SET status = $2, error = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(image_id)
        .bind(ImageStatus::Error.as_str())
        .bind(message)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ImageLister for PgImageStore {
    async fn list_images(&self, filter: &ImageFilter) -> anyhow::Result<Vec<Image>> {
        self.list(filter).await.context("image list query failed")
    }
}

#[async_trait]
impl ImageCorrector for PgImageStore {
    async fn mark_error(&self, image_id: Uuid, message: &str) -> anyhow::Result<()> {
        let rows = self
            .force_error(image_id, message)
            .await
            .with_context(|| format!("corrective update for {} failed", image_id))?;
        tracing::debug!(%image_id, rows, "Corrective status written");
        Ok(())
    }
}
