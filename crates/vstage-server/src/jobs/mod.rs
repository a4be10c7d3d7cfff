//! Staging worker glue
//!
//! A staging job moves its image through `processing` and then to `ready` or
//! `error`. Each step is a guarded status write followed by a notification.
//! A failed notification does not undo the write; the caller decides whether
//! to retry the job.

use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::status::{ImageStatusWriter, StatusError};
use crate::models::ImageStatus;
use crate::notify::{JobUpdateEvent, PublishError, Publisher};

/// Identity of one staging job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingJob {
    pub job_id: String,
    pub image_id: Uuid,
}

impl StagingJob {
    pub fn new(job_id: impl Into<String>, image_id: Uuid) -> Self {
        Self {
            job_id: job_id.into(),
            image_id,
        }
    }

    fn event(&self, status: ImageStatus) -> JobUpdateEvent {
        JobUpdateEvent::new(self.job_id.clone(), self.image_id.to_string(), status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("status update failed: {0}")]
    Status(#[from] StatusError),

    #[error("notification failed: {0}")]
    Notify(#[from] PublishError),
}

impl WorkerError {
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Status(StatusError::Database(_)) => true,
            WorkerError::Status(StatusError::InvalidArgument(_)) => false,
            WorkerError::Notify(PublishError::Cancelled) => false,
            WorkerError::Notify(PublishError::InvalidArgument(_)) => false,
            WorkerError::Notify(_) => true,
        }
    }
}

/// Applies status transitions and announces them
#[derive(Clone)]
pub struct StagingWorker {
    status: Arc<dyn ImageStatusWriter>,
    publisher: Publisher,
}

impl StagingWorker {
    pub fn new(status: Arc<dyn ImageStatusWriter>, publisher: Publisher) -> Self {
        Self { status, publisher }
    }

    #[tracing::instrument(skip(self, cancel), fields(job_id = %job.job_id, image_id = %job.image_id))]
    pub async fn mark_processing(
        &self,
        job: &StagingJob,
        cancel: &CancellationToken,
    ) -> Result<(), WorkerError> {
        self.status.set_processing(job.image_id).await?;
        self.publisher
            .publish(cancel, &job.event(ImageStatus::Processing))
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, cancel), fields(job_id = %job.job_id, image_id = %job.image_id))]
    pub async fn mark_ready(
        &self,
        job: &StagingJob,
        cancel: &CancellationToken,
        staged_url: &str,
    ) -> Result<(), WorkerError> {
        self.status.set_ready(job.image_id, staged_url).await?;
        self.publisher
            .publish(cancel, &job.event(ImageStatus::Ready))
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, cancel), fields(job_id = %job.job_id, image_id = %job.image_id))]
    pub async fn mark_error(
        &self,
        job: &StagingJob,
        cancel: &CancellationToken,
        message: &str,
    ) -> Result<(), WorkerError> {
        self.status.set_error(job.image_id, message).await?;
        self.publisher
            .publish(cancel, &job.event(ImageStatus::Error).with_error(message))
            .await?;
        Ok(())
    }

    /// Drive one job end to end
    ///
    /// `stage` yields the staged object URL, or a diagnostic message on
    /// failure. Returns the terminal status that was written.
    pub async fn run<F>(
        &self,
        job: &StagingJob,
        cancel: &CancellationToken,
        stage: F,
    ) -> Result<ImageStatus, WorkerError>
    where
        F: Future<Output = Result<String, String>> + Send,
    {
        self.mark_processing(job, cancel).await?;

        match stage.await {
            Ok(staged_url) => {
                self.mark_ready(job, cancel, &staged_url).await?;
                tracing::info!(job_id = %job.job_id, image_id = %job.image_id, "Staging job finished");
                Ok(ImageStatus::Ready)
            },
            Err(message) => {
                tracing::warn!(job_id = %job.job_id, image_id = %job.image_id, error = %message, "Staging job failed");
                self.mark_error(job, cancel, &message).await?;
                Ok(ImageStatus::Error)
            },
        }
    }
}
