use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use vstage_common::ids::parse_uuid;

use crate::error::{AppError, AppResult};
use crate::jobs::{StagingJob, StagingWorker};
use crate::models::ImageStatus;

/// State for the job callback routes
#[derive(Clone)]
pub struct JobsState {
    pub worker: StagingWorker,
    /// Cancelled on server shutdown; ends publish retries early
    pub shutdown: CancellationToken,
}

pub fn job_routes() -> Router<JobsState> {
    Router::new().route("/:job_id/status", post(report_status))
}

#[derive(Debug, Deserialize)]
struct StatusReport {
    image_id: String,
    status: ImageStatus,
    #[serde(default)]
    staged_url: String,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Serialize)]
struct StatusAccepted {
    job_id: String,
    image_id: String,
    status: ImageStatus,
}

#[tracing::instrument(skip_all, fields(job_id = %job_id))]
async fn report_status(
    State(state): State<JobsState>,
    Path(job_id): Path<String>,
    body: Bytes,
) -> AppResult<Response> {
    let report: StatusReport = serde_json::from_slice(&body)
        .map_err(|e| AppError::bad_request(format!("invalid body: {}", e)))?;
    let image_id = parse_uuid(&report.image_id)
        .map_err(|e| AppError::bad_request(format!("invalid image_id: {}", e)))?;

    let job = StagingJob::new(job_id, image_id);
    let cancel = &state.shutdown;
    match report.status {
        ImageStatus::Processing => state.worker.mark_processing(&job, cancel).await?,
        ImageStatus::Ready => state.worker.mark_ready(&job, cancel, &report.staged_url).await?,
        ImageStatus::Error => state.worker.mark_error(&job, cancel, &report.error).await?,
        ImageStatus::Queued => {
            return Err(AppError::bad_request(
                "status must be processing, ready or error",
            ))
        },
    }

    let accepted = StatusAccepted {
        job_id: job.job_id,
        image_id: image_id.to_string(),
        status: report.status,
    };
    Ok((StatusCode::OK, Json(accepted)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::status::{ImageStatusWriter, StatusError};
    use crate::notify::{LocalPubSub, PubSub, PubSubError, Publisher, RetryPolicy};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    const IMAGE_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    /// Records writes, rejecting empty arguments like the SQL repository
    #[derive(Default)]
    struct RecordingStatus {
        writes: Mutex<Vec<(Uuid, ImageStatus)>>,
    }

    #[async_trait]
    impl ImageStatusWriter for RecordingStatus {
        async fn set_processing(&self, image_id: Uuid) -> Result<(), StatusError> {
            self.writes.lock().unwrap().push((image_id, ImageStatus::Processing));
            Ok(())
        }

        async fn set_ready(&self, image_id: Uuid, staged_url: &str) -> Result<(), StatusError> {
            if staged_url.is_empty() {
                return Err(StatusError::InvalidArgument("staged_url is required".into()));
            }
            self.writes.lock().unwrap().push((image_id, ImageStatus::Ready));
            Ok(())
        }

        async fn set_error(&self, image_id: Uuid, message: &str) -> Result<(), StatusError> {
            if message.is_empty() {
                return Err(StatusError::InvalidArgument("error message is required".into()));
            }
            self.writes.lock().unwrap().push((image_id, ImageStatus::Error));
            Ok(())
        }
    }

    struct DownPubSub;

    #[async_trait]
    impl PubSub for DownPubSub {
        async fn publish(&self, _channel: &str, _payload: &str) -> Result<usize, PubSubError> {
            Err(PubSubError::Unavailable("connection refused".to_string()))
        }
    }

    fn app(
        status: Arc<RecordingStatus>,
        pubsub: Arc<dyn PubSub>,
        shutdown: CancellationToken,
    ) -> Router {
        let policy = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(2));
        job_routes().with_state(JobsState {
            worker: StagingWorker::new(status, Publisher::new(pubsub, policy)),
            shutdown,
        })
    }

    async fn send(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_ready_report_writes_and_publishes() {
        let status = Arc::new(RecordingStatus::default());
        let hub = LocalPubSub::new(8);
        let mut rx = hub.subscribe(&format!("jobs:image:{}", IMAGE_ID)).await;
        let app = app(status.clone(), Arc::new(hub), CancellationToken::new());

        let (code, json) = send(
            app,
            "/job-1/status",
            r#"{"image_id": "550e8400e29b41d4a716446655440000", "status": "ready", "staged_url": "http://localhost:9000/staged/a.png"}"#,
        )
        .await;

        assert_eq!(code, StatusCode::OK);
        assert_eq!(json["job_id"], "job-1");
        assert_eq!(json["image_id"], IMAGE_ID);
        assert_eq!(json["status"], "ready");
        assert_eq!(
            *status.writes.lock().unwrap(),
            vec![(Uuid::parse_str(IMAGE_ID).unwrap(), ImageStatus::Ready)]
        );
        assert_eq!(rx.recv().await.unwrap(), r#"{"status":"ready"}"#);
    }

    #[tokio::test]
    async fn test_missing_staged_url_is_400() {
        let status = Arc::new(RecordingStatus::default());
        let app = app(status.clone(), Arc::new(LocalPubSub::new(8)), CancellationToken::new());

        let (code, json) = send(
            app,
            "/job-2/status",
            &format!(r#"{{"image_id": "{}", "status": "ready"}}"#, IMAGE_ID),
        )
        .await;

        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid argument: staged_url is required");
        assert!(status.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_queued_and_bad_ids_are_rejected() {
        let status = Arc::new(RecordingStatus::default());

        let queued = app(status.clone(), Arc::new(LocalPubSub::new(8)), CancellationToken::new());
        let (code, _) = send(
            queued,
            "/job-3/status",
            &format!(r#"{{"image_id": "{}", "status": "queued"}}"#, IMAGE_ID),
        )
        .await;
        assert_eq!(code, StatusCode::BAD_REQUEST);

        let bad_id = app(status.clone(), Arc::new(LocalPubSub::new(8)), CancellationToken::new());
        let (code, json) = send(
            bad_id,
            "/job-3/status",
            r#"{"image_id": "abc", "status": "processing"}"#,
        )
        .await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid image_id: invalid UUID length");

        assert!(status.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_publish_is_500_after_write() {
        let status = Arc::new(RecordingStatus::default());
        let app = app(status.clone(), Arc::new(DownPubSub), CancellationToken::new());

        let (code, json) = send(
            app,
            "/job-4/status",
            &format!(r#"{{"image_id": "{}", "status": "processing"}}"#, IMAGE_ID),
        )
        .await;

        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("after 2 attempts"));
        assert_eq!(status.writes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_publish_retries() {
        let status = Arc::new(RecordingStatus::default());
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let app = app(status.clone(), Arc::new(DownPubSub), shutdown);

        let (code, json) = send(
            app,
            "/job-5/status",
            &format!(r#"{{"image_id": "{}", "status": "error", "error": "model timed out"}}"#, IMAGE_ID),
        )
        .await;

        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "publish cancelled");
        assert_eq!(status.writes.lock().unwrap().len(), 1);
    }
}
