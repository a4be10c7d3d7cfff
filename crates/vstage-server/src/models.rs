//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Processing status of an image
///
/// `Ready` and `Error` are terminal for the staging worker. Only the
/// reconciler may move a `Ready` row to `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Queued,
    Processing,
    Ready,
    Error,
}

impl ImageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStatus::Queued => "queued",
            ImageStatus::Processing => "processing",
            ImageStatus::Ready => "ready",
            ImageStatus::Error => "error",
        }
    }

    /// States from which the staging worker may write a new status
    pub const WORKER_WRITABLE: [ImageStatus; 2] = [ImageStatus::Queued, ImageStatus::Processing];

    /// Whether a guarded worker transition applies to a row in this state
    pub fn accepts_worker_transition(&self) -> bool {
        Self::WORKER_WRITABLE.contains(self)
    }
}

impl std::fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status string read from storage or supplied by a caller
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown image status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for ImageStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(ImageStatus::Queued),
            "processing" => Ok(ImageStatus::Processing),
            "ready" => Ok(ImageStatus::Ready),
            "error" => Ok(ImageStatus::Error),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for ImageStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, UnknownStatus> {
        value.parse()
    }
}

/// Image row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Image {
    pub id: Uuid,
    pub project_id: Uuid,
    pub original_url: String,
    pub staged_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ImageStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Image {
    /// The staged object is only expected to exist once the row is ready
    pub fn expects_staged_object(&self) -> bool {
        self.status == ImageStatus::Ready
            && self.staged_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(status: ImageStatus, staged_url: Option<&str>) -> Image {
        Image {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            original_url: "http://localhost:9000/bucket/uploads/a.jpg".to_string(),
            staged_url: staged_url.map(str::to_string),
            status,
            error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            ImageStatus::Queued,
            ImageStatus::Processing,
            ImageStatus::Ready,
            ImageStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<ImageStatus>().unwrap(), status);
        }
        assert!("done".parse::<ImageStatus>().is_err());
    }

    #[test]
    fn test_status_try_from_string() {
        assert_eq!(ImageStatus::try_from("ready".to_string()), Ok(ImageStatus::Ready));
        assert_eq!(
            ImageStatus::try_from("staged".to_string()),
            Err(UnknownStatus("staged".to_string()))
        );
    }

    #[test]
    fn test_worker_guard() {
        assert!(ImageStatus::Queued.accepts_worker_transition());
        assert!(ImageStatus::Processing.accepts_worker_transition());
        assert!(!ImageStatus::Ready.accepts_worker_transition());
        assert!(!ImageStatus::Error.accepts_worker_transition());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ImageStatus::Ready).unwrap(), "\"ready\"");
    }

    #[test]
    fn test_expects_staged_object() {
        assert!(image(ImageStatus::Ready, Some("http://h/b/k.png")).expects_staged_object());
        assert!(!image(ImageStatus::Ready, None).expects_staged_object());
        assert!(!image(ImageStatus::Ready, Some("")).expects_staged_object());
        assert!(!image(ImageStatus::Error, Some("http://h/b/k.png")).expects_staged_object());
    }
}
