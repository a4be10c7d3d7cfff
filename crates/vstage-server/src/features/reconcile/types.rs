//! Reconciliation request/response types and collaborator seams

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vstage_common::{ids::parse_uuid, VstageError};

use crate::models::{Image, ImageStatus};

/// Candidate batch size when none (or a non-positive one) is given
pub const DEFAULT_LIMIT: i64 = 100;

/// Worker-pool size when none (or a non-positive one) is given
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Upper bound on sampled examples kept in a [`ReconcileResult`]
pub const MAX_EXAMPLES: usize = 10;

/// Corrective message when the original upload is gone
pub const ORIGINAL_MISSING: &str = "original missing in storage";

/// Corrective message when the staged output of a ready image is gone
pub const STAGED_MISSING: &str = "staged missing in storage";

/// Operator intent for one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Opaque status filter handed to the lister
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Resume after this image id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    /// `<= 0` means [`DEFAULT_LIMIT`]
    pub limit: i64,
    pub dry_run: bool,
    /// `<= 0` means [`DEFAULT_CONCURRENCY`]
    pub concurrency: i64,
}

impl ReconcileOptions {
    pub fn effective_limit(&self) -> i64 {
        if self.limit <= 0 {
            DEFAULT_LIMIT
        } else {
            self.limit
        }
    }

    pub fn effective_concurrency(&self) -> usize {
        usize::try_from(self.concurrency)
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }

    /// Resolve filters, validating identifiers before any I/O happens
    pub fn to_filter(&self) -> Result<ImageFilter, ReconcileError> {
        let project_id = non_blank(&self.project_id)
            .map(parse_uuid)
            .transpose()
            .map_err(ReconcileError::InvalidProjectId)?;
        let cursor = non_blank(&self.cursor)
            .map(parse_uuid)
            .transpose()
            .map_err(ReconcileError::InvalidCursor)?;

        Ok(ImageFilter {
            project_id,
            status: non_blank(&self.status).map(str::to_string),
            cursor,
            limit: self.effective_limit(),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Resolved list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<String>,
    pub cursor: Option<Uuid>,
    pub limit: i64,
}

/// One flagged row, kept for operator visibility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileExample {
    pub image_id: Uuid,
    pub status: ImageStatus,
    pub error: String,
}

/// Aggregate outcome of a pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileResult {
    pub checked: u64,
    pub missing_original: u64,
    pub missing_staged: u64,
    pub updated: u64,
    pub dry_run: bool,
    pub examples: Vec<ReconcileExample>,
    /// Id of the last listed row when the batch was full
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl ReconcileResult {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Keep the first [`MAX_EXAMPLES`] flagged rows, drop the rest
    pub fn record_example(&mut self, example: ReconcileExample) {
        if self.examples.len() < MAX_EXAMPLES {
            self.examples.push(example);
        }
    }
}

/// Errors that abort a whole pass
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("invalid project_id: {0}")]
    InvalidProjectId(VstageError),

    #[error("invalid cursor: {0}")]
    InvalidCursor(VstageError),

    #[error("failed to list images: {0:#}")]
    List(anyhow::Error),
}

/// Lists candidate image rows
#[async_trait]
pub trait ImageLister: Send + Sync {
    async fn list_images(&self, filter: &ImageFilter) -> anyhow::Result<Vec<Image>>;
}

/// Metadata-only existence check against object storage
///
/// `Ok(false)` and `Err(_)` are both treated as "missing" by the reconciler.
#[async_trait]
pub trait ObjectProbe: Send + Sync {
    async fn object_exists(&self, key: &str) -> anyhow::Result<bool>;
}

/// Unguarded corrective write: marks a row `error` regardless of its state
#[async_trait]
pub trait ImageCorrector: Send + Sync {
    async fn mark_error(&self, image_id: Uuid, message: &str) -> anyhow::Result<()>;
}
