//! Storage reconciler
//!
//! Audits a batch of image rows against object storage. Every row becomes one
//! task; a semaphore admits at most `concurrency` of them at a time, and the
//! pass returns once all tasks have finished.
//!
//! Anything that prevents confirming an object (bad URL, probe error, plain
//! not-found) counts as missing. Rows are repaired independently: a failed
//! corrective write is logged and skipped without affecting its siblings.

use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use vstage_common::keys::extract_key;

use super::types::{
    ImageCorrector, ImageLister, ObjectProbe, ReconcileError, ReconcileExample, ReconcileOptions,
    ReconcileResult, ORIGINAL_MISSING, STAGED_MISSING,
};
use crate::models::Image;

/// Batch auditor for image/object drift
#[derive(Clone)]
pub struct Reconciler {
    lister: Arc<dyn ImageLister>,
    probe: Arc<dyn ObjectProbe>,
    corrector: Arc<dyn ImageCorrector>,
}

impl Reconciler {
    pub fn new(
        lister: Arc<dyn ImageLister>,
        probe: Arc<dyn ObjectProbe>,
        corrector: Arc<dyn ImageCorrector>,
    ) -> Self {
        Self {
            lister,
            probe,
            corrector,
        }
    }

    /// Run one reconciliation pass
    ///
    /// # Errors
    ///
    /// - `InvalidProjectId` / `InvalidCursor` before any I/O
    /// - `List` when the candidate query fails
    ///
    /// Per-row failures never surface here; they show up in the counters.
    #[tracing::instrument(skip(self, options), fields(dry_run = options.dry_run, limit = options.limit))]
    pub async fn reconcile(
        &self,
        options: ReconcileOptions,
    ) -> Result<ReconcileResult, ReconcileError> {
        let filter = options.to_filter()?;
        let concurrency = options.effective_concurrency();

        let images = self
            .lister
            .list_images(&filter)
            .await
            .map_err(ReconcileError::List)?;

        let listed = images.len();
        let next_cursor = if listed as i64 == filter.limit {
            images.last().map(|image| image.id.to_string())
        } else {
            None
        };

        debug!(listed, concurrency, "Dispatching reconcile units");

        let tally = Arc::new(Mutex::new(ReconcileResult::new(options.dry_run)));
        let permits = Arc::new(Semaphore::new(concurrency));
        let mut units = JoinSet::new();

        for image in images {
            let unit = Unit {
                probe: Arc::clone(&self.probe),
                corrector: Arc::clone(&self.corrector),
                tally: Arc::clone(&tally),
                dry_run: options.dry_run,
            };
            let permits = Arc::clone(&permits);

            units.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                unit.check(image).await;
            });
        }

        while let Some(joined) = units.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Reconcile unit did not complete");
            }
        }

        let mut result = tally.lock().await.clone();
        result.checked = listed as u64;
        result.next_cursor = next_cursor;

        info!(
            checked = result.checked,
            missing_original = result.missing_original,
            missing_staged = result.missing_staged,
            updated = result.updated,
            dry_run = result.dry_run,
            "Reconciliation pass finished"
        );

        Ok(result)
    }
}

/// Per-row work, holding only shared handles
struct Unit {
    probe: Arc<dyn ObjectProbe>,
    corrector: Arc<dyn ImageCorrector>,
    tally: Arc<Mutex<ReconcileResult>>,
    dry_run: bool,
}

impl Unit {
    async fn check(&self, image: Image) {
        let original_missing = !self.object_present(&image.original_url).await;

        let staged_missing = match image.staged_url.as_deref() {
            Some(url) if image.expects_staged_object() => !self.object_present(url).await,
            _ => false,
        };

        let message = if original_missing {
            Some(ORIGINAL_MISSING)
        } else if staged_missing {
            Some(STAGED_MISSING)
        } else {
            None
        };

        {
            let mut tally = self.tally.lock().await;
            if original_missing {
                tally.missing_original += 1;
            }
            if staged_missing {
                tally.missing_staged += 1;
            }
            if let Some(message) = message {
                tally.record_example(ReconcileExample {
                    image_id: image.id,
                    status: image.status,
                    error: message.to_string(),
                });
            }
        }

        let Some(message) = message else {
            return;
        };

        if self.dry_run {
            debug!(image_id = %image.id, reason = message, "Dry run, skipping correction");
            return;
        }

        match self.corrector.mark_error(image.id, message).await {
            Ok(()) => {
                self.tally.lock().await.updated += 1;
            },
            Err(e) => {
                warn!(image_id = %image.id, error = %e, "Failed to apply corrective status");
            },
        }
    }

    /// `false` whenever presence cannot be confirmed
    async fn object_present(&self, url: &str) -> bool {
        let key = match extract_key(url) {
            Ok(key) => key,
            Err(e) => {
                debug!(url, error = %e, "Cannot derive storage key");
                return false;
            },
        };

        match self.probe.object_exists(&key).await {
            Ok(found) => found,
            Err(e) => {
                debug!(key = %key, error = %e, "Existence probe failed");
                false
            },
        }
    }
}
