//! Feature modules exposed over HTTP
//!
//! # Features
//!
//! - **reconcile**: admin-triggered storage reconciliation
//! - **jobs**: status callbacks from the staging worker
//!
//! Each feature owns its types, service logic and `routes.rs`.

pub mod jobs;
pub mod reconcile;

use axum::Router;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::ReconcileConfig;
use crate::jobs::StagingWorker;
use jobs::JobsState;
use reconcile::{ReconcileState, Reconciler};

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub reconciler: Arc<Reconciler>,
    pub reconcile: ReconcileConfig,
    pub worker: StagingWorker,
    pub shutdown: CancellationToken,
}

/// Creates the API router with all feature routes mounted
///
/// - `/admin/reconcile/images` - storage reconciliation
/// - `/jobs/:job_id/status` - staging job transitions
pub fn router(state: FeatureState) -> Router<()> {
    let reconcile_state = ReconcileState {
        reconciler: state.reconciler,
        settings: state.reconcile,
    };
    let jobs_state = JobsState {
        worker: state.worker,
        shutdown: state.shutdown,
    };

    Router::new()
        .nest(
            "/admin",
            reconcile::reconcile_routes().with_state(reconcile_state),
        )
        .nest("/jobs", jobs::job_routes().with_state(jobs_state))
}
