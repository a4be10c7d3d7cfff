//! Storage reconciliation
//!
//! Audits image rows against object storage and repairs drift by forcing
//! affected rows to `error`.
//!
//! - `types.rs` - options, result and collaborator traits
//! - `reconciler.rs` - the bounded-concurrency pass
//! - `routes.rs` - admin HTTP entry point

pub mod reconciler;
pub mod routes;
pub mod types;

pub use reconciler::Reconciler;
pub use routes::{reconcile_routes, ReconcileState, MAX_HTTP_LIMIT};
pub use types::{
    ImageCorrector, ImageFilter, ImageLister, ObjectProbe, ReconcileError, ReconcileExample,
    ReconcileOptions, ReconcileResult, DEFAULT_CONCURRENCY, DEFAULT_LIMIT, MAX_EXAMPLES,
    ORIGINAL_MISSING, STAGED_MISSING,
};
