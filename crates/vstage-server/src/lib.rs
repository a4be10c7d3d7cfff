//! vstage Server Library
//!
//! Image-status consistency and notification subsystem for the virtual
//! staging backend.
//!
//! # Overview
//!
//! - **Status repository** ([`db::status`]): guarded, idempotent state
//!   transitions on a single image row
//! - **Notifications** ([`notify`]): retried publication of
//!   `{"status": ...}` payloads on `jobs:image:<id>` channels
//! - **Staging worker glue** ([`jobs`]): write-then-announce for every
//!   transition a staging job makes, reachable over HTTP through
//!   [`features::jobs`]
//! - **Reconciliation** ([`features::reconcile`]): bounded-concurrency audit
//!   of image rows against object storage, with optional repair
//!
//! # Framework Stack
//!
//! - **Axum** for the admin HTTP surface
//! - **SQLx** (PostgreSQL) for the images table
//! - **aws-sdk-s3** for object existence probes
//! - **redis** (or an in-process broadcast hub) for status fan-out
//!
//! # Example
//!
//! ```no_run
//! use vstage_server::{config::Config, db, features::reconcile::{ReconcileOptions, Reconciler}};
//! use vstage_server::storage::{config::StorageConfig, Storage};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let storage = Storage::new(StorageConfig::from_env()?).await?;
//!     let store = Arc::new(db::images::PgImageStore::new(pool));
//!
//!     let reconciler = Reconciler::new(store.clone(), Arc::new(storage), store);
//!     let options = ReconcileOptions { dry_run: true, ..Default::default() };
//!     let result = reconciler.reconcile(options).await?;
//!     println!("checked {} images", result.checked);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod storage;

// Re-export commonly used types
pub use error::{AppError, AppResult};
