//! vstage reconcile CLI
//!
//! Runs one storage reconciliation pass against the images table and prints
//! a summary. Set `JSON_OUTPUT=1` to also print the result as JSON.

pub mod commands;
pub mod error;

pub use error::{CliError, Result};

use clap::Parser;
use vstage_server::features::reconcile::ReconcileOptions;

/// Audit image rows against object storage and flag missing objects
#[derive(Parser, Debug)]
#[command(name = "vstage-reconcile")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Number of images to check in this pass
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    pub batch_size: i64,

    /// Maximum concurrent existence checks
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    pub concurrency: i64,

    /// Report findings without writing corrections
    #[arg(long)]
    pub dry_run: bool,

    /// Only check images of this project
    #[arg(long)]
    pub project_id: Option<String>,

    /// Only check images with this status
    #[arg(long)]
    pub status: Option<String>,

    /// Resume after this image id (printed as the next cursor of a full batch)
    #[arg(long)]
    pub cursor: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn to_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            project_id: self.project_id.clone(),
            status: self.status.clone(),
            cursor: self.cursor.clone(),
            limit: self.batch_size,
            dry_run: self.dry_run,
            concurrency: self.concurrency,
        }
    }
}
