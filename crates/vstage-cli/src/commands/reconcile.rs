//! `vstage-reconcile` command implementation

use colored::Colorize;
use std::sync::Arc;
use vstage_server::{
    config::Config,
    db::{self, images::PgImageStore},
    features::reconcile::{ReconcileOptions, ReconcileResult, Reconciler},
    storage::{config::StorageConfig, Storage},
};

use crate::error::{CliError, Result};

/// Run one reconciliation pass and print its outcome
pub async fn run(options: ReconcileOptions) -> Result<ReconcileResult> {
    // Reject bad filters before connecting to anything
    options.to_filter()?;

    let config = Config::load().map_err(|e| CliError::config(format!("{:#}", e)))?;

    let pool = db::create_pool(&config.database).await?;

    let storage_config = StorageConfig::from_env().map_err(|e| CliError::config(e.to_string()))?;
    let storage = Storage::new(storage_config)
        .await
        .map_err(|e| CliError::Storage(format!("{:#}", e)))?;

    let store = Arc::new(PgImageStore::new(pool));
    let reconciler = Reconciler::new(store.clone(), Arc::new(storage), store);

    tracing::info!(
        limit = options.effective_limit(),
        concurrency = options.effective_concurrency(),
        dry_run = options.dry_run,
        "Starting reconciliation"
    );

    let result = reconciler.reconcile(options).await?;

    println!("{}", "Reconciliation Summary:".cyan().bold());
    print!("{}", format_summary(&result));

    if json_output_enabled(std::env::var("JSON_OUTPUT").ok().as_deref()) {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(result)
}

/// Human-readable report, one field per line
pub fn format_summary(result: &ReconcileResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("  Checked:          {}\n", result.checked));
    out.push_str(&format!("  Missing original: {}\n", result.missing_original));
    out.push_str(&format!("  Missing staged:   {}\n", result.missing_staged));
    out.push_str(&format!("  Updated:          {}\n", result.updated));
    out.push_str(&format!("  Dry run:          {}\n", result.dry_run));

    if let Some(cursor) = &result.next_cursor {
        out.push_str(&format!("  Next cursor:      {}\n", cursor));
    }

    if !result.examples.is_empty() {
        out.push_str("\nExamples:\n");
        for example in &result.examples {
            out.push_str(&format!(
                "  {} [{}] {}\n",
                example.image_id, example.status, example.error
            ));
        }
    }

    out
}

/// `JSON_OUTPUT=1` (or `true`) turns on the JSON dump
pub fn json_output_enabled(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1") | Some("true"))
}
