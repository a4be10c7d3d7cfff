use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::reconciler::Reconciler;
use super::types::{ReconcileOptions, DEFAULT_CONCURRENCY, DEFAULT_LIMIT};
use crate::config::{parse_positive, ReconcileConfig};
use crate::error::{AppError, AppResult};

/// Largest batch accepted over HTTP
pub const MAX_HTTP_LIMIT: i64 = 1000;

/// State for the admin reconcile routes
#[derive(Clone)]
pub struct ReconcileState {
    pub reconciler: Arc<Reconciler>,
    pub settings: ReconcileConfig,
}

pub fn reconcile_routes() -> Router<ReconcileState> {
    Router::new().route("/reconcile/images", post(reconcile_images))
}

/// JSON body, every field optional
#[derive(Debug, Default, Deserialize)]
struct ReconcileBody {
    project_id: Option<String>,
    status: Option<String>,
    cursor: Option<String>,
    limit: Option<i64>,
    dry_run: Option<bool>,
}

/// Query string, kept as raw strings so bad values become a 400 with our error shape
#[derive(Debug, Default, Deserialize)]
struct ReconcileQuery {
    project_id: Option<String>,
    status: Option<String>,
    cursor: Option<String>,
    limit: Option<String>,
    dry_run: Option<String>,
    concurrency: Option<String>,
}

#[tracing::instrument(skip_all)]
async fn reconcile_images(
    State(state): State<ReconcileState>,
    query: Result<Query<ReconcileQuery>, QueryRejection>,
    body: Bytes,
) -> AppResult<Response> {
    if !state.settings.enabled {
        return Err(AppError::NotImplemented(
            "reconciliation endpoint is disabled".to_string(),
        ));
    }

    let Query(query) = query.map_err(|e| AppError::bad_request(format!("invalid query: {}", e)))?;
    let body = parse_body(&body)?;
    let options = resolve_options(body, &query, &state.settings)?;

    tracing::info!(
        project_id = ?options.project_id,
        status = ?options.status,
        limit = options.limit,
        dry_run = options.dry_run,
        concurrency = options.concurrency,
        "Admin reconciliation requested"
    );

    let result = state.reconciler.reconcile(options).await?;

    Ok((StatusCode::OK, Json(result)).into_response())
}

/// A whitespace-only body counts as no body
fn parse_body(bytes: &Bytes) -> AppResult<ReconcileBody> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ReconcileBody::default());
    }
    serde_json::from_slice(bytes).map_err(|e| AppError::bad_request(format!("invalid body: {}", e)))
}

/// Merge body and query; a non-blank query value wins field by field
fn resolve_options(
    body: ReconcileBody,
    query: &ReconcileQuery,
    settings: &ReconcileConfig,
) -> AppResult<ReconcileOptions> {
    let limit = match non_blank(&query.limit) {
        Some(raw) => Some(
            raw.trim()
                .parse::<i64>()
                .map_err(|_| AppError::bad_request(format!("invalid limit: {}", raw)))?,
        ),
        None => body.limit,
    };
    // A bare `?dry_run` is a request for a dry run
    let dry_run = match query.dry_run.as_deref() {
        Some(raw) => Some(parse_flag(raw)?),
        None => body.dry_run,
    };

    let concurrency = query
        .concurrency
        .as_deref()
        .and_then(parse_positive)
        .or(settings.concurrency)
        .unwrap_or(DEFAULT_CONCURRENCY);

    Ok(ReconcileOptions {
        project_id: non_blank(&query.project_id).or(body.project_id),
        status: non_blank(&query.status).or(body.status),
        cursor: non_blank(&query.cursor).or(body.cursor),
        limit: clamp_limit(limit.unwrap_or(0)),
        dry_run: dry_run.unwrap_or(false),
        concurrency: i64::try_from(concurrency).unwrap_or(DEFAULT_CONCURRENCY as i64),
    })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.clone().filter(|s| !s.trim().is_empty())
}

fn clamp_limit(limit: i64) -> i64 {
    if limit <= 0 {
        DEFAULT_LIMIT
    } else {
        limit.min(MAX_HTTP_LIMIT)
    }
}

fn parse_flag(raw: &str) -> AppResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "t" | "yes" => Ok(true),
        "0" | "false" | "f" | "no" => Ok(false),
        _ => Err(AppError::bad_request(format!("invalid dry_run: {}", raw))),
    }
}
