//! vstage Server - Main entry point

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;
use tracing::info;
use vstage_common::logging::{init_logging, LogConfig};

use vstage_server::{
    config::Config,
    db::{self, images::PgImageStore, status::PgStatusRepository},
    features::{self, reconcile::Reconciler},
    jobs::StagingWorker,
    middleware,
    notify::{self, Publisher},
    storage::{config::StorageConfig, Storage},
};

#[derive(Clone)]
struct AppState {
    db: sqlx::PgPool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("vstage-server".to_string())
        .filter_directives("vstage_server=debug,tower_http=debug,sqlx=warn".to_string())
        .build();
    let log_config = log_config.merge_env()?;

    init_logging(&log_config)?;

    info!("Starting vstage server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db_pool = db::create_pool(&config.database).await?;

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    info!("Database migrations completed");

    let storage = Storage::new(StorageConfig::from_env()?).await?;

    let store = Arc::new(PgImageStore::new(db_pool.clone()));
    let reconciler = Reconciler::new(store.clone(), Arc::new(storage), store);

    let pubsub = notify::connect(&config.notify).await?;
    let publisher = Publisher::new(pubsub, config.notify.retry_policy());
    let worker = StagingWorker::new(Arc::new(PgStatusRepository::new(db_pool.clone())), publisher);
    let transport = if config.notify.redis_url.is_some() { "redis" } else { "local" };
    info!(
        transport,
        max_attempts = config.notify.max_attempts,
        "Status notifications ready"
    );

    if config.reconcile.enabled {
        info!(concurrency = ?config.reconcile.concurrency, "Admin reconciliation endpoint enabled");
    } else {
        info!("Admin reconciliation endpoint disabled (RECONCILE_ENABLED!=1)");
    }

    let shutdown = CancellationToken::new();

    let state = AppState { db: db_pool };
    let feature_state = features::FeatureState {
        reconciler: Arc::new(reconciler),
        reconcile: config.reconcile.clone(),
        worker,
        shutdown: shutdown.clone(),
    };

    let app = create_router(state, feature_state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs, shutdown))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_router(state: AppState, feature_state: features::FeatureState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
        .nest("/api/v1", features::router(feature_state))
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

async fn health_check(State(state): State<AppState>) -> Result<Response, StatusCode> {
    match db::health_check(&state.db).await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}

async fn shutdown_signal(timeout_secs: u64, shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }

    shutdown.cancel();

    info!("Waiting up to {} seconds for in-flight requests", timeout_secs);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
        tracing::warn!("Shutdown timeout elapsed, exiting");
        std::process::exit(0);
    });
}
