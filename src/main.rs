//! Taskdeck server binary.
//!
//! Wires configuration, the JWT verifier, the PostgreSQL repository, and
//! the MCP router together, then serves until shutdown.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use taskdeck::adapters::auth::{JwtVerifier, JwtVerifierConfig, KeySource};
use taskdeck::adapters::mcp::{mcp_router, McpServerState};
use taskdeck::adapters::postgres::PostgresTaskRepository;
use taskdeck::config::AppConfig;
use taskdeck::ports::{TaskRepository, TokenVerifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(&config.server.log_level))
        .init();

    tracing::info!(environment = ?config.server.environment, "Starting taskdeck");

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let key_source = match (&config.auth.verification_key_pem, &config.auth.jwks_url) {
        (Some(pem), None) => KeySource::RsaPem(pem.clone()),
        (None, Some(url)) => KeySource::JwksUrl(url.clone()),
        // validate() guarantees exactly one source.
        _ => return Err("auth configuration requires exactly one key source".into()),
    };

    let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier::new(JwtVerifierConfig {
        issuer: config.auth.issuer.clone(),
        audience: config.auth.audience.clone(),
        key_source,
        jwks_cache_ttl: Some(config.auth.jwks_cache_ttl()),
    })?);

    let repository: Arc<dyn TaskRepository> = Arc::new(PostgresTaskRepository::new(pool.clone()));
    let state = McpServerState::new(verifier, repository, config.mcp.call_deadline());

    let app = Router::new()
        .route("/health", get(health))
        .with_state(pool)
        .merge(mcp_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Liveness probe; checks database connectivity.
async fn health(State(pool): State<PgPool>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unavailable" })),
            )
        }
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install ctrl-c handler");
    tracing::info!("Shutdown signal received");
}
