//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; route errors are answered by the auth crate.

use auth::{
    AnyAdapter, AuthAppState, AuthConfig, AuthSchema, DbConfig, LogResetPasswordSender,
    SessionService, app_router,
};
use axum::{
    http,
    http::{Method, header},
};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Auth configuration (secret is mandatory in production)
    let auth_config = AuthConfig::from_env()?;
    tracing::info!(config = ?auth_config, "Auth configuration loaded");

    // Database adapter
    let db_config = DbConfig::from_env();
    let adapter = AnyAdapter::from_config(db_config, AuthSchema::default());

    // Schema definition is idempotent; a failure here should not prevent startup
    match adapter.init_schema().await {
        Ok(()) => tracing::info!("Auth schema ready"),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Schema initialization failed, continuing anyway"
            );
        }
    }

    let state = AuthAppState::new(adapter, auth_config, Arc::new(LogResetPasswordSender));

    // Startup cleanup: remove expired sessions
    let sessions = SessionService::new(state.adapter.clone(), state.config.clone());
    match sessions.cleanup_expired().await {
        Ok(deleted) => {
            tracing::info!(
                sessions_deleted = deleted,
                "Auth session cleanup completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Auth session cleanup failed, continuing anyway"
            );
        }
    }

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    let db = state.adapter.clone();

    // Build router
    let app = app_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    db.close().await;
    tracing::info!("Database connection closed");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
