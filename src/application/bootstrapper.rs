//! Application bootstrapper
//!
//! Handles all initialization and setup for the reminder service.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware as axum_middleware, Router};
use http::HeaderValue;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::application::logging::{self, MAIN};
use crate::config::CONFIG;
use crate::db;
use crate::endpoints;
use crate::middleware::security_headers;
use crate::services::bootstrap::{ensure_admin, resume_notification_job};
use crate::services::{RuntimeConfig, SearchService, SmtpMailer};
use crate::state::AppState;

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let log_rx = logging::init(&CONFIG)?;

    tracing::info!(target: MAIN, "Starting reminder v{}", CONFIG.version);

    let state = init_services().await?;
    logging::spawn_log_writer(log_rx, state.db.clone(), state.search.clone());

    init_admin(&state).await;
    init_notification_job(&state).await?;

    let app = create_app(state);
    serve(app).await
}

/// Connect the database and wire the services
async fn init_services() -> anyhow::Result<AppState> {
    let conn = db::connect().await?;
    tracing::info!("Database connection established");

    let runtime_config = RuntimeConfig::from_static(&CONFIG.mail);
    let search = SearchService::new(CONFIG.search.url.clone());
    if search.url().is_some() && !search.ping().await {
        tracing::warn!(target: MAIN, "Search engine is configured but not reachable");
    }

    Ok(AppState::new(
        conn,
        runtime_config,
        Arc::new(SmtpMailer::new()),
        search,
    ))
}

async fn init_admin(state: &AppState) {
    let Some(admin) = &CONFIG.auth.admin else {
        return;
    };
    if let Err(e) = ensure_admin(&state.db, admin).await {
        tracing::error!(target: MAIN, "Failed to create the administrator account: {}", e);
    }
}

/// Resume a persisted job when configured to; otherwise clear it so the job
/// table reflects the stopped service
async fn init_notification_job(state: &AppState) -> anyhow::Result<()> {
    if CONFIG.scheduler.resume_on_start {
        resume_notification_job(&state.scheduler, state.engine.clone()).await?;
    } else if state.scheduler.persisted_trigger().await?.is_some() {
        state.scheduler.stop().await?;
        tracing::info!(target: MAIN, "Notification service is off until an admin turns it on");
    }
    Ok(())
}

/// Create the main application router
fn create_app(state: AppState) -> Router {
    let cors = if CONFIG.server.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = CONFIG
            .server
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    endpoints::create_router(state)
        .layer(axum_middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the HTTP server
async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", CONFIG.server.host, CONFIG.server.port).parse()?;
    tracing::info!(target: MAIN, "Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
