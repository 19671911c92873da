pub mod admin_events;
pub mod admin_users;
pub mod auth;
pub mod dashboard;
pub mod events;
pub mod logs;
pub mod notify;
pub mod search;
pub mod users;

use std::collections::HashMap;

use axum::{middleware as axum_middleware, routing::MethodRouter, Json, Router};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, Select};
use serde::Serialize;
use utoipa::OpenApi;

use crate::config::CONFIG;
use crate::error::Result;
use crate::middleware::{require_admin, require_password_current, require_session};
use crate::models::prelude::*;
use crate::state::AppState;

/// Notice returned whenever the search engine cannot be reached
pub const SEARCH_UNAVAILABLE: &str = "Sorry! No connection with search engine!";

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes; event routes guard their own write methods
    let public_routes = Router::new()
        .route("/api/health", axum::routing::get(health_check))
        .route("/api/version", axum::routing::get(get_version))
        .route("/api/openapi.json", axum::routing::get(openapi_json))
        .merge(auth::auth_routes(state.clone()))
        .merge(events::events_routes(state.clone()))
        .merge(users::users_routes(state.clone()));

    public_routes.merge(admin_routes(state))
}

/// Routes under /api/admin, behind session → password-current → admin
fn admin_routes(state: AppState) -> Router {
    Router::new()
        .merge(dashboard::dashboard_routes(state.clone()))
        .merge(admin_events::admin_events_routes(state.clone()))
        .merge(admin_users::admin_users_routes(state.clone()))
        .merge(notify::notify_routes(state.clone()))
        .merge(logs::logs_routes(state.clone()))
        .merge(search::search_routes(state.clone()))
        .route_layer(axum_middleware::from_fn(require_admin))
        .route_layer(axum_middleware::from_fn(require_password_current))
        .route_layer(axum_middleware::from_fn_with_state(state, require_session))
}

/// Put a single route behind session → password-current
pub(crate) fn signed_in(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route
        .route_layer(axum_middleware::from_fn(require_password_current))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_session))
}

/// One 1-based page of `select` plus the total row count
pub(crate) async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    page: u64,
    per_page: u64,
) -> Result<(Vec<E::Model>, u64)>
where
    E: EntityTrait,
    E::Model: Sync,
{
    let paginator = select.paginate(db, per_page);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page.max(1) - 1).await?;
    Ok((items, total))
}

/// Role names keyed by id
pub(crate) async fn role_names(db: &DatabaseConnection) -> Result<HashMap<i64, String>> {
    Ok(Role::find()
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect())
}

pub(crate) async fn role_name(db: &DatabaseConnection, role_id: i64) -> Result<String> {
    Ok(role_names(db).await?.remove(&role_id).unwrap_or_default())
}

// ============================================================================
// System Endpoints
// ============================================================================

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VersionInfo {
    pub version: String,
    pub commit_hash: String,
    pub backend: &'static str,
}

/// Health check endpoint
#[utoipa::path(get, path = "/api/health", tag = "System", responses((status = 200, body = String)))]
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
#[utoipa::path(get, path = "/api/version", tag = "System", responses((status = 200, body = VersionInfo)))]
pub async fn get_version() -> Json<VersionInfo> {
    Json(VersionInfo {
        version: CONFIG.version.clone(),
        commit_hash: CONFIG.commit_hash.clone(),
        backend: "rust",
    })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Reminder API", description = "Event reminders with scheduled email notifications"),
    paths(
        health_check,
        get_version,
        auth::login,
        auth::logout,
        auth::change_password,
        events::calendar,
        events::list_events,
        events::search_events,
        events::create_event,
        events::get_event,
        events::update_event,
        events::deactivate_event,
        users::list_notifiable,
        dashboard::dashboard,
        admin_events::list_events,
        admin_events::get_event,
        admin_events::update_event,
        admin_events::delete_event,
        admin_events::toggle_active,
        admin_users::list_users,
        admin_users::create_user,
        admin_users::get_user,
        admin_users::update_user,
        admin_users::delete_user,
        notify::get_settings,
        notify::update_settings,
        logs::list_logs,
        logs::clear_logs,
        search::engine_status,
        search::reindex,
        search::search,
    ),
    tags(
        (name = "System"),
        (name = "Auth"),
        (name = "Events"),
        (name = "Users"),
        (name = "Admin")
    )
)]
pub struct ApiDoc;
