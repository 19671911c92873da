use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::application::logging::ADMIN;
use crate::endpoints::events::{load_in_order, with_recipients};
use crate::endpoints::SEARCH_UNAVAILABLE;
use crate::error::{AppError, Result};
use crate::models::log;
use crate::models::prelude::*;
use crate::schemas::{AdminSearchQuery, AdminSearchResults, Page, ReindexResponse, SearchEngineStatus, SearchSubject};
use crate::services::search::{EVENT_INDEX, LOG_INDEX};
use crate::state::AppState;

pub const ADMIN_SEARCH_PER_PAGE: u64 = 10;

pub fn search_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/admin/search-engine", get(engine_status))
        .route("/api/admin/search-engine/reindex", post(reindex))
        .route("/api/admin/search", get(search))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/admin/search-engine",
    tag = "Admin",
    responses((status = 200, body = SearchEngineStatus))
)]
pub async fn engine_status(State(state): State<AppState>) -> Json<SearchEngineStatus> {
    let node = state.search.node_info().await;
    Json(SearchEngineStatus {
        url: state.search.url().map(str::to_string),
        available: node.is_some(),
        node,
    })
}

/// Push every event and log record into the search engine
#[utoipa::path(
    post,
    path = "/api/admin/search-engine/reindex",
    tag = "Admin",
    responses(
        (status = 200, body = ReindexResponse),
        (status = 503, description = "Search engine unreachable")
    )
)]
pub async fn reindex(State(state): State<AppState>) -> Result<Json<ReindexResponse>> {
    if !state.search.ping().await {
        return Err(AppError::ServiceUnavailable(SEARCH_UNAVAILABLE.to_string()));
    }

    let (events, logs) = state.search.reindex(&state.db).await?;
    tracing::info!(target: ADMIN, "Search engine reindexed: {} events, {} logs", events, logs);
    Ok(Json(ReindexResponse { events, logs }))
}

/// Search events (inactive included) or log records
#[utoipa::path(
    get,
    path = "/api/admin/search",
    tag = "Admin",
    params(AdminSearchQuery),
    responses(
        (status = 200, body = AdminSearchResults),
        (status = 503, description = "Search engine unreachable")
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<AdminSearchQuery>,
) -> Result<Json<AdminSearchResults>> {
    if !state.search.ping().await {
        return Err(AppError::ServiceUnavailable(SEARCH_UNAVAILABLE.to_string()));
    }

    let results = match query.sub {
        SearchSubject::Events => {
            let hits = state
                .search
                .search(EVENT_INDEX, &query.q, None, query.page, ADMIN_SEARCH_PER_PAGE)
                .await;
            let events = load_in_order(&state.db, &hits.ids, false).await?;
            let items = with_recipients(&state.db, events, Utc::now()).await?;
            AdminSearchResults::Events(Page::new(items, query.page, ADMIN_SEARCH_PER_PAGE, hits.total))
        }
        SearchSubject::Logs => {
            let hits = state
                .search
                .search(LOG_INDEX, &query.q, None, query.page, ADMIN_SEARCH_PER_PAGE)
                .await;
            let mut logs = if hits.ids.is_empty() {
                Vec::new()
            } else {
                Log::find()
                    .filter(log::Column::Id.is_in(hits.ids.iter().copied()))
                    .all(&state.db)
                    .await?
            };
            logs.sort_by_key(|l| hits.ids.iter().position(|id| *id == l.id));
            AdminSearchResults::Logs(Page::new(logs, query.page, ADMIN_SEARCH_PER_PAGE, hits.total))
        }
    };

    Ok(Json(results))
}
