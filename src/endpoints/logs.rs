use axum::{
    extract::{Extension, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::application::logging::ADMIN;
use crate::endpoints::fetch_page;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::log;
use crate::models::prelude::*;
use crate::schemas::{ClearLogsQuery, ClearLogsResponse, LogSortColumn, LogsQuery, Page, SortDir};
use crate::state::AppState;

pub const LOGS_PER_PAGE: u64 = 12;

pub fn logs_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/admin/logs", get(list_logs).delete(clear_logs))
        .with_state(state)
}

/// Application log records, newest first by default
#[utoipa::path(
    get,
    path = "/api/admin/logs",
    tag = "Admin",
    params(LogsQuery),
    responses((status = 200, body = Page<log::Model>))
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Page<log::Model>>> {
    let column = match query.col {
        LogSortColumn::Time => log::Column::Time,
        LogSortColumn::LogName => log::Column::LogName,
        LogSortColumn::Level => log::Column::Level,
    };
    let select = match query.dir {
        SortDir::Asc => Log::find().order_by_asc(column),
        SortDir::Desc => Log::find().order_by_desc(column),
    }
    .order_by_desc(log::Column::Id);

    let (items, total) = fetch_page(&state.db, select, query.page, LOGS_PER_PAGE).await?;
    Ok(Json(Page::new(items, query.page, LOGS_PER_PAGE, total)))
}

/// Delete all records, or those older than the chosen range
#[utoipa::path(
    delete,
    path = "/api/admin/logs",
    tag = "Admin",
    params(ClearLogsQuery),
    responses((status = 200, body = ClearLogsResponse))
)]
pub async fn clear_logs(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ClearLogsQuery>,
) -> Result<Json<ClearLogsResponse>> {
    let mut delete = Log::delete_many();
    if let Some(days) = query.range.keep_days() {
        delete = delete.filter(log::Column::Time.lt(Utc::now() - Duration::days(days)));
    }
    let result = delete.exec(&state.db).await?;

    tracing::info!(
        target: ADMIN,
        "{} log records cleared by admin \"{}\"",
        result.rows_affected,
        current.user.username
    );
    Ok(Json(ClearLogsResponse {
        deleted: result.rows_affected,
    }))
}
