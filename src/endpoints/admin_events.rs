use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use validator::Validate;

use crate::application::logging::ADMIN;
use crate::endpoints::events::with_recipients;
use crate::endpoints::fetch_page;
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::prelude::*;
use crate::models::{event, event_recipient};
use crate::schemas::{AdminEventInput, AdminEventsQuery, EventResponse, EventSortColumn, Page, SortDir};
use crate::services::event_store;
use crate::state::AppState;

pub const ADMIN_EVENTS_PER_PAGE: u64 = 10;

pub fn admin_events_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/admin/events", get(list_events))
        .route(
            "/api/admin/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/api/admin/events/{id}/toggle-active", post(toggle_active))
        .with_state(state)
}

async fn find_event(state: &AppState, id: i64) -> Result<event::Model> {
    Event::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
}

async fn respond(state: &AppState, event: event::Model) -> Result<Json<EventResponse>> {
    let id = event.id;
    with_recipients(&state.db, vec![event], Utc::now())
        .await?
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
}

/// Every event, inactive ones included
#[utoipa::path(
    get,
    path = "/api/admin/events",
    tag = "Admin",
    params(AdminEventsQuery),
    responses((status = 200, body = Page<EventResponse>))
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<AdminEventsQuery>,
) -> Result<Json<Page<EventResponse>>> {
    let column = match query.col {
        EventSortColumn::Id => event::Column::Id,
        EventSortColumn::Start => event::Column::TimeEventStart,
        EventSortColumn::Stop => event::Column::TimeEventStop,
    };
    let select = match query.dir {
        SortDir::Asc => Event::find().order_by_asc(column),
        SortDir::Desc => Event::find().order_by_desc(column),
    };

    let (events, total) = fetch_page(&state.db, select, query.page, ADMIN_EVENTS_PER_PAGE).await?;
    let items = with_recipients(&state.db, events, Utc::now()).await?;
    Ok(Json(Page::new(items, query.page, ADMIN_EVENTS_PER_PAGE, total)))
}

#[utoipa::path(
    get,
    path = "/api/admin/events/{id}",
    tag = "Admin",
    params(("id" = i64, Path, description = "Event id")),
    responses((status = 200, body = EventResponse), (status = 404, description = "Event not found"))
)]
pub async fn get_event(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<EventResponse>> {
    let event = find_event(&state, id).await?;
    respond(&state, event).await
}

/// Edit any event; may also reset the sent flag so it is notified again
#[utoipa::path(
    put,
    path = "/api/admin/events/{id}",
    tag = "Admin",
    params(("id" = i64, Path, description = "Event id")),
    request_body = AdminEventInput,
    responses((status = 200, body = EventResponse), (status = 404, description = "Event not found"))
)]
pub async fn update_event(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(input): Json<AdminEventInput>,
) -> Result<Json<EventResponse>> {
    input.validate()?;

    let existing = find_event(&state, id).await?;
    let updated =
        event_store::update_event(&state.db, existing, &input.event, Some(input.notification_sent))
            .await?;
    state.search.index_event(&updated).await;

    tracing::info!(
        target: ADMIN,
        "Event \"{}\" (id {}) edited by admin \"{}\"",
        updated.title,
        updated.id,
        current.user.username
    );
    respond(&state, updated).await
}

/// Remove an event and its recipient links for good
#[utoipa::path(
    delete,
    path = "/api/admin/events/{id}",
    tag = "Admin",
    params(("id" = i64, Path, description = "Event id")),
    responses((status = 204, description = "Event deleted"), (status = 404, description = "Event not found"))
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let existing = find_event(&state, id).await?;

    EventRecipient::delete_many()
        .filter(event_recipient::Column::EventId.eq(id))
        .exec(&state.db)
        .await?;
    Event::delete_by_id(id).exec(&state.db).await?;
    state.search.delete_event(id).await;

    tracing::info!(
        target: ADMIN,
        "Event \"{}\" (id {}) deleted by admin \"{}\"",
        existing.title,
        id,
        current.user.username
    );
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/events/{id}/toggle-active",
    tag = "Admin",
    params(("id" = i64, Path, description = "Event id")),
    responses((status = 200, body = EventResponse), (status = 404, description = "Event not found"))
)]
pub async fn toggle_active(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<EventResponse>> {
    let existing = find_event(&state, id).await?;
    let is_active = !existing.is_active;

    let mut active: event::ActiveModel = existing.into();
    active.is_active = Set(is_active);
    let updated = active.update(&state.db).await?;
    state.search.index_event(&updated).await;

    tracing::info!(
        target: ADMIN,
        "Event \"{}\" (id {}) {} by admin \"{}\"",
        updated.title,
        updated.id,
        if is_active { "activated" } else { "deactivated" },
        current.user.username
    );
    respond(&state, updated).await
}
