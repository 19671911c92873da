use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use validator::Validate;

use crate::application::logging::MAIN;
use crate::endpoints::{fetch_page, signed_in, SEARCH_UNAVAILABLE};
use crate::error::{AppError, Result};
use crate::middleware::{optional_session, CurrentUser};
use crate::models::event;
use crate::models::prelude::*;
use crate::schemas::{
    CalendarEntry, CalendarQuery, EventInput, EventListMode, EventListQuery, EventResponse,
    NotifiableUser, Page, SearchQuery,
};
use crate::services::event_store;
use crate::services::search::EVENT_INDEX;
use crate::state::AppState;

pub const EVENTS_PER_PAGE: u64 = 10;
pub const SEARCH_RESULTS_PER_PAGE: u64 = 3;

/// Create event routes: public reads plus author actions
pub fn events_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/events",
            get(list_events)
                .route_layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    optional_session,
                ))
                .merge(signed_in(&state, post(create_event))),
        )
        .route("/api/events/calendar", get(calendar))
        .route("/api/events/search", get(search_events))
        .route("/api/events/{id}", signed_in(&state, get(get_event).put(update_event)))
        .route("/api/events/{id}/deactivate", signed_in(&state, post(deactivate_event)))
        .with_state(state)
}

// ============================================================================
// Helpers
// ============================================================================

/// Attach recipients to a batch of events
pub(crate) async fn with_recipients(
    db: &DatabaseConnection,
    events: Vec<event::Model>,
    now: DateTime<Utc>,
) -> Result<Vec<EventResponse>> {
    let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
    let mut recipients = event_store::recipients_for(db, &ids).await?;

    Ok(events
        .into_iter()
        .map(|event| {
            let users = recipients
                .remove(&event.id)
                .unwrap_or_default()
                .into_iter()
                .map(NotifiableUser::from)
                .collect();
            EventResponse::new(event, users, now)
        })
        .collect())
}

async fn find_event(db: &DatabaseConnection, id: i64) -> Result<event::Model> {
    Event::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
}

/// Authors and admins may change an event
fn ensure_can_edit(current: &CurrentUser, event: &event::Model) -> Result<()> {
    if current.is_admin() || event.author_id == current.user.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the author can change this event".to_string(),
        ))
    }
}

// ============================================================================
// Public Endpoints
// ============================================================================

/// Active events overlapping the requested window, coloured by timing
#[utoipa::path(
    get,
    path = "/api/events/calendar",
    tag = "Events",
    params(CalendarQuery),
    responses((status = 200, body = Vec<CalendarEntry>))
)]
pub async fn calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<CalendarEntry>>> {
    let now = Utc::now();
    let events = Event::find()
        .filter(event::Column::IsActive.eq(true))
        .filter(event::Column::TimeEventStart.lte(query.end))
        .filter(event::Column::TimeEventStop.gte(query.start))
        .order_by_asc(event::Column::TimeEventStart)
        .all(&state.db)
        .await?;

    Ok(Json(
        events
            .into_iter()
            .map(|e| CalendarEntry::new(e, now))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/events",
    tag = "Events",
    params(EventListQuery),
    responses(
        (status = 200, body = Page<EventResponse>),
        (status = 401, description = "`own` listing without a session")
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    current: Option<Extension<CurrentUser>>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<Page<EventResponse>>> {
    let now = Utc::now();
    let mut select = Event::find().filter(event::Column::IsActive.eq(true));

    select = match query.list {
        EventListMode::All => select,
        EventListMode::Current => select.filter(event_store::current_condition(now)),
        EventListMode::Own => {
            let Some(Extension(current)) = current else {
                return Err(AppError::Unauthorized(
                    "Please log in to access this page.".to_string(),
                ));
            };
            select
                .filter(event_store::current_condition(now))
                .filter(event::Column::AuthorId.eq(current.user.id))
        }
        EventListMode::Author => {
            let author_id = query
                .id
                .ok_or_else(|| AppError::BadRequest("Author id is required".to_string()))?;
            select
                .filter(event_store::current_condition(now))
                .filter(event::Column::AuthorId.eq(author_id))
        }
    };

    let select = select.order_by_asc(event::Column::TimeEventStart);
    let (events, total) = fetch_page(&state.db, select, query.page, EVENTS_PER_PAGE).await?;
    let items = with_recipients(&state.db, events, now).await?;

    Ok(Json(Page::new(items, query.page, EVENTS_PER_PAGE, total)))
}

/// Full-text search over active events
#[utoipa::path(
    get,
    path = "/api/events/search",
    tag = "Events",
    params(SearchQuery),
    responses(
        (status = 200, body = Page<EventResponse>),
        (status = 503, description = "Search engine unreachable")
    )
)]
pub async fn search_events(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Page<EventResponse>>> {
    if !state.search.ping().await {
        return Err(AppError::ServiceUnavailable(SEARCH_UNAVAILABLE.to_string()));
    }

    let hits = state
        .search
        .search(
            EVENT_INDEX,
            &query.q,
            Some(serde_json::json!({ "is_active": true })),
            query.page,
            SEARCH_RESULTS_PER_PAGE,
        )
        .await;

    let events = load_in_order(&state.db, &hits.ids, true).await?;
    let items = with_recipients(&state.db, events, Utc::now()).await?;
    Ok(Json(Page::new(items, query.page, SEARCH_RESULTS_PER_PAGE, hits.total)))
}

/// Load events by id keeping the order of `ids`
pub(crate) async fn load_in_order(
    db: &DatabaseConnection,
    ids: &[i64],
    active_only: bool,
) -> Result<Vec<event::Model>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut select = Event::find().filter(event::Column::Id.is_in(ids.iter().copied()));
    if active_only {
        select = select.filter(event::Column::IsActive.eq(true));
    }
    let mut found = select.all(db).await?;
    found.sort_by_key(|e| ids.iter().position(|id| *id == e.id));
    Ok(found)
}

// ============================================================================
// Author Endpoints
// ============================================================================

#[utoipa::path(
    post,
    path = "/api/events",
    tag = "Events",
    request_body = EventInput,
    responses((status = 201, body = EventResponse), (status = 422, description = "Invalid event"))
)]
pub async fn create_event(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<EventInput>,
) -> Result<(StatusCode, Json<EventResponse>)> {
    input.validate()?;

    let now = Utc::now();
    let created = event_store::create_event(&state.db, current.user.id, &input, now).await?;
    state.search.index_event(&created).await;
    tracing::info!(
        target: MAIN,
        "Event \"{}\" (id {}) created by \"{}\"",
        created.title,
        created.id,
        current.user.username
    );

    let response = with_recipients(&state.db, vec![created], now)
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("Created event vanished".to_string()))?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    tag = "Events",
    params(("id" = i64, Path, description = "Event id")),
    responses((status = 200, body = EventResponse), (status = 404, description = "Event not found"))
)]
pub async fn get_event(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<EventResponse>> {
    let event = find_event(&state.db, id).await?;
    if !event.is_active && !current.is_admin() {
        return Err(AppError::NotFound(format!("Event {} not found", id)));
    }

    let response = with_recipients(&state.db, vec![event], Utc::now())
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;
    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/events/{id}",
    tag = "Events",
    params(("id" = i64, Path, description = "Event id")),
    request_body = EventInput,
    responses((status = 200, body = EventResponse), (status = 403, description = "Not the author"), (status = 404, description = "Event not found"))
)]
pub async fn update_event(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(input): Json<EventInput>,
) -> Result<Json<EventResponse>> {
    input.validate()?;

    let existing = find_event(&state.db, id).await?;
    if !existing.is_active {
        return Err(AppError::NotFound(format!("Event {} not found", id)));
    }
    ensure_can_edit(&current, &existing)?;

    let updated = event_store::update_event(&state.db, existing, &input, None).await?;
    state.search.index_event(&updated).await;
    tracing::info!(
        target: MAIN,
        "Event \"{}\" (id {}) updated by \"{}\"",
        updated.title,
        updated.id,
        current.user.username
    );

    let response = with_recipients(&state.db, vec![updated], Utc::now())
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;
    Ok(Json(response))
}

/// Soft-delete an event
#[utoipa::path(
    post,
    path = "/api/events/{id}/deactivate",
    tag = "Events",
    params(("id" = i64, Path, description = "Event id")),
    responses((status = 204, description = "Event deactivated"), (status = 403, description = "Not the author"), (status = 404, description = "Event not found"))
)]
pub async fn deactivate_event(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let existing = find_event(&state.db, id).await?;
    ensure_can_edit(&current, &existing)?;

    let mut active: event::ActiveModel = existing.into();
    active.is_active = Set(false);
    let updated = active.update(&state.db).await?;
    state.search.index_event(&updated).await;

    tracing::info!(
        target: MAIN,
        "Event \"{}\" (id {}) deactivated by \"{}\"",
        updated.title,
        updated.id,
        current.user.username
    );
    Ok(StatusCode::NO_CONTENT)
}
