use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use validator::Validate;

use crate::error::Result;
use crate::schemas::{NotifySettingsForm, NotifySettingsResponse, NotifyUpdateResponse};
use crate::state::AppState;

pub fn notify_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/admin/notify", get(get_settings).post(update_settings))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/admin/notify",
    tag = "Admin",
    responses((status = 200, body = NotifySettingsResponse))
)]
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<NotifySettingsResponse>> {
    Ok(Json(state.notify.current().await?))
}

/// Apply the notification settings form.
///
/// Turning the service on tests the mail server first; a failed test leaves
/// the service stopped and answers 422.
#[utoipa::path(
    post,
    path = "/api/admin/notify",
    tag = "Admin",
    request_body = NotifySettingsForm,
    responses(
        (status = 200, body = NotifyUpdateResponse),
        (status = 422, body = NotifyUpdateResponse, description = "Mail server test failed")
    )
)]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(form): Json<NotifySettingsForm>,
) -> Result<(StatusCode, Json<NotifyUpdateResponse>)> {
    form.validate()?;

    let outcome = state.notify.apply(&form).await?;
    let status = if outcome.is_failure() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(NotifyUpdateResponse {
            outcome,
            message: outcome.message().to_string(),
            settings: state.notify.current().await?,
        }),
    ))
}
