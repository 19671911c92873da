use axum::{extract::State, routing::get, Json, Router};

use crate::endpoints::signed_in;
use crate::error::Result;
use crate::schemas::NotifiableUser;
use crate::services::event_store;
use crate::state::AppState;

pub fn users_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/users/notifiable", signed_in(&state, get(list_notifiable)))
        .with_state(state)
}

/// Standard users that can be picked as event recipients
#[utoipa::path(
    get,
    path = "/api/users/notifiable",
    tag = "Users",
    responses((status = 200, body = Vec<NotifiableUser>))
)]
pub async fn list_notifiable(State(state): State<AppState>) -> Result<Json<Vec<NotifiableUser>>> {
    let users = event_store::notifiable_users(&state.db).await?;
    Ok(Json(users.into_iter().map(NotifiableUser::from).collect()))
}
