use axum::{
    extract::{Extension, State},
    http::{header, HeaderValue, StatusCode},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use validator::Validate;

use crate::application::logging::AUTH;
use crate::config::CONFIG;
use crate::endpoints::role_name;
use crate::error::{AppError, Result};
use crate::middleware::{require_session, CurrentUser};
use crate::schemas::{ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, UserResponse};
use crate::services::account::{self, LoginOutcome, PasswordChangeOutcome, LOGIN_FAILED};
use crate::services::security::{create_session_token, SESSION_COOKIE};
use crate::state::AppState;

/// Create auth routes for session management
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route(
            "/auth/change_pass",
            post(change_password).route_layer(axum_middleware::from_fn_with_state(
                state.clone(),
                require_session,
            )),
        )
        .with_state(state)
}

// ============================================================================
// Session Cookie Helpers
// ============================================================================

fn session_cookie(token: &str) -> HeaderValue {
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, CONFIG.auth.session_ttl_secs
    );
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn clear_session_cookie() -> HeaderValue {
    let cookie = format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE);
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

// ============================================================================
// Session Management Endpoints
// ============================================================================

/// Log in with username and password; sets the session cookie
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, description = "Unknown user, wrong password or blocked account")
    )
)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Response> {
    request.validate()?;

    let (user, password_change_required) =
        match account::authenticate(&state.db, request.username.trim(), &request.password).await? {
            LoginOutcome::Authenticated {
                user,
                password_change_required,
            } => (user, password_change_required),
            LoginOutcome::Rejected => return Err(AppError::Unauthorized(LOGIN_FAILED.to_string())),
        };

    let token = create_session_token(user.id)?;
    let role = role_name(&state.db, user.role_id).await?;
    let response = LoginResponse {
        user: UserResponse::from_user(user, &role),
        password_change_required,
    };

    Ok(([(header::SET_COOKIE, session_cookie(&token))], Json(response)).into_response())
}

/// Clear the session cookie
#[utoipa::path(post, path = "/auth/logout", tag = "Auth", responses((status = 200, body = MessageResponse)))]
pub async fn logout() -> Response {
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(MessageResponse::new("You have been logged out!")),
    )
        .into_response()
}

/// Change the signed-in user's password.
///
/// Three wrong current passwords in a row block the account and end the session.
#[utoipa::path(
    post,
    path = "/auth/change_pass",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, body = MessageResponse),
        (status = 400, description = "Wrong current password or unchanged password"),
        (status = 403, description = "Account blocked")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Response> {
    request.validate()?;

    let username = current.user.username.clone();
    let outcome = account::change_password(
        &state.db,
        current.user,
        &request.current_password,
        &request.new_password,
    )
    .await?;

    match outcome {
        PasswordChangeOutcome::Changed => {
            Ok(Json(MessageResponse::new(outcome.message())).into_response())
        }
        PasswordChangeOutcome::SameAsCurrent | PasswordChangeOutcome::WrongCurrent { .. } => {
            Err(AppError::BadRequest(outcome.message().to_string()))
        }
        PasswordChangeOutcome::Locked => {
            tracing::warn!(target: AUTH, "Session of \"{}\" ended after account lock", username);
            Ok((
                StatusCode::FORBIDDEN,
                [(header::SET_COOKIE, clear_session_cookie())],
                Json(serde_json::json!({ "detail": outcome.message() })),
            )
                .into_response())
        }
    }
}
