//! Session guards
//!
//! Composed at route registration as `require_session` → `require_password_current`
//! → `require_admin`. Each short-circuits: 401 without a usable session, 303 to
//! the password-change flow while a change is pending, 403 for non-admins.

use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::models::prelude::*;
use crate::models::{role, user};
use crate::services::security::{decode_session_token, SESSION_COOKIE};
use crate::state::AppState;

/// Path of the password-change flow
pub const CHANGE_PASSWORD_PATH: &str = "/auth/change_pass";

/// Signed-in user stored in request extensions
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: user::Model,
    pub role: String,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == role::ADMIN
    }
}

/// Reject requests without a valid session for an enabled account
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_session_token(req.headers()) else {
        return unauthorized_response("Please log in to access this page.");
    };

    match load_session(&state, &token).await {
        Ok(current) => {
            req.extensions_mut().insert(current);
            next.run(req).await
        }
        Err(msg) => unauthorized_response(&msg),
    }
}

/// Attach the session user when there is one, without rejecting anonymous requests
pub async fn optional_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(req.headers()) {
        if let Ok(current) = load_session(&state, &token).await {
            req.extensions_mut().insert(current);
        }
    }
    next.run(req).await
}

/// Send users with a pending password change to the change flow
pub async fn require_password_current(req: Request, next: Next) -> Response {
    match req.extensions().get::<CurrentUser>() {
        Some(current) if current.user.pass_change_req => {
            Redirect::to(CHANGE_PASSWORD_PATH).into_response()
        }
        Some(_) => next.run(req).await,
        None => unauthorized_response("Please log in to access this page."),
    }
}

pub async fn require_admin(req: Request, next: Next) -> Response {
    match req.extensions().get::<CurrentUser>() {
        Some(current) if current.is_admin() => next.run(req).await,
        Some(_) => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "detail": "Admin access required" })),
        )
            .into_response(),
        None => unauthorized_response("Please log in to access this page."),
    }
}

/// Extract session token from cookie header
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let cookie_str = headers.get(COOKIE)?.to_str().ok()?;
    let prefix = format!("{}=", SESSION_COOKIE);

    cookie_str
        .split(';')
        .map(str::trim)
        .find_map(|c| c.strip_prefix(&prefix))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Decode the token, re-load the user and refresh `last_seen`
async fn load_session(state: &AppState, token: &str) -> Result<CurrentUser, String> {
    let claims = decode_session_token(token).map_err(|_| "Invalid or expired session".to_string())?;
    let user_id = claims
        .user_id()
        .map_err(|_| "Invalid session subject".to_string())?;

    let (found, found_role) = User::find_by_id(user_id)
        .find_also_related(Role)
        .one(&state.db)
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    if !found.access_granted {
        return Err("Your account has been blocked".to_string());
    }

    let mut active: user::ActiveModel = found.into();
    active.last_seen = Set(Some(Utc::now()));
    let user = active
        .update(&state.db)
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    Ok(CurrentUser {
        user,
        role: found_role.map(|r| r.name).unwrap_or_default(),
    })
}

/// Create a 401 Unauthorized JSON response
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "detail": message
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_session_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; reminder_session=abc.def.ghi; other=1"),
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_empty_session_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("reminder_session="));
        assert!(extract_session_token(&headers).is_none());
        assert!(extract_session_token(&HeaderMap::new()).is_none());
    }
}
