use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use validator::Validate;

use crate::application::logging::ADMIN;
use crate::config::CONFIG;
use crate::endpoints::{fetch_page, role_names};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::prelude::*;
use crate::models::{event, event_recipient, role, user};
use crate::schemas::{CreateUser, Page, PageQuery, RoleName, UpdateUser, UserResponse};
use crate::services::account;
use crate::services::security::hash_password;
use crate::state::AppState;

pub const USERS_PER_PAGE: u64 = 10;

pub fn admin_users_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/admin/users", get(list_users).post(create_user))
        .route(
            "/api/admin/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .with_state(state)
}

// ============================================================================
// Helpers
// ============================================================================

async fn role_id(db: &DatabaseConnection, name: RoleName) -> Result<i64> {
    Role::find()
        .filter(role::Column::Name.eq(name.as_str()))
        .one(db)
        .await?
        .map(|r| r.id)
        .ok_or_else(|| AppError::Internal(format!("Role '{}' is missing", name.as_str())))
}

/// Reject a username or email already used by another account
async fn ensure_unique(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    except: Option<i64>,
) -> Result<()> {
    let mut select = User::find().filter(
        user::Column::Username
            .eq(username)
            .or(user::Column::Email.eq(email)),
    );
    if let Some(id) = except {
        select = select.filter(user::Column::Id.ne(id));
    }

    match select.one(db).await? {
        Some(other) if other.username == username => Err(AppError::Conflict(
            "That username is taken. Please choose a different one!".to_string(),
        )),
        Some(_) => Err(AppError::Conflict(
            "That email is taken. Please choose a different one!".to_string(),
        )),
        None => Ok(()),
    }
}

async fn find_user(db: &DatabaseConnection, id: i64) -> Result<user::Model> {
    User::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
}

async fn respond(db: &DatabaseConnection, found: user::Model) -> Result<Json<UserResponse>> {
    let names = role_names(db).await?;
    let role = names.get(&found.role_id).cloned().unwrap_or_default();
    Ok(Json(UserResponse::from_user(found, &role)))
}

// ============================================================================
// Endpoints
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    params(PageQuery),
    responses((status = 200, body = Page<UserResponse>))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<UserResponse>>> {
    let select = User::find().order_by_asc(user::Column::Username);
    let (users, total) = fetch_page(&state.db, select, query.page, USERS_PER_PAGE).await?;
    let names = role_names(&state.db).await?;

    let items = users
        .into_iter()
        .map(|u| {
            let role = names.get(&u.role_id).cloned().unwrap_or_default();
            UserResponse::from_user(u, &role)
        })
        .collect();
    Ok(Json(Page::new(items, query.page, USERS_PER_PAGE, total)))
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "Admin",
    request_body = CreateUser,
    responses(
        (status = 201, body = UserResponse),
        (status = 409, description = "Username or email taken")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreateUser>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    request.validate()?;
    let username = request.username.trim();
    let email = request.email.trim().to_lowercase();
    ensure_unique(&state.db, username, &email, None).await?;

    let created = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email),
        password_hash: Set(hash_password(&request.password)?),
        access_granted: Set(request.access_granted),
        failed_login_attempts: Set(0),
        pass_change_req: Set(request.pass_change_req),
        role_id: Set(role_id(&state.db, request.role).await?),
        last_seen: Set(None),
        creation_date: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(
        target: ADMIN,
        "User \"{}\" created by admin \"{}\"",
        created.username,
        current.user.username
    );
    let response = respond(&state.db, created).await?;
    Ok((StatusCode::CREATED, response))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    params(("id" = i64, Path, description = "User id")),
    responses((status = 200, body = UserResponse), (status = 404, description = "User not found"))
)]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<UserResponse>> {
    let found = find_user(&state.db, id).await?;
    respond(&state.db, found).await
}

/// Edit an account. Granting access clears the failed-attempt counter.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUser,
    responses(
        (status = 200, body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username or email taken")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUser>,
) -> Result<Json<UserResponse>> {
    request.validate()?;

    let existing = find_user(&state.db, id).await?;
    let username = request.username.trim();
    let email = request.email.trim().to_lowercase();
    ensure_unique(&state.db, username, &email, Some(id)).await?;

    let attempts =
        account::attempts_after_admin_edit(request.access_granted, existing.failed_login_attempts);
    let mut active: user::ActiveModel = existing.into();
    active.username = Set(username.to_string());
    active.email = Set(email);
    active.access_granted = Set(request.access_granted);
    active.failed_login_attempts = Set(attempts);
    active.pass_change_req = Set(request.pass_change_req);
    active.role_id = Set(role_id(&state.db, request.role).await?);

    if request.reset_password {
        let default = CONFIG.auth.user_default_password.as_deref().ok_or_else(|| {
            AppError::BadRequest("No default password is configured".to_string())
        })?;
        active.password_hash = Set(hash_password(default)?);
        active.pass_change_req = Set(true);
    } else if let Some(password) = request.password.as_deref().filter(|p| !p.is_empty()) {
        active.password_hash = Set(hash_password(password)?);
    }

    let updated = active.update(&state.db).await?;
    tracing::info!(
        target: ADMIN,
        "User \"{}\" updated by admin \"{}\"",
        updated.username,
        current.user.username
    );
    respond(&state.db, updated).await
}

/// Delete another account together with the events it authored.
///
/// Admins cannot delete themselves.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Attempt to delete own account"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    if id == current.user.id {
        return Err(AppError::BadRequest("You cannot delete your own account!".to_string()));
    }
    let existing = find_user(&state.db, id).await?;

    let authored: Vec<i64> = Event::find()
        .filter(event::Column::AuthorId.eq(id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|e| e.id)
        .collect();

    EventRecipient::delete_many()
        .filter(
            sea_orm::Condition::any()
                .add(event_recipient::Column::UserId.eq(id))
                .add(event_recipient::Column::EventId.is_in(authored.iter().copied())),
        )
        .exec(&state.db)
        .await?;
    Event::delete_many()
        .filter(event::Column::AuthorId.eq(id))
        .exec(&state.db)
        .await?;
    for event_id in &authored {
        state.search.delete_event(*event_id).await;
    }
    User::delete_by_id(id).exec(&state.db).await?;

    tracing::info!(
        target: ADMIN,
        "User \"{}\" deleted by admin \"{}\"",
        existing.username,
        current.user.username
    );
    Ok(StatusCode::NO_CONTENT)
}
