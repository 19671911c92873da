use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::{validate_password, validate_username};
use crate::models::{role, user};

/// Role assignable through the admin portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Admin,
    User,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => role::ADMIN,
            RoleName::User => role::STANDARD,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateUser {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(email, length(max = 70))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[serde(default = "default_true")]
    pub access_granted: bool,
    #[serde(default)]
    pub pass_change_req: bool,
    pub role: RoleName,
}

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateUser {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(email, length(max = 70))]
    pub email: String,
    /// Left unchanged when absent or blank
    #[serde(default)]
    #[validate(custom(function = "validate_optional_password"))]
    pub password: Option<String>,
    /// Set the configured default password and force a change on next login
    #[serde(default)]
    pub reset_password: bool,
    pub access_granted: bool,
    pub pass_change_req: bool,
    pub role: RoleName,
}

fn default_true() -> bool {
    true
}

fn validate_optional_password(password: &str) -> Result<(), validator::ValidationError> {
    if password.is_empty() {
        Ok(())
    } else {
        validate_password(password)
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub access_granted: bool,
    pub failed_login_attempts: i32,
    pub pass_change_req: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub creation_date: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_user(user: user::Model, role_name: &str) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: role_name.to_string(),
            access_granted: user.access_granted,
            failed_login_attempts: user.failed_login_attempts,
            pass_change_req: user.pass_change_req,
            last_seen: user.last_seen,
            creation_date: user.creation_date,
        }
    }
}

/// Standard user selectable as an event recipient
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct NotifiableUser {
    pub id: i64,
    pub username: String,
}

impl From<user::Model> for NotifiableUser {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}
