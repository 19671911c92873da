//! Login and password-change state machine
//!
//! An account is ENABLED while `access_granted` is true and LOCKED otherwise.
//! Failed logins and failed current-password checks share one counter;
//! reaching [`MAX_FAILED_ATTEMPTS`] locks the account until an admin grants
//! access again.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};

use crate::application::logging::AUTH;
use crate::error::Result;
use crate::models::prelude::*;
use crate::models::user;
use crate::services::security::{hash_password, verify_password};

pub const MAX_FAILED_ATTEMPTS: i32 = 3;

pub const LOGIN_FAILED: &str = "Login Unsuccessful. Please check username and password!";
pub const PASSWORD_UNCHANGED: &str = "The new password should be different from the current one!";
pub const PASSWORD_MISMATCH: &str = "The current password does not match! Please check your password";
pub const ACCOUNT_BLOCKED: &str =
    "Password change has been unsuccessful. Your account has been blocked!";
pub const PASSWORD_CHANGED: &str = "Your password has been changed!";

#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated {
        user: user::Model,
        password_change_required: bool,
    },
    /// Unknown user, locked account or wrong password; callers must not tell these apart
    Rejected,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PasswordChangeOutcome {
    Changed,
    SameAsCurrent,
    WrongCurrent { attempts: i32 },
    /// The failed check hit the threshold; the session must end
    Locked,
}

impl PasswordChangeOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            PasswordChangeOutcome::Changed => PASSWORD_CHANGED,
            PasswordChangeOutcome::SameAsCurrent => PASSWORD_UNCHANGED,
            PasswordChangeOutcome::WrongCurrent { .. } => PASSWORD_MISMATCH,
            PasswordChangeOutcome::Locked => ACCOUNT_BLOCKED,
        }
    }
}

pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> std::result::Result<LoginOutcome, DbErr> {
    let Some(found) = User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
    else {
        tracing::info!(target: AUTH, "Login failed for unknown user \"{}\"", username);
        return Ok(LoginOutcome::Rejected);
    };

    if !found.access_granted {
        tracing::warn!(target: AUTH, "Login refused for blocked user \"{}\"", found.username);
        return Ok(LoginOutcome::Rejected);
    }

    if !verify_password(password, &found.password_hash) {
        register_failure(db, found).await?;
        return Ok(LoginOutcome::Rejected);
    }

    let password_change_required = found.pass_change_req;
    let mut active: user::ActiveModel = found.into();
    active.failed_login_attempts = Set(0);
    active.last_seen = Set(Some(Utc::now()));
    let user = active.update(db).await?;

    tracing::info!(target: AUTH, "User \"{}\" logged in", user.username);
    Ok(LoginOutcome::Authenticated {
        user,
        password_change_required,
    })
}

/// Re-verify the current password and store the new one.
///
/// Both passwords are checked against the stored hash; the new one must not
/// match it.
pub async fn change_password(
    db: &DatabaseConnection,
    account: user::Model,
    current_password: &str,
    new_password: &str,
) -> Result<PasswordChangeOutcome> {
    if !verify_password(current_password, &account.password_hash) {
        let updated = register_failure(db, account).await?;
        if updated.access_granted {
            return Ok(PasswordChangeOutcome::WrongCurrent {
                attempts: updated.failed_login_attempts,
            });
        }
        return Ok(PasswordChangeOutcome::Locked);
    }

    if verify_password(new_password, &account.password_hash) {
        return Ok(PasswordChangeOutcome::SameAsCurrent);
    }

    let username = account.username.clone();
    let mut active: user::ActiveModel = account.into();
    active.password_hash = Set(hash_password(new_password)?);
    active.pass_change_req = Set(false);
    active.failed_login_attempts = Set(0);
    active.update(db).await?;

    tracing::info!(target: AUTH, "User \"{}\" changed their password", username);
    Ok(PasswordChangeOutcome::Changed)
}

/// Count one failed check, locking the account at the threshold
async fn register_failure(
    db: &DatabaseConnection,
    account: user::Model,
) -> std::result::Result<user::Model, DbErr> {
    let attempts = account.failed_login_attempts + 1;
    let locked = attempts >= MAX_FAILED_ATTEMPTS;

    let mut active: user::ActiveModel = account.into();
    active.failed_login_attempts = Set(attempts);
    if locked {
        active.access_granted = Set(false);
    }
    let updated = active.update(db).await?;

    if locked {
        tracing::warn!(
            target: AUTH,
            "User \"{}\" has been blocked after {} failed attempts",
            updated.username,
            attempts
        );
    } else {
        tracing::info!(
            target: AUTH,
            "Failed password check for user \"{}\" ({} of {})",
            updated.username,
            attempts,
            MAX_FAILED_ATTEMPTS
        );
    }
    Ok(updated)
}

/// Failed-attempt counter to store when an admin saves an account
pub fn attempts_after_admin_edit(access_granted: bool, current: i32) -> i32 {
    if access_granted {
        0
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granting_access_resets_counter() {
        assert_eq!(attempts_after_admin_edit(true, 3), 0);
        assert_eq!(attempts_after_admin_edit(false, 3), 3);
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(PasswordChangeOutcome::Locked.message(), ACCOUNT_BLOCKED);
        assert_eq!(
            PasswordChangeOutcome::WrongCurrent { attempts: 1 }.message(),
            PASSWORD_MISMATCH
        );
    }
}
