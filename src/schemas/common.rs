use serde::{Deserialize, Serialize};
use validator::ValidationError;

/// Characters accepted as the "special" class of the password policy
const PASSWORD_SPECIALS: &str = "@$!%*#?&";

/// One page of a listing
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        Self {
            items,
            page,
            per_page,
            total,
            pages: total.div_ceil(per_page.max(1)),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
        }
    }
}

/// `?page=` query parameter, 1-based
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    pub page: u64,
}

pub fn first_page() -> u64 {
    1
}

/// Sort direction for admin listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// 3–40 characters of `[A-Za-z0-9._-]`, starting and ending alphanumeric
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let chars: Vec<char> = username.chars().collect();
    let valid = (3..=40).contains(&chars.len())
        && chars.iter().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && chars.first().is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.last().is_some_and(|c| c.is_ascii_alphanumeric());

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("username").with_message(
            "Username must be 3-40 characters: letters, digits, '.', '_' or '-', starting and ending with a letter or digit".into(),
        ))
    }
}

/// 8–40 characters with at least one letter, one digit and one of `@$!%*#?&`
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    let valid = (8..=40).contains(&len)
        && allowed
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("password").with_message(
            "Password must contain minimum 8 characters, at least one letter, one number and one special character".into(),
        ))
    }
}
