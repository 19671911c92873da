pub mod auth;
pub mod security_headers;

pub use auth::{
    optional_session, require_admin, require_password_current, require_session, CurrentUser,
};
pub use security_headers::security_headers;
