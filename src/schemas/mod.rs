pub mod admin;
pub mod auth;
pub mod common;
pub mod event;
pub mod notify;
pub mod user;

pub use admin::*;
pub use auth::*;
pub use common::*;
pub use event::*;
pub use notify::*;
pub use user::*;
