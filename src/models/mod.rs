pub mod event;
pub mod event_recipient;
pub mod log;
pub mod notification_config;
pub mod role;
pub mod scheduled_job;
pub mod user;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::event::{self, Entity as Event};
    pub use super::event_recipient::{self, Entity as EventRecipient};
    pub use super::log::{self, Entity as Log};
    pub use super::notification_config::{self, Entity as NotificationConfig};
    pub use super::role::{self, Entity as Role};
    pub use super::scheduled_job::{self, Entity as ScheduledJob};
    pub use super::user::{self, Entity as User};
}
