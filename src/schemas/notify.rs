use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::mail::MailSecurity;
use crate::services::notify_settings::NotifyOutcome;
use crate::services::scheduler::IntervalUnit;

/// Requested state of the notification service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotifyStatus {
    On,
    Off,
}

/// Admin submission of notification settings. Blank or missing mail fields
/// leave the cached value unchanged.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct NotifySettingsForm {
    pub notify_status: NotifyStatus,
    pub notify_unit: IntervalUnit,
    #[validate(range(min = 1))]
    pub notify_interval: i32,
    #[validate(length(max = 100))]
    pub mail_server: Option<String>,
    #[validate(range(min = 1))]
    pub mail_port: Option<u16>,
    pub mail_security: Option<MailSecurity>,
    #[validate(length(max = 70))]
    pub mail_username: Option<String>,
    pub mail_password: Option<String>,
}

/// Current notification settings; the password is never returned
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct NotifySettingsResponse {
    pub service_running: bool,
    pub notify_unit: String,
    pub notify_interval: i32,
    pub mail_server: String,
    pub mail_port: String,
    pub mail_security: String,
    pub mail_username: String,
    pub mail_password_set: bool,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct NotifyUpdateResponse {
    pub outcome: NotifyOutcome,
    pub message: String,
    pub settings: NotifySettingsResponse,
}
