use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::common::first_page;
use super::user::NotifiableUser;
use crate::models::event::{self, Timing};

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[validate(schema(function = "validate_event_times"))]
pub struct EventInput {
    #[validate(length(min = 1, max = 40))]
    pub title: String,
    #[validate(length(max = 200))]
    pub details: Option<String>,
    #[serde(default)]
    pub all_day_event: bool,
    pub time_event_start: DateTime<Utc>,
    pub time_event_stop: DateTime<Utc>,
    #[serde(default)]
    pub to_notify: bool,
    pub time_notify: Option<DateTime<Utc>>,
    /// Recipients; replaces the current set on edit
    #[serde(default)]
    pub notified_users: Vec<i64>,
}

fn validate_event_times(input: &EventInput) -> Result<(), ValidationError> {
    if input.time_event_stop < input.time_event_start {
        return Err(ValidationError::new("time_event_stop")
            .with_message("Event cannot end before it starts".into()));
    }
    if input.to_notify && input.time_notify.is_none() {
        return Err(ValidationError::new("time_notify")
            .with_message("Notification time is required when notification is enabled".into()));
    }
    Ok(())
}

/// Admin edit form; can also reset the sent flag
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct AdminEventInput {
    #[serde(flatten)]
    #[validate(nested)]
    pub event: EventInput,
    #[serde(default)]
    pub notification_sent: bool,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct EventResponse {
    pub id: i64,
    pub title: String,
    pub details: Option<String>,
    pub time_creation: DateTime<Utc>,
    pub all_day_event: bool,
    pub time_event_start: DateTime<Utc>,
    pub time_event_stop: DateTime<Utc>,
    pub to_notify: bool,
    pub time_notify: Option<DateTime<Utc>>,
    pub notification_sent: bool,
    pub is_active: bool,
    pub author_id: i64,
    pub timing: Timing,
    pub notified_users: Vec<NotifiableUser>,
}

impl EventResponse {
    pub fn new(event: event::Model, recipients: Vec<NotifiableUser>, now: DateTime<Utc>) -> Self {
        Self {
            timing: event.timing(now),
            id: event.id,
            title: event.title,
            details: event.details,
            time_creation: event.time_creation,
            all_day_event: event.all_day_event,
            time_event_start: event.time_event_start,
            time_event_stop: event.time_event_stop,
            to_notify: event.to_notify,
            time_notify: event.time_notify,
            notification_sent: event.notification_sent,
            is_active: event.is_active,
            author_id: event.author_id,
            notified_users: recipients,
        }
    }
}

/// Entry of the calendar feed
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: i64,
    pub title: String,
    pub start: String,
    pub end: String,
    pub all_day: bool,
    pub background_color: &'static str,
    pub border_color: &'static str,
    pub extended_props: CalendarDetails,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CalendarDetails {
    pub details: Option<String>,
}

impl CalendarEntry {
    pub fn new(event: event::Model, now: DateTime<Utc>) -> Self {
        let colour = event.timing(now).colour();
        Self {
            id: event.id,
            start: event.time_event_start.to_rfc3339(),
            end: event.time_event_stop.to_rfc3339(),
            all_day: event.all_day_event,
            background_color: colour,
            border_color: colour,
            extended_props: CalendarDetails {
                details: event.details,
            },
            title: event.title,
        }
    }
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct CalendarQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Which events a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventListMode {
    /// Active events not yet finished
    #[default]
    Current,
    /// Current events authored by the caller
    Own,
    /// Every active event, past ones included
    All,
    /// Current events by the author given in `id`
    Author,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct EventListQuery {
    #[serde(default)]
    pub list: EventListMode,
    pub id: Option<i64>,
    #[serde(default = "first_page")]
    pub page: u64,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "first_page")]
    pub page: u64,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AuthorInfo {
    pub id: i64,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn input() -> EventInput {
        let start = Utc::now() + Duration::days(1);
        EventInput {
            title: "Team lunch".to_string(),
            details: None,
            all_day_event: false,
            time_event_start: start,
            time_event_stop: start + Duration::hours(1),
            to_notify: true,
            time_notify: Some(start - Duration::hours(2)),
            notified_users: vec![2, 3],
        }
    }

    #[test]
    fn test_valid_event_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_stop_before_start_is_rejected() {
        let mut event = input();
        event.time_event_stop = event.time_event_start - Duration::minutes(1);
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_notification_requires_time() {
        let mut event = input();
        event.time_notify = None;
        assert!(event.validate().is_err());

        event.to_notify = false;
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_title_length() {
        let mut event = input();
        event.title = "x".repeat(41);
        assert!(event.validate().is_err());
    }
}
