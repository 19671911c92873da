use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub details: Option<String>,
    pub time_creation: DateTimeUtc,
    pub all_day_event: bool,
    pub time_event_start: DateTimeUtc,
    pub time_event_stop: DateTimeUtc,
    pub to_notify: bool,
    pub time_notify: Option<DateTimeUtc>,
    pub notification_sent: bool,
    /// Soft-delete flag
    pub is_active: bool,
    pub author_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
    #[sea_orm(has_many = "super::event_recipient::Entity")]
    Recipients,
}

/// Users notified about the event, through `user_to_event`
impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        super::event_recipient::Relation::User.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::event_recipient::Relation::Event.def().rev())
    }
}

impl Related<super::event_recipient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Where an event sits relative to a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Timing {
    Upcoming,
    Ongoing,
    Past,
}

impl Timing {
    /// Calendar colour used by the frontend
    pub fn colour(self) -> &'static str {
        match self {
            Timing::Upcoming => "blue",
            Timing::Ongoing => "green",
            Timing::Past => "red",
        }
    }
}

impl Model {
    /// Eligible for the notification sweep at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.to_notify
            && self.is_active
            && !self.notification_sent
            && self.time_notify.is_some_and(|t| t <= now)
    }

    pub fn timing(&self, now: DateTime<Utc>) -> Timing {
        if self.time_event_start >= now {
            Timing::Upcoming
        } else if self.time_event_stop >= now
            || (self.all_day_event && self.time_event_stop.date_naive() == now.date_naive())
        {
            Timing::Ongoing
        } else {
            Timing::Past
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event_at(start: DateTime<Utc>, stop: DateTime<Utc>) -> Model {
        Model {
            id: 1,
            title: "Standup".to_string(),
            details: None,
            time_creation: start,
            all_day_event: false,
            time_event_start: start,
            time_event_stop: stop,
            to_notify: true,
            time_notify: Some(start - Duration::hours(1)),
            notification_sent: false,
            is_active: true,
            author_id: 1,
        }
    }

    #[test]
    fn test_null_notify_time_is_never_due() {
        let now = Utc::now();
        let mut event = event_at(now, now + Duration::hours(1));
        event.time_notify = None;
        assert!(!event.is_due(now));
    }

    #[test]
    fn test_due_exactly_at_notify_time() {
        let now = Utc::now();
        let mut event = event_at(now + Duration::hours(1), now + Duration::hours(2));
        event.time_notify = Some(now);
        assert!(event.is_due(now));
        assert!(!event.is_due(now - Duration::seconds(1)));
    }

    #[test]
    fn test_timing_colours() {
        let now = Utc::now();
        let upcoming = event_at(now + Duration::hours(1), now + Duration::hours(2));
        let ongoing = event_at(now - Duration::hours(1), now + Duration::hours(1));
        let past = event_at(now - Duration::days(3), now - Duration::days(2));

        assert_eq!(upcoming.timing(now).colour(), "blue");
        assert_eq!(ongoing.timing(now).colour(), "green");
        assert_eq!(past.timing(now).colour(), "red");
    }
}
