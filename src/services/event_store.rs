//! Event persistence helpers shared by the notification engine and the API

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::models::prelude::*;
use crate::models::{event, event_recipient, role, user};
use crate::schemas::EventInput;

/// Events the notification sweep must handle at `now`.
///
/// A NULL `time_notify` never compares true, so such events are never due.
pub async fn find_due_events(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<Vec<event::Model>, DbErr> {
    Event::find()
        .filter(event::Column::ToNotify.eq(true))
        .filter(event::Column::IsActive.eq(true))
        .filter(event::Column::NotificationSent.eq(false))
        .filter(event::Column::TimeNotify.lte(now))
        .order_by_asc(event::Column::TimeNotify)
        .all(db)
        .await
}

/// Persist `notification_sent = true` for one event
pub async fn mark_sent(db: &DatabaseConnection, event_id: i64) -> Result<(), DbErr> {
    event::ActiveModel {
        id: Set(event_id),
        notification_sent: Set(true),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(())
}

/// Users notified about `event_id`
pub async fn recipients_of(db: &DatabaseConnection, event_id: i64) -> Result<Vec<user::Model>, DbErr> {
    User::find()
        .inner_join(EventRecipient)
        .filter(event_recipient::Column::EventId.eq(event_id))
        .order_by_asc(user::Column::Username)
        .all(db)
        .await
}

/// Recipients of several events at once, keyed by event id
pub async fn recipients_for(
    db: &DatabaseConnection,
    event_ids: &[i64],
) -> Result<HashMap<i64, Vec<user::Model>>, DbErr> {
    if event_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = EventRecipient::find()
        .filter(event_recipient::Column::EventId.is_in(event_ids.iter().copied()))
        .all(db)
        .await?;

    let user_ids: Vec<i64> = links.iter().map(|l| l.user_id).collect();
    let users: HashMap<i64, user::Model> = User::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut grouped: HashMap<i64, Vec<user::Model>> = HashMap::new();
    for link in links {
        if let Some(user) = users.get(&link.user_id) {
            grouped.entry(link.event_id).or_default().push(user.clone());
        }
    }
    for recipients in grouped.values_mut() {
        recipients.sort_by(|a, b| a.username.cmp(&b.username));
    }
    Ok(grouped)
}

/// Standard users, the only ones selectable as recipients
pub async fn notifiable_users(db: &DatabaseConnection) -> Result<Vec<user::Model>, DbErr> {
    User::find()
        .inner_join(Role)
        .filter(role::Column::Name.eq(role::STANDARD))
        .order_by_asc(user::Column::Username)
        .all(db)
        .await
}

/// Replace the recipient set of an event wholesale.
///
/// Ids that do not belong to a standard user are dropped. Callers run it on
/// the transaction that writes the event row.
pub async fn replace_recipients<C: ConnectionTrait>(
    conn: &C,
    event_id: i64,
    user_ids: &[i64],
) -> Result<(), DbErr> {
    let allowed: Vec<i64> = if user_ids.is_empty() {
        Vec::new()
    } else {
        User::find()
            .inner_join(Role)
            .filter(role::Column::Name.eq(role::STANDARD))
            .filter(user::Column::Id.is_in(user_ids.iter().copied()))
            .all(conn)
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect()
    };

    EventRecipient::delete_many()
        .filter(event_recipient::Column::EventId.eq(event_id))
        .exec(conn)
        .await?;

    if !allowed.is_empty() {
        let rows = allowed.into_iter().map(|user_id| event_recipient::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(user_id),
        });
        EventRecipient::insert_many(rows).exec(conn).await?;
    }

    Ok(())
}

/// Events that have not finished yet: upcoming, ongoing, or all-day events
/// ending today
pub fn current_condition(now: DateTime<Utc>) -> Condition {
    let today = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now);

    Condition::any()
        .add(event::Column::TimeEventStart.gte(now))
        .add(event::Column::TimeEventStop.gte(now))
        .add(
            Condition::all()
                .add(event::Column::AllDayEvent.eq(true))
                .add(event::Column::TimeEventStop.gte(today)),
        )
}

/// Insert a new event and its recipients in one transaction
pub async fn create_event(
    db: &DatabaseConnection,
    author_id: i64,
    input: &EventInput,
    now: DateTime<Utc>,
) -> Result<event::Model, DbErr> {
    let txn = db.begin().await?;
    let saved = event::ActiveModel {
        title: Set(input.title.trim().to_string()),
        details: Set(normalized_details(input)),
        time_creation: Set(now),
        all_day_event: Set(input.all_day_event),
        time_event_start: Set(input.time_event_start),
        time_event_stop: Set(input.time_event_stop),
        to_notify: Set(input.to_notify),
        time_notify: Set(input.time_notify.filter(|_| input.to_notify)),
        notification_sent: Set(false),
        is_active: Set(true),
        author_id: Set(author_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_recipients(&txn, saved.id, &input.notified_users).await?;
    txn.commit().await?;
    Ok(saved)
}

/// Overwrite an event's editable fields and recipients in one transaction.
///
/// `notification_sent` is only touched when given, which only admin edits do.
pub async fn update_event(
    db: &DatabaseConnection,
    existing: event::Model,
    input: &EventInput,
    notification_sent: Option<bool>,
) -> Result<event::Model, DbErr> {
    let id = existing.id;
    let mut active: event::ActiveModel = existing.into();
    active.title = Set(input.title.trim().to_string());
    active.details = Set(normalized_details(input));
    active.all_day_event = Set(input.all_day_event);
    active.time_event_start = Set(input.time_event_start);
    active.time_event_stop = Set(input.time_event_stop);
    active.to_notify = Set(input.to_notify);
    active.time_notify = Set(input.time_notify.filter(|_| input.to_notify));
    if let Some(sent) = notification_sent {
        active.notification_sent = Set(sent);
    }
    let txn = db.begin().await?;
    let saved = active.update(&txn).await?;

    replace_recipients(&txn, id, &input.notified_users).await?;
    txn.commit().await?;
    Ok(saved)
}

fn normalized_details(input: &EventInput) -> Option<String> {
    input
        .details
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}
