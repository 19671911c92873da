use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect};

use crate::error::Result;
use crate::models::prelude::*;
use crate::models::{event, role};
use crate::schemas::{DailyCount, DashboardResponse};
use crate::state::AppState;

/// Days covered by the event creation chart, today included
const CHART_DAYS: i64 = 31;

pub fn dashboard_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/admin/dashboard", get(dashboard))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    tag = "Admin",
    responses((status = 200, body = DashboardResponse))
)]
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>> {
    let db = &state.db;

    let users_count = User::find().count(db).await?;
    let admin_users_count = User::find()
        .inner_join(Role)
        .filter(role::Column::Name.eq(role::ADMIN))
        .count(db)
        .await?;
    let events_count = Event::find().count(db).await?;
    let events_active = Event::find()
        .filter(event::Column::IsActive.eq(true))
        .count(db)
        .await?;

    let today = Utc::now().date_naive();
    let first_day = today - Duration::days(CHART_DAYS - 1);
    let since = first_day
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or_else(Utc::now);

    let created: Vec<chrono::DateTime<Utc>> = Event::find()
        .select_only()
        .column(event::Column::TimeCreation)
        .filter(event::Column::TimeCreation.gte(since))
        .into_tuple()
        .all(db)
        .await?;

    Ok(Json(DashboardResponse {
        users_count,
        standard_users_count: users_count.saturating_sub(admin_users_count),
        admin_users_count,
        events_count,
        events_active,
        events_notactive: events_count.saturating_sub(events_active),
        events_created: daily_counts(first_day, today, &created),
        search_status: state.search.ping().await,
        notification_status: state.scheduler.is_running(),
    }))
}

/// One entry per day in `first..=last`, zero-filled
fn daily_counts(
    first: NaiveDate,
    last: NaiveDate,
    created: &[chrono::DateTime<Utc>],
) -> Vec<DailyCount> {
    let mut counts: BTreeMap<NaiveDate, u64> = first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|d| (d, 0))
        .collect();

    for time in created {
        if let Some(count) = counts.get_mut(&time.date_naive()) {
            *count += 1;
        }
    }

    counts
        .into_iter()
        .map(|(day, count)| DailyCount { day, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_daily_counts_zero_fill() {
        let first = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        let created = vec![
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 3, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 3, 23, 59, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 27, 12, 0, 0).unwrap(),
        ];

        let counts = daily_counts(first, last, &created);
        let values: Vec<u64> = counts.iter().map(|c| c.count).collect();

        assert_eq!(values, vec![1, 0, 2]);
        assert_eq!(counts[0].day, first);
    }
}
