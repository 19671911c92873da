use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::common::{first_page, Page, SortDir};
use super::event::EventResponse;
use crate::models::log;
use crate::services::search::NodeInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventSortColumn {
    Id,
    #[default]
    Start,
    Stop,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct AdminEventsQuery {
    #[serde(default)]
    pub col: EventSortColumn,
    #[serde(default)]
    pub dir: SortDir,
    #[serde(default = "first_page")]
    pub page: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogSortColumn {
    #[default]
    Time,
    LogName,
    Level,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct LogsQuery {
    #[serde(default)]
    pub col: LogSortColumn,
    #[serde(default = "desc")]
    pub dir: SortDir,
    #[serde(default = "first_page")]
    pub page: u64,
}

fn desc() -> SortDir {
    SortDir::Desc
}

/// How much history `DELETE /api/admin/logs` keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogRange {
    All,
    Day1,
    Week1,
    Week2,
    Month1,
    Month3,
}

impl LogRange {
    /// Age in days beyond which records are removed; `None` removes everything
    pub fn keep_days(&self) -> Option<i64> {
        match self {
            LogRange::All => None,
            LogRange::Day1 => Some(1),
            LogRange::Week1 => Some(7),
            LogRange::Week2 => Some(14),
            LogRange::Month1 => Some(31),
            LogRange::Month3 => Some(90),
        }
    }
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct ClearLogsQuery {
    pub range: LogRange,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ClearLogsResponse {
    pub deleted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchSubject {
    Events,
    Logs,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct AdminSearchQuery {
    pub sub: SearchSubject,
    #[serde(default)]
    pub q: String,
    #[serde(default = "first_page")]
    pub page: u64,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SearchEngineStatus {
    pub url: Option<String>,
    pub available: bool,
    pub node: Option<NodeInfo>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ReindexResponse {
    pub events: usize,
    pub logs: usize,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DashboardResponse {
    pub users_count: u64,
    pub standard_users_count: u64,
    pub admin_users_count: u64,
    pub events_count: u64,
    pub events_active: u64,
    pub events_notactive: u64,
    /// Events created per day over the last 31 days
    pub events_created: Vec<DailyCount>,
    pub search_status: bool,
    pub notification_status: bool,
}

/// Results of an admin search, shaped by the searched collection
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(tag = "sub", content = "results", rename_all = "lowercase")]
pub enum AdminSearchResults {
    Events(Page<EventResponse>),
    Logs(Page<log::Model>),
}
