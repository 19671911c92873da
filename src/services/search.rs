//! Full-text search over events and logs, backed by Elasticsearch.
//!
//! The index is a best-effort mirror of the database. When the engine is not
//! configured or unreachable, reads come back empty and writes are skipped.

use std::time::Duration;

use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::prelude::*;
use crate::models::{event, log};

pub const EVENT_INDEX: &str = "event";
pub const LOG_INDEX: &str = "log";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// One page of search results, in relevance order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHits {
    pub ids: Vec<i64>,
    pub total: u64,
}

/// Version details reported by the engine's root endpoint
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct NodeInfo {
    pub version: String,
    pub build_type: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Deserialize)]
struct Hits {
    total: Total,
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Total {
    value: u64,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Clone)]
pub struct SearchService {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl SearchService {
    pub fn new(base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, base_url }
    }

    /// A service with no engine behind it
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Whether the engine answers at all
    pub async fn ping(&self) -> bool {
        let Some(base) = &self.base_url else {
            return false;
        };
        match self.client.get(base.as_str()).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Search engine ping failed");
                false
            }
        }
    }

    pub async fn node_info(&self) -> Option<NodeInfo> {
        let base = self.base_url.as_ref()?;
        let body: Value = self
            .client
            .get(base.as_str())
            .send()
            .await
            .ok()?
            .json()
            .await
            .ok()?;

        let field = |name: &str| {
            body["version"][name]
                .as_str()
                .unwrap_or("No data")
                .to_string()
        };
        Some(NodeInfo {
            version: field("number"),
            build_type: field("build_type"),
        })
    }

    /// Add or replace a document
    pub async fn index(&self, index: &str, id: i64, document: &Value) {
        let Some(base) = &self.base_url else {
            return;
        };
        let url = format!("{}/{}/_doc/{}", base, index, id);
        if let Err(e) = self
            .client
            .put(url)
            .json(document)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            tracing::debug!(index, id, error = %e, "Skipped search index update");
        }
    }

    pub async fn delete(&self, index: &str, id: i64) {
        let Some(base) = &self.base_url else {
            return;
        };
        let url = format!("{}/{}/_doc/{}", base, index, id);
        if let Err(e) = self.client.delete(url).send().await {
            tracing::debug!(index, id, error = %e, "Skipped search index delete");
        }
    }

    /// Full-text query across all fields, optionally restricted by a term filter
    pub async fn search(
        &self,
        index: &str,
        query: &str,
        filter: Option<Value>,
        page: u64,
        per_page: u64,
    ) -> SearchHits {
        let Some(base) = &self.base_url else {
            return SearchHits::default();
        };
        let url = format!("{}/{}/_search", base, index);
        let body = query_body(query, filter, page, per_page);

        let response = match self.client.post(url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(index, error = %e, "Search request failed");
                return SearchHits::default();
            }
        };

        match response.json::<SearchResponse>().await {
            Ok(parsed) => SearchHits {
                ids: parsed
                    .hits
                    .hits
                    .iter()
                    .filter_map(|h| h.id.parse().ok())
                    .collect(),
                total: parsed.hits.total.value,
            },
            Err(e) => {
                tracing::debug!(index, error = %e, "Unreadable search response");
                SearchHits::default()
            }
        }
    }

    pub async fn index_event(&self, event: &event::Model) {
        self.index(EVENT_INDEX, event.id, &event_document(event))
            .await;
    }

    pub async fn delete_event(&self, event_id: i64) {
        self.delete(EVENT_INDEX, event_id).await;
    }

    pub async fn index_log(&self, log: &log::Model) {
        self.index(LOG_INDEX, log.id, &log_document(log)).await;
    }

    /// Push every event and log row into the index; returns (events, logs)
    pub async fn reindex(&self, db: &DatabaseConnection) -> Result<(usize, usize), sea_orm::DbErr> {
        let events = Event::find().all(db).await?;
        for event in &events {
            self.index_event(event).await;
        }

        let logs = Log::find().all(db).await?;
        for log in &logs {
            self.index_log(log).await;
        }

        Ok((events.len(), logs.len()))
    }
}

fn event_document(event: &event::Model) -> Value {
    json!({
        "title": event.title,
        "details": event.details,
        "is_active": event.is_active,
    })
}

fn log_document(log: &log::Model) -> Value {
    json!({
        "log_name": log.log_name,
        "level": log.level,
        "msg": log.msg,
    })
}

/// Request body for a paged `multi_match` query
pub fn query_body(query: &str, filter: Option<Value>, page: u64, per_page: u64) -> Value {
    let multi_match = json!({ "multi_match": { "query": query, "fields": ["*"] } });
    let query = match filter {
        Some(term) => json!({ "bool": { "must": multi_match, "filter": { "term": term } } }),
        None => multi_match,
    };
    json!({
        "query": query,
        "from": page.saturating_sub(1) * per_page,
        "size": per_page,
    })
}
