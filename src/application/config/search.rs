use std::env;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Elasticsearch base URL; search is disabled when unset
    pub url: Option<String>,
}

impl SearchConfig {
    pub fn from_env() -> Self {
        Self {
            url: env::var("REMINDER_ELASTICSEARCH_URL")
                .or_else(|_| env::var("ELASTICSEARCH_URL"))
                .ok()
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
        }
    }
}
