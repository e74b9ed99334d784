//! Reference Search
//!
//! Backs the `search_references` tool with a Tavily-compatible web search API.
//! Every failure is classified so the editor can apologise and carry on
//! instead of ending the session.

use crate::tools::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.tavily.com/search";
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_RESULTS: u8 = 5;
const MAX_RESULTS_CAP: u8 = 10;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),
    #[error("Search service returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    #[error("Search timed out after {0:?}")]
    Timeout(Duration),
    #[error("Search failed: {0}")]
    Unexpected(String),
}

impl From<SearchError> for ToolError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::MissingCredential(name) => ToolError::MissingCredential(name),
            SearchError::UpstreamStatus { status, body } => ToolError::UpstreamStatus { status, body },
            SearchError::Timeout(after) => ToolError::Timeout(after),
            SearchError::Unexpected(reason) => ToolError::Unexpected(reason),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str, max_results: u8) -> Result<Vec<SearchHit>, SearchError>;
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u8,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Search client issuing a single JSON POST per query, with no retries.
pub struct HttpSearchClient {
    http: reqwest::Client,
    settings: SearchSettings,
}

impl HttpSearchClient {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn classify(&self, err: reqwest::Error) -> SearchError {
        if err.is_timeout() {
            SearchError::Timeout(self.settings.timeout)
        } else if let Some(status) = err.status() {
            SearchError::UpstreamStatus {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            SearchError::Unexpected(err.to_string())
        }
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn search(&self, query: &str, max_results: u8) -> Result<Vec<SearchHit>, SearchError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| SearchError::MissingCredential("SEARCH_API_KEY".to_string()))?;

        let timeout = self.settings.timeout;
        let body = SearchRequest {
            api_key,
            query,
            max_results: max_results.clamp(1, MAX_RESULTS_CAP),
        };
        let request = self
            .http
            .post(&self.settings.endpoint)
            .timeout(timeout)
            .json(&body)
            .send();

        let response = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| SearchError::Timeout(timeout))?
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "search service returned an error status");
            return Err(SearchError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| self.classify(e))?;
        info!(%query, hits = parsed.results.len(), "search completed");
        Ok(parsed.results)
    }
}

/// Renders hits as the short text block handed back to the model.
pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No references found.".to_string();
    }
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("{}. {} ({})\n{}", i + 1, hit.title, hit.url, hit.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
