//! Search collaborator.
//!
//! [`SearchBackend`] returns ordered [`SearchResult`]s for a query; [`DiscoveryClient`]
//! implements it against Vertex AI Search (Discovery Engine).

mod discovery;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use discovery::DiscoveryClient;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("search api error: {0}")]
    Api(String),
}

/// One search hit. Absent fields are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_snippet: Option<String>,
}

impl SearchResult {
    /// True when the result carries a non-empty long snippet (substantial enough to answer from).
    pub fn has_long_snippet(&self) -> bool {
        self.long_snippet
            .as_deref()
            .is_some_and(|s| !s.is_empty())
    }
}

/// Search collaborator. An empty result list means no match, not an error.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;
}
