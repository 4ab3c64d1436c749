//! Vertex AI Search client (Discovery Engine `servingConfigs/{id}:search`).

use crate::search::{SearchBackend, SearchError, SearchResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Client for one Discovery Engine data store.
#[derive(Clone)]
pub struct DiscoveryClient {
    base_url: String,
    project: String,
    location: String,
    data_store: String,
    serving_config: String,
    page_size: u32,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl DiscoveryClient {
    pub fn new(
        base_url: impl Into<String>,
        project: impl Into<String>,
        location: impl Into<String>,
        data_store: impl Into<String>,
        serving_config: impl Into<String>,
        page_size: u32,
        access_token: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project: project.into(),
            location: location.into(),
            data_store: data_store.into(),
            serving_config: serving_config.into(),
            page_size,
            access_token,
            client: reqwest::Client::new(),
        }
    }

    fn search_url(&self) -> String {
        format!(
            "{}/projects/{}/locations/{}/collections/default_collection/dataStores/{}/servingConfigs/{}:search",
            self.base_url, self.project, self.location, self.data_store, self.serving_config
        )
    }
}

#[async_trait]
impl SearchBackend for DiscoveryClient {
    /// POST :search for one page of results, with snippets and one extractive answer each.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let url = self.search_url();
        let body = SearchRequest {
            query,
            page_size: self.page_size,
            content_search_spec: ContentSearchSpec {
                snippet_spec: SnippetSpec {
                    return_snippet: true,
                },
                extractive_content_spec: ExtractiveContentSpec {
                    max_extractive_answer_count: 1,
                },
            },
        };
        let mut req = self.client.post(&url).json(&body);
        if let Some(ref token) = self.access_token {
            req = req.bearer_auth(token);
        }
        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SearchError::Api(format!("{} {}", status, body)));
        }
        let data: SearchResponse = res.json().await?;
        let results: Vec<SearchResult> = data
            .results
            .into_iter()
            .map(|r| SearchResult::from(r.document.derived_struct_data))
            .collect();
        log::debug!("search returned {} result(s)", results.len());
        Ok(results)
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    page_size: u32,
    content_search_spec: ContentSearchSpec,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentSearchSpec {
    snippet_spec: SnippetSpec,
    extractive_content_spec: ExtractiveContentSpec,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SnippetSpec {
    return_snippet: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractiveContentSpec {
    max_extractive_answer_count: u32,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResponseResult>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponseResult {
    #[serde(default)]
    document: SearchDocument,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchDocument {
    #[serde(default)]
    derived_struct_data: DerivedStructData,
}

/// Unstructured-document fields; Discovery Engine uses snake_case inside derivedStructData.
#[derive(Debug, Default, Deserialize)]
struct DerivedStructData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippets: Vec<SnippetItem>,
    #[serde(default)]
    extractive_answers: Vec<ExtractiveAnswer>,
}

#[derive(Debug, Default, Deserialize)]
struct SnippetItem {
    #[serde(default)]
    snippet: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtractiveAnswer {
    #[serde(default)]
    content: Option<String>,
}

impl From<DerivedStructData> for SearchResult {
    fn from(d: DerivedStructData) -> Self {
        Self {
            title: d.title,
            snippet: d.snippets.into_iter().find_map(|s| s.snippet),
            link: d.link,
            long_snippet: d.extractive_answers.into_iter().find_map(|a| a.content),
        }
    }
}
