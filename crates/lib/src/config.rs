//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.infobot/config.json`) and environment.
//! Credentials and endpoints for the Google APIs are supplied by the hosting layer; the
//! generation parameters and model ids are fixed and not configurable here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Vertex AI prediction endpoint (text and chat generation).
    #[serde(default)]
    pub vertex: VertexConfig,

    /// Vertex AI Search (Discovery Engine) data store.
    #[serde(default)]
    pub search: SearchConfig,

    /// Bearer token for Google APIs. Overridden by INFOBOT_ACCESS_TOKEN or GOOGLE_ACCESS_TOKEN env.
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Server bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for the webhook (default 8080). Overridden by PORT env.
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; the platform calls in from outside).
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

/// Vertex AI project, region and optional base URL override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexConfig {
    /// Google Cloud project id. Falls back to GOOGLE_CLOUD_PROJECT env.
    #[serde(default)]
    pub project: Option<String>,

    /// Region (default "us-central1").
    #[serde(default = "default_vertex_location")]
    pub location: String,

    /// Override the API root (default `https://{location}-aiplatform.googleapis.com/v1`).
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Vertex AI Search data store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    /// Google Cloud project id. Falls back to GOOGLE_CLOUD_PROJECT env.
    #[serde(default)]
    pub project: Option<String>,

    /// Location of the data store (default "global").
    #[serde(default = "default_search_location")]
    pub location: String,

    /// Data store id.
    #[serde(default)]
    pub data_store: String,

    /// Serving config id (default "default_search").
    #[serde(default = "default_serving_config")]
    pub serving_config: String,

    /// Maximum number of results per query (default 10).
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Override the API root (default `https://discoveryengine.googleapis.com/v1alpha`).
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_server_port() -> u16 {
    8080
}

fn default_server_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_vertex_location() -> String {
    "us-central1".to_string()
}

fn default_search_location() -> String {
    "global".to_string()
}

fn default_serving_config() -> String {
    "default_search".to_string()
}

fn default_page_size() -> u32 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            project: None,
            location: default_vertex_location(),
            base_url: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            project: None,
            location: default_search_location(),
            data_store: String::new(),
            serving_config: default_serving_config(),
            page_size: default_page_size(),
            base_url: None,
        }
    }
}

/// Non-empty trimmed value of an environment variable.
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Resolve the bearer token: env INFOBOT_ACCESS_TOKEN, then GOOGLE_ACCESS_TOKEN, then config.
pub fn resolve_access_token(config: &Config) -> Option<String> {
    env_non_empty("INFOBOT_ACCESS_TOKEN")
        .or_else(|| env_non_empty("GOOGLE_ACCESS_TOKEN"))
        .or_else(|| non_empty(config.access_token.as_ref()))
}

/// Resolve the listen port: env PORT (set by serverless hosts) overrides config.
pub fn resolve_port(config: &Config) -> u16 {
    env_non_empty("PORT")
        .and_then(|p| p.parse().ok())
        .unwrap_or(config.server.port)
}

/// Resolve the Vertex AI project: config, then GOOGLE_CLOUD_PROJECT env.
pub fn resolve_vertex_project(config: &Config) -> Option<String> {
    non_empty(config.vertex.project.as_ref()).or_else(|| env_non_empty("GOOGLE_CLOUD_PROJECT"))
}

/// Resolve the search project: config, then GOOGLE_CLOUD_PROJECT env.
pub fn resolve_search_project(config: &Config) -> Option<String> {
    non_empty(config.search.project.as_ref()).or_else(|| env_non_empty("GOOGLE_CLOUD_PROJECT"))
}

/// Vertex AI API root, with any trailing slash removed.
pub fn resolve_vertex_base_url(config: &Config) -> String {
    non_empty(config.vertex.base_url.as_ref())
        .map(|u| u.trim_end_matches('/').to_string())
        .unwrap_or_else(|| {
            format!(
                "https://{}-aiplatform.googleapis.com/v1",
                config.vertex.location.trim()
            )
        })
}

/// Discovery Engine API root, with any trailing slash removed.
pub fn resolve_search_base_url(config: &Config) -> String {
    non_empty(config.search.base_url.as_ref())
        .map(|u| u.trim_end_matches('/').to_string())
        .unwrap_or_else(|| "https://discoveryengine.googleapis.com/v1alpha".to_string())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("INFOBOT_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".infobot").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, the default path, or INFOBOT_CONFIG_PATH. Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
