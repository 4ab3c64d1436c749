//! Text and chat generation backends.
//!
//! The answer producer talks to a [`GenerationBackend`]; [`VertexClient`] implements it
//! against the Vertex AI `:predict` endpoint.

mod vertex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use vertex::VertexClient;

/// Model used for single-prompt completion.
pub const TEXT_MODEL: &str = "text-bison@001";

/// Model used for multi-turn chat.
pub const CHAT_MODEL: &str = "chat-bison@001";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("generation api error: {0}")]
    Api(String),
}

/// Sampling parameters sent with every prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

impl GenerationParams {
    /// The fixed parameters both answer paths use.
    pub const FIXED: Self = Self {
        temperature: 0.2,
        max_output_tokens: 1024,
        top_p: 0.8,
        top_k: 40,
    };
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::FIXED
    }
}

/// One prior turn: (author, text), e.g. `["user", "hi"]` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn(pub String, pub String);

impl HistoryTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self("user".to_string(), text.into())
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self("bot".to_string(), text.into())
    }

    pub fn author(&self) -> &str {
        &self.0
    }

    pub fn text(&self) -> &str {
        &self.1
    }
}

/// Input/output exemplar for chat prompting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePair {
    #[serde(alias = "input")]
    pub input_text: String,
    #[serde(alias = "output")]
    pub output_text: String,
}

/// Everything a chat turn needs besides model and parameters.
#[derive(Debug, Clone, Copy)]
pub struct ChatPrompt<'a> {
    pub message: &'a str,
    pub context: &'a str,
    pub history: &'a [HistoryTurn],
    pub examples: &'a [ExamplePair],
}

/// Generation collaborator: plain completion and multi-turn chat.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Complete a single prompt.
    async fn predict(
        &self,
        model: &str,
        params: &GenerationParams,
        prompt: &str,
    ) -> Result<String, GenerationError>;

    /// Answer the next message of a conversation.
    async fn chat(
        &self,
        model: &str,
        params: &GenerationParams,
        prompt: ChatPrompt<'_>,
    ) -> Result<String, GenerationError>;
}
