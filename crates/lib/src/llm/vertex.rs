//! Vertex AI prediction client (`publishers/google/models/{model}:predict`).
//! Text models take `{ "content" }` instances; chat models take context, examples and messages.

use crate::llm::{ChatPrompt, GenerationBackend, GenerationError, GenerationParams};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Client for the Vertex AI REST API.
#[derive(Clone)]
pub struct VertexClient {
    base_url: String,
    project: String,
    location: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl VertexClient {
    pub fn new(
        base_url: impl Into<String>,
        project: impl Into<String>,
        location: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project: project.into(),
            location: location.into(),
            access_token,
            client: reqwest::Client::new(),
        }
    }

    fn predict_url(&self, model: &str) -> String {
        format!(
            "{}/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.base_url, self.project, self.location, model
        )
    }

    /// POST a predict request and return the raw predictions.
    async fn post_predict<I: Serialize>(
        &self,
        model: &str,
        instance: I,
        params: &GenerationParams,
    ) -> Result<Vec<serde_json::Value>, GenerationError> {
        let url = self.predict_url(model);
        let body = PredictRequest {
            instances: vec![instance],
            parameters: PredictParameters::from(params),
        };
        let mut req = self.client.post(&url).json(&body);
        if let Some(ref token) = self.access_token {
            req = req.bearer_auth(token);
        }
        log::debug!("vertex predict: model {}", model);
        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(GenerationError::Api(format!("{} {}", status, body)));
        }
        let data: PredictResponse = res.json().await?;
        Ok(data.predictions)
    }
}

#[async_trait]
impl GenerationBackend for VertexClient {
    async fn predict(
        &self,
        model: &str,
        params: &GenerationParams,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let predictions = self
            .post_predict(model, TextInstance { content: prompt }, params)
            .await?;
        text_prediction_content(&predictions)
    }

    async fn chat(
        &self,
        model: &str,
        params: &GenerationParams,
        prompt: ChatPrompt<'_>,
    ) -> Result<String, GenerationError> {
        let predictions = self
            .post_predict(model, ChatInstance::from(prompt), params)
            .await?;
        chat_prediction_content(&predictions)
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct PredictRequest<I> {
    instances: Vec<I>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
}

impl From<&GenerationParams> for PredictParameters {
    fn from(p: &GenerationParams) -> Self {
        Self {
            temperature: p.temperature,
            max_output_tokens: p.max_output_tokens,
            top_p: p.top_p,
            top_k: p.top_k,
        }
    }
}

#[derive(Debug, Serialize)]
struct TextInstance<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatInstance<'a> {
    #[serde(skip_serializing_if = "is_blank")]
    context: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    examples: Vec<ChatExample<'a>>,
    messages: Vec<ChatMessage<'a>>,
}

fn is_blank(s: &&str) -> bool {
    s.is_empty()
}

#[derive(Debug, Serialize)]
struct ChatExample<'a> {
    input: ChatContent<'a>,
    output: ChatContent<'a>,
}

#[derive(Debug, Serialize)]
struct ChatContent<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    author: &'a str,
    content: &'a str,
}

impl<'a> From<ChatPrompt<'a>> for ChatInstance<'a> {
    fn from(prompt: ChatPrompt<'a>) -> Self {
        let mut messages: Vec<ChatMessage<'a>> = prompt
            .history
            .iter()
            .map(|turn| ChatMessage {
                author: turn.author(),
                content: turn.text(),
            })
            .collect();
        messages.push(ChatMessage {
            author: "user",
            content: prompt.message,
        });
        Self {
            context: prompt.context,
            examples: prompt
                .examples
                .iter()
                .map(|e| ChatExample {
                    input: ChatContent {
                        content: &e.input_text,
                    },
                    output: ChatContent {
                        content: &e.output_text,
                    },
                })
                .collect(),
            messages,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<serde_json::Value>,
}

/// `predictions[0].content`. A prediction without content (e.g. safety-blocked) is an empty answer.
fn text_prediction_content(predictions: &[serde_json::Value]) -> Result<String, GenerationError> {
    let first = predictions
        .first()
        .ok_or_else(|| GenerationError::Api("response contained no predictions".to_string()))?;
    Ok(first
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string())
}

/// `predictions[0].candidates[0].content`.
fn chat_prediction_content(predictions: &[serde_json::Value]) -> Result<String, GenerationError> {
    let first = predictions
        .first()
        .ok_or_else(|| GenerationError::Api("response contained no predictions".to_string()))?;
    Ok(first
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ExamplePair, HistoryTurn};
    use serde_json::json;

    #[test]
    fn predict_url_includes_project_location_and_model() {
        let client = VertexClient::new("http://localhost:1/v1/", "proj", "us-central1", None);
        assert_eq!(
            client.predict_url("text-bison@001"),
            "http://localhost:1/v1/projects/proj/locations/us-central1/publishers/google/models/text-bison@001:predict"
        );
    }

    #[test]
    fn parameters_use_camel_case() {
        let body = PredictRequest {
            instances: vec![TextInstance { content: "hi" }],
            parameters: PredictParameters::from(&GenerationParams::FIXED),
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["instances"][0]["content"], "hi");
        assert_eq!(v["parameters"]["maxOutputTokens"], 1024);
        assert_eq!(v["parameters"]["topK"], 40);
        assert!(v["parameters"].get("topP").is_some());
    }

    #[test]
    fn chat_instance_appends_message_after_history() {
        let history = vec![HistoryTurn::user("hi"), HistoryTurn::bot("hello")];
        let examples = vec![ExamplePair {
            input_text: "q".to_string(),
            output_text: "a".to_string(),
        }];
        let instance = ChatInstance::from(ChatPrompt {
            message: "what now?",
            context: "be brief",
            history: &history,
            examples: &examples,
        });
        let v = serde_json::to_value(&instance).unwrap();
        assert_eq!(
            v,
            json!({
                "context": "be brief",
                "examples": [{"input": {"content": "q"}, "output": {"content": "a"}}],
                "messages": [
                    {"author": "user", "content": "hi"},
                    {"author": "bot", "content": "hello"},
                    {"author": "user", "content": "what now?"}
                ]
            })
        );
    }

    #[test]
    fn chat_instance_omits_empty_context_and_examples() {
        let instance = ChatInstance::from(ChatPrompt {
            message: "hi",
            context: "",
            history: &[],
            examples: &[],
        });
        let v = serde_json::to_value(&instance).unwrap();
        assert_eq!(v, json!({"messages": [{"author": "user", "content": "hi"}]}));
    }

    #[test]
    fn text_content_is_read_from_first_prediction() {
        let preds = vec![json!({"content": "9-5"}), json!({"content": "other"})];
        assert_eq!(text_prediction_content(&preds).unwrap(), "9-5");
        assert_eq!(text_prediction_content(&[json!({})]).unwrap(), "");
        assert!(text_prediction_content(&[]).is_err());
    }

    #[test]
    fn chat_content_is_read_from_first_candidate() {
        let preds = vec![json!({"candidates": [{"author": "1", "content": "sure"}]})];
        assert_eq!(chat_prediction_content(&preds).unwrap(), "sure");
        assert!(chat_prediction_content(&[]).is_err());
    }
}
