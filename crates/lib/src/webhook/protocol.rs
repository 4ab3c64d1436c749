//! Webhook wire types (Dialogflow CX `WebhookRequest` / `WebhookResponse` JSON, camelCase).
//!
//! Only the fields this service reads or writes are modelled; unknown fields are ignored on
//! decode so newer platform payloads still parse. A `null` field decodes like an absent one.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Session parameters: string keys to arbitrary JSON values.
pub type Parameters = Map<String, Value>;

/// Inbound fulfillment request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub detect_intent_response_id: String,
    /// Free-text user input, when the turn was typed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// Speech transcript, when the turn was spoken.
    #[serde(default, deserialize_with = "null_as_default")]
    pub transcript: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub language_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfillment_info: Option<FulfillmentInfo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub session_info: SessionInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,
}

/// Which fulfillment triggered the call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag: String,
}

/// Session id and parameters (request and response).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub session: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Parameters,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl WebhookRequest {
    /// Decode from an already-parsed JSON value. Strings are parsed as JSON text; anything that
    /// doesn't decode yields the default (empty) request.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::default(),
            Some(Value::String(s)) => Self::from_json_str(s),
            Some(v @ Value::Object(_)) => Self::deserialize(v).unwrap_or_else(|e| {
                log::debug!("webhook request did not decode, using empty request: {}", e);
                Self::default()
            }),
            Some(other) => {
                log::debug!("webhook request is not an object: {}", other);
                Self::default()
            }
        }
    }

    /// Decode from JSON text. Empty or malformed text yields the default request.
    pub fn from_json_str(s: &str) -> Self {
        if s.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(s).unwrap_or_else(|e| {
            log::debug!("webhook request did not parse, using empty request: {}", e);
            Self::default()
        })
    }

    /// Fulfillment tag, if the request carried one.
    pub fn tag(&self) -> Option<&str> {
        self.fulfillment_info.as_ref().map(|f| f.tag.as_str())
    }

    pub fn parameters(&self) -> &Parameters {
        &self.session_info.parameters
    }
}

/// Outbound fulfillment response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub fulfillment_response: FulfillmentResponse,
    pub session_info: SessionInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentResponse {
    pub messages: Vec<ResponseMessage>,
    pub merge_behavior: MergeBehavior,
}

/// How the response messages combine with what the platform would render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeBehavior {
    #[default]
    MergeBehaviorUnspecified,
    Append,
    Replace,
}

/// A single message: plain text or a custom payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessage {
    pub text: Vec<String>,
}

impl ResponseMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(TextMessage {
                text: vec![text.into()],
            }),
            payload: None,
        }
    }

    pub fn payload(payload: Map<String, Value>) -> Self {
        Self {
            text: None,
            payload: Some(payload),
        }
    }
}

impl WebhookResponse {
    /// The response as a plain JSON value.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Text of every text message, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.fulfillment_response
            .messages
            .iter()
            .filter_map(|m| m.text.as_ref())
            .flat_map(|t| t.text.iter().map(String::as_str))
            .collect()
    }
}
