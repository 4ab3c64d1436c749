//! Session-parameter extraction into per-flow argument bundles.

use crate::llm::{ExamplePair, HistoryTurn};
use crate::webhook::protocol::{Parameters, WebhookRequest};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Number, Value};

/// Session parameter holding the fallback query (both flows read it).
pub const SEARCH_QUERY_PARAM: &str = "search_query";
pub const LAST_QUERY_PARAM: &str = "last_query";
pub const CONTEXT_PARAM: &str = "context";
pub const NEGATIVE_RESPONSE_PARAM: &str = "negative_response";
pub const HISTORY_PARAM: &str = "history";
pub const EXAMPLES_PARAM: &str = "examples";

/// Arguments for the search-grounded answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfobotAnswerArgs {
    pub search_query: String,
    pub last_query: String,
    /// Prompt template with `{last_query}`, `{search_query}` and `{search_results}`.
    pub context: String,
    pub negative_response: String,
}

/// Arguments for the multi-turn chat answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationalAnswerArgs {
    pub message: String,
    pub history: Vec<HistoryTurn>,
    pub context: String,
    pub examples: Vec<ExamplePair>,
}

/// String parameter or "" when absent. Session parameters are protobuf `Struct` values, so
/// numbers print as floats (`3.0`, `1e+20`) and booleans as `True`/`False`.
pub fn param_str(params: &Parameters, key: &str) -> String {
    match params.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => float_text(n),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        _ => String::new(),
    }
}

/// Shortest round-trip float text, positional for exponents in -4..16, else `<m>e±XX`.
fn float_text(n: &Number) -> String {
    let Some(f) = n.as_f64() else {
        return n.to_string();
    };
    let sci = format!("{:e}", f);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if (-4..16).contains(&exp) {
        let plain = f.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{}.0", plain)
        }
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    }
}

/// Sequence parameter or empty when absent or not the expected shape.
pub fn param_list<T: DeserializeOwned>(params: &Parameters, key: &str) -> Vec<T> {
    match params.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(v) => Vec::<T>::deserialize(v).unwrap_or_else(|e| {
            log::warn!("session parameter {} ignored: {}", key, e);
            Vec::new()
        }),
    }
}

/// User input for this turn: text, then transcript, then the `search_query` parameter.
fn user_input(request: &WebhookRequest) -> String {
    if !request.text.is_empty() {
        request.text.clone()
    } else if !request.transcript.is_empty() {
        request.transcript.clone()
    } else {
        param_str(request.parameters(), SEARCH_QUERY_PARAM)
    }
}

pub fn extract_infobot_args(request: &WebhookRequest) -> InfobotAnswerArgs {
    let params = request.parameters();
    InfobotAnswerArgs {
        search_query: user_input(request),
        last_query: param_str(params, LAST_QUERY_PARAM),
        context: param_str(params, CONTEXT_PARAM),
        negative_response: param_str(params, NEGATIVE_RESPONSE_PARAM),
    }
}

pub fn extract_conversational_args(request: &WebhookRequest) -> ConversationalAnswerArgs {
    let params = request.parameters();
    ConversationalAnswerArgs {
        message: user_input(request),
        history: param_list(params, HISTORY_PARAM),
        context: param_str(params, CONTEXT_PARAM),
        examples: param_list(params, EXAMPLES_PARAM),
    }
}
