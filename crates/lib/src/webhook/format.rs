//! Response encoding for both flows.

use crate::llm::HistoryTurn;
use crate::search::SearchResult;
use crate::webhook::params::{InfobotAnswerArgs, HISTORY_PARAM, LAST_QUERY_PARAM};
use crate::webhook::protocol::{MergeBehavior, ResponseMessage, WebhookResponse};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Rich-content "info" card for one search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoCard {
    #[serde(rename = "type")]
    pub typ: &'static str,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub action_link: Option<String>,
}

impl From<&SearchResult> for InfoCard {
    fn from(r: &SearchResult) -> Self {
        Self {
            typ: "info",
            title: r.title.clone(),
            subtitle: r.snippet.clone(),
            action_link: r.link.clone(),
        }
    }
}

/// `{"richContent": [[card], [card], ...]}`, one single-card row per result.
pub fn rich_content_payload(results: &[SearchResult]) -> Map<String, Value> {
    let rows: Vec<Value> = results
        .iter()
        .map(|r| json!([InfoCard::from(r)]))
        .collect();
    let mut payload = Map::new();
    payload.insert("richContent".to_string(), Value::Array(rows));
    payload
}

/// Rolling summary of the last exchange, stored for the next turn's prompt.
pub fn last_query_summary(search_query: &str, answer: &str) -> String {
    format!("Q:{} A:{}", search_query, answer)
}

fn replace_response(messages: Vec<ResponseMessage>) -> WebhookResponse {
    let mut response = WebhookResponse::default();
    response.fulfillment_response.merge_behavior = MergeBehavior::Replace;
    response.fulfillment_response.messages = messages;
    response
}

/// Answer text, result cards, and the updated `last_query` parameter.
pub fn format_infobot_response(
    answer: &str,
    results: &[SearchResult],
    args: &InfobotAnswerArgs,
) -> WebhookResponse {
    let mut response = replace_response(vec![
        ResponseMessage::text(answer),
        ResponseMessage::payload(rich_content_payload(results)),
    ]);
    response.session_info.parameters.insert(
        LAST_QUERY_PARAM.to_string(),
        Value::String(last_query_summary(&args.search_query, answer)),
    );
    response
}

/// Answer text and the updated `history` parameter.
pub fn format_conversational_response(answer: &str, history: &[HistoryTurn]) -> WebhookResponse {
    let mut response = replace_response(vec![ResponseMessage::text(answer)]);
    response
        .session_info
        .parameters
        .insert(HISTORY_PARAM.to_string(), json!(history));
    response
}
