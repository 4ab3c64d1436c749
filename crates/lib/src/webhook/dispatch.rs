//! Tag routing: decode, pick the flow, extract → answer → encode.

use crate::answer::{self, AnswerError};
use crate::config::{self, Config};
use crate::llm::{GenerationBackend, HistoryTurn, VertexClient};
use crate::search::{DiscoveryClient, SearchBackend};
use crate::webhook::format::{format_conversational_response, format_infobot_response};
use crate::webhook::params::{extract_conversational_args, extract_infobot_args};
use crate::webhook::protocol::{WebhookRequest, WebhookResponse};
use serde_json::Value;
use std::sync::Arc;

/// Plain-text reply for requests that can't be routed.
pub const FALLBACK_REPLY: &str = "Hello";

/// Which flow a fulfillment tag selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Infobot,
    Conversational,
}

impl Flow {
    /// Exact, case-sensitive tag match.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Infobot" => Some(Self::Infobot),
            "Conversational" => Some(Self::Conversational),
            _ => None,
        }
    }
}

/// Outcome of one webhook call.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Fulfillment(WebhookResponse),
    Fallback,
}

/// External services used to answer.
#[derive(Clone)]
pub struct Collaborators {
    pub search: Arc<dyn SearchBackend>,
    pub generation: Arc<dyn GenerationBackend>,
}

impl Collaborators {
    pub fn new(search: Arc<dyn SearchBackend>, generation: Arc<dyn GenerationBackend>) -> Self {
        Self { search, generation }
    }

    /// Vertex AI Search and Vertex AI generation clients from config and environment.
    pub fn from_config(config: &Config) -> Self {
        let token = config::resolve_access_token(config);
        if token.is_none() {
            log::warn!("no access token configured; Google API calls will be unauthenticated");
        }
        let vertex_project = config::resolve_vertex_project(config).unwrap_or_else(|| {
            log::warn!("vertex.project not set (config or GOOGLE_CLOUD_PROJECT)");
            String::new()
        });
        let search_project = config::resolve_search_project(config).unwrap_or_else(|| {
            log::warn!("search.project not set (config or GOOGLE_CLOUD_PROJECT)");
            String::new()
        });
        let generation = VertexClient::new(
            config::resolve_vertex_base_url(config),
            vertex_project,
            config.vertex.location.trim(),
            token.clone(),
        );
        let search = DiscoveryClient::new(
            config::resolve_search_base_url(config),
            search_project,
            config.search.location.trim(),
            config.search.data_store.trim(),
            config.search.serving_config.trim(),
            config.search.page_size,
            token,
        );
        Self::new(Arc::new(search), Arc::new(generation))
    }
}

/// Route a parsed body. A JSON object with a `fulfillmentInfo` field, or a JSON string holding
/// such an object, is answered when its tag is known; everything else gets [`Reply::Fallback`]
/// without touching a collaborator.
pub async fn dispatch(
    body: Option<&Value>,
    collaborators: &Collaborators,
) -> Result<Reply, AnswerError> {
    let routable = match body {
        Some(Value::Object(o)) => o.contains_key("fulfillmentInfo"),
        Some(Value::String(_)) => true,
        _ => false,
    };
    if !routable {
        log::debug!("request without fulfillmentInfo, sending fallback reply");
        return Ok(Reply::Fallback);
    }
    let request = WebhookRequest::from_value(body);
    let Some(flow) = request.tag().and_then(Flow::from_tag) else {
        log::info!("unrouted fulfillment tag {:?}, sending fallback reply", request.tag());
        return Ok(Reply::Fallback);
    };
    log::info!("fulfillment {:?} for session {:?}", flow, request.session_info.session);
    let response = match flow {
        Flow::Infobot => infobot(&request, collaborators).await?,
        Flow::Conversational => conversational(&request, collaborators).await?,
    };
    Ok(Reply::Fulfillment(response))
}

/// Answer one request given as JSON text and render the reply: the response as pretty JSON, or
/// the fallback text. Text that isn't JSON is treated as an absent body.
pub async fn fulfill_text(text: &str, collaborators: &Collaborators) -> Result<String, AnswerError> {
    let body: Option<Value> = serde_json::from_str(text).ok();
    match dispatch(body.as_ref(), collaborators).await? {
        Reply::Fulfillment(response) => Ok(serde_json::to_string_pretty(&response)?),
        Reply::Fallback => Ok(FALLBACK_REPLY.to_string()),
    }
}

async fn infobot(
    request: &WebhookRequest,
    collaborators: &Collaborators,
) -> Result<WebhookResponse, AnswerError> {
    let args = extract_infobot_args(request);
    let (answer, results) = answer::answer_infobot(
        &args,
        collaborators.search.as_ref(),
        collaborators.generation.as_ref(),
    )
    .await?;
    Ok(format_infobot_response(&answer, &results, &args))
}

/// The new user/bot exchange is appended to history before it is written back.
async fn conversational(
    request: &WebhookRequest,
    collaborators: &Collaborators,
) -> Result<WebhookResponse, AnswerError> {
    let args = extract_conversational_args(request);
    let answer =
        answer::answer_conversational(&args, collaborators.generation.as_ref()).await?;
    let mut history = args.history;
    history.push(HistoryTurn::user(args.message));
    history.push(HistoryTurn::bot(answer.as_str()));
    Ok(format_conversational_response(&answer, &history))
}
