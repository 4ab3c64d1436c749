//! Fulfillment webhook: wire types, parameter extraction, response encoding, tag dispatch and
//! the HTTP server.
//!
//! One request in, one response out; nothing is kept between requests. Session state lives in
//! the platform's session parameters, of which only `last_query` and `history` are rewritten.

mod dispatch;
mod format;
mod params;
mod protocol;
mod server;

pub use dispatch::{dispatch, fulfill_text, Collaborators, Flow, Reply, FALLBACK_REPLY};
pub use format::{
    format_conversational_response, format_infobot_response, last_query_summary,
    rich_content_payload, InfoCard,
};
pub use params::{
    extract_conversational_args, extract_infobot_args, param_list, param_str,
    ConversationalAnswerArgs, InfobotAnswerArgs,
};
pub use protocol::{
    FulfillmentInfo, FulfillmentResponse, MergeBehavior, Parameters, ResponseMessage,
    SessionInfo, TextMessage, WebhookRequest, WebhookResponse,
};
pub use server::{router, run_server, WebhookError, WebhookState};
