//! Infobot core library: a fulfillment webhook that answers conversational-agent turns with
//! search-grounded text generation or multi-turn chat.

pub mod answer;
pub mod config;
pub mod llm;
pub mod search;
pub mod template;
pub mod webhook;
