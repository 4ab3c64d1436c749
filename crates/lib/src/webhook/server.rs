//! Webhook HTTP server: `POST /` handles fulfillment, `GET /` is a health probe.

use crate::answer::AnswerError;
use crate::config::Config;
use crate::webhook::dispatch::{dispatch, Collaborators, Reply, FALLBACK_REPLY};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

/// Shared state for request handlers.
#[derive(Clone)]
pub struct WebhookState {
    pub collaborators: Collaborators,
    pub port: u16,
}

/// A request-fatal error, reported as 500 with a JSON body.
#[derive(Debug)]
pub struct WebhookError(AnswerError);

impl From<AnswerError> for WebhookError {
    fn from(e: AnswerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        log::error!("fulfillment failed: {}", self.0);
        let body = json!({
            "error": "fulfillment_failed",
            "message": self.0.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Fulfillment(response) => Json(response).into_response(),
            Reply::Fallback => FALLBACK_REPLY.into_response(),
        }
    }
}

/// Routes for the webhook; exposed for in-process tests.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(health_http).post(webhook_http))
        .with_state(state)
}

/// Bind `server.bind:server.port` and serve until SIGINT/SIGTERM.
pub async fn run_server(config: Config, collaborators: Collaborators) -> Result<()> {
    let port = config.server.port;
    let bind = config.server.bind.trim();
    let app = router(WebhookState {
        collaborators,
        port,
    });

    let bind_addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("webhook listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server exited")?;
    log::info!("webhook stopped");
    Ok(())
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /. The body is parsed leniently: anything that isn't JSON is treated as absent.
async fn webhook_http(
    State(state): State<WebhookState>,
    body: Bytes,
) -> Result<Reply, WebhookError> {
    let parsed: Option<Value> = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => Some(v),
            Err(e) => {
                log::debug!("webhook body is not JSON: {}", e);
                None
            }
        }
    };
    let reply = dispatch(parsed.as_ref(), &state.collaborators).await?;
    Ok(reply)
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<WebhookState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "infobot",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
    }))
}
