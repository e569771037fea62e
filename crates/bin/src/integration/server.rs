//! HTTP surface of the gateway.
//!
//! | Route | Answer |
//! |---|---|
//! | `POST /predict` | `{price, season_label}` or `{error: {kind, message}}` |
//! | `POST /reload` | swaps in the artifacts currently on disk |
//! | `GET /health` | 200 while artifacts are loaded, 503 otherwise |

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use staycast::serve::{ErrorDetail, ErrorResponse, GatewayError};
use staycast::{ArtifactLayout, Gateway, GatewayConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Shared by every handler.
#[derive(Debug, Clone)]
pub(crate) struct ServerState {
    gateway: Gateway,
    layout: Arc<ArtifactLayout>,
    config: GatewayConfig,
}

impl ServerState {
    pub(crate) fn new(gateway: Gateway, layout: ArtifactLayout, config: GatewayConfig) -> Self {
        Self {
            gateway,
            layout: Arc::new(layout),
            config,
        }
    }
}

pub(crate) fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/reload", post(reload))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub(crate) async fn serve(addr: SocketAddr, state: ServerState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "gateway listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl-C handler");
    }
    info!("shutting down");
}

async fn health(State(state): State<ServerState>) -> Response {
    match state.gateway.slot().failure() {
        None => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Some(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(error_body("model_unavailable", reason)),
        )
            .into_response(),
    }
}

async fn predict(State(state): State<ServerState>, body: Bytes) -> Response {
    match parse_body(&body).and_then(|value| state.gateway.respond(value)) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            let status = status_of(&err);
            if status.is_server_error() {
                warn!(kind = err.kind(), error = %err, "prediction failed");
            } else {
                debug!(kind = err.kind(), error = %err, "prediction rejected");
            }
            (status, Json(ErrorResponse::from(&err))).into_response()
        }
    }
}

async fn reload(State(state): State<ServerState>) -> Response {
    let task = tokio::task::spawn_blocking(move || {
        state.gateway.slot().reload(&state.layout, state.config)
    });

    let failure = match task.await {
        Ok(Ok(())) => {
            return (StatusCode::OK, Json(json!({ "status": "reloaded" }))).into_response();
        }
        Ok(Err(e)) => e.to_string(),
        Err(e) => e.to_string(),
    };

    error!(error = %failure, "reload failed, keeping previous artifacts");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(error_body("reload_failed", failure)),
    )
        .into_response()
}

/// Decode a request body; malformed JSON is an input validation failure.
pub(crate) fn parse_body(body: &[u8]) -> Result<serde_json::Value, GatewayError> {
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::InputValidation(format!("invalid JSON body: {e}")))
}

pub(crate) fn status_of(err: &GatewayError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn error_body(kind: &str, message: String) -> ErrorResponse {
    ErrorResponse {
        error: ErrorDetail {
            kind: kind.to_string(),
            message,
        },
    }
}
