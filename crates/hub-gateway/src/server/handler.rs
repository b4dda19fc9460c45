//! HTTP and WebSocket handlers

use crate::server::GatewayState;
use crate::session::{Session, SessionReport};
use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::StreamExt;
use serde::Serialize;

/// Transport-level message and frame cap, as a multiple of the configured
/// maximum message size
///
/// Messages between the two limits reach the inbound pump, which rejects them
/// as protocol violations.
pub const TRANSPORT_LIMIT_FACTOR: usize = 4;

/// WebSocket upgrade handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let limit = state
        .config()
        .max_message_size
        .saturating_mul(TRANSPORT_LIMIT_FACTOR);

    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| handle_socket(state, socket))
}

/// Run one upgraded connection to completion
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let session = Session::new(state.names().next_name(), state.config().clone());
    let session_id = session.id();
    let (sink, stream) = socket.split();

    let tasks = match session
        .establish(state.hub(), stream, sink)
        .await
    {
        Ok(tasks) => tasks,
        Err(e) => {
            tracing::warn!(
                session_id = %session_id,
                error = %e,
                code = e.code(),
                "Failed to establish session"
            );
            return;
        }
    };

    log_report(&tasks.wait().await);
}

fn log_report(report: &SessionReport) {
    let unexpected = [
        report.read.as_ref().err(),
        report.write.as_ref().err(),
        report.liveness.as_ref().err(),
    ]
    .into_iter()
    .flatten()
    .find(|e| !e.is_peer_fault());

    match unexpected {
        Some(e) => tracing::warn!(
            session_id = %report.id,
            name = %report.name,
            error = %e,
            code = e.code(),
            "Session ended abnormally"
        ),
        None => tracing::info!(
            session_id = %report.id,
            name = %report.name,
            read = ?report.read,
            write = ?report.write,
            liveness = ?report.liveness,
            "Session closed"
        ),
    }
}

/// Health check body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
}

/// Health check endpoint
///
/// Reports the registry size; 503 once the hub loop has stopped.
pub async fn health_check(State(state): State<GatewayState>) -> Response {
    match state.hub().stats().await {
        Ok(stats) => Json(HealthResponse {
            status: "ok",
            sessions: stats.sessions,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    sessions: 0,
                }),
            )
                .into_response()
        }
    }
}
