//! HTTP and WebSocket routes for the live-eval server.

use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use livecell_core::{EvaluatorMsg, Mailbox};
use tower_http::cors::CorsLayer;

use crate::protocol::ServerMessage;

/// Application state shared across handlers: just the evaluator's mailbox.
/// `/api/state` and every `/ws` connection call
/// [`Mailbox::subscribe_evaluator`] directly rather than caching a
/// snapshot here, so each caller's view is exactly what the evaluator's
/// own `IncrementalServer::subscribe` would have handed it.
pub struct AppState<Env, I, O> {
    evaluator: Mailbox<EvaluatorMsg<Env, I, O>>,
}

impl<Env, I, O> AppState<Env, I, O> {
    pub fn new(evaluator: Mailbox<EvaluatorMsg<Env, I, O>>) -> Self {
        AppState { evaluator }
    }
}

/// Build the router: `GET /health`, `GET /api/state`, `GET /ws`.
pub fn create_router<Env, I, O>(state: Arc<AppState<Env, I, O>>) -> Router
where
    Env: Send + Sync + 'static,
    I: Clone + Send + Sync + serde::Serialize + 'static,
    O: Clone + Send + Sync + serde::Serialize + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/state", get(state_handler::<Env, I, O>))
        .route("/ws", get(ws_handler::<Env, I, O>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// One-shot snapshot of the current cell list. Subscribes, takes the
/// snapshot, and drops the diff receiver immediately; the evaluator
/// tolerates a subscriber disappearing (sends through a dropped receiver
/// are silently ignored, per [`livecell_core::actor::Mailbox::send`]).
async fn state_handler<Env, I, O>(
    State(state): State<Arc<AppState<Env, I, O>>>,
) -> impl IntoResponse
where
    Env: Send + 'static,
    I: Clone + Send + serde::Serialize + 'static,
    O: Clone + Send + serde::Serialize + 'static,
{
    match state.evaluator.subscribe_evaluator::<Env, I, O>().await {
        Some((nodes, _diffs)) => Json(ServerMessage::Snapshot { nodes }).into_response(),
        None => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "evaluator not running" })),
        )
            .into_response(),
    }
}

async fn ws_handler<Env, I, O>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<Env, I, O>>>,
) -> impl IntoResponse
where
    Env: Send + 'static,
    I: Clone + Send + Sync + serde::Serialize + 'static,
    O: Clone + Send + Sync + serde::Serialize + 'static,
{
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handshake: send the full current snapshot, then forward every
/// subsequent diff verbatim. Incoming client frames only understand
/// `Ping`; the cell list can only change by editing the watched file.
async fn handle_websocket<Env, I, O>(socket: WebSocket, state: Arc<AppState<Env, I, O>>)
where
    Env: Send + 'static,
    I: Clone + Send + Sync + serde::Serialize + 'static,
    O: Clone + Send + Sync + serde::Serialize + 'static,
{
    let Some((snapshot, mut diff_rx)) = state
        .evaluator
        .subscribe_evaluator::<Env, I, O>()
        .await
    else {
        return;
    };

    let (sender, mut receiver) = socket.split();
    let sender = Arc::new(tokio::sync::Mutex::new(sender));

    {
        let initial: ServerMessage<I, O> = ServerMessage::Snapshot { nodes: snapshot };
        if !send_json(&sender, &initial).await {
            return;
        }
    }

    let forward_sender = sender.clone();
    let forward_task = tokio::spawn(async move {
        while let Some(diff) = diff_rx.recv().await {
            let msg: ServerMessage<I, O> = ServerMessage::Update { diff };
            if !send_json(&forward_sender, &msg).await {
                break;
            }
        }
    });

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<crate::protocol::ClientMessage>(&text) {
                Ok(crate::protocol::ClientMessage::Ping) => {
                    let pong: ServerMessage<I, O> = ServerMessage::Pong;
                    if !send_json(&sender, &pong).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring unrecognized client frame");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "websocket error");
                break;
            }
        }
    }

    forward_task.abort();
    let _ = forward_task.await;
}

type WsSender = futures::stream::SplitSink<WebSocket, Message>;

async fn send_json<T: serde::Serialize>(sender: &Arc<tokio::sync::Mutex<WsSender>>, msg: &T) -> bool {
    let Ok(json) = serde_json::to_string(msg) else {
        return false;
    };
    sender.lock().await.send(Message::Text(json.into())).await.is_ok()
}

#[cfg(test)]
mod tests {
    #[test]
    fn health_payload_reports_ok() {
        let health = serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        });
        assert_eq!(health["status"], "ok");
    }
}
