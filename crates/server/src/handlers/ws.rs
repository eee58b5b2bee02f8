use crate::config::AppState;
use crate::presence::SessionHandle;
use crate::relay::{ClientFrame, Relay, SessionEvent};
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// GET /ws - one live session per socket
pub async fn session_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let relay = state.relay.clone();
    ws.on_upgrade(move |socket| run_session(socket, relay))
}

async fn run_session(socket: WebSocket, relay: Arc<Relay>) {
    let (session, mut outbound) = SessionHandle::channel();
    let (mut sender, mut receiver) = socket.split();
    info!("User connected: {}", session.id());

    let push_task = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Dropping unserializable event: {}", e);
                    continue;
                }
            };
            if sender.send(WsMessage::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = receiver.next().await {
        let text = match frame {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<ClientFrame>(text.as_str()) {
            Ok(frame) => relay.handle(&session, frame.into()).await,
            Err(e) => debug!("Ignoring malformed frame on {}: {}", session.id(), e),
        }
    }

    relay.handle(&session, SessionEvent::Disconnect).await;
    push_task.abort();
    info!("User disconnected: {}", session.id());
}
