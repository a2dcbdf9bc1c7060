//! WebSocket handler for the console feed.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::debug;
use uuid::Uuid;

use super::event_hub::EventHub;

#[derive(Clone)]
pub struct WebSocketState {
    pub event_hub: Arc<EventHub>,
}

/// Handle WebSocket upgrade request
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let session = Uuid::new_v4();
    // Subscribe before anything else so no event after this point is missed
    let events = BroadcastStream::new(state.event_hub.subscribe());
    tracing::info!(
        "Console subscriber {} connected ({} total)",
        session,
        state.event_hub.subscriber_count()
    );

    let (mut sender, mut receiver) = socket.split();

    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Ok(_) => {
                    // The feed is push-only; commands go through HTTP
                }
                Err(e) => {
                    debug!("Error receiving from {}: {}", session, e);
                    break;
                }
            }
        }
    });

    let mut send_task = tokio::spawn(async move {
        let mut events = events;
        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(BroadcastStreamRecvError::Lagged(missed)) => {
                    tracing::warn!("Subscriber {} lagged, {} events skipped", session, missed);
                    continue;
                }
            };

            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => {
            debug!("Receiver task ended for {}", session);
            send_task.abort();
        }
        _ = &mut send_task => {
            debug!("Sender task ended for {}", session);
            recv_task.abort();
        }
    }

    tracing::info!("Console subscriber {} disconnected", session);
}
