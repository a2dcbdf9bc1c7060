//! Routes that never touch the engine

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::websocket::EventHub;

#[derive(Serialize)]
struct PingResponse {
    status: &'static str,
    version: &'static str,
    /// Open console WebSocket sessions
    console_subscribers: usize,
}

pub fn public_router(event_hub: Arc<EventHub>) -> Router {
    Router::new()
        .route("/api/v1/public/ping", get(ping))
        .with_state(event_hub)
}

async fn ping(State(event_hub): State<Arc<EventHub>>) -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        console_subscribers: event_hub.subscriber_count(),
    })
}
