pub mod public;
pub mod server;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};

use crate::container::LifecycleHandle;
use crate::websocket::{self, WebSocketState};

/// Full HTTP surface: commands, ping and the console WebSocket.
pub fn app(lifecycle: LifecycleHandle, ws_state: WebSocketState) -> Router {
    let event_hub = ws_state.event_hub.clone();
    let ws_routes = Router::new()
        .route("/ws", get(websocket::ws_handler))
        .with_state(ws_state);

    public::public_router(event_hub)
        .merge(server::server_router(lifecycle))
        .merge(ws_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
