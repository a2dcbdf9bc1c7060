use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::container::{LifecycleHandle, ServerOptions, StartOutcome, StopOutcome};
use crate::error::LauncherError;

#[derive(Clone)]
pub struct ServerAppState {
    pub lifecycle: LifecycleHandle,
}

#[derive(Serialize)]
struct StartResponse {
    started: bool,
    outcome: StartOutcome,
}

#[derive(Serialize)]
struct StopResponse {
    outcome: StopOutcome,
    confirmed_absent: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn server_router(lifecycle: LifecycleHandle) -> Router {
    let state = ServerAppState { lifecycle };

    Router::new()
        .route("/api/v1/server/start", post(start_server))
        .route("/api/v1/server/stop", post(stop_server))
        .route("/api/v1/server/status", get(server_status))
        .with_state(state)
}

fn error_response(err: LauncherError) -> Response {
    let status = match &err {
        LauncherError::PullFailed { .. }
        | LauncherError::StartFailed(_)
        | LauncherError::Engine { .. } => StatusCode::BAD_GATEWAY,
        LauncherError::Connectivity(_) | LauncherError::ShutDown => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        LauncherError::ConfigIo(_) | LauncherError::ConfigParse(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse { error: err.to_string() })).into_response()
}

async fn start_server(
    State(state): State<ServerAppState>,
    Json(options): Json<ServerOptions>,
) -> Response {
    tracing::info!("Start requested for server {:?}", options.name);
    match state.lifecycle.start(options).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(StartResponse {
                started: true,
                outcome,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn stop_server(State(state): State<ServerAppState>) -> Response {
    match state.lifecycle.stop().await {
        Ok(outcome) => {
            let confirmed_absent = outcome.confirmed_absent();
            (
                StatusCode::OK,
                Json(StopResponse {
                    outcome,
                    confirmed_absent,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn server_status(State(state): State<ServerAppState>) -> Response {
    match state.lifecycle.status().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response(e),
    }
}
