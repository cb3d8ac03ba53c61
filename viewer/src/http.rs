use crate::SharedState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Serves the published state until the process exits.
pub async fn serve(addr: SocketAddr, state: SharedState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "serving HTTP");
    axum::serve(listener, router(state)).await
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(services))
        .route("/live", get(live))
        .route("/ready", get(ready))
        .with_state(state)
}

async fn services(State(state): State<SharedState>) -> Response {
    let current = state.read();
    Json(&*current).into_response()
}

async fn live() -> &'static str {
    "ok"
}

async fn ready(State(state): State<SharedState>) -> Response {
    if state.is_published() {
        (StatusCode::OK, "ready").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "no services published yet").into_response()
    }
}
