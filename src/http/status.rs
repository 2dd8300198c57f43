use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
};
use tracing::error;

use crate::output::{Format, JsonFormat};
use crate::registry::Registry;

// ─── GET <status_key> ────────────────────────────────────────────
/// Renders the last published snapshot as nested JSON.
/// Answers 500 with an empty body if the snapshot cannot be encoded.

pub async fn status_handler(State(registry): State<Registry>) -> Response {
    match JsonFormat.encode(&registry.snapshot()) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode status snapshot");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// The status endpoint as a standalone route, for routers not built with
/// [`HttpMuxer`](super::HttpMuxer).
pub fn status_route<S>(registry: &Registry) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    get(status_handler).with_state(registry.clone())
}
