use axum::{extract::Path, http::StatusCode, Router};
use std::time::Duration;

use statsnap::Registry;

/// Builds the demo router: a few instrumented routes plus the status
/// endpoint from the config.
pub fn create_router(stats: &Registry) -> Router {
    stats
        .http_muxer("http")
        // ── Demo endpoints ──────────────────────────────────────
        .get("/hello", hello)
        .get("/sleep/:ms", sleep)
        .get("/teapot", teapot)
        .into_router()
}

async fn hello() -> &'static str {
    "hello"
}

/// Sleeps for up to five seconds, so the route timer has something to show.
async fn sleep(Path(ms): Path<u64>) -> Result<String, (StatusCode, &'static str)> {
    if ms > 5_000 {
        return Err((StatusCode::BAD_REQUEST, "ms must be at most 5000"));
    }
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Ok(format!("slept {ms}ms"))
}

async fn teapot() -> StatusCode {
    StatusCode::IM_A_TEAPOT
}
