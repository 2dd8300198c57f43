use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use statsnap::{Config, Registry};

mod server;

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // ── 1. Config (optional JSON file as the only argument) ─────
    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path).unwrap_or_else(|e| {
            tracing::error!(%path, error = %e, "config load failed");
            std::process::exit(1);
        }),
        None => Config::default(),
    };
    let status_key = cfg.status_key.clone();

    // ── 2. Registry + scheduler ─────────────────────────────────
    let exit = CancellationToken::new();
    let stats = Registry::new(cfg, exit.clone()).unwrap_or_else(|e| {
        tracing::error!(error = %e, "invalid stats config");
        std::process::exit(1);
    });
    stats.new_string_gauge("build.version").set(env!("CARGO_PKG_VERSION"));

    // ── 3. Router ───────────────────────────────────────────────
    let app = server::create_router(&stats);

    // ── 4. Bind & serve ─────────────────────────────────────────
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to port 3000, is it already in use?");

    tracing::info!(%addr, %status_key, "statsnap demo listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(exit.clone()))
        .await
        .expect("Server exited with error");

    stats.shutdown().await;
}

async fn shutdown_signal(exit: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
    exit.cancel();
}
