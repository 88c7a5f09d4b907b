//! Application entry point and server initialization
//!
//! Loads configuration, opens the database, and serves the API until a
//! shutdown signal arrives.

use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use classifieds::config::Config;
use classifieds::database::{init_db, AppState};
use classifieds::route::create_app;

/// # Environment Variables
///
/// - `PORT` - Server port number (default: 8080)
/// - `DATABASE_URL` - Path to database file (default: "data.db")
/// - `TOTAL_ON_PAGE` - Page size of the list endpoints (default: 10)
/// - `MEDIA_ROOT` / `MEDIA_URL` - Where uploaded images go and how they are addressed
/// - `MAX_UPLOAD_BYTES` - Body limit of the image upload route
/// - `RUST_LOG` - Log filter (default: "classifieds=debug,tower_http=debug")
#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("classifieds=debug,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env();

    let db = init_db(&config.database_url).expect("Failed to initialize database");

    let port = config.port;
    let database_url = config.database_url.clone();
    let state = AppState {
        db: Arc::new(db),
        config: Arc::new(config),
    };

    let app = create_app(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");

    tracing::info!(%addr, database = %database_url, "server running");

    // Keep serving until SIGTERM or SIGINT, letting open requests finish
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Waits for SIGINT, or SIGTERM on Unix, and logs which one stopped the server
async fn shutdown_signal() {
    let signal = wait_for_signal().await;
    tracing::info!(signal, "shutdown signal received, draining connections");
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal as unix_signal, SignalKind};

    let mut terminate = match unix_signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!(error = %err, "SIGTERM handler unavailable, listening for Ctrl+C only");
            let _ = signal::ctrl_c().await;
            return "SIGINT";
        }
    };

    tokio::select! {
        _ = signal::ctrl_c() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = signal::ctrl_c().await;
    "SIGINT"
}
