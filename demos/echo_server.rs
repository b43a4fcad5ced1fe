//! Echo server for manual testing: logs every request and answers 200.
//!
//! Run with `cargo run --example echo_server`, then point the `basic`
//! demo at `http://127.0.0.1:8080`.

use axum::{
    http::{HeaderMap, Method, StatusCode, Uri},
    Router,
};
use tracing_subscriber::EnvFilter;
use url::form_urlencoded;

const MAX_LOGGED_BODY: usize = 1000;

async fn log_request(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, &'static str) {
    tracing::info!("----- New Request ------");
    tracing::info!("Method: {method}");
    tracing::info!("URL: {uri}");
    tracing::info!("Path: {}", uri.path());

    tracing::info!("[Headers]");
    for (name, value) in &headers {
        tracing::info!("\t{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }

    tracing::info!("[Query Parameters]");
    for (name, value) in form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes()) {
        tracing::info!("\t{name}: {value}");
    }

    if !body.is_empty() {
        tracing::info!("[Body]");
        match body.char_indices().nth(MAX_LOGGED_BODY) {
            Some((cut, _)) => tracing::info!("\t{}...(truncated)", &body[..cut]),
            None => tracing::info!("\t{body}"),
        }
    }
    tracing::info!("------------------------");

    (StatusCode::OK, "Request received and logged.\n")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let app = Router::new().fallback(log_request);
    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!("Starting server on :8080");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("failed to listen for ctrl-c: {err}");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down server...");
        })
        .await?;

    tracing::info!("Server gracefully stopped.");
    Ok(())
}
