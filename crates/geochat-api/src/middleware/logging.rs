use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Request logging middleware
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        "Request processed"
    );

    response
}

/// Install the global subscriber; `RUST_LOG` wins over `level`.
///
/// One-shot commands log to stderr since stdout carries their output.
pub fn init_logging(level: &str, format: &str, to_stderr: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match (format, to_stderr) {
        ("json", false) => registry.with(fmt::layer().json()).init(),
        ("json", true) => registry.with(fmt::layer().json().with_writer(std::io::stderr)).init(),
        (_, false) => registry.with(fmt::layer().pretty()).init(),
        (_, true) => registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init(),
    }
}
