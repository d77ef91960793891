//! Tracing setup and per-request logging.
//!
//! Console output is compact and filtered by `RUST_LOG`. Everything at
//! `info` and above, including the `registrar::audit` lines written for
//! each generated identifier, also goes to a daily JSON file in `LOG_DIR`.

use anyhow::Context;
use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use registrar_config::ServerConfig;
use std::time::Instant;
use tracing::{Instrument, error, info, info_span, warn};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const DEFAULT_FILTER: &str = "registrar=info,registrar_db=info,tower_http=warn,sqlx=warn";

/// Route template when routing has matched, raw path otherwise.
pub(crate) fn request_path(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned())
}

/// Logs one line per request inside a `request` span and returns the
/// request id in `x-request-id`. A caller-supplied id is kept.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %request_path(&req),
    );

    let mut response = next.run(req).instrument(span.clone()).await;
    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_millis() as u64;

    span.in_scope(|| match status {
        500.. => error!(status, latency_ms, "Server error"),
        400..=499 => warn!(status, latency_ms, "Client error"),
        _ => info!(status, latency_ms, "Request completed"),
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

pub fn init_tracing(config: &ServerConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.log_dir).with_context(|| {
        format!("Failed to create log directory {}", config.log_dir.display())
    })?;

    let console_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        );

    let json_layer = fmt::layer()
        .json()
        .with_writer(rolling::daily(&config.log_dir, "registrar.json"))
        .with_current_span(true)
        .with_span_list(false)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    info!(log_dir = %config.log_dir.display(), "Tracing initialized");
    Ok(())
}
