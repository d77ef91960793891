//! Prometheus metrics for identifier generation.
//!
//! Without an installed recorder every counter below is a no-op, so the
//! `track_*` helpers are safe to call from tests and the CLI.

use anyhow::Context;
use axum::{Router, extract::Request, middleware::Next, response::Response, routing::get};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use registrar_config::ServerConfig;
use std::time::{Duration, Instant};

use crate::logging::request_path;

const GENERATED: &str = "matricules_generated_total";
const CONFLICTS: &str = "matricule_conflicts_total";
const FAILURES: &str = "matricule_generation_failures_total";
const BATCH_RECORDS: &str = "matricule_batch_records_total";
const HTTP_REQUESTS: &str = "http_requests_total";
const HTTP_DURATION: &str = "http_request_duration_seconds";

/// Install the Prometheus recorder, or `Ok(None)` when
/// `OBSERVABILITY_ENABLED` is off.
pub fn init_metrics(config: &ServerConfig) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.observability_enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(HTTP_DURATION.to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5],
        )
        .context("Failed to set buckets")?
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    describe_counter!(GENERATED, "Identifiers written, by kind");
    describe_counter!(CONFLICTS, "Identifier writes rejected by a unique index and retried");
    describe_counter!(FAILURES, "Generations abandoned, by identifier kind");
    describe_counter!(BATCH_RECORDS, "Backfill records, by target and outcome");
    describe_histogram!(HTTP_DURATION, "HTTP request latency");

    let upkeep = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep.run_upkeep();
        }
    });

    Ok(Some(handle))
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = request_path(&req);

    let response = next.run(req).await;
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS, "method" => method.clone(), "path" => path.clone(), "status" => status)
        .increment(1);
    histogram!(HTTP_DURATION, "method" => method, "path" => path)
        .record(start.elapsed().as_secs_f64());

    response
}

/// Router serving `/metrics`.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

/// One identifier written; `kind` is `user` or `student`.
pub fn track_matricule_generated(kind: &'static str) {
    counter!(GENERATED, "kind" => kind).increment(1);
}

/// A write lost the race for an identifier and was retried.
pub fn track_identifier_conflict(field: &'static str) {
    counter!(CONFLICTS, "field" => field).increment(1);
}

pub fn track_generation_failure(reason: &'static str) {
    counter!(FAILURES, "reason" => reason).increment(1);
}

pub fn track_batch(target: &'static str, generated: usize, skipped: usize, failed: usize) {
    for (outcome, count) in [("generated", generated), ("skipped", skipped), ("failed", failed)] {
        counter!(BATCH_RECORDS, "target" => target, "outcome" => outcome).increment(count as u64);
    }
}
