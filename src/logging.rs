//! Tracing setup and the request logging middleware.
//!
//! With `OBSERVABILITY_ENABLED=false` only compact console logging is
//! installed. Otherwise logs also go to daily rolling files under
//! `storage/logs` and spans are exported over OTLP when a collector is
//! reachable.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::{KeyValue, global, trace::TraceError};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, Tracer},
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::metrics::is_observability_enabled;

const LOG_DIR: &str = "storage/logs";

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let request_id = uuid::Uuid::new_v4().to_string();

    let response = next.run(req).await;
    let latency_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    match status {
        400..=499 => warn!(
            request_id = %request_id,
            method = %method,
            path = %matched_path,
            status,
            latency_ms = %latency_ms,
            "Client error"
        ),
        500..=599 => error!(
            request_id = %request_id,
            method = %method,
            path = %matched_path,
            status,
            latency_ms = %latency_ms,
            "Server error"
        ),
        _ => info!(
            request_id = %request_id,
            method = %method,
            path = %matched_path,
            status,
            latency_ms = %latency_ms,
            "Request completed"
        ),
    }

    response
}

fn init_tracer() -> Result<Tracer, TraceError> {
    let otlp_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());

    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::new(vec![
        KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new(
            "environment",
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        ),
    ]);

    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(otlp_endpoint);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .install_batch(runtime::Tokio)
}

fn console_filter() -> EnvFilter {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={},tower_http=warn,hyper=warn,tonic=warn,h2=warn,sqlx=warn",
            env!("CARGO_CRATE_NAME"),
            log_level
        ))
    })
}

/// Console-only logging, used when observability is switched off or the log
/// directory cannot be created.
pub fn init_basic_console_logging() {
    let console_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(console_filter());

    tracing_subscriber::registry().with(console_layer).init();
}

pub fn init_tracing() {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::fmt;

    if !is_observability_enabled() {
        init_basic_console_logging();
        eprintln!("ℹ️  Observability disabled - console logging only");
        return;
    }

    if let Err(e) = std::fs::create_dir_all(LOG_DIR) {
        init_basic_console_logging();
        warn!(error = %e, dir = LOG_DIR, "Cannot create log directory, file logging disabled");
        return;
    }

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_filter(console_filter());

    let file_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "heightcert.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_filter(EnvFilter::new("error"));

    // JSON file for log shippers
    let json_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "heightcert.json");
    let json_layer = fmt::layer()
        .json()
        .with_writer(json_appender)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    match init_tracer() {
        Ok(tracer) => {
            let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

            tracing_subscriber::registry()
                .with(console_layer)
                .with(file_layer)
                .with(json_layer)
                .with(otel_layer)
                .init();

            info!("Tracing initialized with OpenTelemetry and file logging");
        }
        Err(e) => {
            eprintln!(
                "⚠️  Failed to initialize OpenTelemetry: {}. Continuing without tracing...",
                e
            );

            tracing_subscriber::registry()
                .with(console_layer)
                .with(file_layer)
                .with(json_layer)
                .init();

            warn!("Tracing initialized without OpenTelemetry (file logging only)");
        }
    }
}

pub async fn shutdown_tracer() {
    if !is_observability_enabled() {
        return;
    }
    info!("Shutting down OpenTelemetry tracer...");
    global::shutdown_tracer_provider();
}
