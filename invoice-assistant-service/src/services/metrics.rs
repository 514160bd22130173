//! Prometheus metrics for invoice-assistant-service.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Request metrics
pub static ASSISTANT_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Model metrics
pub static MODEL_TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static MODEL_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static MODEL_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static UNPARSEABLE_REPLIES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Store metrics
pub static STORE_OPERATION_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static STORE_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HISTORY_LOAD_FALLBACKS_TOTAL: OnceLock<IntCounter> = OnceLock::new();

/// Initialize all metrics. Call once at startup; later calls keep the first
/// registry.
pub fn init_metrics() {
    if REGISTRY.get().is_some() {
        return;
    }

    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new(
            "assistant_requests_total",
            "Total handled requests by endpoint and outcome",
        ),
        &["endpoint", "outcome"], // outcome: ok, client_error, server_error
    )
    .expect("Failed to create assistant_requests_total metric");

    // Input/output tokens by tenant and model
    let model_tokens = IntCounterVec::new(
        Opts::new("model_tokens_total", "Total tokens processed by the model backend"),
        &["tenant_id", "model", "type"],
    )
    .expect("Failed to create model_tokens_total metric");

    let model_latency = HistogramVec::new(
        HistogramOpts::new("model_latency_seconds", "Model backend latency in seconds")
            .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["provider", "model"],
    )
    .expect("Failed to create model_latency_seconds metric");

    let model_errors = IntCounterVec::new(
        Opts::new("model_errors_total", "Total model backend errors"),
        &["provider", "error_type"],
    )
    .expect("Failed to create model_errors_total metric");

    let unparseable_replies = IntCounterVec::new(
        Opts::new(
            "model_unparseable_replies_total",
            "Model replies that did not match the invoice schema",
        ),
        &["endpoint"],
    )
    .expect("Failed to create model_unparseable_replies_total metric");

    let store_duration = HistogramVec::new(
        HistogramOpts::new(
            "store_operation_duration_seconds",
            "Tenant store operation duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["operation"],
    )
    .expect("Failed to create store_operation_duration_seconds metric");

    let store_errors = IntCounterVec::new(
        Opts::new("store_errors_total", "Total tenant store errors"),
        &["operation"],
    )
    .expect("Failed to create store_errors_total metric");

    let history_fallbacks = IntCounter::new(
        "history_load_fallbacks_total",
        "History loads that failed and continued with an empty history",
    )
    .expect("Failed to create history_load_fallbacks_total metric");

    // Register all metrics
    registry
        .register(Box::new(requests_total.clone()))
        .expect("Failed to register assistant_requests_total");
    registry
        .register(Box::new(model_tokens.clone()))
        .expect("Failed to register model_tokens_total");
    registry
        .register(Box::new(model_latency.clone()))
        .expect("Failed to register model_latency_seconds");
    registry
        .register(Box::new(model_errors.clone()))
        .expect("Failed to register model_errors_total");
    registry
        .register(Box::new(unparseable_replies.clone()))
        .expect("Failed to register model_unparseable_replies_total");
    registry
        .register(Box::new(store_duration.clone()))
        .expect("Failed to register store_operation_duration_seconds");
    registry
        .register(Box::new(store_errors.clone()))
        .expect("Failed to register store_errors_total");
    registry
        .register(Box::new(history_fallbacks.clone()))
        .expect("Failed to register history_load_fallbacks_total");

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = ASSISTANT_REQUESTS_TOTAL.set(requests_total);
    let _ = MODEL_TOKENS_TOTAL.set(model_tokens);
    let _ = MODEL_LATENCY_SECONDS.set(model_latency);
    let _ = MODEL_ERRORS_TOTAL.set(model_errors);
    let _ = UNPARSEABLE_REPLIES_TOTAL.set(unparseable_replies);
    let _ = STORE_OPERATION_DURATION_SECONDS.set(store_duration);
    let _ = STORE_ERRORS_TOTAL.set(store_errors);
    let _ = HISTORY_LOAD_FALLBACKS_TOTAL.set(history_fallbacks);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record the outcome of a handled request.
pub fn record_request(endpoint: &str, outcome: &str) {
    if let Some(counter) = ASSISTANT_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[endpoint, outcome]).inc();
    }
}

/// Record token usage per tenant.
pub fn record_tokens(tenant_id: &str, model: &str, input_tokens: u32, output_tokens: u32) {
    if let Some(counter) = MODEL_TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[tenant_id, model, "input"])
            .inc_by(u64::from(input_tokens));
        counter
            .with_label_values(&[tenant_id, model, "output"])
            .inc_by(u64::from(output_tokens));
    }
}

pub fn record_model_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(histogram) = MODEL_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

pub fn record_model_error(provider: &str, error_type: &str) {
    if let Some(counter) = MODEL_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}

pub fn record_unparseable_reply(endpoint: &str) {
    if let Some(counter) = UNPARSEABLE_REPLIES_TOTAL.get() {
        counter.with_label_values(&[endpoint]).inc();
    }
}

pub fn record_store_operation(operation: &str, duration_secs: f64) {
    if let Some(histogram) = STORE_OPERATION_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[operation])
            .observe(duration_secs);
    }
}

pub fn record_store_error(operation: &str) {
    if let Some(counter) = STORE_ERRORS_TOTAL.get() {
        counter.with_label_values(&[operation]).inc();
    }
}

/// A history load failed and the request continued with no prior turns.
pub fn record_history_fallback() {
    if let Some(counter) = HISTORY_LOAD_FALLBACKS_TOTAL.get() {
        counter.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_recorded_series() {
        init_metrics();
        record_request("conversation", "ok");
        record_history_fallback();

        let text = get_metrics();
        assert!(text.contains("assistant_requests_total"));
        assert!(text.contains("history_load_fallbacks_total"));
    }
}
