//! Prometheus metrics

use axum::{body::Body, http::Request, response::Response};
use lazy_static::lazy_static;
use prometheus::{self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use tracing::Span;

lazy_static! {
    // Registry for holding metric state
    pub static ref REGISTRY: Registry = Registry::new();
    // Simple request counter
    pub static ref INCOMING_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("incoming_requests", "The number of HTTP requests received"),
        &["http_method"]
    ).expect("valid metric definition");
    // Request counter by status code
    pub static ref RESPONSE_CODE_COLLECTOR: IntCounterVec = IntCounterVec::new(
        Opts::new("outgoing_response", "The number of responses sent."),
        &["status_code"]
    ).expect("valid metric definition");
    // Request histogram by response time
    pub static ref RESPONSE_TIME_COLLECTOR: HistogramVec = HistogramVec::new(
        HistogramOpts{
            common_opts: Opts::new("response_time", "The time taken to respond to each request"),
            buckets: prometheus::DEFAULT_BUCKETS.to_vec(),
        },
        &[],
    ).expect("valid metric definition");
    // Calls made to the pass API by operation and outcome
    pub static ref UPSTREAM_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("upstream_requests", "The number of requests sent to the pass API"),
        &["operation", "outcome"]
    ).expect("valid metric definition");
    // Pass API latency by operation
    pub static ref UPSTREAM_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts{
            common_opts: Opts::new("upstream_request_duration", "The time taken by each pass API request"),
            buckets: prometheus::DEFAULT_BUCKETS.to_vec(),
        },
        &["operation"],
    ).expect("valid metric definition");
}

/// Register all metrics with [REGISTRY].
///
/// Must be called at most once per process.
pub fn register_metrics() {
    REGISTRY
        .register(Box::new(INCOMING_REQUESTS.clone()))
        .expect("incoming_requests registered once");
    REGISTRY
        .register(Box::new(RESPONSE_CODE_COLLECTOR.clone()))
        .expect("outgoing_response registered once");
    REGISTRY
        .register(Box::new(RESPONSE_TIME_COLLECTOR.clone()))
        .expect("response_time registered once");
    REGISTRY
        .register(Box::new(UPSTREAM_REQUESTS.clone()))
        .expect("upstream_requests registered once");
    REGISTRY
        .register(Box::new(UPSTREAM_REQUEST_DURATION.clone()))
        .expect("upstream_request_duration registered once");
}

/// Render all registered metrics in the Prometheus text format.
pub async fn metrics_handler() -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("failed to encode metrics: {}", err);
    }

    String::from_utf8_lossy(&buffer).into_owned()
}

/// Increments the prometheus counter on all incoming requests, labelled by http method
pub fn request_counter(request: &Request<Body>, _span: &Span) {
    INCOMING_REQUESTS
        .with_label_values(&[&request.method().to_string().to_ascii_uppercase()])
        .inc();
}

/// Increment the prometheus counter on all outgoing responses, labelled by status code
pub fn record_response_metrics<B>(
    response: &Response<B>,
    latency: std::time::Duration,
    _span: &Span,
) {
    RESPONSE_CODE_COLLECTOR
        .with_label_values(&[response.status().as_str()])
        .inc();

    RESPONSE_TIME_COLLECTOR
        .with_label_values(&[])
        .observe(latency.as_secs_f64());
}

/// Record the outcome and latency of a single pass API request
///
/// # Arguments
///
/// * `operation`: Client operation name, e.g. `fetch_all`
/// * `outcome`: Short outcome label, e.g. `ok` or `not_found`
/// * `latency`: Time between sending the request and finishing with the response
pub fn record_upstream_request(operation: &str, outcome: &str, latency: std::time::Duration) {
    UPSTREAM_REQUESTS
        .with_label_values(&[operation, outcome])
        .inc();
    UPSTREAM_REQUEST_DURATION
        .with_label_values(&[operation])
        .observe(latency.as_secs_f64());
}
