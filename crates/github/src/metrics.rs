use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

pub static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "github_requests_total",
        "GitHub API requests by endpoint and response status",
        &["endpoint", "status"]
    )
    .expect("github requests total")
});

pub static LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "github_request_latency_seconds",
        "GitHub API request latency by endpoint",
        &["endpoint"]
    )
    .expect("github latency")
});
