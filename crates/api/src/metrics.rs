use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec};

use crate::error::{ApiError, ApiResult};

pub static SIWE_VERIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "api_siwe_verifications_total",
        "Sign-in attempts by outcome",
        &["outcome"]
    )
    .expect("siwe verifications counter")
});

pub static REPOSITORY_CACHE: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "api_repository_cache_total",
        "Repository lookups served from the store (hit) or fetched from the platform (miss)",
        &["result"]
    )
    .expect("repository cache counter")
});

pub fn render() -> ApiResult<impl IntoResponse> {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    let content_type = encoder.format_type().to_string();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(ApiError::internal)?;
    Ok((StatusCode::OK, [(CONTENT_TYPE, content_type)], buffer))
}
