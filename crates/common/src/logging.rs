use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber: stderr formatting filtered by `RUST_LOG`
/// (falling back to `default_level`), plus OTLP span export when built with
/// the `otel` feature and `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
pub fn init_tracing(service: &str, default_level: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    #[cfg(feature = "otel")]
    if let Some(tracer) = otel::tracer(service) {
        registry
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .init();
        return;
    }

    let _ = service;
    registry.init();
}

/// Flushes pending spans. No-op without the `otel` feature.
pub fn shutdown_tracer_provider() {
    #[cfg(feature = "otel")]
    opentelemetry::global::shutdown_tracer_provider();
}

#[cfg(feature = "otel")]
mod otel {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{runtime, trace, Resource};

    pub(super) fn tracer(service: &str) -> Option<trace::Tracer> {
        std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;

        let resource = Resource::new(vec![KeyValue::new("service.name", service.to_string())]);
        match opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(trace::config().with_resource(resource))
            .install_batch(runtime::Tokio)
        {
            Ok(tracer) => Some(tracer),
            Err(err) => {
                eprintln!("otlp exporter disabled: {err}");
                None
            }
        }
    }
}
