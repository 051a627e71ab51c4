//! # Telemetry Features
//!
//! Console logging through `tracing_subscriber::fmt` is always installed.
//! OpenTelemetry export is optional and selected with cargo features.
//!
//! ## Feature matrix
//!
//! - `tracing`: Enables OpenTelemetry distributed tracing (via spans).
//! - `metrics`: Enables OpenTelemetry metrics (via counters, histograms, etc.).
//! - `otlp`: Enables the OTLP/gRPC exporter. The endpoint, headers and
//!   timeout come from the standard `OTEL_EXPORTER_OTLP_*` variables.
//! - `stdout`: Enables the stdout exporter.
//!
//! ## Feature constraints
//!
//! - Exporters require using at least one of: `tracing` or `metrics`.
//! - Both `otlp` and `stdout` exporters can be enabled at the same time.
//!
//! ## Metrics
//!
//! | name | kind | meaning |
//! |------|------|---------|
//! | `list_requests` | counter | `List` streams opened |
//! | `streams_inflight` | up/down counter | concurrent `List` streams |
//! | `stream_errors` | counter | streams ended by an error |
//! | `stream_duration` | histogram (ms) | lifetime of a `List` stream |
//! | `filter_validation_failures` | counter | requests answered with a filter error |
//! | `results_per_page` | histogram | products returned per page |
//! | `products_ingested` | counter | records upserted by `Fetch` |
//! | `fetch_errors` | counter | failed `Fetch` calls |
//!
//! Every recording helper compiles to a no-op without `metrics`.
//!
//! ## Example usage
//!
//! ```bash
//! cargo run --features tracing,metrics,otlp
//! cargo run --features tracing,stdout
//! ```

// Disallow using `otlp` without `tracing` or `metrics`
#[cfg(all(feature = "otlp", not(any(feature = "tracing", feature = "metrics"))))]
compile_error!("The 'otlp' feature requires at least one of 'tracing' or 'metrics' to be enabled.");

// Disallow using `stdout` without `tracing` or `metrics`
#[cfg(all(feature = "stdout", not(any(feature = "tracing", feature = "metrics"))))]
compile_error!(
    "The 'stdout' feature requires at least one of 'tracing' or 'metrics' to be enabled."
);

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(all(feature = "otlp", any(feature = "metrics", feature = "tracing")))]
use anyhow::Context;

// Metrics-specific imports
#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Counter, Histogram, Meter, UpDownCounter};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::metrics as sdkmetrics;
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

// Either
#[cfg(any(feature = "metrics", feature = "tracing"))]
use opentelemetry::{InstrumentationScope, KeyValue};
#[cfg(any(feature = "metrics", feature = "tracing"))]
use opentelemetry_sdk::Resource;
#[cfg(any(feature = "metrics", feature = "tracing"))]
use opentelemetry_semantic_conventions as semvcns;

// Tracing-specific imports
#[cfg(feature = "tracing")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "tracing")]
use opentelemetry_sdk::propagation::TraceContextPropagator;
#[cfg(feature = "tracing")]
use opentelemetry_sdk::trace as sdktrace;

const SERVICE_NAME: &str = "catalog";

/// Exporter handles that must be flushed before the process exits.
pub struct TelemetryProviders {
    #[cfg(feature = "tracing")]
    pub tracer_provider: sdktrace::SdkTracerProvider,
    #[cfg(feature = "metrics")]
    pub meter_provider: sdkmetrics::SdkMeterProvider,
}

impl TelemetryProviders {
    /// Flushes and shuts down every enabled exporter. Failures are printed to
    /// stderr since the subscriber may already be gone.
    pub fn shutdown(&self) {
        #[cfg(feature = "tracing")]
        {
            if let Err(err) = self.tracer_provider.force_flush() {
                eprintln!("Error flushing traces: {err:#?}");
            }
            if let Err(err) = self.tracer_provider.shutdown() {
                eprintln!("Error shutting down tracer: {err:#?}");
            }
        }

        #[cfg(feature = "metrics")]
        {
            if let Err(err) = self.meter_provider.force_flush() {
                eprintln!("Error flushing metrics: {err:#?}");
            }
            if let Err(err) = self.meter_provider.shutdown() {
                eprintln!("Error shutting down meter: {err:#?}");
            }
        }
    }
}

pub fn init_telemetry() -> anyhow::Result<TelemetryProviders> {
    #[cfg(feature = "tracing")]
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    #[cfg(feature = "tracing")]
    let tracer_provider = init_tracer()?;

    #[cfg(feature = "metrics")]
    let meter_provider = init_metrics()?;

    #[cfg(any(feature = "metrics", feature = "tracing"))]
    let scope = InstrumentationScope::builder(SERVICE_NAME)
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_schema_url(semvcns::SCHEMA_URL)
        .build();

    // The console layer is independent of the `stdout` exporter: it prints
    // events in human-readable form whatever else is enabled.
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty(),
        );

    #[cfg(feature = "tracing")]
    let registry = {
        opentelemetry::global::set_tracer_provider(tracer_provider.clone());
        registry.with(
            tracing_opentelemetry::layer()
                .with_tracer(tracer_provider.tracer_with_scope(scope.clone()))
                .with_error_records_to_exceptions(true),
        )
    };

    #[cfg(feature = "metrics")]
    let registry = {
        opentelemetry::global::set_meter_provider(meter_provider.clone());
        let meter = opentelemetry::global::meter_with_scope(scope);
        init_metric_handles(&meter);

        registry.with(tracing_opentelemetry::MetricsLayer::new(
            meter_provider.clone(),
        ))
    };

    registry.try_init()?;

    Ok(TelemetryProviders {
        #[cfg(feature = "tracing")]
        tracer_provider,
        #[cfg(feature = "metrics")]
        meter_provider,
    })
}

#[cfg(any(feature = "metrics", feature = "tracing"))]
fn resource() -> Resource {
    Resource::builder()
        .with_service_name(SERVICE_NAME)
        .with_schema_url(
            [KeyValue::new(
                semvcns::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            )],
            semvcns::SCHEMA_URL,
        )
        .build()
}

#[cfg(feature = "metrics")]
fn init_metrics() -> anyhow::Result<sdkmetrics::SdkMeterProvider> {
    let builder = sdkmetrics::SdkMeterProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::MetricExporter;
        let exporter = MetricExporter::default();
        let reader = sdkmetrics::PeriodicReader::builder(exporter)
            .with_interval(std::time::Duration::from_secs(5))
            .build();

        builder.with_reader(reader)
    };

    #[cfg(feature = "otlp")]
    let builder = {
        let exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_tonic()
            .build()
            .context("failed to build metrics exporter")?;

        builder.with_periodic_exporter(exporter)
    };

    Ok(builder.build())
}

#[cfg(feature = "tracing")]
fn batch_config() -> sdktrace::BatchConfig {
    sdktrace::BatchConfigBuilder::default()
        .with_scheduled_delay(std::time::Duration::from_secs(5))
        .with_max_queue_size(2048)
        .build()
}

#[cfg(feature = "tracing")]
fn init_tracer() -> anyhow::Result<sdktrace::SdkTracerProvider> {
    let builder = sdktrace::SdkTracerProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::SpanExporter;
        let batch = sdktrace::BatchSpanProcessor::builder(SpanExporter::default())
            .with_batch_config(batch_config())
            .build();
        builder.with_span_processor(batch)
    };

    #[cfg(feature = "otlp")]
    let builder = {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .build()
            .context("failed to build tracer exporter")?;
        let batch = sdktrace::BatchSpanProcessor::builder(exporter)
            .with_batch_config(batch_config())
            .build();

        builder.with_span_processor(batch)
    };

    Ok(builder.build())
}

// Metric handles - only compiled when metrics feature is enabled
#[cfg(feature = "metrics")]
static LIST_REQUESTS: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static STREAMS_INFLIGHT: OnceLock<UpDownCounter<i64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static STREAM_ERRORS: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static STREAM_DURATION_MS: OnceLock<Histogram<f64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static FILTER_VALIDATION_FAILURES: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static RESULTS_PER_PAGE: OnceLock<Histogram<f64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static PRODUCTS_INGESTED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static FETCH_ERRORS: OnceLock<Counter<u64>> = OnceLock::new();

#[cfg(feature = "metrics")]
fn init_metric_handles(meter: &Meter) {
    let _ = LIST_REQUESTS.set(
        meter
            .u64_counter("list_requests")
            .with_description("Total List streams opened")
            .build(),
    );

    let _ = STREAMS_INFLIGHT.set(
        meter
            .i64_up_down_counter("streams_inflight")
            .with_description("Concurrent List streams")
            .build(),
    );

    let _ = STREAM_ERRORS.set(
        meter
            .u64_counter("stream_errors")
            .with_description("Errored/cancelled List streams")
            .build(),
    );

    let _ = STREAM_DURATION_MS.set(
        meter
            .f64_histogram("stream_duration")
            .with_unit("ms")
            .with_description("End-to-end List stream duration")
            .build(),
    );

    let _ = FILTER_VALIDATION_FAILURES.set(
        meter
            .u64_counter("filter_validation_failures")
            .with_description("List requests rejected by filter validation")
            .build(),
    );

    let _ = RESULTS_PER_PAGE.set(
        meter
            .f64_histogram("results_per_page")
            .with_description("Products returned per List response")
            .build(),
    );

    let _ = PRODUCTS_INGESTED.set(
        meter
            .u64_counter("products_ingested")
            .with_description("Product records upserted by Fetch")
            .build(),
    );

    let _ = FETCH_ERRORS.set(
        meter
            .u64_counter("fetch_errors")
            .with_description("Failed Fetch calls")
            .build(),
    );
}

// Convenience functions that compile to no-ops when metrics are disabled
#[cfg(feature = "metrics")]
pub fn increment_list_requests() {
    if let Some(counter) = LIST_REQUESTS.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_list_requests() {}

#[cfg(feature = "metrics")]
pub fn increment_streams_inflight() {
    if let Some(counter) = STREAMS_INFLIGHT.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_streams_inflight() {}

#[cfg(feature = "metrics")]
pub fn decrement_streams_inflight() {
    if let Some(counter) = STREAMS_INFLIGHT.get() {
        counter.add(-1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn decrement_streams_inflight() {}

#[cfg(feature = "metrics")]
pub fn increment_stream_errors() {
    if let Some(counter) = STREAM_ERRORS.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_stream_errors() {}

#[cfg(feature = "metrics")]
pub fn record_stream_duration(duration_ms: f64) {
    if let Some(histogram) = STREAM_DURATION_MS.get() {
        histogram.record(duration_ms, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn record_stream_duration(_duration_ms: f64) {}

#[cfg(feature = "metrics")]
pub fn increment_filter_validation_failures() {
    if let Some(counter) = FILTER_VALIDATION_FAILURES.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_filter_validation_failures() {}

#[cfg(feature = "metrics")]
pub fn record_results_per_page(count: f64) {
    if let Some(histogram) = RESULTS_PER_PAGE.get() {
        histogram.record(count, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn record_results_per_page(_count: f64) {}

#[cfg(feature = "metrics")]
pub fn increment_products_ingested(count: u64) {
    if let Some(counter) = PRODUCTS_INGESTED.get() {
        counter.add(count, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_products_ingested(_count: u64) {}

#[cfg(feature = "metrics")]
pub fn increment_fetch_errors() {
    if let Some(counter) = FETCH_ERRORS.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_fetch_errors() {}
