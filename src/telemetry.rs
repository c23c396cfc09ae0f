use std::path::PathBuf;
use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{MetricExporter, SpanExporter};
use opentelemetry_sdk::{Resource, metrics::SdkMeterProvider, trace::SdkTracerProvider};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

const SERVICE_NAME: &str = "sitecheck";
const DEFAULT_FILTER: &str = "warn";

/// Where log output goes besides stderr
#[derive(Debug, Default)]
pub struct TelemetryOptions {
    /// Directory for a daily-rotated `sitecheck.log`
    pub log_dir: Option<PathBuf>,

    /// Export traces and metrics over OTLP/HTTP
    pub otel: bool,
}

fn get_resource() -> Resource {
    static RESOURCE: OnceLock<Resource> = OnceLock::new();
    RESOURCE
        .get_or_init(|| Resource::builder().with_service_name(SERVICE_NAME).build())
        .clone()
}

fn init_traces() -> anyhow::Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder().with_http().build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(get_resource())
        .build())
}

fn init_metrics() -> anyhow::Result<SdkMeterProvider> {
    let exporter = MetricExporter::builder().with_http().build()?;

    Ok(SdkMeterProvider::builder()
        .with_periodic_exporter(exporter)
        .with_resource(get_resource())
        .build())
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

// Keep the exporter's own HTTP stack out of exported telemetry.
fn otel_filter() -> anyhow::Result<EnvFilter> {
    Ok(filter()
        .add_directive("hyper=off".parse()?)
        .add_directive("reqwest=off".parse()?)
        .add_directive("opentelemetry=off".parse()?))
}

/// Install the global subscriber
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes the file writer and shuts the OTLP providers down.
pub fn init_tracing_subscriber(options: &TelemetryOptions) -> anyhow::Result<TelemetryGuard> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter());

    let (file_layer, file_guard) = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "sitecheck.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let providers = if options.otel {
        Some((init_traces()?, init_metrics()?))
    } else {
        None
    };

    let trace_filter = otel_filter()?;
    let metrics_filter = otel_filter()?;

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(providers.as_ref().map(|(tracer_provider, _)| {
            OpenTelemetryLayer::new(tracer_provider.tracer(SERVICE_NAME)).with_filter(trace_filter)
        }))
        .with(providers.as_ref().map(|(_, meter_provider)| {
            MetricsLayer::new(meter_provider.clone()).with_filter(metrics_filter)
        }))
        .try_init()?;

    Ok(TelemetryGuard {
        providers,
        _file_guard: file_guard,
    })
}

pub struct TelemetryGuard {
    providers: Option<(SdkTracerProvider, SdkMeterProvider)>,
    _file_guard: Option<WorkerGuard>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some((tracer_provider, meter_provider)) = self.providers.take() {
            if let Err(err) = tracer_provider.shutdown() {
                eprintln!("{err:?}");
            }
            if let Err(err) = meter_provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
