use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{
    BuildError as PrometheusBuildError, PrometheusBuilder, PrometheusHandle,
};
use std::fmt as stdfmt;
use tracing_subscriber::{
    fmt::{self as tracing_fmt, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use dbginit_util::{AppConfig, Environment};

#[derive(Debug)]
pub enum TelemetryError {
    Tracing(tracing_subscriber::util::TryInitError),
    Metrics(PrometheusBuildError),
}

impl stdfmt::Display for TelemetryError {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        match self {
            Self::Tracing(err) => write!(f, "failed to initialize tracing: {err}"),
            Self::Metrics(err) => write!(f, "failed to initialize prometheus recorder: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {}

impl From<tracing_subscriber::util::TryInitError> for TelemetryError {
    fn from(value: tracing_subscriber::util::TryInitError) -> Self {
        Self::Tracing(value)
    }
}

impl From<PrometheusBuildError> for TelemetryError {
    fn from(value: PrometheusBuildError) -> Self {
        Self::Metrics(value)
    }
}

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Installs the global subscriber. Events go to stderr so stdout carries only
/// the status document and the metrics dump.
///
/// Human-readable output outside production, one JSON object per event in
/// production. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = config.environment == Environment::Production;

    let pretty_layer = (!json).then(|| {
        tracing_fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_timer(UtcTime::rfc_3339())
            .event_format(tracing_fmt::format().pretty())
    });
    let json_layer = json.then(|| {
        tracing_fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_timer(UtcTime::rfc_3339())
            .json()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(pretty_layer)
        .with(json_layer)
        .try_init()?;

    tracing::info!(
        stage = "telemetry",
        env = %config.environment.as_str(),
        version = BUILD_VERSION,
        "tracing initialized"
    );
    Ok(())
}

/// Installs the Prometheus recorder used by the lifetime manager's counters
/// and histograms. Called at most once per process.
pub fn init_metrics() -> Result<PrometheusHandle, TelemetryError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(
        "initializer_runs_total",
        "Count of tier initializations, labelled by tier and result"
    );
    describe_histogram!(
        "initializer_duration_seconds",
        "Time spent initializing each tier in seconds"
    );
    describe_counter!(
        "initializer_terminations_total",
        "Count of tier terminations, labelled by tier"
    );

    Ok(handle)
}

/// Renders the recorded lifecycle metrics in the Prometheus text format.
pub fn render_metrics(handle: &PrometheusHandle) -> String {
    let mut body = handle.render();
    if !body.is_empty() && !body.ends_with('\n') {
        body.push('\n');
    }
    body.push_str("# TYPE dbginit_build_info gauge\n");
    body.push_str(&format!("dbginit_build_info{{version=\"{BUILD_VERSION}\"}} 1\n"));
    body
}
