//! Tracing subscriber installation.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::Filter {
        filter: config.log_level.clone(),
        message: e.to_string(),
    })
}

/// Install the global tracing subscriber.
///
/// Exactly one of the json and human-readable layers is active. Fails if the
/// filter does not parse or a subscriber is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;
    let source = config.with_source_location;

    let json = config.json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_file(source)
            .with_line_number(source)
    });
    let human = (!config.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_file(source)
            .with_line_number(source)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(human)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        filter = %config.log_level,
        json = config.json_logs,
        "logging ready"
    );
    Ok(())
}
