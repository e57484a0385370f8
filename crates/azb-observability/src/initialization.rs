// azblob-manager - Azure Blob Storage convenience layer
// Copyright (C) 2026 azblob-manager Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Logging initialization and setup.
//!
//! Library crates only emit `tracing` events; the entry point calls one of the
//! functions here once to install a global subscriber.

use crate::config::{LogConfig, LogError, LogFormat, LogOutput};
use azb_config::ObservabilitySettings;
use std::io;
use tracing::Subscriber;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Initialize tracing with the specified format and optional log level.
///
/// # Example
///
/// ```no_run
/// use azb_observability::{init_tracing, LogFormat};
///
/// init_tracing(LogFormat::Pretty, Some("debug")).unwrap();
/// tracing::info!("Application started");
/// ```
pub fn init_tracing(format: LogFormat, level: Option<&str>) -> Result<(), LogError> {
    let mut config = LogConfig::new().with_format(format);
    if let Some(level) = level {
        config = config.with_level(level);
    }
    init_tracing_with_config(config)
}

/// Initialize tracing from the `observability` section of the settings.
///
/// ```no_run
/// use azb_config::ConfigLoader;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = ConfigLoader::new().from_env()?;
/// azb_observability::init_from_settings(&settings.observability)?;
/// # Ok(())
/// # }
/// ```
pub fn init_from_settings(settings: &ObservabilitySettings) -> Result<(), LogError> {
    init_tracing_with_config(LogConfig::from_settings(settings)?)
}

/// Initialize tracing with a detailed configuration.
///
/// # Errors
///
/// Fails if the level filter cannot be parsed or a global subscriber is already set.
pub fn init_tracing_with_config(config: LogConfig) -> Result<(), LogError> {
    build_subscriber(&config)?
        .try_init()
        .map_err(|e| LogError::AlreadyInitialized(e.to_string()))
}

/// Build the subscriber without installing it.
///
/// Useful with [`tracing::subscriber::with_default`] to scope logging to a test.
pub fn build_subscriber(
    config: &LogConfig,
) -> Result<impl Subscriber + Send + Sync + 'static, LogError> {
    let env_filter = build_env_filter(config)?;
    Ok(Registry::default()
        .with(build_fmt_layer(config))
        .with(env_filter))
}

fn build_fmt_layer(config: &LogConfig) -> BoxedLayer {
    let layer = fmt::layer()
        .with_writer(get_writer(&config.output))
        .with_target(config.include_targets)
        .with_thread_ids(config.include_thread_ids)
        .with_ansi(config.use_color && config.format != LogFormat::Json);

    match (config.format, config.use_timestamps) {
        (LogFormat::Pretty, true) => layer
            .pretty()
            .with_thread_names(true)
            .with_span_events(FmtSpan::ACTIVE)
            .boxed(),
        (LogFormat::Pretty, false) => layer
            .pretty()
            .without_time()
            .with_thread_names(true)
            .with_span_events(FmtSpan::ACTIVE)
            .boxed(),
        (LogFormat::Compact, true) => layer
            .compact()
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        (LogFormat::Compact, false) => layer
            .compact()
            .without_time()
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        (LogFormat::Json, true) => layer
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        (LogFormat::Json, false) => layer
            .json()
            .without_time()
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    }
}

/// Get the writer for the specified output
fn get_writer(output: &LogOutput) -> fn() -> Box<dyn io::Write + Send> {
    match output {
        LogOutput::Stderr => || Box::new(io::stderr()),
        LogOutput::Stdout => || Box::new(io::stdout()),
    }
}

/// Build an environment filter for the given configuration
fn build_env_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    let level_str = config.get_effective_level();

    EnvFilter::try_new(&level_str)
        .map_err(|e| LogError::InvalidFilter(format!("'{}': {}", level_str, e)))
}
