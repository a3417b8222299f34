//! Subscriber installation

use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Format};
use crate::error::{LogError, LogResult};

/// Guard returned by [`init`]
///
/// Holds the root span for the lifetime of the process.
pub struct LoggerGuard {
    _root_span: tracing::span::EnteredSpan,
}

impl std::fmt::Debug for LoggerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerGuard").finish_non_exhaustive()
    }
}

/// Build and install the global subscriber
///
/// # Errors
///
/// Returns error if:
/// - Filter string cannot be parsed
/// - A global subscriber is already installed
pub fn init(config: Config) -> LogResult<LoggerGuard> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| LogError::Filter(format!("{}: {e}", config.level)))?;

    let registry = Registry::default().with(filter);

    let result = match config.format {
        Format::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(config.colors)
                    .with_target(config.target),
            )
            .try_init(),
        Format::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(config.colors)
                    .with_target(config.target),
            )
            .try_init(),
        Format::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_target(config.target),
            )
            .try_init(),
    };
    result.map_err(|e| LogError::Init(e.to_string()))?;

    let root = tracing::info_span!("stagehand", version = env!("CARGO_PKG_VERSION"));
    Ok(LoggerGuard {
        _root_span: root.entered(),
    })
}
