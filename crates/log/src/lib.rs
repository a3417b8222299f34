//! Stagehand Log - tracing subscriber setup
//!
//! One call wires a `tracing-subscriber` registry with an `EnvFilter` and a
//! pretty, compact or JSON formatter:
//!
//! ```rust,no_run
//! let _guard = stagehand_log::init(stagehand_log::Config::from_env())?;
//! tracing::info!("ready");
//! # Ok::<(), stagehand_log::LogError>(())
//! ```
#![forbid(unsafe_code)]

mod builder;
mod config;
mod error;

pub use builder::{LoggerGuard, init};
pub use config::{Config, ENV_FORMAT, ENV_LEVEL, Format};
pub use error::{LogError, LogResult};
