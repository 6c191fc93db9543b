//! Logging initialization
//!
//! Structured logging through `tracing`, configured from the environment:
//!
//! - `BOX_LOG`: an `EnvFilter` directive string, e.g. `box_build=debug`
//! - `BOX_LOG_FORMAT`: `pretty` (default) or `json`
//! - `BOX_LOG_INCLUDE_LOCATION`: `true` to add file:line to every event
//!
//! Output goes to stderr so command output on stdout stays machine-readable.

use anyhow::{Context, Result};
use std::env;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Env var holding the filter directives.
pub const LOG_ENV: &str = "BOX_LOG";

/// Log format: pretty for terminals, JSON for CI log collectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directives; a bare level such as `info` works too
    pub filter: String,
    pub format: LogFormat,
    /// Include file:line location
    pub include_location: bool,
}

impl LogConfig {
    /// Read `BOX_LOG*` variables. `verbose` picks the fallback level when
    /// `BOX_LOG` is unset.
    pub fn from_env(verbose: bool) -> Self {
        Self {
            filter: env::var(LOG_ENV).unwrap_or_else(|_| default_level(verbose).to_string()),
            format: LogFormat::parse(&env::var("BOX_LOG_FORMAT").unwrap_or_default()),
            include_location: env::var("BOX_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }
}

fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber from the environment.
pub fn init_logging(verbose: bool) -> Result<()> {
    init_logging_with_config(&LogConfig::from_env(verbose))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("Invalid log filter: {}", config.filter))?;

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}
