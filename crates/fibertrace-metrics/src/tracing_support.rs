//! Structured logging for metrics sessions and merge kernels
//!
//! Collection lifecycle events, trace flushes and latched errors are emitted
//! as `tracing` events when the `tracing` feature is enabled (default). With
//! the feature off, the `record_*` helpers compile to no-ops.
//!
//! # Example
//!
//! ```ignore
//! use fibertrace_metrics::tracing_support::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::default())?;
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directive (default: `fibertrace=info,warn`)
//! - `FIBERTRACE_LOG_FORMAT`: `json`, `compact` or `pretty` (default)

use anyhow::Result;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Pretty-printed human-readable format
    Pretty,
    /// JSON format for structured logging
    Json,
    /// Compact format (single line per event)
    Compact,
}

impl TracingFormat {
    /// Parse from string
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => TracingFormat::Json,
            "compact" => TracingFormat::Compact,
            _ => TracingFormat::Pretty,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Output format
    pub format: TracingFormat,
    /// Filter directive (e.g., "fibertrace_metrics=debug,info")
    pub filter: String,
    /// Enable ANSI colors
    pub with_ansi: bool,
    /// Show target module paths
    pub with_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        let format = std::env::var("FIBERTRACE_LOG_FORMAT")
            .map(|s| TracingFormat::parse(&s))
            .unwrap_or(TracingFormat::Pretty);

        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "fibertrace=info,warn".to_string());

        Self {
            format,
            filter,
            with_ansi: true,
            with_target: true,
        }
    }
}

/// Install a global subscriber for the given configuration
///
/// Fails if the filter does not parse or a global subscriber is already set.
#[cfg(feature = "tracing")]
pub fn init_tracing(config: TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)?;

    match config.format {
        TracingFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
        TracingFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_target(config.with_target)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
        TracingFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
    }

    Ok(())
}

/// Stub for when tracing feature is disabled
#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_config: TracingConfig) -> Result<()> {
    Ok(())
}

/// Record the start of a collection session
#[cfg(feature = "tracing")]
pub fn record_begin(prefix: &str, loop_order: &[String]) {
    tracing::info!(prefix = prefix, loop_order = ?loop_order, "metrics_collection_begin");
}

/// Stub for when tracing is disabled
#[cfg(not(feature = "tracing"))]
pub fn record_begin(_prefix: &str, _loop_order: &[String]) {}

/// Record the end of a collection session
#[cfg(feature = "tracing")]
pub fn record_end(prefix: &str, traced_ranks: usize, counters: usize) {
    tracing::info!(
        prefix = prefix,
        traced_ranks = traced_ranks,
        counters = counters,
        "metrics_collection_end"
    );
}

/// Stub for when tracing is disabled
#[cfg(not(feature = "tracing"))]
pub fn record_end(_prefix: &str, _traced_ranks: usize, _counters: usize) {}

/// Record a trace flush
#[cfg(feature = "tracing")]
pub fn record_flush(rank: &str, path: &std::path::Path, lines: usize) {
    tracing::debug!(rank = rank, path = %path.display(), lines = lines, "trace_flushed");
}

/// Stub for when tracing is disabled
#[cfg(not(feature = "tracing"))]
pub fn record_flush(_rank: &str, _path: &std::path::Path, _lines: usize) {}

/// Record an error that was deferred to `end_collect`
#[cfg(feature = "tracing")]
pub fn record_latched_error(error: &crate::MetricsError) {
    tracing::warn!(error = %error, "metrics_error_latched");
}

/// Stub for when tracing is disabled
#[cfg(not(feature = "tracing"))]
pub fn record_latched_error(_error: &crate::MetricsError) {}
