//! Configuration for metrics sessions
//!
//! # Environment Variables
//!
//! - `FIBERTRACE_CACHED_USES`: number of trace lines buffered per rank before
//!   a flush (default: 1000, must be > 1)
//! - `FIBERTRACE_TRACE_DIR`: directory that trace files are written into
//!   (default: the trace prefix is used as a path as-is)

use std::path::{Path, PathBuf};

use crate::error::{MetricsError, MetricsResult};

/// Default number of trace lines buffered per rank
pub const DEFAULT_CACHED_USES: usize = 1000;

/// Metrics session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsConfig {
    /// Trace lines buffered per rank before the oldest are written out
    pub num_cached_uses: usize,
    /// Directory trace files are written into
    pub trace_dir: Option<PathBuf>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        let num_cached_uses = std::env::var("FIBERTRACE_CACHED_USES")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_CACHED_USES);

        let trace_dir = std::env::var_os("FIBERTRACE_TRACE_DIR").map(PathBuf::from);

        Self {
            num_cached_uses,
            trace_dir,
        }
    }
}

impl MetricsConfig {
    /// Configuration with the built-in defaults, ignoring the environment
    pub fn builtin() -> Self {
        Self {
            num_cached_uses: DEFAULT_CACHED_USES,
            trace_dir: None,
        }
    }

    /// Set the number of buffered trace lines per rank
    pub fn with_num_cached_uses(mut self, num_cached_uses: usize) -> Self {
        self.num_cached_uses = num_cached_uses;
        self
    }

    /// Set the directory trace files are written into
    pub fn with_trace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.trace_dir = Some(dir.into());
        self
    }

    /// Check the configuration invariants
    pub fn validate(&self) -> MetricsResult<()> {
        if self.num_cached_uses <= 1 {
            return Err(MetricsError::CacheTooSmall {
                size: self.num_cached_uses,
            });
        }
        Ok(())
    }

    /// Path of the trace file for `rank` under `prefix`
    ///
    /// Files are named `<prefix>-<rank>.csv`.
    pub fn trace_path(&self, prefix: &str, rank: &str) -> PathBuf {
        let file = format!("{prefix}-{rank}.csv");
        match &self.trace_dir {
            Some(dir) => dir.join(file),
            None => Path::new(&file).to_path_buf(),
        }
    }
}
