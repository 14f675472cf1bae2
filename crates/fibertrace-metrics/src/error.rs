//! Error types for metrics collection and trace persistence
//!
//! # Design
//!
//! - **Contract errors**: misuse of the session lifecycle or of the declared
//!   loop order (`NotCollecting`, `UnknownRank`, `CacheTooSmall`)
//! - **Storage errors**: trace files that cannot be opened or written (`Io`)
//!
//! # Examples
//!
//! ```
//! use fibertrace_metrics::{Metrics, MetricsError};
//!
//! let metrics = Metrics::new();
//! let err = metrics.set_num_cached_uses(1).unwrap_err();
//! assert!(matches!(err, MetricsError::CacheTooSmall { size: 1 }));
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the metrics subsystem
#[derive(Error, Debug)]
pub enum MetricsError {
    /// An operation that needs an active session was called outside one
    #[error("Metrics collection is not active: call begin_collect() first ({operation})")]
    NotCollecting { operation: &'static str },

    /// The rank is not part of the declared loop order
    #[error("Rank '{rank}' is not in the loop order {loop_order:?}")]
    UnknownRank {
        rank: String,
        loop_order: Vec<String>,
    },

    /// The trace cache must hold at least two uses
    #[error("Number of cached uses must be > 1, got {size}")]
    CacheTooSmall { size: usize },

    /// A trace file could not be opened or written
    #[error("Trace I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;

impl MetricsError {
    /// Create an unknown-rank error
    pub fn unknown_rank(rank: &str, loop_order: &[String]) -> Self {
        MetricsError::UnknownRank {
            rank: rank.to_string(),
            loop_order: loop_order.to_vec(),
        }
    }

    /// Wrap an I/O failure with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MetricsError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_too_small_message() {
        let err = MetricsError::CacheTooSmall { size: 1 };
        assert_eq!(err.to_string(), "Number of cached uses must be > 1, got 1");
    }

    #[test]
    fn test_unknown_rank_message() {
        let err = MetricsError::unknown_rank("K", &["M".to_string(), "N".to_string()]);
        assert_eq!(
            err.to_string(),
            "Rank 'K' is not in the loop order [\"M\", \"N\"]"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err = MetricsError::io(
            "/nowhere/trace.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.source().is_some());
        assert!(err.to_string().contains("trace.csv"));
    }
}
