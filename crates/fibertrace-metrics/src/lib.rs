//! # fibertrace-metrics
//!
//! Access-statistics collection for simulated sparse tensor kernels.
//!
//! This crate provides:
//! - [`Metrics`]: an explicit session handle with `begin_collect` /
//!   `end_collect`, named counters, an iteration vector and a point vector
//!   indexed by a declared loop order
//! - Per-rank reuse traces buffered in memory and persisted as CSV
//!   (`<prefix>-<rank>.csv`)
//! - [`MetricsConfig`] with environment-driven defaults
//! - Structured logging helpers ([`tracing_support`])
//!
//! ## Quick Start
//!
//! ```
//! use fibertrace_metrics::Metrics;
//!
//! let metrics = Metrics::new();
//! metrics.begin_collect("matmul", &["M", "N"]);
//!
//! metrics.inc_count("Rank K", "successful_intersect", 1);
//! metrics.inc_iter("N");
//!
//! metrics.end_collect().unwrap();
//! assert_eq!(metrics.dump()["Rank K"]["successful_intersect"], 1);
//! ```

#![deny(warnings)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod trace;
pub mod tracing_support;

pub use config::*;
pub use error::*;
pub use metrics::*;
pub use trace::RankTrace;
