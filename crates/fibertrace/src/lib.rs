//! # fibertrace - Fibertree Merge Engine with Access Tracing
//!
//! Simulates how sparse tensor kernels walk and combine fiber trees, and
//! records the access statistics an accelerator would see: per-rank
//! iteration counts, skipped comparisons and reuse traces.
//!
//! This is the **meta crate** that re-exports all fibertrace components for
//! convenient access.
//!
//! ## Quick Start
//!
//! ```
//! use fibertrace::prelude::*;
//!
//! let metrics = Metrics::new();
//! metrics.begin_collect("dot", &["K"]);
//!
//! let a = Tensor::from_entries("A", &["K"], &[8], vec![([1], 2), ([4], 3)])?;
//! let b = Tensor::from_entries("B", &["K"], &[8], vec![([4], 5), ([6], 1)])?;
//!
//! let mut dot = 0;
//! for (_, (x, y)) in intersect(&metrics, a.root(), b.root())? {
//!     dot += x.value()? * y.value()?;
//! }
//! assert_eq!(dot, 15);
//!
//! metrics.end_collect()?;
//! assert_eq!(metrics.dump()["Rank K"]["successful_intersect"], 1);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### Fiber Trees ([`core`])
//!
//! Eager and lazy fibers, rank attributes, payloads and tensors.
//!
//! ```
//! use fibertrace::core::{Fiber, RankAttrs};
//!
//! let rank = RankAttrs::new("K").shared();
//! let fiber = Fiber::new(rank, vec![0, 3], vec![1.5, 2.5], 0.0).unwrap();
//! assert_eq!(fiber.payload_or_default(1), &0.0);
//! ```
//!
//! ### Merge Operators ([`merge`])
//!
//! Intersection, union, exclusive-or, difference, assignment and their
//! variadic folds.
//!
//! ```
//! use fibertrace::core::{Fiber, RankAttrs};
//! use fibertrace::merge::{xor, Mask};
//! use fibertrace::metrics::Metrics;
//!
//! let k = RankAttrs::new("K").shared();
//! let a = Fiber::new(k.clone(), vec![0, 1], vec![1, 1], 0).unwrap();
//! let b = Fiber::new(k, vec![1, 2], vec![1, 1], 0).unwrap();
//!
//! let masks: Vec<_> = xor(&Metrics::new(), &a, &b).unwrap().map(|(_, (m, _, _))| m).collect();
//! assert_eq!(masks, vec![Mask::A, Mask::B]);
//! ```
//!
//! ### Metrics ([`metrics`])
//!
//! Collection sessions, counters, iteration/point vectors and per-rank
//! reuse traces written as CSV.
//!
//! ## Features
//!
//! - `tracing` (default): structured logging of session events
//! - `serde`: `Serialize`/`Deserialize` for value types
//! - `full`: Enable all features

#![deny(warnings)]

pub use fibertrace_core as core;
pub use fibertrace_merge as merge;
pub use fibertrace_metrics as metrics;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use fibertrace::prelude::*;
    //!
    //! let metrics = Metrics::new();
    //! let rank = RankAttrs::new("K").shared();
    //! let fiber: Fiber<i32> = Fiber::empty(rank, 0);
    //! assert_eq!(intersect(&metrics, &fiber, &fiber).unwrap().count(), 0);
    //! ```

    // Fiber trees
    pub use crate::core::{Coord, Fiber, FiberSource, Format, LazyFiber, Payload, RankAttrs, Tensor};

    // Merge operators
    pub use crate::merge::{
        assign_from, difference, intersect, intersect_all, union, union_all, xor, Mask,
    };

    // Metrics
    pub use crate::metrics::{Metrics, MetricsConfig};
}
