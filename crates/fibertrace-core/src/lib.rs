//! # fibertrace-core
//!
//! Fiber-tree data model for simulated sparse tensor kernels.
//!
//! This crate provides:
//! - [`Fiber`]: an eager, ordered coordinate/payload sequence for one rank
//! - [`LazyFiber`]: a single-pass fiber produced on demand
//! - [`FiberSource`]: the operand trait accepted by merge operators
//! - [`Payload`]: scalar value or owned sub-fiber, with checked arithmetic
//! - [`RankAttrs`] and [`Format`]: per-rank metadata shared by fibers
//! - [`Tensor`]: a named tree of fibers built from coordinate entries
//!
//! ## Quick Start
//!
//! ```
//! use fibertrace_core::{Format, Tensor};
//!
//! let a = Tensor::from_entries("A", &["K"], &[5], vec![([0], 10), ([2], 20)]).unwrap();
//!
//! let stored: Vec<_> = a.root().iter().map(|(c, _)| c).collect();
//! assert_eq!(stored, vec![0, 2]);
//!
//! a.set_format("K", Format::U).unwrap();
//! assert_eq!(a.root().iter().count(), 5);
//! ```

#![deny(warnings)]

pub mod error;
pub mod fiber;
pub mod iterators;
pub mod lazy;
pub mod payload;
pub mod tensor;
pub mod types;

pub use error::{FiberError, PayloadError};
pub use fiber::Fiber;
pub use iterators::{Cursor, Entries, FiberIter, ShapeIter, Ticked};
pub use lazy::{BoxedStream, FiberSource, LazyFiber, OwnedStream};
pub use payload::{Occupancy, Payload};
pub use tensor::Tensor;
pub use types::{Coord, Format, Point, RankAttrs, RankRef};
