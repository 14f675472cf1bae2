//! # fibertrace-merge
//!
//! Instrumented merge operators over ordered, unique fibers.
//!
//! This crate provides:
//! - [`intersect`], [`union`], [`xor`], [`difference`]: two-pointer merges
//!   returning a [`LazyFiber`](fibertrace_core::LazyFiber)
//! - [`assign_from`]: a lending cursor that populates an eager fiber from
//!   another, inserting entries only where the result is occupied
//! - [`intersect_all`] and [`union_all`]: left folds over any number of
//!   operands with flattened payloads
//! - [`Mask`]: which operands contributed to a union element
//!
//! Every operator takes the [`Metrics`](fibertrace_metrics::Metrics)
//! session explicitly and reports to it while the result is pulled.
//! Operands are anything implementing
//! [`FiberSource`](fibertrace_core::FiberSource), so a lazy result can feed
//! the next operator directly.
//!
//! ## Quick Start
//!
//! ```
//! use fibertrace_core::{Fiber, RankAttrs};
//! use fibertrace_merge::{assign_from, intersect};
//! use fibertrace_metrics::Metrics;
//!
//! let metrics = Metrics::new();
//! metrics.begin_collect("dot", &["K"]);
//!
//! let k = RankAttrs::new("K").shared();
//! let a = Fiber::new(k.clone(), vec![0, 2, 4], vec![1.0, 2.0, 3.0], 0.0).unwrap();
//! let b = Fiber::new(k.clone(), vec![2, 4, 6], vec![4.0, 5.0, 6.0], 0.0).unwrap();
//!
//! let dot: f64 = intersect(&metrics, &a, &b)
//!     .unwrap()
//!     .map(|(_, (x, y))| x * y)
//!     .sum();
//! assert_eq!(dot, 23.0);
//!
//! let mut z = Fiber::empty(k, 0.0);
//! assign_from(&metrics, &mut z, &a)
//!     .unwrap()
//!     .for_each(|_, z, a| *z += **a);
//! assert_eq!(z.coords(), &[0, 2, 4]);
//!
//! metrics.end_collect().unwrap();
//! assert_eq!(metrics.dump()["Rank K"]["successful_intersect"], 2);
//! ```

#![deny(warnings)]

pub mod assign;
pub mod difference;
pub mod error;
pub mod intersect;
pub mod mask;
mod probe;
pub mod union;
pub mod variadic;

pub use assign::{assign_from, Assign, AssignSlot};
pub use difference::{difference, Difference, DifferenceFiber};
pub use error::MergeError;
pub use intersect::{intersect, Intersect, IntersectFiber};
pub use mask::Mask;
pub use union::{union, xor, Union, UnionFiber};
pub use variadic::{intersect_all, union_all, IntersectAllFiber, UnionAllFiber};
