//! Eagerly materialized fibers
//!
//! A [`Fiber`] is one rank of one subtree of a tensor: parallel vectors of
//! coordinates and payloads, a default payload returned for absent
//! coordinates, and a shared handle to the rank's [`RankAttrs`](crate::RankAttrs).
//!
//! Merge operators require fibers that are ordered (non-decreasing
//! coordinates) and unique (no repeated coordinate). Both flags are derived
//! when the fiber is built and maintained by [`Fiber::insert`].
//!
//! # Examples
//!
//! ```
//! use fibertrace_core::{Fiber, RankAttrs};
//!
//! let rank = RankAttrs::new("K").shared();
//! let fiber = Fiber::new(rank, vec![0, 2, 4], vec![10, 20, 40], 0).unwrap();
//!
//! assert_eq!(fiber.payload(2), Some(&20));
//! assert_eq!(fiber.payload_or_default(3), &0);
//! assert_eq!(fiber.max_coord(), Some(4));
//! ```

use std::rc::Rc;

use anyhow::{bail, Result};

use crate::error::FiberError;
use crate::types::{Coord, RankRef};

/// Ordered sequence of coordinate/payload pairs for one rank
#[derive(Debug, Clone)]
pub struct Fiber<P> {
    rank: RankRef,
    coords: Vec<Coord>,
    payloads: Vec<P>,
    default: P,
    ordered: bool,
    unique: bool,
}

impl<P> Fiber<P> {
    /// Build a fiber from parallel coordinate and payload vectors
    ///
    /// # Errors
    ///
    /// [`FiberError::LengthMismatch`] if the vectors differ in length.
    pub fn new(rank: RankRef, coords: Vec<Coord>, payloads: Vec<P>, default: P) -> Result<Self> {
        if coords.len() != payloads.len() {
            bail!(FiberError::LengthMismatch {
                coords: coords.len(),
                payloads: payloads.len(),
            });
        }

        let (ordered, unique) = classify(&coords);
        Ok(Self {
            rank,
            coords,
            payloads,
            default,
            ordered,
            unique,
        })
    }

    /// Build a fiber from coordinate/payload pairs
    pub fn from_pairs<I>(rank: RankRef, pairs: I, default: P) -> Self
    where
        I: IntoIterator<Item = (Coord, P)>,
    {
        let (coords, payloads): (Vec<Coord>, Vec<P>) = pairs.into_iter().unzip();
        let (ordered, unique) = classify(&coords);
        Self {
            rank,
            coords,
            payloads,
            default,
            ordered,
            unique,
        }
    }

    /// Empty fiber of `rank`
    pub fn empty(rank: RankRef, default: P) -> Self {
        Self {
            rank,
            coords: Vec::new(),
            payloads: Vec::new(),
            default,
            ordered: true,
            unique: true,
        }
    }

    /// Replace the default payload
    pub fn with_default(mut self, default: P) -> Self {
        self.default = default;
        self
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    pub fn payloads(&self) -> &[P] {
        &self.payloads
    }

    /// Stored payloads, mutable in place; coordinates are not exposed
    pub fn payloads_mut(&mut self) -> &mut [P] {
        &mut self.payloads
    }

    /// Payload returned for coordinates that hold no entry
    pub fn default_payload(&self) -> &P {
        &self.default
    }

    pub fn rank(&self) -> &RankRef {
        &self.rank
    }

    /// Id of this fiber's rank
    pub fn rank_id(&self) -> &str {
        self.rank.id()
    }

    /// Attach the fiber to a different rank
    pub fn set_rank(&mut self, rank: RankRef) {
        self.rank = rank;
    }

    /// Whether both fibers share the same rank attributes
    pub fn same_rank<Q>(&self, other: &Fiber<Q>) -> bool {
        Rc::ptr_eq(&self.rank, &other.rank)
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Largest stored coordinate
    pub fn max_coord(&self) -> Option<Coord> {
        if self.ordered {
            self.coords.last().copied()
        } else {
            self.coords.iter().max().copied()
        }
    }

    /// Extent iterated in `U` format
    ///
    /// The declared shape of the rank, else one past the largest stored
    /// coordinate.
    pub fn shape(&self) -> usize {
        self.rank
            .shape()
            .unwrap_or_else(|| self.max_coord().map_or(0, |c| c + 1))
    }

    /// Index of `coord` in the storage vectors
    pub fn position(&self, coord: Coord) -> Option<usize> {
        if self.ordered {
            self.coords.binary_search(&coord).ok()
        } else {
            self.coords.iter().position(|&c| c == coord)
        }
    }

    /// Stored payload at `coord`, without synthesizing a default
    pub fn payload(&self, coord: Coord) -> Option<&P> {
        self.position(coord).map(|i| &self.payloads[i])
    }

    /// Stored payload at `coord`, or the default payload
    pub fn payload_or_default(&self, coord: Coord) -> &P {
        self.payload(coord).unwrap_or(&self.default)
    }

    /// Mutable stored payload at `coord`
    pub fn payload_mut(&mut self, coord: Coord) -> Option<&mut P> {
        self.position(coord).map(move |i| &mut self.payloads[i])
    }

    /// Store `payload` at `coord`
    ///
    /// Ordered fibers stay ordered. Returns the payload previously stored
    /// at `coord`, if any.
    pub fn insert(&mut self, coord: Coord, payload: P) -> Option<P> {
        if let Some(i) = self.position(coord) {
            return Some(std::mem::replace(&mut self.payloads[i], payload));
        }

        if self.ordered {
            let i = self.coords.partition_point(|&c| c < coord);
            self.coords.insert(i, coord);
            self.payloads.insert(i, payload);
        } else {
            self.coords.push(coord);
            self.payloads.push(payload);
        }
        None
    }

    /// Stored entries with mutable payloads, in storage order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Coord, &mut P)> + '_ {
        self.coords.iter().copied().zip(self.payloads.iter_mut())
    }

    /// Split into rank, coordinates, payloads and default
    pub fn into_parts(self) -> (RankRef, Vec<Coord>, Vec<P>, P) {
        (self.rank, self.coords, self.payloads, self.default)
    }

    pub(crate) fn flags(&self) -> (bool, bool) {
        (self.ordered, self.unique)
    }
}

impl<P: PartialEq> PartialEq for Fiber<P> {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords
            && self.payloads == other.payloads
            && self.default == other.default
    }
}

fn classify(coords: &[Coord]) -> (bool, bool) {
    let ordered = coords.windows(2).all(|w| w[0] <= w[1]);
    let unique = if ordered {
        coords.windows(2).all(|w| w[0] != w[1])
    } else {
        let mut sorted = coords.to_vec();
        sorted.sort_unstable();
        sorted.windows(2).all(|w| w[0] != w[1])
    };
    (ordered, unique)
}
