//! Iteration surfaces of eager fibers
//!
//! - [`Fiber::iter`] follows the rank's format: stored entries for `C`,
//!   every coordinate of the shape for `U`
//! - [`Fiber::iter_occupancy`] walks stored entries and can be reversed
//! - [`Fiber::iter_shape`] walks `0..shape`, synthesizing defaults
//! - [`Fiber::cursor`] resumes from a saved position and remembers where
//!   it stopped
//! - [`Fiber::iter_with`] / [`Ticked`] advance the rank's slot in the
//!   metrics iteration vector while the stream is consumed

use std::iter::FusedIterator;
use std::slice;

use anyhow::{bail, Result};
use fibertrace_metrics::Metrics;

use crate::error::FiberError;
use crate::fiber::Fiber;
use crate::types::{Coord, Format, RankAttrs};

impl<P> Fiber<P> {
    /// Format-aware iteration
    pub fn iter(&self) -> FiberIter<'_, P> {
        match self.rank().format() {
            Format::C => FiberIter::Occupancy(self.iter_occupancy()),
            Format::U => FiberIter::Shape(self.iter_shape()),
        }
    }

    /// Stored entries in storage order
    pub fn iter_occupancy(&self) -> Entries<'_, P> {
        Entries {
            coords: self.coords().iter(),
            payloads: self.payloads().iter(),
        }
    }

    /// Every coordinate of the shape, with the default payload where no
    /// entry is stored
    pub fn iter_shape(&self) -> ShapeIter<'_, P> {
        ShapeIter {
            fiber: self,
            next: 0,
            end: self.shape(),
        }
    }

    /// Format-aware iteration that ticks this rank in `metrics`
    pub fn iter_with(&self, metrics: &Metrics) -> Ticked<FiberIter<'_, P>> {
        Ticked::new(self.iter(), metrics, self.rank())
    }

    /// Stored entries starting at storage position `start_pos`
    ///
    /// # Errors
    ///
    /// [`FiberError::InvalidStartPosition`] if `start_pos` is not a valid
    /// storage position.
    pub fn cursor(&self, start_pos: usize) -> Result<Cursor<'_, P>> {
        if start_pos >= self.len() {
            bail!(FiberError::InvalidStartPosition {
                start_pos,
                len: self.len(),
            });
        }

        Ok(Cursor {
            fiber: self,
            start: start_pos,
            next: start_pos,
            saved: None,
        })
    }
}

impl<'a, P> IntoIterator for &'a Fiber<P> {
    type Item = (Coord, &'a P);
    type IntoIter = FiberIter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Stored entries of a fiber
#[derive(Debug, Clone)]
pub struct Entries<'a, P> {
    coords: slice::Iter<'a, Coord>,
    payloads: slice::Iter<'a, P>,
}

impl<'a, P> Iterator for Entries<'a, P> {
    type Item = (Coord, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        Some((*self.coords.next()?, self.payloads.next()?))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.coords.size_hint()
    }
}

impl<P> DoubleEndedIterator for Entries<'_, P> {
    fn next_back(&mut self) -> Option<Self::Item> {
        Some((*self.coords.next_back()?, self.payloads.next_back()?))
    }
}

impl<P> ExactSizeIterator for Entries<'_, P> {}
impl<P> FusedIterator for Entries<'_, P> {}

/// Every coordinate of a fiber's shape
#[derive(Debug, Clone)]
pub struct ShapeIter<'a, P> {
    fiber: &'a Fiber<P>,
    next: Coord,
    end: Coord,
}

impl<'a, P> Iterator for ShapeIter<'a, P> {
    type Item = (Coord, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let coord = self.next;
        self.next += 1;
        Some((coord, self.fiber.payload_or_default(coord)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end.saturating_sub(self.next);
        (n, Some(n))
    }
}

impl<P> ExactSizeIterator for ShapeIter<'_, P> {}

/// Iterator returned by [`Fiber::iter`]
#[derive(Debug, Clone)]
pub enum FiberIter<'a, P> {
    Occupancy(Entries<'a, P>),
    Shape(ShapeIter<'a, P>),
}

impl<'a, P> Iterator for FiberIter<'a, P> {
    type Item = (Coord, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            FiberIter::Occupancy(it) => it.next(),
            FiberIter::Shape(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            FiberIter::Occupancy(it) => it.size_hint(),
            FiberIter::Shape(it) => it.size_hint(),
        }
    }
}

/// Resumable iteration over stored entries
///
/// After each element the cursor remembers the storage position it came
/// from and its distance from the start position, so a later pass can
/// resume where this one stopped.
#[derive(Debug, Clone)]
pub struct Cursor<'a, P> {
    fiber: &'a Fiber<P>,
    start: usize,
    next: usize,
    saved: Option<usize>,
}

impl<P> Cursor<'_, P> {
    /// Storage position of the last element yielded
    pub fn saved_pos(&self) -> Option<usize> {
        self.saved
    }

    /// Elements between the start position and the saved position
    pub fn distance(&self) -> Option<usize> {
        self.saved.map(|pos| pos - self.start)
    }
}

impl<'a, P> Iterator for Cursor<'a, P> {
    type Item = (Coord, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.next;
        let coord = *self.fiber.coords().get(i)?;
        self.next += 1;
        self.saved = Some(i);
        Some((coord, &self.fiber.payloads()[i]))
    }
}

/// Iteration-vector ticking for one rank
///
/// The counter advances when the consumer resumes after an element and is
/// cleared once the stream is exhausted.
#[derive(Debug, Clone)]
pub(crate) struct Ticker {
    metrics: Metrics,
    rank: String,
    pending: bool,
    finished: bool,
}

impl Ticker {
    /// `None` unless `metrics` is collecting
    pub(crate) fn new(metrics: &Metrics, rank: &RankAttrs) -> Option<Self> {
        metrics.is_collecting().then(|| Self {
            metrics: metrics.clone(),
            rank: rank.id().to_string(),
            pending: false,
            finished: false,
        })
    }

    pub(crate) fn next<I: Iterator>(&mut self, inner: &mut I) -> Option<I::Item> {
        if std::mem::take(&mut self.pending) {
            self.metrics.inc_iter(&self.rank);
        }

        match inner.next() {
            Some(item) => {
                self.pending = true;
                Some(item)
            }
            None => {
                if !self.finished {
                    self.finished = true;
                    self.metrics.clr_iter(&self.rank);
                }
                None
            }
        }
    }
}

/// Stream adapter that ticks a rank's iteration counter
///
/// Inactive when `metrics` was not collecting at construction.
#[derive(Debug)]
pub struct Ticked<I> {
    inner: I,
    ticker: Option<Ticker>,
}

impl<I> Ticked<I> {
    pub fn new(inner: I, metrics: &Metrics, rank: &RankAttrs) -> Self {
        Self {
            inner,
            ticker: Ticker::new(metrics, rank),
        }
    }

    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<I: Iterator> Iterator for Ticked<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        match self.ticker.as_mut() {
            Some(ticker) => ticker.next(&mut self.inner),
            None => self.inner.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
