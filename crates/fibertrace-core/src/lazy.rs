//! Single-pass fibers and the operand abstraction of the merge engine
//!
//! A [`LazyFiber`] wraps a coordinate/payload stream produced on demand,
//! usually by a merge operator. It is consumed by value: it can be iterated
//! once, folded into another operator, or collected with
//! [`LazyFiber::materialize`]. It offers no cursor and no reversal.
//!
//! [`FiberSource`] is what merge operators accept: borrowed eager fibers
//! (payloads by reference) and lazy fibers (payloads by value).
//!
//! A lazy fiber made [`ticking`](LazyFiber::ticking) advances its rank's
//! iteration counter while a consumer iterates it. Reading it as a merge
//! operand goes through [`FiberSource::into_stream`] and does not tick.

use std::fmt;
use std::vec;

use fibertrace_metrics::Metrics;

use crate::fiber::Fiber;
use crate::iterators::{FiberIter, Ticker};
use crate::types::{Coord, RankRef};

/// Boxed coordinate/payload stream
pub type BoxedStream<'a, P> = Box<dyn Iterator<Item = (Coord, P)> + 'a>;

/// Stream of an eager fiber converted with [`Fiber::into_lazy`]
pub type OwnedStream<P> = std::iter::Zip<vec::IntoIter<Coord>, vec::IntoIter<P>>;

/// Fiber whose elements are produced on demand
pub struct LazyFiber<I, P> {
    iter: I,
    rank: RankRef,
    default: P,
    ordered: bool,
    unique: bool,
    ticker: Option<Ticker>,
}

impl<I, P> LazyFiber<I, P>
where
    I: Iterator<Item = (Coord, P)>,
{
    /// Wrap `iter`, which must yield strictly increasing coordinates
    pub fn new(rank: RankRef, default: P, iter: I) -> Self {
        Self {
            iter,
            rank,
            default,
            ordered: true,
            unique: true,
            ticker: None,
        }
    }

    /// Override the ordered/unique flags
    pub fn with_flags(mut self, ordered: bool, unique: bool) -> Self {
        self.ordered = ordered;
        self.unique = unique;
        self
    }

    /// Tick this fiber's rank in `metrics` as it is iterated
    ///
    /// Has no effect unless `metrics` is collecting.
    pub fn ticking(mut self, metrics: &Metrics) -> Self {
        self.ticker = Ticker::new(metrics, &self.rank);
        self
    }

    pub fn rank(&self) -> &RankRef {
        &self.rank
    }

    pub fn default_payload(&self) -> &P {
        &self.default
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Drain the stream into an eager fiber
    pub fn materialize(self) -> Fiber<P> {
        Fiber::from_pairs(self.rank, self.iter, self.default)
    }

    /// Erase the stream type
    pub fn boxed<'a>(self) -> LazyFiber<BoxedStream<'a, P>, P>
    where
        I: 'a,
    {
        LazyFiber {
            iter: Box::new(self.iter),
            rank: self.rank,
            default: self.default,
            ordered: self.ordered,
            unique: self.unique,
            ticker: self.ticker,
        }
    }

    /// Transform every payload and the default with `f`
    pub fn map_payloads<Q, F>(self, mut f: F) -> LazyFiber<impl Iterator<Item = (Coord, Q)>, Q>
    where
        F: FnMut(P) -> Q,
    {
        let default = f(self.default);
        LazyFiber {
            iter: self.iter.map(move |(c, p)| (c, f(p))),
            rank: self.rank,
            default,
            ordered: self.ordered,
            unique: self.unique,
            ticker: self.ticker,
        }
    }
}

impl<I, P> Iterator for LazyFiber<I, P>
where
    I: Iterator<Item = (Coord, P)>,
{
    type Item = (Coord, P);

    fn next(&mut self) -> Option<Self::Item> {
        match self.ticker.as_mut() {
            Some(ticker) => ticker.next(&mut self.iter),
            None => self.iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<I, P: fmt::Debug> fmt::Debug for LazyFiber<I, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyFiber")
            .field("rank", &self.rank.id())
            .field("default", &self.default)
            .field("ordered", &self.ordered)
            .field("unique", &self.unique)
            .field("ticking", &self.ticker.is_some())
            .finish_non_exhaustive()
    }
}

impl<P> Fiber<P> {
    /// Convert into a single-pass fiber that yields owned payloads
    pub fn into_lazy(self) -> LazyFiber<OwnedStream<P>, P> {
        let (ordered, unique) = self.flags();
        let (rank, coords, payloads, default) = self.into_parts();
        LazyFiber {
            iter: coords.into_iter().zip(payloads),
            rank,
            default,
            ordered,
            unique,
            ticker: None,
        }
    }
}

/// Operand of a merge operator
pub trait FiberSource {
    /// Payload type yielded by the stream
    type Payload: Clone;
    /// Coordinate/payload stream
    type Stream: Iterator<Item = (Coord, Self::Payload)>;

    fn rank(&self) -> &RankRef;

    /// Payload synthesized where this operand has no entry
    fn default_payload(&self) -> Self::Payload;

    /// Whether coordinates are strictly increasing
    fn is_ordered_unique(&self) -> bool;

    fn into_stream(self) -> Self::Stream;
}

impl<'a, P> FiberSource for &'a Fiber<P> {
    type Payload = &'a P;
    type Stream = FiberIter<'a, P>;

    fn rank(&self) -> &RankRef {
        Fiber::rank(*self)
    }

    fn default_payload(&self) -> &'a P {
        Fiber::default_payload(*self)
    }

    fn is_ordered_unique(&self) -> bool {
        self.is_ordered() && self.is_unique()
    }

    fn into_stream(self) -> FiberIter<'a, P> {
        self.iter()
    }
}

impl<I, P> FiberSource for LazyFiber<I, P>
where
    I: Iterator<Item = (Coord, P)>,
    P: Clone,
{
    type Payload = P;
    type Stream = I;

    fn rank(&self) -> &RankRef {
        &self.rank
    }

    fn default_payload(&self) -> P {
        self.default.clone()
    }

    fn is_ordered_unique(&self) -> bool {
        self.ordered && self.unique
    }

    fn into_stream(self) -> I {
        self.iter
    }
}
