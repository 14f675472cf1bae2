//! Difference of two fibers

use std::cmp::Ordering;

use anyhow::Result;
use fibertrace_core::{Coord, FiberSource, LazyFiber, Ticked};
use fibertrace_metrics::Metrics;

use crate::probe::{require_ordered_unique, Head};

/// Iterator behind [`difference`]
#[derive(Debug)]
pub struct Difference<SA, SB, PA, PB> {
    a: Head<Ticked<SA>, PA>,
    b: Head<Ticked<SB>, PB>,
}

impl<SA, SB, PA, PB> Iterator for Difference<SA, SB, PA, PB>
where
    SA: Iterator<Item = (Coord, PA)>,
    SB: Iterator<Item = (Coord, PB)>,
{
    type Item = (Coord, PA);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let a_coord = self.a.coord()?;
            let Some(b_coord) = self.b.coord() else {
                return self.a.take();
            };

            match a_coord.cmp(&b_coord) {
                Ordering::Equal => {
                    self.a.skip();
                    self.b.skip();
                }
                Ordering::Less => return self.a.take(),
                Ordering::Greater => self.b.skip(),
            }
        }
    }
}

/// Lazy fiber returned by [`difference`]
pub type DifferenceFiber<A, B> = LazyFiber<
    Difference<
        <A as FiberSource>::Stream,
        <B as FiberSource>::Stream,
        <A as FiberSource>::Payload,
        <B as FiberSource>::Payload,
    >,
    <A as FiberSource>::Payload,
>;

/// Coordinates of `a` that `b` does not hold, with `a`'s payloads
///
/// `b` is not read past `a`'s last coordinate. The result's default is
/// `a`'s default.
///
/// # Errors
///
/// [`FiberError::NotOrderedUnique`](fibertrace_core::FiberError) if either
/// operand is not ordered and unique.
pub fn difference<A, B>(metrics: &Metrics, a: A, b: B) -> Result<DifferenceFiber<A, B>>
where
    A: FiberSource,
    B: FiberSource,
{
    require_ordered_unique(&a)?;
    require_ordered_unique(&b)?;

    let rank = a.rank().derived();
    let default = a.default_payload();

    let a_rank = a.rank().clone();
    let b_rank = b.rank().clone();
    let iter = Difference {
        a: Head::new(Ticked::new(a.into_stream(), metrics, &a_rank)),
        b: Head::new(Ticked::new(b.into_stream(), metrics, &b_rank)),
    };
    Ok(LazyFiber::new(rank, default, iter).ticking(metrics))
}
