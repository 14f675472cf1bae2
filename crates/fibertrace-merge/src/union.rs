//! Union and exclusive-or of two fibers
//!
//! Both walk the operands with a two-pointer merge and tag every emitted
//! coordinate with a [`Mask`] naming the operands that hold it. The absent
//! side contributes a clone of its default payload. Operands are read with
//! ticking, so each operand rank's iteration counter advances as its
//! elements are consumed.

use std::cmp::Ordering;

use anyhow::Result;
use fibertrace_core::{Coord, FiberSource, LazyFiber, Ticked};
use fibertrace_metrics::Metrics;

use crate::mask::Mask;
use crate::probe::{require_ordered_unique, Head};

/// Iterator behind [`union`] and [`xor`]
#[derive(Debug)]
pub struct Union<SA, SB, PA, PB> {
    a: Head<Ticked<SA>, PA>,
    b: Head<Ticked<SB>, PB>,
    a_default: PA,
    b_default: PB,
    exclusive: bool,
}

impl<SA, SB, PA, PB> Iterator for Union<SA, SB, PA, PB>
where
    SA: Iterator<Item = (Coord, PA)>,
    SB: Iterator<Item = (Coord, PB)>,
    PA: Clone,
    PB: Clone,
{
    type Item = (Coord, (Mask, PA, PB));

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let order = match (self.a.coord(), self.b.coord()) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => return None,
            };

            match order {
                Ordering::Equal => {
                    let (coord, a_payload) = self.a.take()?;
                    let (_, b_payload) = self.b.take()?;
                    if !self.exclusive {
                        return Some((coord, (Mask::AB, a_payload, b_payload)));
                    }
                }
                Ordering::Less => {
                    let (coord, a_payload) = self.a.take()?;
                    return Some((coord, (Mask::A, a_payload, self.b_default.clone())));
                }
                Ordering::Greater => {
                    let (coord, b_payload) = self.b.take()?;
                    return Some((coord, (Mask::B, self.a_default.clone(), b_payload)));
                }
            }
        }
    }
}

/// Lazy fiber returned by [`union`] and [`xor`]
pub type UnionFiber<A, B> = LazyFiber<
    Union<
        <A as FiberSource>::Stream,
        <B as FiberSource>::Stream,
        <A as FiberSource>::Payload,
        <B as FiberSource>::Payload,
    >,
    (
        Mask,
        <A as FiberSource>::Payload,
        <B as FiberSource>::Payload,
    ),
>;

fn merge<A, B>(metrics: &Metrics, a: A, b: B, exclusive: bool) -> Result<UnionFiber<A, B>>
where
    A: FiberSource,
    B: FiberSource,
{
    require_ordered_unique(&a)?;
    require_ordered_unique(&b)?;

    let rank = a.rank().derived();
    let a_default = a.default_payload();
    let b_default = b.default_payload();
    let default = (Mask::EMPTY, a_default.clone(), b_default.clone());

    let a_rank = a.rank().clone();
    let b_rank = b.rank().clone();
    let iter = Union {
        a: Head::new(Ticked::new(a.into_stream(), metrics, &a_rank)),
        b: Head::new(Ticked::new(b.into_stream(), metrics, &b_rank)),
        a_default,
        b_default,
        exclusive,
    };
    Ok(LazyFiber::new(rank, default, iter).ticking(metrics))
}

/// Coordinates present in `a` or `b`, with payload `(mask, pA, pB)`
///
/// `mask` is `"A"`, `"B"` or `"AB"`; the side that holds no entry
/// contributes its default payload. The result's default is
/// `(Mask::EMPTY, dA, dB)`.
///
/// # Errors
///
/// [`FiberError::NotOrderedUnique`](fibertrace_core::FiberError) if either
/// operand is not ordered and unique.
///
/// # Examples
///
/// ```
/// use fibertrace_core::{Fiber, RankAttrs};
/// use fibertrace_merge::union;
/// use fibertrace_metrics::Metrics;
///
/// let k = RankAttrs::new("K").shared();
/// let a = Fiber::new(k.clone(), vec![0, 2], vec![10, 20], 0).unwrap();
/// let b = Fiber::new(k, vec![2, 3], vec![1, 2], 0).unwrap();
///
/// let out: Vec<_> = union(&Metrics::new(), &a, &b)
///     .unwrap()
///     .map(|(c, (m, pa, pb))| (c, m.to_string(), *pa, *pb))
///     .collect();
/// assert_eq!(out[0], (0, "A".to_string(), 10, 0));
/// assert_eq!(out[1], (2, "AB".to_string(), 20, 1));
/// assert_eq!(out[2], (3, "B".to_string(), 0, 2));
/// ```
pub fn union<A, B>(metrics: &Metrics, a: A, b: B) -> Result<UnionFiber<A, B>>
where
    A: FiberSource,
    B: FiberSource,
{
    merge(metrics, a, b, false)
}

/// Coordinates present in exactly one of `a` and `b`
///
/// Payloads and default are shaped as in [`union`]; the mask is never
/// `"AB"`.
///
/// # Errors
///
/// [`FiberError::NotOrderedUnique`](fibertrace_core::FiberError) if either
/// operand is not ordered and unique.
pub fn xor<A, B>(metrics: &Metrics, a: A, b: B) -> Result<UnionFiber<A, B>>
where
    A: FiberSource,
    B: FiberSource,
{
    merge(metrics, a, b, true)
}
