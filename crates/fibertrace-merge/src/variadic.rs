//! Merges of more than two fibers
//!
//! Both reducers fold the binary operator left to right and flatten the
//! nested payloads as they go, so the result of merging `n` fibers carries
//! one flat `Vec` of `n` payloads per coordinate.

use anyhow::{bail, Result};
use fibertrace_core::{BoxedStream, FiberSource, LazyFiber};
use fibertrace_metrics::Metrics;

use crate::error::MergeError;
use crate::intersect::intersect;
use crate::mask::Mask;
use crate::probe::require_ordered_unique;
use crate::union::union;

/// Lazy fiber returned by [`intersect_all`]
pub type IntersectAllFiber<'a, P> = LazyFiber<BoxedStream<'a, Vec<P>>, Vec<P>>;

/// Lazy fiber returned by [`union_all`]
pub type UnionAllFiber<'a, P> = LazyFiber<BoxedStream<'a, (Mask, Vec<P>)>, (Mask, Vec<P>)>;

/// Coordinates present in every operand, with payloads `[p1, .., pn]`
///
/// # Errors
///
/// [`MergeError::TooFewOperands`] for fewer than two operands, and
/// [`FiberError::NotOrderedUnique`](fibertrace_core::FiberError) for an
/// operand that is not ordered and unique.
pub fn intersect_all<'a, S>(
    metrics: &Metrics,
    operands: Vec<S>,
) -> Result<IntersectAllFiber<'a, S::Payload>>
where
    S: FiberSource + 'a,
    S::Stream: 'a,
    S::Payload: 'a,
{
    let found = operands.len();
    let mut operands = operands.into_iter();
    let first = match operands.next() {
        Some(first) if found >= 2 => first,
        _ => bail!(MergeError::TooFewOperands { found }),
    };
    require_ordered_unique(&first)?;

    let default = vec![first.default_payload()];
    let rank = first.rank().clone();
    let stream = first.into_stream().map(|(c, p)| (c, vec![p]));
    let mut acc = LazyFiber::new(rank, default, stream).boxed();

    for operand in operands {
        acc = intersect(metrics, acc, operand)?
            .map_payloads(|(mut payloads, p)| {
                payloads.push(p);
                payloads
            })
            .boxed();
    }
    Ok(acc)
}

/// Coordinates present in any operand, with payload `(mask, [p1, .., pn])`
///
/// `mask` names every operand holding the coordinate by position (`"A"`
/// for the first, `"C"` for the third); absent operands contribute their
/// default payload. The result's default is `(Mask::EMPTY, [d1, .., dn])`.
///
/// # Errors
///
/// [`MergeError::TooFewOperands`] for fewer than two operands,
/// [`MergeError::TooManyOperands`] for more than a mask can name, and
/// [`FiberError::NotOrderedUnique`](fibertrace_core::FiberError) for an
/// operand that is not ordered and unique.
///
/// # Examples
///
/// ```
/// use fibertrace_core::{Fiber, RankAttrs};
/// use fibertrace_merge::union_all;
/// use fibertrace_metrics::Metrics;
///
/// let k = RankAttrs::new("K").shared();
/// let a = Fiber::new(k.clone(), vec![0, 1], vec![1, 1], 0).unwrap();
/// let b = Fiber::new(k.clone(), vec![1], vec![2], 0).unwrap();
/// let c = Fiber::new(k, vec![0, 2], vec![3, 3], 0).unwrap();
///
/// let masks: Vec<_> = union_all(&Metrics::new(), vec![&a, &b, &c])
///     .unwrap()
///     .map(|(coord, (mask, _))| (coord, mask.to_string()))
///     .collect();
/// assert_eq!(masks[0], (0, "AC".to_string()));
/// assert_eq!(masks[1], (1, "AB".to_string()));
/// assert_eq!(masks[2], (2, "C".to_string()));
/// ```
pub fn union_all<'a, S>(
    metrics: &Metrics,
    operands: Vec<S>,
) -> Result<UnionAllFiber<'a, S::Payload>>
where
    S: FiberSource + 'a,
    S::Stream: 'a,
    S::Payload: 'a,
{
    let found = operands.len();
    if found > Mask::MAX_OPERANDS {
        bail!(MergeError::TooManyOperands {
            found,
            max: Mask::MAX_OPERANDS,
        });
    }
    let mut operands = operands.into_iter();
    let first = match operands.next() {
        Some(first) if found >= 2 => first,
        _ => bail!(MergeError::TooFewOperands { found }),
    };
    require_ordered_unique(&first)?;

    let default = (Mask::EMPTY, vec![first.default_payload()]);
    let rank = first.rank().clone();
    let stream = first
        .into_stream()
        .map(|(c, p)| (c, (Mask::operand(0), vec![p])));
    let mut acc = LazyFiber::new(rank, default, stream).boxed();

    for (i, operand) in operands.enumerate() {
        let bit = Mask::operand(i + 1);
        acc = union(metrics, acc, operand)?
            .map_payloads(move |(pair, (mask, mut payloads), p)| {
                payloads.push(p);
                if pair.contains(1) {
                    (mask | bit, payloads)
                } else {
                    (mask, payloads)
                }
            })
            .boxed();
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fibertrace_core::{Coord, Fiber, RankAttrs};

    fn fiber(coords: Vec<Coord>, scale: i32) -> Fiber<i32> {
        let payloads = coords.iter().map(|&c| c as i32 * scale).collect();
        Fiber::new(RankAttrs::new("K").shared(), coords, payloads, 0).unwrap()
    }

    #[test]
    fn test_intersect_all_flattens_payloads() {
        let a = fiber(vec![0, 1, 2, 5], 1);
        let b = fiber(vec![1, 2, 5, 9], 10);
        let c = fiber(vec![2, 5], 100);

        let out: Vec<_> = intersect_all(&Metrics::new(), vec![&a, &b, &c])
            .unwrap()
            .map(|(coord, ps)| (coord, ps.into_iter().copied().collect::<Vec<_>>()))
            .collect();
        assert_eq!(out, vec![(2, vec![2, 20, 200]), (5, vec![5, 50, 500])]);
    }

    #[test]
    fn test_intersect_all_of_two_matches_binary() {
        let a = fiber(vec![0, 2, 4], 1);
        let b = fiber(vec![2, 3, 4], 1);
        let out = intersect_all(&Metrics::new(), vec![&a, &b]).unwrap();
        assert_eq!(out.rank().id(), "K");
        assert_eq!(out.map(|(c, _)| c).collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn test_union_all_masks_and_defaults() {
        let a = fiber(vec![0, 3], 1);
        let b = fiber(vec![1, 3], 10);
        let c = fiber(vec![3, 4], 100);
        let d = fiber(vec![4], 1000);

        let out = union_all(&Metrics::new(), vec![&a, &b, &c, &d]).unwrap();
        assert_eq!(out.default_payload(), &(Mask::EMPTY, vec![&0; 4]));

        let got: Vec<_> = out
            .map(|(coord, (mask, ps))| {
                (coord, mask.to_string(), ps.into_iter().copied().collect::<Vec<_>>())
            })
            .collect();
        assert_eq!(
            got,
            vec![
                (0, "A".to_string(), vec![0, 0, 0, 0]),
                (1, "B".to_string(), vec![0, 10, 0, 0]),
                (3, "ABC".to_string(), vec![3, 30, 300, 0]),
                (4, "CD".to_string(), vec![0, 0, 400, 4000]),
            ]
        );
    }

    #[test]
    fn test_union_all_of_three_with_single_contributor() {
        let a = fiber(vec![], 1);
        let b = fiber(vec![], 1);
        let c = fiber(vec![7], 1);
        let got: Vec<_> = union_all(&Metrics::new(), vec![&a, &b, &c])
            .unwrap()
            .map(|(coord, (mask, _))| (coord, mask))
            .collect();
        assert_eq!(got, vec![(7, Mask::operand(2))]);
    }

    #[test]
    fn test_operand_count_checked() {
        let a = fiber(vec![1], 1);
        let err = intersect_all(&Metrics::new(), vec![&a]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MergeError>(),
            Some(&MergeError::TooFewOperands { found: 1 })
        );

        let err = union_all(&Metrics::new(), Vec::<&Fiber<i32>>::new()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MergeError>(),
            Some(&MergeError::TooFewOperands { found: 0 })
        );

        let many = vec![&a; Mask::MAX_OPERANDS + 1];
        let err = union_all(&Metrics::new(), many).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MergeError>(),
            Some(&MergeError::TooManyOperands { found: 27, max: 26 })
        );
    }
}
