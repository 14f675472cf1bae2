//! Two-operand intersection
//!
//! Two-pointer merge: the operand with the smaller current coordinate
//! advances; on a match both advance. Operands are read without ticking
//! the iteration vector.
//!
//! # Metrics
//!
//! Under `"Rank <id>"` of the first operand:
//!
//! | counter                            | incremented                          |
//! |------------------------------------|--------------------------------------|
//! | `coordinate_read_tensor{0,1}`      | once at start, then per advance that lands on an element |
//! | `unsuccessful_intersect_tensor{0,1}` | per advance past a miss            |
//! | `skipped_intersect`                | per miss following a miss on the same side |
//! | `successful_intersect`             | per match                            |
//! | `payload_read_tensor{0,1}`         | per match                            |
//! | `same_last_coord` / `diff_last_coord` | once, when the merge ends         |
//!
//! The first three start at zero so they appear in the dump even when
//! never incremented. Uses of matched coordinates are recorded for traced
//! ranks when the consumer pulls the next element, after the result's rank
//! was ticked.

use std::cmp::Ordering;

use anyhow::Result;
use fibertrace_core::{Coord, FiberSource, LazyFiber};
use fibertrace_metrics::Metrics;

use crate::probe::{require_ordered_unique, Head, Probe};

/// Side whose previous miss may turn the next miss into a skip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

/// Iterator behind [`intersect`]
#[derive(Debug)]
pub struct Intersect<SA, SB, PA, PB> {
    a: Head<SA, PA>,
    b: Head<SB, PB>,
    probe: Probe,
    skip: Option<Side>,
    matched: Option<Coord>,
    started: bool,
    finished: bool,
}

impl<SA, SB, PA, PB> Intersect<SA, SB, PA, PB>
where
    SA: Iterator<Item = (Coord, PA)>,
    SB: Iterator<Item = (Coord, PB)>,
{
    fn start(&mut self) {
        self.started = true;
        self.a.coord();
        self.b.coord();

        self.probe.count("coordinate_read_tensor0", 1);
        self.probe.count("coordinate_read_tensor1", 1);
        self.probe.count("unsuccessful_intersect_tensor0", 0);
        self.probe.count("unsuccessful_intersect_tensor1", 0);
        self.probe.count("skipped_intersect", 0);
    }

    /// Finish the previous match: record uses, then read past it on both
    /// sides
    ///
    /// The matched heads were already taken, so the next `coord()` lands on
    /// the element after the match.
    fn release(&mut self, coord: Coord) {
        self.probe.record_uses(coord);

        if self.a.coord().is_some() {
            self.probe.count("coordinate_read_tensor0", 1);
        }
        if self.b.coord().is_some() {
            self.probe.count("coordinate_read_tensor1", 1);
        }
    }

    fn finish(&mut self, same_last: bool) {
        self.finished = true;
        if same_last {
            self.probe.count("same_last_coord", 1);
        } else {
            self.probe.count("diff_last_coord", 1);
        }
    }
}

impl<SA, SB, PA, PB> Iterator for Intersect<SA, SB, PA, PB>
where
    SA: Iterator<Item = (Coord, PA)>,
    SB: Iterator<Item = (Coord, PB)>,
{
    type Item = (Coord, (PA, PB));

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.start();
        }
        if let Some(coord) = self.matched.take() {
            self.release(coord);
        }

        loop {
            let (a_coord, b_coord) = match (self.a.coord(), self.b.coord()) {
                (Some(a), Some(b)) => (a, b),
                (a, b) => {
                    self.finish(a.is_none() && b.is_none());
                    return None;
                }
            };

            match a_coord.cmp(&b_coord) {
                Ordering::Equal => {
                    self.probe.count("successful_intersect", 1);
                    self.probe.count("payload_read_tensor0", 1);
                    self.probe.count("payload_read_tensor1", 1);

                    let (_, a_payload) = self.a.take()?;
                    let (_, b_payload) = self.b.take()?;
                    self.matched = Some(a_coord);
                    return Some((a_coord, (a_payload, b_payload)));
                }
                Ordering::Less => {
                    self.a.skip();
                    self.probe.count("unsuccessful_intersect_tensor0", 1);
                    if self.skip == Some(Side::A) {
                        self.probe.count("skipped_intersect", 1);
                    }
                    if let Some(next) = self.a.coord() {
                        self.probe.count("coordinate_read_tensor0", 1);
                        self.skip = (next < b_coord).then_some(Side::A);
                    }
                }
                Ordering::Greater => {
                    self.b.skip();
                    self.probe.count("unsuccessful_intersect_tensor1", 1);
                    if self.skip == Some(Side::B) {
                        self.probe.count("skipped_intersect", 1);
                    }
                    if let Some(next) = self.b.coord() {
                        self.probe.count("coordinate_read_tensor1", 1);
                        self.skip = (next < a_coord).then_some(Side::B);
                    }
                }
            }
        }
    }
}

/// Lazy fiber returned by [`intersect`]
pub type IntersectFiber<A, B> = LazyFiber<
    Intersect<
        <A as FiberSource>::Stream,
        <B as FiberSource>::Stream,
        <A as FiberSource>::Payload,
        <B as FiberSource>::Payload,
    >,
    (
        <A as FiberSource>::Payload,
        <B as FiberSource>::Payload,
    ),
>;

/// Coordinates present in both `a` and `b`, with payload `(pA, pB)`
///
/// The result carries the first operand's rank id and the default
/// `(dA, dB)`.
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
/// use fibertrace_merge::intersect;
/// use fibertrace_metrics::Metrics;
///
/// let k = RankAttrs::new("K").shared();
/// let a = Fiber::new(k.clone(), vec![0, 2, 4], vec![10, 20, 40], 0).unwrap();
/// let b = Fiber::new(k, vec![2, 3, 4], vec![1, 2, 4], 0).unwrap();
///
/// let pairs: Vec<_> = intersect(&Metrics::new(), &a, &b)
///     .unwrap()
///     .map(|(c, (pa, pb))| (c, *pa, *pb))
///     .collect();
/// assert_eq!(pairs, vec![(2, 20, 1), (4, 40, 4)]);
/// ```
pub fn intersect<A, B>(metrics: &Metrics, a: A, b: B) -> Result<IntersectFiber<A, B>>
where
    A: FiberSource,
    B: FiberSource,
{
    require_ordered_unique(&a)?;
    require_ordered_unique(&b)?;

    let rank = a.rank().derived();
    let default = (a.default_payload(), b.default_payload());
    let probe = Probe::new(metrics, a.rank(), b.rank());

    let iter = Intersect {
        a: Head::new(a.into_stream()),
        b: Head::new(b.into_stream()),
        probe,
        skip: None,
        matched: None,
        started: false,
        finished: false,
    };
    Ok(LazyFiber::new(rank, default, iter).ticking(metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fibertrace_core::{Fiber, FiberError, RankAttrs};

    fn fiber(id: &str, coords: Vec<Coord>) -> Fiber<i32> {
        let payloads = coords.iter().map(|&c| c as i32 * 10).collect();
        Fiber::new(RankAttrs::new(id).shared(), coords, payloads, 0).unwrap()
    }

    fn coords<I: Iterator<Item = (Coord, T)>, T>(iter: I) -> Vec<Coord> {
        iter.map(|(c, _)| c).collect()
    }

    #[test]
    fn test_basic_intersection() {
        let a = fiber("K", vec![0, 2, 4]);
        let b = fiber("K", vec![2, 3, 4]);
        let out = intersect(&Metrics::new(), &a, &b).unwrap();
        assert_eq!(out.rank().id(), "K");
        assert_eq!(coords(out), vec![2, 4]);
    }

    #[test]
    fn test_consecutive_matches_are_all_kept() {
        let a = fiber("K", vec![0, 2, 4]);
        assert_eq!(coords(intersect(&Metrics::new(), &a, &a).unwrap()), vec![0, 2, 4]);

        let b = fiber("K", vec![0, 1, 2, 4]);
        let pairs: Vec<_> = intersect(&Metrics::new(), &a, &b)
            .unwrap()
            .map(|(c, (pa, pb))| (c, *pa, *pb))
            .collect();
        assert_eq!(pairs, vec![(0, 0, 0), (2, 20, 20), (4, 40, 40)]);
    }

    #[test]
    fn test_disjoint_and_empty() {
        let a = fiber("K", vec![0, 1]);
        let b = fiber("K", vec![5, 6]);
        assert!(coords(intersect(&Metrics::new(), &a, &b).unwrap()).is_empty());

        let e = fiber("K", vec![]);
        assert!(coords(intersect(&Metrics::new(), &a, &e).unwrap()).is_empty());
    }

    #[test]
    fn test_rejects_unordered_operand() {
        let a = fiber("K", vec![0, 2]);
        let b = fiber("N", vec![3, 1]);
        let err = intersect(&Metrics::new(), &a, &b).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FiberError>(),
            Some(&FiberError::NotOrderedUnique { rank: "N".into() })
        );
    }

    #[test]
    fn test_counters() {
        let metrics = Metrics::new();
        metrics.begin_collect("t", &["K"]);

        let a = fiber("K", vec![0, 2, 4]);
        let b = fiber("K", vec![2, 3, 4]);
        assert_eq!(intersect(&metrics, &a, &b).unwrap().count(), 2);

        let dump = metrics.dump();
        let rank = &dump["Rank K"];
        assert_eq!(rank["successful_intersect"], 2);
        assert_eq!(rank["payload_read_tensor0"], 2);
        assert_eq!(rank["payload_read_tensor1"], 2);
        // A: start + advance to 2 + advance to 4
        assert_eq!(rank["coordinate_read_tensor0"], 3);
        // B: start + advance to 3 + advance to 4
        assert_eq!(rank["coordinate_read_tensor1"], 3);
        assert_eq!(rank["unsuccessful_intersect_tensor0"], 1);
        assert_eq!(rank["unsuccessful_intersect_tensor1"], 1);
        assert_eq!(rank["skipped_intersect"], 0);
        assert_eq!(rank["same_last_coord"], 1);
        assert!(!rank.contains_key("diff_last_coord"));
    }

    #[test]
    fn test_skip_accounting() {
        let metrics = Metrics::new();
        metrics.begin_collect("t", &["K"]);

        // A runs 0,1,2,3 below B's 9: the second and later misses skip
        let a = fiber("K", vec![0, 1, 2, 3]);
        let b = fiber("K", vec![9]);
        assert_eq!(intersect(&metrics, &a, &b).unwrap().count(), 0);

        let dump = metrics.dump();
        let rank = &dump["Rank K"];
        assert_eq!(rank["unsuccessful_intersect_tensor0"], 4);
        assert_eq!(rank["skipped_intersect"], 3);
        assert_eq!(rank["diff_last_coord"], 1);
    }

    #[test]
    fn test_skip_resets_on_direction_change() {
        let metrics = Metrics::new();
        metrics.begin_collect("t", &["K"]);

        let a = fiber("K", vec![0, 5, 9]);
        let b = fiber("K", vec![3, 7, 9]);
        assert_eq!(coords(intersect(&metrics, &a, &b).unwrap()), vec![9]);

        let dump = metrics.dump();
        assert_eq!(dump["Rank K"]["skipped_intersect"], 0);
        assert_eq!(dump["Rank K"]["same_last_coord"], 1);
    }

    #[test]
    fn test_no_counters_outside_session() {
        let metrics = Metrics::new();
        let a = fiber("K", vec![1]);
        assert_eq!(intersect(&metrics, &a, &a).unwrap().count(), 1);
        assert!(metrics.dump().is_empty());
    }

    #[test]
    fn test_uses_recorded_on_next_pull() {
        let metrics = Metrics::new();
        metrics.begin_collect("t", &["K"]);

        let a = fiber("K", vec![1, 6]);
        a.rank().set_collecting(true);
        let b = fiber("K", vec![1, 6]);

        let mut out = intersect(&metrics, &a, &b).unwrap();
        assert_eq!(out.next().map(|(c, _)| c), Some(1));
        assert_eq!(metrics.get_point(), vec![0]);

        assert_eq!(out.next().map(|(c, _)| c), Some(6));
        assert_eq!(metrics.get_point(), vec![1]);

        assert!(out.next().is_none());
        assert_eq!(metrics.get_point(), vec![6]);
    }
}
