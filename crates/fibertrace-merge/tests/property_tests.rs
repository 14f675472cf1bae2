//! Property-based tests for the merge operators
//!
//! Coordinates of every operator result are checked against the matching
//! `BTreeSet` operation; payloads and masks are checked against direct
//! lookups in the operands.

use std::collections::BTreeSet;

use fibertrace_core::{Coord, Fiber, RankAttrs};
use fibertrace_merge::{
    assign_from, difference, intersect, intersect_all, union, union_all, xor, Mask,
};
use fibertrace_metrics::Metrics;
use proptest::prelude::*;

// ============================================================================
// Test Utilities
// ============================================================================

fn coord_set() -> impl Strategy<Value = BTreeSet<Coord>> {
    prop::collection::btree_set(0..64usize, 0..24)
}

/// Fiber over `coords` whose payload is `coord * scale + 1`
fn fiber(coords: &BTreeSet<Coord>, scale: i64) -> Fiber<i64> {
    let pairs = coords.iter().map(|&c| (c, c as i64 * scale + 1));
    Fiber::from_pairs(RankAttrs::new("K").shared(), pairs, 0)
}

fn coords_of<T>(iter: impl Iterator<Item = (Coord, T)>) -> Vec<Coord> {
    iter.map(|(c, _)| c).collect()
}

// ============================================================================
// Set Algebra
// ============================================================================

proptest! {
    /// Property: intersect yields C_A ∩ C_B with both payloads
    #[test]
    fn prop_intersect_is_set_intersection(sa in coord_set(), sb in coord_set()) {
        let (a, b) = (fiber(&sa, 2), fiber(&sb, 3));
        let out: Vec<_> = intersect(&Metrics::new(), &a, &b).unwrap().collect();

        let expected: Vec<Coord> = sa.intersection(&sb).copied().collect();
        prop_assert_eq!(coords_of(out.iter().map(|(c, p)| (*c, p))), expected);
        for (c, (pa, pb)) in out {
            prop_assert_eq!(a.payload(c), Some(pa));
            prop_assert_eq!(b.payload(c), Some(pb));
        }
    }

    /// Property: union yields C_A ∪ C_B and the mask names the holders
    #[test]
    fn prop_union_is_set_union(sa in coord_set(), sb in coord_set()) {
        let (a, b) = (fiber(&sa, 2), fiber(&sb, 3));
        let out: Vec<_> = union(&Metrics::new(), &a, &b).unwrap().collect();

        let expected: Vec<Coord> = sa.union(&sb).copied().collect();
        prop_assert_eq!(coords_of(out.iter().map(|(c, p)| (*c, p))), expected);
        for (c, (mask, pa, pb)) in out {
            prop_assert_eq!(mask.contains(0), sa.contains(&c));
            prop_assert_eq!(mask.contains(1), sb.contains(&c));
            prop_assert_eq!(pa, a.payload_or_default(c));
            prop_assert_eq!(pb, b.payload_or_default(c));
        }
    }

    /// Property: xor yields the symmetric difference, never mask AB
    #[test]
    fn prop_xor_is_symmetric_difference(sa in coord_set(), sb in coord_set()) {
        let (a, b) = (fiber(&sa, 2), fiber(&sb, 3));
        let out: Vec<_> = xor(&Metrics::new(), &a, &b).unwrap().collect();

        let expected: Vec<Coord> = sa.symmetric_difference(&sb).copied().collect();
        prop_assert_eq!(coords_of(out.iter().map(|(c, p)| (*c, p))), expected);
        for (_, (mask, _, _)) in out {
            prop_assert_eq!(mask.count(), 1);
        }
    }

    /// Property: difference yields C_A \ C_B with A's payloads
    #[test]
    fn prop_difference_is_set_difference(sa in coord_set(), sb in coord_set()) {
        let (a, b) = (fiber(&sa, 2), fiber(&sb, 3));
        let out: Vec<_> = difference(&Metrics::new(), &a, &b).unwrap().collect();

        let expected: Vec<Coord> = sa.difference(&sb).copied().collect();
        prop_assert_eq!(coords_of(out.iter().map(|(c, p)| (*c, p))), expected);
        for (c, p) in out {
            prop_assert_eq!(a.payload(c), Some(p));
        }
    }

    /// Property: intersect(A, A) pairs every payload with itself
    #[test]
    fn prop_intersect_idempotent(sa in coord_set()) {
        let a = fiber(&sa, 5);
        let out: Vec<_> = intersect(&Metrics::new(), &a, &a).unwrap().collect();

        prop_assert_eq!(out.len(), a.len());
        for (c, (p, q)) in out {
            prop_assert_eq!(p, q);
            prop_assert_eq!(a.payload(c), Some(p));
        }
    }

    /// Property: folds over three operands agree with nested set operations
    #[test]
    fn prop_variadic_folds(sa in coord_set(), sb in coord_set(), sc in coord_set()) {
        let (a, b, c) = (fiber(&sa, 1), fiber(&sb, 2), fiber(&sc, 3));

        let all: BTreeSet<Coord> = sa.intersection(&sb).copied().collect();
        let all: Vec<Coord> = all.intersection(&sc).copied().collect();
        let got = coords_of(intersect_all(&Metrics::new(), vec![&a, &b, &c]).unwrap());
        prop_assert_eq!(got, all);

        let any: BTreeSet<Coord> = sa.union(&sb).copied().collect();
        let any: Vec<Coord> = any.union(&sc).copied().collect();
        let out: Vec<_> = union_all(&Metrics::new(), vec![&a, &b, &c]).unwrap().collect();
        prop_assert_eq!(coords_of(out.iter().map(|(c, p)| (*c, p))), any);

        for (coord, (mask, payloads)) in out {
            let mut expected = Mask::EMPTY;
            for (i, set) in [&sa, &sb, &sc].into_iter().enumerate() {
                if set.contains(&coord) {
                    expected |= Mask::operand(i);
                }
            }
            prop_assert_eq!(mask, expected);
            prop_assert_eq!(payloads.len(), 3);
        }
    }

    /// Property: assign_from leaves the target holding C_Z ∪ (non-zero C_A)
    #[test]
    fn prop_assign_populates_target(sz in coord_set(), sa in coord_set()) {
        let mut z = fiber(&sz, 1);
        let a = fiber(&sa, 0);

        assign_from(&Metrics::new(), &mut z, &a)
            .unwrap()
            .for_each(|_, z, a| *z += **a);

        let expected: Vec<Coord> = sz.union(&sa).copied().collect();
        prop_assert_eq!(z.coords(), expected.as_slice());
        prop_assert!(z.is_ordered() && z.is_unique());
        for &c in &sa {
            let before = if sz.contains(&c) { c as i64 + 1 } else { 0 };
            prop_assert_eq!(z.payload(c), Some(&(before + 1)));
        }
    }
}
