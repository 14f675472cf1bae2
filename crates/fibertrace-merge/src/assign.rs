//! Populating a fiber from another
//!
//! [`assign_from`] walks the source fiber and, for each of its coordinates,
//! hands out the target's payload at that coordinate next to the source
//! payload. Where the target holds no entry, a clone of its default payload
//! is staged instead and only stored once the slot is released holding an
//! occupied value; an explicit zero carried over from the source never
//! creates an entry.
//!
//! Slots borrow the cursor, so at most one is alive at a time:
//!
//! ```text
//! next_slot() ──► AssignSlot { coord, target: &mut P, source: &Q }
//!     ▲               │  caller updates target in place
//!     │               ▼
//!     │           drop: staged payload stored if occupied
//!     └── target rank ticked, uses of the released coordinate recorded
//! ```
//!
//! Insertions for coordinates whose slot was never handed out do not
//! happen; drain the cursor (for example with [`Assign::for_each`]) for the
//! target to reflect the whole source.
//!
//! # Examples
//!
//! ```
//! use fibertrace_core::{Fiber, RankAttrs};
//! use fibertrace_merge::assign_from;
//! use fibertrace_metrics::Metrics;
//!
//! let k = RankAttrs::new("K").shared();
//! let mut z = Fiber::new(k.clone(), vec![1], vec![5], 0).unwrap();
//! let a = Fiber::new(k, vec![0, 1, 3], vec![2, 3, 0], 0).unwrap();
//!
//! assign_from(&Metrics::new(), &mut z, &a)
//!     .unwrap()
//!     .for_each(|_, z, a| *z += *a);
//!
//! assert_eq!(z.coords(), &[0, 1]);
//! assert_eq!(z.payloads(), &[2, 8]);
//! ```

use anyhow::{bail, Result};
use fibertrace_core::{Coord, Fiber, FiberError, FiberSource, Occupancy};
use fibertrace_metrics::Metrics;

use crate::probe::{require_ordered_unique, Probe};

/// Lending cursor returned by [`assign_from`]
pub struct Assign<'t, P, S: FiberSource> {
    target: &'t mut Fiber<P>,
    source: S::Stream,
    probe: Probe,
    released: Option<Coord>,
    finished: bool,
}

enum Entry<P> {
    Stored(usize),
    Staged(P),
}

/// Target and source payloads at one source coordinate
pub struct AssignSlot<'s, 't, P, S>
where
    P: Clone + Occupancy,
    S: FiberSource,
{
    cursor: &'s mut Assign<'t, P, S>,
    coord: Coord,
    source: S::Payload,
    entry: Entry<P>,
}

impl<'t, P, S> Assign<'t, P, S>
where
    P: Clone + Occupancy,
    S: FiberSource,
{
    /// Advance to the next source coordinate
    pub fn next_slot(&mut self) -> Option<AssignSlot<'_, 't, P, S>> {
        if let Some(coord) = self.released.take() {
            self.probe.inc_iter();
            self.probe.record_uses(coord);
        }

        let Some((coord, source)) = self.source.next() else {
            if !self.finished {
                self.finished = true;
                self.probe.clr_iter();
            }
            return None;
        };

        self.probe.count("coordinate_read_tensor1", 1);
        self.probe.count("payload_read_tensor1", 1);

        let entry = match self.target.position(coord) {
            Some(pos) => {
                self.probe.count("coordinate_read_tensor0", 1);
                self.probe.count("payload_read_tensor0", 1);
                Entry::Stored(pos)
            }
            None => {
                if self.target.max_coord().map_or(true, |max| max < coord) {
                    self.probe.count("coord_payload_append_tensor0", 1);
                } else {
                    self.probe.count("coord_payload_insert_tensor0", 1);
                }
                Entry::Staged(self.target.default_payload().clone())
            }
        };

        Some(AssignSlot {
            cursor: self,
            coord,
            source,
            entry,
        })
    }

    /// Visit every remaining slot with `(coord, target, source)`
    pub fn for_each<F>(mut self, mut f: F)
    where
        F: FnMut(Coord, &mut P, &S::Payload),
    {
        while let Some(mut slot) = self.next_slot() {
            let coord = slot.coord;
            let (target, source) = slot.split();
            f(coord, target, source);
        }
    }

    /// Fallible [`for_each`](Self::for_each); stops at the first error
    ///
    /// The slot that failed is still released, so a payload it already
    /// made occupied is stored.
    pub fn try_for_each<F, E>(mut self, mut f: F) -> std::result::Result<(), E>
    where
        F: FnMut(Coord, &mut P, &S::Payload) -> std::result::Result<(), E>,
    {
        while let Some(mut slot) = self.next_slot() {
            let coord = slot.coord;
            let (target, source) = slot.split();
            f(coord, target, source)?;
        }
        Ok(())
    }
}

impl<P, S> AssignSlot<'_, '_, P, S>
where
    P: Clone + Occupancy,
    S: FiberSource,
{
    pub fn coord(&self) -> Coord {
        self.coord
    }

    pub fn source(&self) -> &S::Payload {
        &self.source
    }

    /// Whether the target held an entry at this coordinate
    pub fn is_stored(&self) -> bool {
        matches!(self.entry, Entry::Stored(_))
    }

    /// Target payload, stored or staged
    pub fn target(&mut self) -> &mut P {
        match &mut self.entry {
            Entry::Stored(pos) => &mut self.cursor.target.payloads_mut()[*pos],
            Entry::Staged(payload) => payload,
        }
    }

    /// Target and source payloads at once
    pub fn split(&mut self) -> (&mut P, &S::Payload) {
        let target = match &mut self.entry {
            Entry::Stored(pos) => &mut self.cursor.target.payloads_mut()[*pos],
            Entry::Staged(payload) => payload,
        };
        (target, &self.source)
    }
}

impl<P, S> Drop for AssignSlot<'_, '_, P, S>
where
    P: Clone + Occupancy,
    S: FiberSource,
{
    fn drop(&mut self) {
        // Placeholder only; the slot is gone after this
        let entry = std::mem::replace(&mut self.entry, Entry::Stored(0));
        if let Entry::Staged(payload) = entry {
            if payload.is_occupied(self.cursor.target.default_payload()) {
                self.cursor.target.insert(self.coord, payload);
            }
        }
        self.cursor.released = Some(self.coord);
    }
}

/// Cursor populating `target` from `source`
///
/// Counters are reported under the target's `"Rank <id>"` line, and the
/// target's rank is ticked as the cursor advances.
///
/// # Errors
///
/// [`FiberError::NotOrderedUnique`] if `target` or `source` is not ordered
/// and unique.
pub fn assign_from<'t, P, S>(
    metrics: &Metrics,
    target: &'t mut Fiber<P>,
    source: S,
) -> Result<Assign<'t, P, S>>
where
    P: Clone + Occupancy,
    S: FiberSource,
{
    if !(target.is_ordered() && target.is_unique()) {
        bail!(FiberError::NotOrderedUnique {
            rank: target.rank_id().to_string(),
        });
    }
    require_ordered_unique(&source)?;

    let probe = Probe::new(metrics, target.rank(), source.rank());
    Ok(Assign {
        target,
        source: source.into_stream(),
        probe,
        released: None,
        finished: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fibertrace_core::RankAttrs;

    fn fiber(coords: Vec<Coord>, payloads: Vec<i64>) -> Fiber<i64> {
        Fiber::new(RankAttrs::new("K").shared(), coords, payloads, 0).unwrap()
    }

    #[test]
    fn test_existing_payloads_updated_in_place() {
        let mut z = fiber(vec![1, 4], vec![10, 40]);
        let a = fiber(vec![1, 4], vec![1, 2]);

        assign_from(&Metrics::new(), &mut z, &a)
            .unwrap()
            .for_each(|_, z, a| *z += *a);
        assert_eq!(z.payloads(), &[11, 42]);
    }

    #[test]
    fn test_zero_never_inserted() {
        let mut z = fiber(vec![], vec![]);
        let a = fiber(vec![0, 1, 2], vec![7, 0, 9]);

        assign_from(&Metrics::new(), &mut z, &a)
            .unwrap()
            .for_each(|_, z, a| *z = **a);
        assert_eq!(z.coords(), &[0, 2]);
        assert_eq!(z.payloads(), &[7, 9]);
    }

    #[test]
    fn test_abandoned_cursor_skips_later_insertions() {
        let mut z = fiber(vec![], vec![]);
        let a = fiber(vec![3, 5], vec![1, 1]);

        {
            let mut cursor = assign_from(&Metrics::new(), &mut z, &a).unwrap();
            let mut slot = cursor.next_slot().unwrap();
            assert!(!slot.is_stored());
            *slot.target() = 8;
        }
        assert_eq!(z.coords(), &[3]);
        assert_eq!(z.payloads(), &[8]);
    }

    #[test]
    fn test_try_for_each_stops_at_error() {
        let mut z = fiber(vec![], vec![]);
        let a = fiber(vec![0, 1, 2], vec![1, 2, 3]);

        let res = assign_from(&Metrics::new(), &mut z, &a)
            .unwrap()
            .try_for_each(|c, z, a| {
                *z = **a;
                if c == 1 {
                    Err("stop")
                } else {
                    Ok(())
                }
            });
        assert_eq!(res, Err("stop"));
        assert_eq!(z.coords(), &[0, 1]);
    }

    #[test]
    fn test_counters() {
        let metrics = Metrics::new();
        metrics.begin_collect("t", &["K"]);

        let mut z = fiber(vec![2], vec![1]);
        let a = fiber(vec![0, 2, 5], vec![1, 1, 1]);
        assign_from(&metrics, &mut z, &a)
            .unwrap()
            .for_each(|_, z, a| *z += *a);

        let dump = metrics.dump();
        let rank = &dump["Rank K"];
        assert_eq!(rank["coordinate_read_tensor1"], 3);
        assert_eq!(rank["payload_read_tensor1"], 3);
        assert_eq!(rank["coordinate_read_tensor0"], 1);
        assert_eq!(rank["payload_read_tensor0"], 1);
        // 0 lies below the stored 2; 5 lies past the then-max 2
        assert_eq!(rank["coord_payload_insert_tensor0"], 1);
        assert_eq!(rank["coord_payload_append_tensor0"], 1);
        assert_eq!(z.coords(), &[0, 2, 5]);
    }

    #[test]
    fn test_uses_recorded_on_resume() {
        let metrics = Metrics::new();
        metrics.begin_collect("t", &["K"]);

        let mut z = fiber(vec![], vec![]);
        z.rank().set_collecting(true);
        let a = fiber(vec![4, 6], vec![1, 1]);

        let mut cursor = assign_from(&metrics, &mut z, &a).unwrap();
        drop(cursor.next_slot());
        assert_eq!(metrics.get_point(), vec![0]);

        drop(cursor.next_slot());
        assert_eq!(metrics.get_point(), vec![4]);
        assert_eq!(metrics.get_iter().as_slice(), &[1]);

        assert!(cursor.next_slot().is_none());
        assert_eq!(metrics.get_point(), vec![6]);
        assert_eq!(metrics.get_iter().as_slice(), &[0]);
    }

    #[test]
    fn test_rejects_unordered_target() {
        let mut z = fiber(vec![3, 1], vec![1, 1]);
        let a = fiber(vec![0], vec![1]);
        assert!(assign_from(&Metrics::new(), &mut z, &a).is_err());
    }
}
