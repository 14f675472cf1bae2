//! Shared plumbing of the merge iterators
//!
//! [`Head`] holds the current element of one operand stream and only pulls
//! the next one when the merge actually needs it, so an operand is resumed
//! after the merged element was handed out, not before. [`Probe`] carries
//! the metrics handle, the first operand's rank and counter line, and the
//! ranks whose uses are traced.

use anyhow::{bail, Result};
use fibertrace_core::{Coord, FiberError, FiberSource, RankAttrs};
use fibertrace_metrics::Metrics;

/// Current element of an operand stream
#[derive(Debug)]
pub(crate) struct Head<S, P> {
    stream: S,
    head: Option<(Coord, P)>,
    stale: bool,
}

impl<S, P> Head<S, P>
where
    S: Iterator<Item = (Coord, P)>,
{
    pub(crate) fn new(stream: S) -> Self {
        Self {
            stream,
            head: None,
            stale: true,
        }
    }

    /// Coordinate of the current element, pulling it if needed
    pub(crate) fn coord(&mut self) -> Option<Coord> {
        if self.stale {
            self.head = self.stream.next();
            self.stale = false;
        }
        self.head.as_ref().map(|(c, _)| *c)
    }

    /// Hand out the current element; the next one is pulled lazily
    pub(crate) fn take(&mut self) -> Option<(Coord, P)> {
        self.coord();
        self.stale = true;
        self.head.take()
    }

    /// Drop the current element
    pub(crate) fn skip(&mut self) {
        self.take();
    }
}

/// Metrics access of one merge iterator
#[derive(Debug)]
pub(crate) struct Probe {
    metrics: Metrics,
    rank: String,
    line: String,
    collecting: bool,
    traced: [Option<String>; 2],
}

impl Probe {
    pub(crate) fn new(metrics: &Metrics, a: &RankAttrs, b: &RankAttrs) -> Self {
        let collecting = metrics.is_collecting();
        let traced = |rank: &RankAttrs| {
            (collecting && rank.is_collecting()).then(|| rank.id().to_string())
        };

        Self {
            metrics: metrics.clone(),
            rank: a.id().to_string(),
            line: a.line(),
            collecting,
            traced: [traced(a), traced(b)],
        }
    }

    /// Increment `metric` under the first operand's line
    pub(crate) fn count(&self, metric: &str, inc: i64) {
        if self.collecting {
            self.metrics.inc_count(&self.line, metric, inc);
        }
    }

    /// Advance the first operand's slot in the iteration vector
    pub(crate) fn inc_iter(&self) {
        if self.collecting {
            self.metrics.inc_iter(&self.rank);
        }
    }

    /// Reset the first operand's slot in the iteration vector
    pub(crate) fn clr_iter(&self) {
        if self.collecting {
            self.metrics.clr_iter(&self.rank);
        }
    }

    /// Record a use of `coord` for every traced operand rank
    pub(crate) fn record_uses(&self, coord: Coord) {
        for rank in self.traced.iter().flatten() {
            self.metrics.record_use(rank, coord);
        }
    }
}

/// Reject operands whose coordinates are not strictly increasing
pub(crate) fn require_ordered_unique<S: FiberSource>(source: &S) -> Result<()> {
    if !source.is_ordered_unique() {
        bail!(FiberError::NotOrderedUnique {
            rank: source.rank().id().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_pulls_lazily() {
        let pulled = std::cell::Cell::new(0);
        let stream = (0..3).map(|c| {
            pulled.set(pulled.get() + 1);
            (c as Coord, c * 10)
        });
        let mut head = Head::new(stream);
        assert_eq!(pulled.get(), 0);

        assert_eq!(head.coord(), Some(0));
        assert_eq!(head.coord(), Some(0));
        assert_eq!(pulled.get(), 1);

        assert_eq!(head.take(), Some((0, 0)));
        assert_eq!(pulled.get(), 1);

        head.skip();
        assert_eq!(pulled.get(), 2);
        assert_eq!(head.take(), Some((2, 20)));
        assert_eq!(head.coord(), None);
    }

    #[test]
    fn test_probe_only_counts_while_collecting() {
        let metrics = Metrics::new();
        let a = RankAttrs::new("K");
        let b = RankAttrs::new("K");

        Probe::new(&metrics, &a, &b).count("m", 1);
        metrics.begin_collect("t", &["K"]);
        assert!(metrics.dump().is_empty());

        Probe::new(&metrics, &a, &b).count("m", 2);
        assert_eq!(metrics.dump()["Rank K"]["m"], 2);
    }

    #[test]
    fn test_probe_traces_collecting_ranks_only() {
        let metrics = Metrics::new();
        metrics.begin_collect("t", &["M", "K"]);
        let a = RankAttrs::new("M");
        a.set_collecting(true);
        let b = RankAttrs::new("K");

        Probe::new(&metrics, &a, &b).record_uses(4);
        assert_eq!(metrics.get_point(), vec![4, 0]);
    }
}
