//! Metrics session handle
//!
//! [`Metrics`] is a cheap, clonable handle to one collection session. Merge
//! kernels receive the handle explicitly and update it while their output
//! streams are pulled; there is no process-wide state. The model is
//! single-threaded: the handle is `!Send` and every clone mutates the same
//! session in program order.
//!
//! # Lifecycle
//!
//! ```text
//! begin_collect(prefix, loop_order)
//!     │  counters cleared, iteration/point vectors sized to the loop order
//!     ├─ inc_count / inc_iter / clr_iter / add_use / trace_rank ...
//!     ▼
//! end_collect()
//!        buffered trace lines flushed, session released
//! ```
//!
//! # Examples
//!
//! ```
//! use fibertrace_metrics::Metrics;
//!
//! let metrics = Metrics::new();
//! metrics.begin_collect("run", &["M", "N"]);
//!
//! metrics.inc_count("L1", "m", 5);
//! metrics.inc_count("L1", "m", 6);
//! assert_eq!(metrics.dump()["L1"]["m"], 11);
//!
//! metrics.inc_iter("M");
//! assert_eq!(metrics.get_iter().as_slice(), &[0, 1]);
//!
//! metrics.end_collect().unwrap();
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use smallvec::SmallVec;

use crate::config::MetricsConfig;
use crate::error::{MetricsError, MetricsResult};
use crate::trace::RankTrace;
use crate::tracing_support::{record_begin, record_end, record_flush, record_latched_error};

/// Accumulated counters: line key → metric name → count
pub type MetricsDump = BTreeMap<String, BTreeMap<String, i64>>;

/// Snapshot of the iteration vector
pub type IterVec = SmallVec<[u64; 6]>;

/// Handle to a metrics collection session
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Rc<RefCell<Collector>>,
}

#[derive(Debug)]
struct Collector {
    config: MetricsConfig,
    num_cached_uses: usize,
    counts: MetricsDump,
    session: Option<Session>,
    latched: Option<MetricsError>,
}

impl Default for Collector {
    fn default() -> Self {
        Self::with_config(MetricsConfig::builtin())
    }
}

impl Collector {
    fn with_config(config: MetricsConfig) -> Self {
        Self {
            num_cached_uses: config.num_cached_uses,
            config,
            counts: MetricsDump::new(),
            session: None,
            latched: None,
        }
    }
}

/// State that only exists between `begin_collect` and `end_collect`
#[derive(Debug)]
struct Session {
    prefix: String,
    loop_order: Vec<String>,
    line_order: HashMap<String, usize>,
    iteration: Vec<u64>,
    point: Vec<usize>,
    traces: BTreeMap<String, RankTrace>,
}

impl Session {
    fn index_of(&self, rank: &str) -> MetricsResult<usize> {
        self.line_order
            .get(rank)
            .copied()
            .ok_or_else(|| MetricsError::unknown_rank(rank, &self.loop_order))
    }
}

impl Metrics {
    /// Create an idle handle with the built-in configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an idle handle with an explicit configuration
    pub fn with_config(config: MetricsConfig) -> MetricsResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Rc::new(RefCell::new(Collector::with_config(config))),
        })
    }

    /// Create an idle handle configured from the environment
    pub fn from_env() -> MetricsResult<Self> {
        Self::with_config(MetricsConfig::default())
    }

    /// Begin a collection session
    ///
    /// Clears all counters and trace buffers and sizes the iteration and
    /// point vectors to `loop_order`. A session that was still open is
    /// discarded without flushing its traces.
    pub fn begin_collect<S: AsRef<str>>(&self, prefix: impl Into<String>, loop_order: &[S]) {
        let prefix = prefix.into();
        let loop_order: Vec<String> = loop_order.iter().map(|r| r.as_ref().to_string()).collect();
        let line_order = loop_order
            .iter()
            .enumerate()
            .map(|(i, r)| (r.clone(), i))
            .collect();

        record_begin(&prefix, &loop_order);

        let mut c = self.inner.borrow_mut();
        c.counts.clear();
        c.latched = None;
        c.session = Some(Session {
            prefix,
            iteration: vec![0; loop_order.len()],
            point: vec![0; loop_order.len()],
            line_order,
            loop_order,
            traces: BTreeMap::new(),
        });
    }

    /// End the collection session
    ///
    /// Flushes every buffered trace line, then releases the session state.
    /// Counters stay readable through [`dump`](Self::dump) until the next
    /// `begin_collect`. Returns the first error latched while merge streams
    /// were pulled, otherwise the first flush error.
    pub fn end_collect(&self) -> MetricsResult<()> {
        let mut guard = self.inner.borrow_mut();
        let collector = &mut *guard;

        let mut first_error = collector.latched.take();
        if let Some(mut session) = collector.session.take() {
            for (rank, trace) in session.traces.iter_mut() {
                match trace.flush() {
                    Ok(lines) => record_flush(rank, trace.path(), lines),
                    Err(e) => {
                        first_error.get_or_insert(e);
                    }
                }
            }
            record_end(&session.prefix, session.traces.len(), collector.counts.len());
        }
        collector.num_cached_uses = collector.config.num_cached_uses;

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Whether a collection session is active
    pub fn is_collecting(&self) -> bool {
        self.inner.borrow().session.is_some()
    }

    /// Declared loop order of the active session
    pub fn loop_order(&self) -> Vec<String> {
        self.inner
            .borrow()
            .session
            .as_ref()
            .map(|s| s.loop_order.clone())
            .unwrap_or_default()
    }

    /// Accumulate `inc` into the counter `metric` under `line`
    ///
    /// Missing keys are created on first use. Surrounding whitespace of
    /// `line` is ignored.
    pub fn inc_count(&self, line: &str, metric: &str, inc: i64) {
        let mut c = self.inner.borrow_mut();
        *c.counts
            .entry(line.trim().to_string())
            .or_default()
            .entry(metric.to_string())
            .or_insert(0) += inc;
    }

    /// Advance `rank`'s position in the iteration vector
    ///
    /// A no-op when `rank` is not in the loop order or no session is active.
    pub fn inc_iter(&self, rank: &str) {
        let mut c = self.inner.borrow_mut();
        if let Some(session) = c.session.as_mut() {
            if let Some(&i) = session.line_order.get(rank) {
                session.iteration[i] += 1;
            }
        }
    }

    /// Reset `rank`'s position in the iteration vector to zero
    ///
    /// A no-op when `rank` is not in the loop order or no session is active.
    pub fn clr_iter(&self, rank: &str) {
        let mut c = self.inner.borrow_mut();
        if let Some(session) = c.session.as_mut() {
            if let Some(&i) = session.line_order.get(rank) {
                session.iteration[i] = 0;
            }
        }
    }

    /// Snapshot of the iteration vector, innermost rank first
    pub fn get_iter(&self) -> IterVec {
        self.inner
            .borrow()
            .session
            .as_ref()
            .map(|s| s.iteration.iter().rev().copied().collect())
            .unwrap_or_default()
    }

    /// Last coordinate observed per rank, in loop order
    pub fn get_point(&self) -> Vec<usize> {
        self.inner
            .borrow()
            .session
            .as_ref()
            .map(|s| s.point.clone())
            .unwrap_or_default()
    }

    /// Record that `rank` is positioned at `coord`
    ///
    /// Updates the point vector. For traced ranks a record is buffered; if
    /// the iteration prefix is unchanged since the previous record of this
    /// rank, that record is replaced so one nest step yields one line. When
    /// the buffer reaches `num_cached_uses + 1` lines, all but the newest
    /// are written out.
    pub fn add_use(&self, rank: &str, coord: usize) -> MetricsResult<()> {
        let mut guard = self.inner.borrow_mut();
        let collector = &mut *guard;
        let limit = collector.num_cached_uses;

        let session = collector
            .session
            .as_mut()
            .ok_or(MetricsError::NotCollecting {
                operation: "add_use",
            })?;
        let i = session.index_of(rank)?;
        session.point[i] = coord;

        let Some(trace) = session.traces.get_mut(rank) else {
            return Ok(());
        };

        let iter = &session.iteration[..=i];
        if trace.repeats(iter) {
            trace.pop();
        }

        if trace.push(iter, &session.point[..=i]) == limit + 1 {
            let lines = trace.spill()?;
            record_flush(rank, trace.path(), lines);
        }
        Ok(())
    }

    /// [`add_use`](Self::add_use) for callers that cannot return an error
    ///
    /// A failure is latched and reported by the next
    /// [`end_collect`](Self::end_collect).
    pub fn record_use(&self, rank: &str, coord: usize) {
        if let Err(e) = self.add_use(rank, coord) {
            self.latch(e);
        }
    }

    /// Undo the most recent trace record of `rank`
    ///
    /// Used when a coordinate was probed but its payload never consumed.
    pub fn remove_use(&self, rank: &str) {
        let mut c = self.inner.borrow_mut();
        if let Some(trace) = c
            .session
            .as_mut()
            .and_then(|s| s.traces.get_mut(rank))
        {
            trace.pop();
        }
    }

    /// Opt `rank` in to trace recording
    ///
    /// Truncates `<prefix>-<rank>.csv` and buffers the header
    /// `r0_pos,..,rk_pos,r0,..,rk` for the loop-order prefix ending at `rank`.
    pub fn trace_rank(&self, rank: &str) -> MetricsResult<()> {
        let mut guard = self.inner.borrow_mut();
        let collector = &mut *guard;

        let session = collector
            .session
            .as_mut()
            .ok_or(MetricsError::NotCollecting {
                operation: "trace_rank",
            })?;
        let i = session.index_of(rank)?;

        let path = collector.config.trace_path(&session.prefix, rank);
        let trace = RankTrace::create(path, &session.loop_order[..=i])?;
        session.traces.insert(rank.to_string(), trace);
        Ok(())
    }

    /// Whether `rank` is being traced in the active session
    pub fn is_traced(&self, rank: &str) -> bool {
        self.inner
            .borrow()
            .session
            .as_ref()
            .is_some_and(|s| s.traces.contains_key(rank))
    }

    /// Number of trace lines currently buffered for `rank`
    pub fn buffered_uses(&self, rank: &str) -> usize {
        self.inner
            .borrow()
            .session
            .as_ref()
            .and_then(|s| s.traces.get(rank))
            .map_or(0, RankTrace::buffered)
    }

    /// Set the number of uses buffered per rank before a flush
    ///
    /// Applies until the end of the current session.
    pub fn set_num_cached_uses(&self, num_cached_uses: usize) -> MetricsResult<()> {
        if num_cached_uses <= 1 {
            return Err(MetricsError::CacheTooSmall {
                size: num_cached_uses,
            });
        }
        self.inner.borrow_mut().num_cached_uses = num_cached_uses;
        Ok(())
    }

    /// Number of uses buffered per rank before a flush
    pub fn num_cached_uses(&self) -> usize {
        self.inner.borrow().num_cached_uses
    }

    /// All counters accumulated since the last `begin_collect`
    pub fn dump(&self) -> MetricsDump {
        self.inner.borrow().counts.clone()
    }

    fn latch(&self, error: MetricsError) {
        record_latched_error(&error);
        let mut c = self.inner.borrow_mut();
        if c.latched.is_none() {
            c.latched = Some(error);
        }
    }
}
