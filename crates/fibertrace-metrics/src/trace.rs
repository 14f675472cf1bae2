//! Per-rank reuse-trace buffers
//!
//! Each traced rank owns a [`RankTrace`]: a bounded buffer of CSV lines
//! plus the iteration prefix of the most recent record. Lines are appended
//! in visit order and written to `<prefix>-<rank>.csv` in insertion order.
//!
//! # File format
//!
//! ```text
//! M_pos,N_pos,M,N
//! 0,0,0,2
//! 0,1,0,5
//! ```
//!
//! The first half of each row is the iteration prefix (loop positions for
//! ranks `0..=k`), the second half the coordinates observed at those ranks.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{MetricsError, MetricsResult};

/// Iteration prefix recorded with each trace line
pub type IterKey = Vec<u64>;

/// Buffered trace of one rank
#[derive(Debug)]
pub struct RankTrace {
    path: PathBuf,
    lines: Vec<String>,
    last_iter: Option<IterKey>,
}

impl RankTrace {
    /// Start a trace at `path`, truncating any previous file
    ///
    /// The header line is buffered, not written, so it is flushed together
    /// with the first batch of records.
    pub fn create(path: PathBuf, loop_prefix: &[String]) -> MetricsResult<Self> {
        File::create(&path).map_err(|e| MetricsError::io(&path, e))?;

        let pos = loop_prefix
            .iter()
            .map(|r| format!("{r}_pos"))
            .collect::<Vec<_>>()
            .join(",");
        let coord = loop_prefix.join(",");

        Ok(Self {
            path,
            lines: vec![format!("{pos},{coord}\n")],
            last_iter: None,
        })
    }

    /// Path of the trace file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of buffered lines
    pub fn buffered(&self) -> usize {
        self.lines.len()
    }

    /// Buffered lines, oldest first
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether `iter` equals the iteration prefix of the last record
    pub fn repeats(&self, iter: &[u64]) -> bool {
        self.last_iter.as_deref() == Some(iter)
    }

    /// Append a record; returns the buffer length afterwards
    pub fn push(&mut self, iter: &[u64], point: &[usize]) -> usize {
        let mut line = iter
            .iter()
            .map(|i| i.to_string())
            .chain(point.iter().map(|c| c.to_string()))
            .collect::<Vec<_>>()
            .join(",");
        line.push('\n');

        self.last_iter = Some(iter.to_vec());
        self.lines.push(line);
        self.lines.len()
    }

    /// Drop the most recent record and forget its iteration prefix
    pub fn pop(&mut self) {
        self.last_iter = None;
        self.lines.pop();
    }

    /// Write all but the newest line, keeping the newest buffered
    pub fn spill(&mut self) -> MetricsResult<usize> {
        let Some(last) = self.lines.pop() else {
            return Ok(0);
        };
        let written = self.write_buffered()?;
        self.lines.push(last);
        Ok(written)
    }

    /// Write every buffered line
    pub fn flush(&mut self) -> MetricsResult<usize> {
        self.write_buffered()
    }

    fn write_buffered(&mut self) -> MetricsResult<usize> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| MetricsError::io(&self.path, e))?;

        let mut writer = BufWriter::new(file);
        for line in &self.lines {
            writer
                .write_all(line.as_bytes())
                .map_err(|e| MetricsError::io(&self.path, e))?;
        }
        writer.flush().map_err(|e| MetricsError::io(&self.path, e))?;

        let written = self.lines.len();
        self.lines.clear();
        Ok(written)
    }
}
