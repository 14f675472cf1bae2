//! Fiber-tree tensors
//!
//! A [`Tensor`] names an ordered list of ranks and owns the root fiber of
//! its tree. Fibers of intermediate ranks carry [`Payload::Fiber`] payloads
//! that own the next rank's fiber; fibers of the last rank carry scalars.
//! Every fiber of a rank shares that rank's [`RankAttrs`].
//!
//! Construction groups sorted coordinate tuples level by level, the same
//! way a CSF tree is built from sorted COO entries.
//!
//! # Examples
//!
//! ```
//! use fibertrace_core::Tensor;
//!
//! let t = Tensor::from_entries(
//!     "A",
//!     &["M", "K"],
//!     &[2, 4],
//!     vec![([0, 1], 5), ([1, 3], 7), ([0, 2], 6)],
//! )
//! .unwrap();
//!
//! assert_eq!(t.root().coords(), &[0, 1]);
//! let row0 = t.root().payload(0).unwrap().as_fiber().unwrap();
//! assert_eq!(row0.coords(), &[1, 2]);
//! assert_eq!(t.nnz(), 3);
//! ```

use anyhow::{bail, Result};
use scirs2_core::numeric::Num;

use crate::error::FiberError;
use crate::fiber::Fiber;
use crate::payload::Payload;
use crate::types::{Coord, Format, Point, RankAttrs, RankRef};

/// Named tree of fibers
#[derive(Debug, Clone)]
pub struct Tensor<V> {
    name: String,
    ranks: Vec<RankRef>,
    root: Fiber<Payload<V>>,
}

impl<V: Num + Copy> Tensor<V> {
    /// Tensor with no entries
    pub fn empty<S: AsRef<str>>(
        name: impl Into<String>,
        rank_ids: &[S],
        shape: &[usize],
    ) -> Result<Self> {
        let ranks = make_ranks(rank_ids, shape)?;
        let root = Fiber::empty(ranks[0].clone(), default_for(&ranks, 0));
        Ok(Self {
            name: name.into(),
            ranks,
            root,
        })
    }

    /// Build a tensor from `(coordinates, value)` entries
    ///
    /// Entries may come in any order. Zero values are not stored.
    ///
    /// # Errors
    ///
    /// - [`FiberError::NoRanks`] / [`FiberError::ShapeMismatch`] for bad
    ///   rank declarations
    /// - [`FiberError::RankCountMismatch`] if an entry has the wrong
    ///   number of coordinates
    /// - [`FiberError::CoordOutOfBounds`] if a coordinate exceeds its shape
    /// - [`FiberError::DuplicateEntry`] if two entries share coordinates
    pub fn from_entries<S, C, I>(
        name: impl Into<String>,
        rank_ids: &[S],
        shape: &[usize],
        entries: I,
    ) -> Result<Self>
    where
        S: AsRef<str>,
        C: AsRef<[Coord]>,
        I: IntoIterator<Item = (C, V)>,
    {
        let ranks = make_ranks(rank_ids, shape)?;

        let mut points: Vec<(Point, V)> = Vec::new();
        for (coords, value) in entries {
            let coords = coords.as_ref();
            if coords.len() != ranks.len() {
                bail!(FiberError::RankCountMismatch {
                    expected: ranks.len(),
                    found: coords.len(),
                });
            }
            for (rank, &coord) in ranks.iter().zip(coords) {
                let extent = rank.shape().unwrap_or(usize::MAX);
                if coord >= extent {
                    bail!(FiberError::CoordOutOfBounds {
                        rank: rank.id().to_string(),
                        coord,
                        shape: extent,
                    });
                }
            }
            if value.is_zero() {
                continue;
            }
            points.push((Point::from_slice(coords), value));
        }

        points.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(w) = points.windows(2).find(|w| w[0].0 == w[1].0) {
            bail!(FiberError::DuplicateEntry {
                coords: w[0].0.to_vec(),
            });
        }

        let root = build_level(&ranks, 0, &points);
        Ok(Self {
            name: name.into(),
            ranks,
            root,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ranks(&self) -> &[RankRef] {
        &self.ranks
    }

    pub fn rank_ids(&self) -> Vec<&str> {
        self.ranks.iter().map(|r| r.id()).collect()
    }

    pub fn num_ranks(&self) -> usize {
        self.ranks.len()
    }

    /// Declared extent of every rank
    pub fn shape(&self) -> Vec<usize> {
        self.ranks.iter().map(|r| r.shape().unwrap_or(0)).collect()
    }

    /// Attributes of rank `id`
    pub fn rank(&self, id: &str) -> Option<&RankRef> {
        self.ranks.iter().find(|r| r.id() == id)
    }

    pub fn root(&self) -> &Fiber<Payload<V>> {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Fiber<Payload<V>> {
        &mut self.root
    }

    /// Enable or disable trace recording for uses of rank `id`
    pub fn set_collecting(&self, id: &str, collecting: bool) -> Result<()> {
        self.require_rank(id)?.set_collecting(collecting);
        Ok(())
    }

    /// Change the iteration format of rank `id`
    pub fn set_format(&self, id: &str, format: Format) -> Result<()> {
        self.require_rank(id)?.set_format(format);
        Ok(())
    }

    /// Every stored leaf as `(coordinates, value)`, in tree order
    pub fn entries(&self) -> Vec<(Point, V)> {
        let mut out = Vec::new();
        let mut prefix = Point::new();
        collect_entries(&self.root, &mut prefix, &mut out);
        out
    }

    /// Number of stored leaves
    pub fn nnz(&self) -> usize {
        count_leaves(&self.root)
    }

    fn require_rank(&self, id: &str) -> Result<&RankRef> {
        match self.rank(id) {
            Some(rank) => Ok(rank),
            None => bail!(FiberError::UnknownRank(id.to_string())),
        }
    }
}

fn make_ranks<S: AsRef<str>>(rank_ids: &[S], shape: &[usize]) -> Result<Vec<RankRef>> {
    if rank_ids.is_empty() {
        bail!(FiberError::NoRanks);
    }
    if rank_ids.len() != shape.len() {
        bail!(FiberError::ShapeMismatch {
            ranks: rank_ids.len(),
            shape: shape.len(),
        });
    }

    Ok(rank_ids
        .iter()
        .zip(shape)
        .map(|(id, &extent)| RankAttrs::new(id.as_ref()).with_shape(extent).shared())
        .collect())
}

/// Default payload of fibers at `level`: zero at the last rank, otherwise
/// an empty fiber of the next rank
fn default_for<V: Num + Copy>(ranks: &[RankRef], level: usize) -> Payload<V> {
    if level + 1 == ranks.len() {
        Payload::Scalar(V::zero())
    } else {
        Payload::fiber(Fiber::empty(
            ranks[level + 1].clone(),
            default_for(ranks, level + 1),
        ))
    }
}

fn build_level<V: Num + Copy>(
    ranks: &[RankRef],
    level: usize,
    points: &[(Point, V)],
) -> Fiber<Payload<V>> {
    let default = default_for(ranks, level);
    let mut pairs = Vec::new();

    if level + 1 == ranks.len() {
        pairs.extend(points.iter().map(|(p, v)| (p[level], Payload::Scalar(*v))));
    } else {
        let mut start = 0;
        while start < points.len() {
            let coord = points[start].0[level];
            let end = start + points[start..].partition_point(|(p, _)| p[level] == coord);
            let child = build_level(ranks, level + 1, &points[start..end]);
            pairs.push((coord, Payload::fiber(child)));
            start = end;
        }
    }

    Fiber::from_pairs(ranks[level].clone(), pairs, default)
}

fn collect_entries<V: Copy>(
    fiber: &Fiber<Payload<V>>,
    prefix: &mut Point,
    out: &mut Vec<(Point, V)>,
) {
    for (coord, payload) in fiber.iter_occupancy() {
        prefix.push(coord);
        match payload {
            Payload::Scalar(v) => out.push((prefix.clone(), *v)),
            Payload::Fiber(child) => collect_entries(child, prefix, out),
        }
        prefix.pop();
    }
}

fn count_leaves<V>(fiber: &Fiber<Payload<V>>) -> usize {
    fiber
        .payloads()
        .iter()
        .map(|p| match p {
            Payload::Scalar(_) => 1,
            Payload::Fiber(child) => count_leaves(child),
        })
        .sum()
}
