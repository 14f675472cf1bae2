//! Coordinates, rank formats and shared rank attributes

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Position within one rank's index space
pub type Coord = usize;

/// Coordinate tuple addressing one element of a multi-rank tensor
pub type Point = SmallVec<[Coord; 6]>;

/// Shared handle to a rank's attributes
pub type RankRef = Rc<RankAttrs>;

/// Iteration format of a rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Format {
    /// Compressed: only stored entries are iterated
    #[default]
    C,
    /// Uncompressed: every coordinate of the declared shape is iterated
    U,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::C => write!(f, "C"),
            Format::U => write!(f, "U"),
        }
    }
}

/// Per-rank metadata shared by every fiber of that rank
///
/// Format and the collecting flag are interior-mutable so a tensor can
/// retarget them after its fibers were built.
#[derive(Debug)]
pub struct RankAttrs {
    id: String,
    shape: Option<usize>,
    format: Cell<Format>,
    collecting: Cell<bool>,
}

impl RankAttrs {
    /// Attributes for rank `id` with format `C` and no declared shape
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            shape: None,
            format: Cell::new(Format::C),
            collecting: Cell::new(false),
        }
    }

    /// Declare the extent of the rank
    pub fn with_shape(mut self, shape: usize) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Set the initial format
    pub fn with_format(self, format: Format) -> Self {
        self.format.set(format);
        self
    }

    /// Wrap in a shared handle
    pub fn shared(self) -> RankRef {
        Rc::new(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn shape(&self) -> Option<usize> {
        self.shape
    }

    pub fn format(&self) -> Format {
        self.format.get()
    }

    pub fn set_format(&self, format: Format) {
        self.format.set(format);
    }

    /// Whether uses of this rank are recorded in the metrics trace
    pub fn is_collecting(&self) -> bool {
        self.collecting.get()
    }

    pub fn set_collecting(&self, collecting: bool) {
        self.collecting.set(collecting);
    }

    /// Metrics line key for counters attributed to this rank
    pub fn line(&self) -> String {
        format!("Rank {}", self.id)
    }

    /// Fresh attributes carrying only this rank's id
    pub fn derived(&self) -> RankRef {
        RankAttrs::new(self.id.clone()).shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_attrs_builder() {
        let rank = RankAttrs::new("K").with_shape(8).with_format(Format::U);
        assert_eq!(rank.id(), "K");
        assert_eq!(rank.shape(), Some(8));
        assert_eq!(rank.format(), Format::U);
        assert!(!rank.is_collecting());
        assert_eq!(rank.line(), "Rank K");
    }

    #[test]
    fn test_shared_attrs_are_interior_mutable() {
        let rank = RankAttrs::new("M").shared();
        let other = Rc::clone(&rank);

        other.set_collecting(true);
        other.set_format(Format::U);
        assert!(rank.is_collecting());
        assert_eq!(rank.format(), Format::U);
    }

    #[test]
    fn test_derived_keeps_only_id() {
        let rank = RankAttrs::new("N").with_shape(4).with_format(Format::U);
        rank.set_collecting(true);

        let derived = rank.derived();
        assert_eq!(derived.id(), "N");
        assert_eq!(derived.shape(), None);
        assert_eq!(derived.format(), Format::C);
        assert!(!derived.is_collecting());
    }
}
