//! Error types for fiber and tensor construction

use thiserror::Error;

use crate::types::Coord;

/// Errors raised by fiber and tensor operations
///
/// Operations returning `anyhow::Result` raise these with `bail!`; callers
/// that need the variant use `downcast_ref::<FiberError>()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FiberError {
    #[error("Fiber of rank {rank} is not ordered and unique")]
    NotOrderedUnique { rank: String },

    #[error("Invalid start position {start_pos} for fiber of length {len}")]
    InvalidStartPosition { start_pos: usize, len: usize },

    #[error("Length mismatch: {coords} coordinates, {payloads} payloads")]
    LengthMismatch { coords: usize, payloads: usize },

    #[error("Entry has {found} coordinates, tensor has {expected} ranks")]
    RankCountMismatch { expected: usize, found: usize },

    #[error("{ranks} rank ids but {shape} shape extents")]
    ShapeMismatch { ranks: usize, shape: usize },

    #[error("Coordinate {coord} out of bounds for rank {rank} with shape {shape}")]
    CoordOutOfBounds {
        rank: String,
        coord: Coord,
        shape: usize,
    },

    #[error("Duplicate entry at {coords:?}")]
    DuplicateEntry { coords: Vec<Coord> },

    #[error("Unknown rank {0}")]
    UnknownRank(String),

    #[error("Tensor needs at least one rank")]
    NoRanks,
}

/// Errors raised by payload arithmetic
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Cannot apply {operation} to a fiber payload")]
    FiberArithmetic { operation: &'static str },

    #[error("Payload holds a fiber, not a scalar")]
    NotScalar,

    #[error("Payload holds a scalar, not a fiber")]
    NotFiber,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FiberError::InvalidStartPosition {
            start_pos: 4,
            len: 3,
        };
        assert_eq!(
            err.to_string(),
            "Invalid start position 4 for fiber of length 3"
        );

        let err = PayloadError::FiberArithmetic { operation: "add" };
        assert!(err.to_string().contains("add"));
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = FiberError::NotOrderedUnique { rank: "K".into() }.into();
        assert_eq!(
            err.downcast_ref::<FiberError>(),
            Some(&FiberError::NotOrderedUnique { rank: "K".into() })
        );
    }
}
