//! Error types for merge operators

use thiserror::Error;

/// Errors raised when setting up a variadic merge
///
/// Binary operators report operand precondition failures as
/// [`FiberError`](fibertrace_core::FiberError).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Variadic merge needs at least 2 operands, got {found}")]
    TooFewOperands { found: usize },

    #[error("Union of {found} operands exceeds the {max} a mask can name")]
    TooManyOperands { found: usize, max: usize },
}
