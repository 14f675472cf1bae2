//! Contribution masks of union-style merges
//!
//! A [`Mask`] records which operands had an entry at a coordinate. Operand
//! `i` is named by the `i`-th capital letter, so a two-operand union emits
//! `"A"`, `"B"` or `"AB"` and a four-operand union may emit `"ACD"`.
//!
//! # Examples
//!
//! ```
//! use fibertrace_merge::Mask;
//!
//! let mask = Mask::operand(0) | Mask::operand(2);
//! assert_eq!(mask, "AC");
//! assert!(mask.contains(2));
//! assert_eq!(Mask::AB.to_string(), "AB");
//! ```

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Positional set of contributing operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mask(u32);

impl Mask {
    /// Operands a mask can name, one per letter
    pub const MAX_OPERANDS: usize = 26;

    /// No contributing operand
    pub const EMPTY: Mask = Mask(0);
    /// First operand only
    pub const A: Mask = Mask(0b01);
    /// Second operand only
    pub const B: Mask = Mask(0b10);
    /// Both operands
    pub const AB: Mask = Mask(0b11);

    /// Mask naming only operand `i`
    ///
    /// `i` must be below [`Mask::MAX_OPERANDS`].
    pub const fn operand(i: usize) -> Mask {
        Mask(1 << i)
    }

    /// Whether operand `i` contributed
    pub fn contains(self, i: usize) -> bool {
        i < Self::MAX_OPERANDS && self.0 & (1 << i) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of contributing operands
    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Contributing operand positions, ascending
    pub fn operands(self) -> impl Iterator<Item = usize> {
        (0..Self::MAX_OPERANDS).filter(move |&i| self.contains(i))
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for Mask {
    type Output = Mask;

    fn bitor(self, rhs: Mask) -> Mask {
        Mask(self.0 | rhs.0)
    }
}

impl BitOrAssign for Mask {
    fn bitor_assign(&mut self, rhs: Mask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in self.operands() {
            write!(f, "{}", (b'A' + i as u8) as char)?;
        }
        Ok(())
    }
}

impl PartialEq<str> for Mask {
    fn eq(&self, other: &str) -> bool {
        let mut letters = other.bytes();
        self.operands()
            .all(|i| letters.next() == Some(b'A' + i as u8))
            && letters.next().is_none()
    }
}

impl PartialEq<&str> for Mask {
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}
