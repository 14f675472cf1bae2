//! Tensor payloads
//!
//! A [`Payload`] is either a scalar value (last rank of a tensor) or the
//! owned fiber of the next rank. Arithmetic unwraps scalars, computes and
//! rewraps the result; applied to a fiber payload it fails with
//! [`PayloadError::FiberArithmetic`].
//!
//! # Examples
//!
//! ```
//! use fibertrace_core::Payload;
//!
//! let a = Payload::Scalar(3);
//! let b = Payload::Scalar(4);
//!
//! assert_eq!((&a * &b).unwrap(), 12);
//! assert_eq!((a + 2).unwrap(), Payload::Scalar(5));
//! ```

use std::ops::{Add, Mul, Sub};

use scirs2_core::numeric::Num;

use crate::error::PayloadError;
use crate::fiber::Fiber;

/// Scalar value or owned sub-fiber
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<V> {
    Scalar(V),
    Fiber(Box<Fiber<Payload<V>>>),
}

impl<V> Payload<V> {
    /// Wrap a sub-fiber
    pub fn fiber(fiber: Fiber<Payload<V>>) -> Self {
        Payload::Fiber(Box::new(fiber))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Payload::Scalar(_))
    }

    pub fn as_fiber(&self) -> Option<&Fiber<Payload<V>>> {
        match self {
            Payload::Fiber(f) => Some(f),
            Payload::Scalar(_) => None,
        }
    }

    pub fn as_fiber_mut(&mut self) -> Option<&mut Fiber<Payload<V>>> {
        match self {
            Payload::Fiber(f) => Some(f),
            Payload::Scalar(_) => None,
        }
    }

    /// Sub-fiber, for descending one rank in a recursive merge
    pub fn try_fiber(&self) -> Result<&Fiber<Payload<V>>, PayloadError> {
        self.as_fiber().ok_or(PayloadError::NotFiber)
    }

    pub fn try_fiber_mut(&mut self) -> Result<&mut Fiber<Payload<V>>, PayloadError> {
        self.as_fiber_mut().ok_or(PayloadError::NotFiber)
    }

    pub fn into_fiber(self) -> Option<Fiber<Payload<V>>> {
        match self {
            Payload::Fiber(f) => Some(*f),
            Payload::Scalar(_) => None,
        }
    }
}

impl<V: Copy> Payload<V> {
    /// Scalar value
    ///
    /// # Errors
    ///
    /// [`PayloadError::NotScalar`] for a fiber payload.
    pub fn value(&self) -> Result<V, PayloadError> {
        match self {
            Payload::Scalar(v) => Ok(*v),
            Payload::Fiber(_) => Err(PayloadError::NotScalar),
        }
    }
}

impl<V: Num + Copy> Payload<V> {
    /// Add `rhs` to a scalar payload in place
    pub fn add_assign_value(&mut self, rhs: V) -> Result<(), PayloadError> {
        match self {
            Payload::Scalar(v) => {
                *v = *v + rhs;
                Ok(())
            }
            Payload::Fiber(_) => Err(PayloadError::FiberArithmetic { operation: "add" }),
        }
    }

    /// Multiply a scalar payload by `rhs` in place
    pub fn mul_assign_value(&mut self, rhs: V) -> Result<(), PayloadError> {
        match self {
            Payload::Scalar(v) => {
                *v = *v * rhs;
                Ok(())
            }
            Payload::Fiber(_) => Err(PayloadError::FiberArithmetic { operation: "mul" }),
        }
    }

    fn scalar_for(&self, operation: &'static str) -> Result<V, PayloadError> {
        match self {
            Payload::Scalar(v) => Ok(*v),
            Payload::Fiber(_) => Err(PayloadError::FiberArithmetic { operation }),
        }
    }
}

impl<V> From<V> for Payload<V> {
    fn from(v: V) -> Self {
        Payload::Scalar(v)
    }
}

impl<V: PartialEq> PartialEq<V> for Payload<V> {
    fn eq(&self, other: &V) -> bool {
        matches!(self, Payload::Scalar(v) if v == other)
    }
}

macro_rules! payload_binop {
    ($trait:ident, $method:ident, $name:literal) => {
        impl<'a, V: Num + Copy> $trait<&'a Payload<V>> for &'a Payload<V> {
            type Output = Result<Payload<V>, PayloadError>;

            fn $method(self, rhs: &'a Payload<V>) -> Self::Output {
                let l = self.scalar_for($name)?;
                let r = rhs.scalar_for($name)?;
                Ok(Payload::Scalar(l.$method(r)))
            }
        }

        impl<V: Num + Copy> $trait for Payload<V> {
            type Output = Result<Payload<V>, PayloadError>;

            fn $method(self, rhs: Payload<V>) -> Self::Output {
                (&self).$method(&rhs)
            }
        }

        impl<V: Num + Copy> $trait<V> for &Payload<V> {
            type Output = Result<Payload<V>, PayloadError>;

            fn $method(self, rhs: V) -> Self::Output {
                Ok(Payload::Scalar(self.scalar_for($name)?.$method(rhs)))
            }
        }

        impl<V: Num + Copy> $trait<V> for Payload<V> {
            type Output = Result<Payload<V>, PayloadError>;

            fn $method(self, rhs: V) -> Self::Output {
                (&self).$method(rhs)
            }
        }
    };
}

payload_binop!(Add, add, "add");
payload_binop!(Sub, sub, "sub");
payload_binop!(Mul, mul, "mul");

/// Whether a staged payload is worth storing in a fiber
pub trait Occupancy {
    fn is_occupied(&self, default: &Self) -> bool;
}

impl<V: PartialEq> Occupancy for Payload<V> {
    fn is_occupied(&self, default: &Self) -> bool {
        match self {
            Payload::Fiber(f) => !f.is_empty(),
            Payload::Scalar(_) => self != default,
        }
    }
}

impl<P> Occupancy for Fiber<P> {
    fn is_occupied(&self, _default: &Self) -> bool {
        !self.is_empty()
    }
}

macro_rules! scalar_occupancy {
    ($($t:ty),*) => {
        $(
            impl Occupancy for $t {
                fn is_occupied(&self, default: &Self) -> bool {
                    self != default
                }
            }
        )*
    };
}

scalar_occupancy!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);
