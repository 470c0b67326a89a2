//! The [`Scalar`] trait for writing AD-generic numeric code.
//!
//! Functions written as `fn f<T: Scalar>(x: &[T]) -> Vec<T>` work unchanged with
//! plain floats, with [`Dual`] (direction propagation) and with [`BReverse`]
//! (tape recording). This is the only capability the dispatcher asks of a
//! user function.

use std::fmt::{Debug, Display};

use num_traits::Zero;

use crate::breverse::BReverse;
use crate::bytecode_tape::TapeFloat;
use crate::dual::Dual;
use crate::float::{Elementary, Float};

/// The central trait for AD-generic numeric code.
pub trait Scalar: Elementary + Default + Debug + Display + 'static {
    /// The underlying primitive float type.
    type Float: Float;

    /// Lift a plain float to this scalar (constant, zero derivative).
    fn from_f(val: Self::Float) -> Self;

    /// Extract the primal value.
    fn value(&self) -> Self::Float;

    /// Directional derivative carried alongside the value; zero for backends
    /// that do not propagate directions.
    #[inline]
    fn tangent(&self) -> Self::Float {
        Self::Float::zero()
    }
}

macro_rules! impl_scalar_for_primitive {
    ($t:ty) => {
        impl Scalar for $t {
            type Float = $t;

            #[inline]
            fn from_f(val: $t) -> Self {
                val
            }

            #[inline]
            fn value(&self) -> $t {
                *self
            }
        }
    };
}

impl_scalar_for_primitive!(f32);
impl_scalar_for_primitive!(f64);

impl<F: Float> Scalar for Dual<F> {
    type Float = F;

    #[inline]
    fn from_f(val: F) -> Self {
        Dual::constant(val)
    }

    #[inline]
    fn value(&self) -> F {
        self.re
    }

    #[inline]
    fn tangent(&self) -> F {
        self.eps
    }
}

impl<F: TapeFloat> Scalar for BReverse<F> {
    type Float = F;

    #[inline]
    fn from_f(val: F) -> Self {
        BReverse::constant(val)
    }

    #[inline]
    fn value(&self) -> F {
        self.value
    }
}
