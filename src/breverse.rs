//! Tape-recording differentiable number.
//!
//! [`BReverse<F>`] appends opcodes to the tape installed by the live
//! [`RecordingGuard`](crate::bytecode_tape::RecordingGuard). Operations whose
//! operands are all constants are evaluated eagerly and never touch the tape,
//! so constants can be built (and `zero()`/`one()` called) outside a
//! recording scope.

use std::fmt::{self, Display};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{One, Zero};

use crate::bytecode_tape::{self, BytecodeTape, TapeFloat, CONSTANT};
use crate::float::{Elementary, Float};
use crate::opcode::{OpCode, UNUSED};

/// Tape-recording variable: a value plus its tape index.
///
/// Constants carry the index [`CONSTANT`].
#[derive(Clone, Copy, Debug)]
pub struct BReverse<F: Float> {
    pub(crate) value: F,
    pub(crate) index: u32,
}

impl<F: Float> BReverse<F> {
    /// Create a constant (not tracked on tape).
    #[inline]
    pub fn constant(value: F) -> Self {
        BReverse {
            value,
            index: CONSTANT,
        }
    }

    /// Create from a tape allocation (internal use).
    #[inline]
    pub fn from_tape(value: F, index: u32) -> Self {
        BReverse { value, index }
    }

    /// Get the tape index.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Whether this value is untracked.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.index == CONSTANT
    }
}

impl<F: Float> Display for BReverse<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<F: Float> Default for BReverse<F> {
    fn default() -> Self {
        BReverse::constant(F::zero())
    }
}

// ── Recording helpers ──

/// Promote a constant operand to a `Const` entry on the tape.
#[inline]
fn ensure_on_tape<F: Float>(x: &BReverse<F>, tape: &mut BytecodeTape<F>) -> u32 {
    if x.index == CONSTANT {
        tape.push_const(x.value)
    } else {
        x.index
    }
}

#[inline]
fn record_binary<F: TapeFloat>(
    lhs: BReverse<F>,
    rhs: BReverse<F>,
    op: OpCode,
    value: F,
) -> BReverse<F> {
    if lhs.is_constant() && rhs.is_constant() {
        return BReverse::constant(value);
    }
    let index = bytecode_tape::with_recording_tape(|t| {
        let li = ensure_on_tape(&lhs, t);
        let ri = ensure_on_tape(&rhs, t);
        t.push_op(op, li, ri, value)
    });
    BReverse { value, index }
}

#[inline]
fn record_unary<F: TapeFloat>(x: BReverse<F>, op: OpCode, value: F) -> BReverse<F> {
    if x.is_constant() {
        return BReverse::constant(value);
    }
    let index = bytecode_tape::with_recording_tape(|t| t.push_op(op, x.index, UNUSED, value));
    BReverse { value, index }
}

// ── Operators ──

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign:ident, $op:expr, $sym:tt) => {
        impl<F: TapeFloat> $trait for BReverse<F> {
            type Output = Self;
            #[inline]
            fn $method(self, rhs: Self) -> Self {
                record_binary(self, rhs, $op, self.value $sym rhs.value)
            }
        }

        impl<F: TapeFloat> $assign_trait for BReverse<F> {
            #[inline]
            fn $assign(&mut self, rhs: Self) {
                *self = *self $sym rhs;
            }
        }
    };
}

impl_binary_op!(Add, add, AddAssign, add_assign, OpCode::Add, +);
impl_binary_op!(Sub, sub, SubAssign, sub_assign, OpCode::Sub, -);
impl_binary_op!(Mul, mul, MulAssign, mul_assign, OpCode::Mul, *);
impl_binary_op!(Div, div, DivAssign, div_assign, OpCode::Div, /);

impl<F: TapeFloat> Neg for BReverse<F> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        record_unary(self, OpCode::Neg, -self.value)
    }
}

// Mixed ops: the primitive operand is promoted to a constant.
macro_rules! impl_scalar_ops {
    ($f:ty) => {
        impl_scalar_ops!(@op $f, Add, add, +);
        impl_scalar_ops!(@op $f, Sub, sub, -);
        impl_scalar_ops!(@op $f, Mul, mul, *);
        impl_scalar_ops!(@op $f, Div, div, /);
    };
    (@op $f:ty, $trait:ident, $method:ident, $sym:tt) => {
        impl $trait<$f> for BReverse<$f> {
            type Output = BReverse<$f>;
            #[inline]
            fn $method(self, rhs: $f) -> BReverse<$f> {
                self $sym BReverse::constant(rhs)
            }
        }

        impl $trait<BReverse<$f>> for $f {
            type Output = BReverse<$f>;
            #[inline]
            fn $method(self, rhs: BReverse<$f>) -> BReverse<$f> {
                BReverse::constant(self) $sym rhs
            }
        }
    };
}

impl_scalar_ops!(f32);
impl_scalar_ops!(f64);

// ── Comparison ──

impl<F: Float> PartialEq for BReverse<F> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<F: Float> PartialOrd for BReverse<F> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

// ── num_traits ──

impl<F: TapeFloat> Zero for BReverse<F> {
    #[inline]
    fn zero() -> Self {
        BReverse::constant(F::zero())
    }
    #[inline]
    fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

impl<F: TapeFloat> One for BReverse<F> {
    #[inline]
    fn one() -> Self {
        BReverse::constant(F::one())
    }
}

// ── Elementary functions ──

macro_rules! recorded_unary {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            #[inline]
            fn $name(self) -> Self {
                record_unary(self, OpCode::$op, self.value.$name())
            }
        )*
    };
}

impl<F: TapeFloat> Elementary for BReverse<F> {
    recorded_unary! {
        recip => Recip,
        sqrt => Sqrt,
        exp => Exp,
        ln => Ln,
        sin => Sin,
        cos => Cos,
        tan => Tan,
        asin => Asin,
        acos => Acos,
        atan => Atan,
        sinh => Sinh,
        cosh => Cosh,
        tanh => Tanh,
        abs => Abs,
        signum => Signum,
    }

    #[inline]
    fn powi(self, n: i32) -> Self {
        let value = self.value.powi(n);
        if self.is_constant() {
            return BReverse::constant(value);
        }
        let index = bytecode_tape::with_recording_tape(|t| t.push_powi(self.index, n, value));
        BReverse { value, index }
    }

    #[inline]
    fn powf(self, n: Self) -> Self {
        record_binary(self, n, OpCode::Powf, self.value.powf(n.value))
    }

    #[inline]
    fn max(self, other: Self) -> Self {
        record_binary(self, other, OpCode::Max, self.value.max(other.value))
    }

    #[inline]
    fn min(self, other: Self) -> Self {
        record_binary(self, other, OpCode::Min, self.value.min(other.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode_tape::RecordingGuard;

    #[test]
    fn constants_never_touch_the_tape() {
        let c = BReverse::constant(2.0_f64) * BReverse::constant(3.0);
        assert!(c.is_constant());
        assert_eq!(c.value, 6.0);
        assert_eq!(c.exp().value, 6.0_f64.exp());
    }

    #[test]
    fn operations_on_inputs_are_recorded() {
        let mut tape = BytecodeTape::<f64>::new();
        let x = BReverse::from_tape(2.0, tape.new_input(2.0));
        let y = {
            let _guard = RecordingGuard::new(&mut tape);
            (x * 3.0_f64).sin().max(x)
        };
        tape.set_outputs(&[y.index]);
        // input, const, mul, sin, max
        assert_eq!(tape.num_ops(), 5);
        assert_eq!(tape.num_switches(), 1);
    }
}
