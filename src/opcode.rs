//! Bytecode opcodes for the bytecode tape.
//!
//! Each opcode represents an elementary operation. The [`eval_forward`] and
//! [`reverse_partials`] functions evaluate / differentiate a single opcode and
//! are generic over [`Elementary`], so the same code drives primal re-evaluation
//! (`F`), tangent sweeps and forward-over-reverse (`Dual<F>`).

use crate::float::Elementary;

/// Sentinel used in `arg_indices[1]` for unary ops (the second argument slot is unused).
pub const UNUSED: u32 = u32::MAX;

/// Elementary operation codes for the bytecode tape.
///
/// Binary ops use both `arg_indices` slots; unary ops use slot 0 only
/// (slot 1 = [`UNUSED`], except for [`OpCode::Powi`] which stores the `i32`
/// exponent reinterpreted as `u32` in slot 1).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpCode {
    // ── Structural ──
    /// Input variable (leaf node).
    Input,
    /// Scalar constant.
    Const,

    // ── Binary ──
    Add,
    Sub,
    Mul,
    Div,
    Powf,
    Max,
    Min,

    // ── Unary ──
    Neg,
    Recip,
    Sqrt,
    /// Integer power. Exponent stored in `arg_indices[1]` as `exp as u32`.
    Powi,
    Exp,
    Ln,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Abs,
    /// Zero derivative but needed for re-evaluation.
    Signum,
}

impl OpCode {
    /// True for ops reading both argument slots as tape indices.
    #[inline]
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            OpCode::Add
                | OpCode::Sub
                | OpCode::Mul
                | OpCode::Div
                | OpCode::Powf
                | OpCode::Max
                | OpCode::Min
        )
    }

    /// True for the piecewise-linear kinks that become switching variables in
    /// the abs-normal form (`abs`, `min`, `max`).
    #[inline]
    pub fn is_switch(self) -> bool {
        matches!(self, OpCode::Abs | OpCode::Min | OpCode::Max)
    }
}

/// Evaluate a single opcode in the forward direction.
///
/// For unary ops `b` is ignored. [`OpCode::Powi`] is evaluated through
/// [`eval_powi`] because its exponent is not a tape value.
#[inline]
pub fn eval_forward<T: Elementary>(op: OpCode, a: T, b: T) -> T {
    match op {
        OpCode::Input | OpCode::Const => {
            unreachable!("Input/Const should not be re-evaluated via eval_forward")
        }
        OpCode::Powi => unreachable!("Powi is evaluated via eval_powi"),

        OpCode::Add => a + b,
        OpCode::Sub => a - b,
        OpCode::Mul => a * b,
        OpCode::Div => a / b,
        OpCode::Powf => a.powf(b),
        OpCode::Max => a.max(b),
        OpCode::Min => a.min(b),

        OpCode::Neg => -a,
        OpCode::Recip => a.recip(),
        OpCode::Sqrt => a.sqrt(),
        OpCode::Exp => a.exp(),
        OpCode::Ln => a.ln(),
        OpCode::Sin => a.sin(),
        OpCode::Cos => a.cos(),
        OpCode::Tan => a.tan(),
        OpCode::Asin => a.asin(),
        OpCode::Acos => a.acos(),
        OpCode::Atan => a.atan(),
        OpCode::Sinh => a.sinh(),
        OpCode::Cosh => a.cosh(),
        OpCode::Tanh => a.tanh(),
        OpCode::Abs => a.abs(),
        OpCode::Signum => a.signum(),
    }
}

/// `a^exp` for the [`OpCode::Powi`] slot.
#[inline]
pub fn eval_powi<T: Elementary>(a: T, exp: i32) -> T {
    a.powi(exp)
}

/// `∂(a^exp)/∂a`.
#[inline]
pub fn powi_partial<T: Elementary>(a: T, exp: i32) -> T {
    if exp == 0 {
        return T::zero();
    }
    int_as::<T>(exp) * a.powi(exp - 1)
}

/// Compute reverse-mode partial derivatives for a single opcode.
///
/// Returns `(∂result/∂arg0, ∂result/∂arg1)`; for unary ops the second partial
/// is zero. `r` is the already-evaluated result.
#[inline]
pub fn reverse_partials<T: Elementary>(op: OpCode, a: T, b: T, r: T) -> (T, T) {
    let zero = T::zero();
    let one = T::one();
    match op {
        OpCode::Input | OpCode::Const => (zero, zero),
        OpCode::Powi => unreachable!("Powi partials come from powi_partial"),

        OpCode::Add => (one, one),
        OpCode::Sub => (one, -one),
        OpCode::Mul => (b, a),
        OpCode::Div => {
            let inv = one / b;
            (inv, -a * inv * inv)
        }
        OpCode::Powf => {
            // d/da a^b = b * a^(b-1), d/db a^b = a^b * ln(a)
            let da = b * a.powf(b - one);
            let db = if r.is_zero() { zero } else { r * a.ln() };
            (da, db)
        }
        OpCode::Max => {
            if a >= b {
                (one, zero)
            } else {
                (zero, one)
            }
        }
        OpCode::Min => {
            if a <= b {
                (one, zero)
            } else {
                (zero, one)
            }
        }

        OpCode::Neg => (-one, zero),
        OpCode::Recip => {
            let inv = one / a;
            (-inv * inv, zero)
        }
        OpCode::Sqrt => (one / ((one + one) * r), zero),
        OpCode::Exp => (r, zero),
        OpCode::Ln => (one / a, zero),
        OpCode::Sin => (a.cos(), zero),
        OpCode::Cos => (-a.sin(), zero),
        OpCode::Tan => (one + r * r, zero),
        OpCode::Asin => (one / (one - a * a).sqrt(), zero),
        OpCode::Acos => (-one / (one - a * a).sqrt(), zero),
        OpCode::Atan => (one / (one + a * a), zero),
        OpCode::Sinh => (a.cosh(), zero),
        OpCode::Cosh => (a.sinh(), zero),
        OpCode::Tanh => (one - r * r, zero),
        OpCode::Abs => {
            if a >= zero {
                (one, zero)
            } else {
                (-one, zero)
            }
        }
        OpCode::Signum => (zero, zero),
    }
}

/// Decode a `powi` exponent stored in `arg_indices[1]`.
#[inline]
pub fn powi_exp_decode(raw: u32) -> i32 {
    raw as i32
}

/// Encode a `powi` exponent as a value that can be stored in `arg_indices[1]`.
#[inline]
pub fn powi_exp_encode(exp: i32) -> u32 {
    exp as u32
}

/// Small integer as `T` by repeated addition of one; exact for the exponents
/// `powi` sees in practice and needs no conversion trait on `T`.
fn int_as<T: Elementary>(n: i32) -> T {
    let mut acc = T::zero();
    for _ in 0..n.unsigned_abs() {
        acc = acc + T::one();
    }
    if n < 0 {
        -acc
    } else {
        acc
    }
}
