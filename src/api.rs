//! One-shot entry points that do not need a registry.
//!
//! [`record`] and [`record_multi`] hand back a [`BytecodeTape`] the caller can
//! re-evaluate directly; [`jvp`] and [`jacobian`] run `f` on [`Dual`] numbers
//! without recording anything.

use crate::breverse::BReverse;
use crate::bytecode_tape::{BytecodeTape, TapeFloat};
use crate::dual::Dual;
use crate::engine::record_tape;
use crate::float::Float;

/// Record a scalar function into a [`BytecodeTape`] that can be re-evaluated at
/// different inputs without re-recording.
///
/// Returns the tape and the output value from the recording pass.
///
/// # Limitations
///
/// The tape records one execution path. If `f` contains branches
/// (`if x > 0 { ... } else { ... }`), re-evaluating at inputs that take a
/// different branch produces **incorrect results**.
///
/// ```
/// let (mut tape, val) = adsweep::record(|x| x[0] * x[0] + x[1] * x[1], &[3.0_f64, 4.0]);
/// assert!((val - 25.0).abs() < 1e-10);
///
/// let g = tape.gradient(&[3.0, 4.0], 0);
/// assert!((g[0] - 6.0).abs() < 1e-10);
/// assert!((g[1] - 8.0).abs() < 1e-10);
/// ```
pub fn record<F: TapeFloat>(
    f: impl FnOnce(&[BReverse<F>]) -> BReverse<F>,
    x: &[F],
) -> (BytecodeTape<F>, F) {
    let (tape, values) = record_tape(x, |inputs| vec![f(inputs)]);
    (tape, values[0])
}

/// Record a multi-output function `f : Rⁿ → Rᵐ` into a [`BytecodeTape`].
///
/// Returns the tape and the output values from the recording pass.
pub fn record_multi<F: TapeFloat>(
    f: impl FnOnce(&[BReverse<F>]) -> Vec<BReverse<F>>,
    x: &[F],
) -> (BytecodeTape<F>, Vec<F>) {
    record_tape(x, f)
}

/// Gradient of a scalar function via one reverse sweep.
pub fn grad<F: TapeFloat>(f: impl FnOnce(&[BReverse<F>]) -> BReverse<F>, x: &[F]) -> Vec<F> {
    let (tape, _) = record(f, x);
    tape.reverse_seeded(&[F::one()])
}

/// Dense Hessian of a scalar function via forward-over-reverse.
///
/// Returns `hessian[i][j] = ∂²f/∂x_i∂x_j`.
pub fn hessian<F: TapeFloat>(
    f: impl FnOnce(&[BReverse<F>]) -> BReverse<F>,
    x: &[F],
) -> Vec<Vec<F>> {
    let (tape, _) = record(f, x);
    tape.hessian_component(x, 0)
}

/// Jacobian-vector product `(f(x), J v)` from one pass of `f` on [`Dual`]
/// numbers; nothing is recorded.
///
/// # Panics
///
/// If `x` and `v` differ in length.
pub fn jvp<F: Float>(f: impl Fn(&[Dual<F>]) -> Vec<Dual<F>>, x: &[F], v: &[F]) -> (Vec<F>, Vec<F>) {
    assert_eq!(x.len(), v.len(), "x and v must have the same length");
    let seeded: Vec<Dual<F>> = x
        .iter()
        .zip(v)
        .map(|(&xi, &vi)| Dual::new(xi, vi))
        .collect();
    f(&seeded).into_iter().map(|d| (d.re, d.eps)).unzip()
}

/// Dense Jacobian `J[i][j] = ∂f_i/∂x_j` from `n` tangent passes, one per
/// basis direction. Returns `(f(x), J)`.
///
/// Prefer [`derivative`](crate::dispatch::derivative) with [`Mode::Jac`](crate::Mode::Jac)
/// when `m` is small relative to `n`; it switches to reverse sweeps.
pub fn jacobian<F: Float>(
    f: impl Fn(&[Dual<F>]) -> Vec<Dual<F>>,
    x: &[F],
) -> (Vec<F>, Vec<Vec<F>>) {
    let n = x.len();
    let mut basis = vec![F::zero(); n];
    let mut values = Vec::new();
    let mut columns = Vec::with_capacity(n);
    for j in 0..n {
        basis[j] = F::one();
        let (y, col) = jvp(&f, x, &basis);
        basis[j] = F::zero();
        values = y;
        columns.push(col);
    }
    if n == 0 {
        values = f(&[]).iter().map(|d| d.re).collect();
    }

    let m = values.len();
    let jac = (0..m)
        .map(|i| columns.iter().map(|col| col[i]).collect())
        .collect();
    (values, jac)
}
