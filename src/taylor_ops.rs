//! Univariate Taylor coefficient propagation.
//!
//! Convention: `c[k] = f^(k)(t₀) / k!` (scaled/normalized Taylor coefficients).
//! All functions operate on slices `&[F]` (inputs) and `&mut [F]` (outputs);
//! the degree is determined by the slice lengths.
//!
//! The multivariate jets in [`crate::jet`] only need the expansion of an
//! elementary function around a point, i.e. the coefficients of `f(a₀ + t)`;
//! [`elementary_coefficients`] produces them by running these recurrences on
//! the series `[a₀, 1, 0, ...]`.

use crate::float::Float;
use crate::opcode::OpCode;

// ══════════════════════════════════════════════
//  Arithmetic
// ══════════════════════════════════════════════

/// `c = a * b`: Cauchy product.
#[inline]
pub fn taylor_mul<F: Float>(a: &[F], b: &[F], c: &mut [F]) {
    for k in 0..c.len() {
        let mut sum = F::zero();
        for j in 0..=k {
            sum = sum + a[j] * b[k - j];
        }
        c[k] = sum;
    }
}

/// `c = a / b`: recursive Taylor division.
///
/// `c[k] = (a[k] - Σ_{j=1}^{k} b[j] * c[k-j]) / b[0]`
#[inline]
pub fn taylor_div<F: Float>(a: &[F], b: &[F], c: &mut [F]) {
    let inv_b0 = F::one() / b[0];
    for k in 0..c.len() {
        let mut sum = a[k];
        for j in 1..=k {
            sum = sum - b[j] * c[k - j];
        }
        c[k] = sum * inv_b0;
    }
}

/// `c = 1/a`.
#[inline]
pub fn taylor_recip<F: Float>(a: &[F], c: &mut [F]) {
    let inv_a0 = F::one() / a[0];
    c[0] = inv_a0;
    for k in 1..c.len() {
        let mut sum = F::zero();
        for j in 1..=k {
            sum = sum + a[j] * c[k - j];
        }
        c[k] = -sum * inv_a0;
    }
}

/// `c = sqrt(a)`
///
/// `c[k] = (a[k] - Σ_{j=1}^{k-1} c[j] * c[k-j]) / (2 * c[0])`
#[inline]
pub fn taylor_sqrt<F: Float>(a: &[F], c: &mut [F]) {
    c[0] = a[0].sqrt();
    let two_c0 = F::from_count(2) * c[0];
    for k in 1..c.len() {
        let mut sum = F::zero();
        for j in 1..k {
            sum = sum + c[j] * c[k - j];
        }
        c[k] = (a[k] - sum) / two_c0;
    }
}

// ══════════════════════════════════════════════
//  Transcendentals (logarithmic derivative technique)
// ══════════════════════════════════════════════

/// `c[k] = (1/k) * Σ_{j=1}^{k} j * a[j] * g[k-j]`, the coefficients of
/// `∫ a' g` for `k >= 1`. `c[0]` is left to the caller.
#[inline]
fn integrate_product<F: Float>(a: &[F], g: &[F], c: &mut [F]) {
    for k in 1..c.len() {
        let mut sum = F::zero();
        for j in 1..=k {
            sum = sum + F::from_count(j) * a[j] * g[k - j];
        }
        c[k] = sum / F::from_count(k);
    }
}

/// `c = exp(a)`
#[inline]
pub fn taylor_exp<F: Float>(a: &[F], c: &mut [F]) {
    c[0] = a[0].exp();
    for k in 1..c.len() {
        let mut sum = F::zero();
        for j in 1..=k {
            sum = sum + F::from_count(j) * a[j] * c[k - j];
        }
        c[k] = sum / F::from_count(k);
    }
}

/// `c = ln(a)`
#[inline]
pub fn taylor_ln<F: Float>(a: &[F], c: &mut [F]) {
    let inv_a0 = F::one() / a[0];
    c[0] = a[0].ln();
    for k in 1..c.len() {
        let mut sum = F::zero();
        for j in 1..k {
            sum = sum + F::from_count(j) * c[j] * a[k - j];
        }
        c[k] = (a[k] - sum / F::from_count(k)) * inv_a0;
    }
}

/// `(s, co) = sin_cos(a)`: coupled recurrence.
#[inline]
pub fn taylor_sin_cos<F: Float>(a: &[F], s: &mut [F], co: &mut [F]) {
    s[0] = a[0].sin();
    co[0] = a[0].cos();
    for k in 1..s.len() {
        let inv_k = F::one() / F::from_count(k);
        let mut sum_s = F::zero();
        let mut sum_c = F::zero();
        for j in 1..=k {
            let jf = F::from_count(j);
            sum_s = sum_s + jf * a[j] * co[k - j];
            sum_c = sum_c + jf * a[j] * s[k - j];
        }
        s[k] = sum_s * inv_k;
        co[k] = -sum_c * inv_k;
    }
}

/// `(sh, ch) = sinh_cosh(a)`: coupled recurrence (positive signs).
#[inline]
pub fn taylor_sinh_cosh<F: Float>(a: &[F], sh: &mut [F], ch: &mut [F]) {
    sh[0] = a[0].sinh();
    ch[0] = a[0].cosh();
    for k in 1..sh.len() {
        let inv_k = F::one() / F::from_count(k);
        let mut sum_sh = F::zero();
        let mut sum_ch = F::zero();
        for j in 1..=k {
            let jf = F::from_count(j);
            sum_sh = sum_sh + jf * a[j] * ch[k - j];
            sum_ch = sum_ch + jf * a[j] * sh[k - j];
        }
        sh[k] = sum_sh * inv_k;
        ch[k] = sum_ch * inv_k;
    }
}

/// `c = atan(a)`: `c' = a' / (1 + a²)`.
#[inline]
pub fn taylor_atan<F: Float>(a: &[F], c: &mut [F]) {
    let n = c.len();
    let mut denom = vec![F::zero(); n];
    taylor_mul(a, a, &mut denom);
    denom[0] = denom[0] + F::one();
    let mut g = vec![F::zero(); n];
    taylor_recip(&denom, &mut g);
    c[0] = a[0].atan();
    integrate_product(a, &g, c);
}

/// `c = asin(a)`: `c' = a' / sqrt(1 - a²)`.
#[inline]
pub fn taylor_asin<F: Float>(a: &[F], c: &mut [F]) {
    let n = c.len();
    let mut sq = vec![F::zero(); n];
    taylor_mul(a, a, &mut sq);
    let one_minus: Vec<F> = sq
        .iter()
        .enumerate()
        .map(|(k, &v)| if k == 0 { F::one() - v } else { -v })
        .collect();
    let mut root = vec![F::zero(); n];
    taylor_sqrt(&one_minus, &mut root);
    let mut g = vec![F::zero(); n];
    taylor_recip(&root, &mut g);
    c[0] = a[0].asin();
    integrate_product(a, &g, c);
}

// ══════════════════════════════════════════════
//  Expansion of an elementary function around a point
// ══════════════════════════════════════════════

/// Coefficients `c[0..=degree]` of `f(a0 + t)` for the unary opcode `op`.
///
/// Piecewise ops (`abs`, `signum`) expand on the branch selected by `a0`.
/// Returns `None` for opcodes that are not unary elementary functions.
pub fn elementary_coefficients<F: Float>(op: OpCode, a0: F, degree: usize) -> Option<Vec<F>> {
    let len = degree + 1;
    let mut a = vec![F::zero(); len];
    a[0] = a0;
    if len > 1 {
        a[1] = F::one();
    }
    let mut c = vec![F::zero(); len];

    match op {
        OpCode::Neg => {
            for (ck, ak) in c.iter_mut().zip(&a) {
                *ck = -*ak;
            }
        }
        OpCode::Recip => taylor_recip(&a, &mut c),
        OpCode::Sqrt => taylor_sqrt(&a, &mut c),
        OpCode::Exp => taylor_exp(&a, &mut c),
        OpCode::Ln => taylor_ln(&a, &mut c),
        OpCode::Sin | OpCode::Cos => {
            let mut other = vec![F::zero(); len];
            if op == OpCode::Sin {
                taylor_sin_cos(&a, &mut c, &mut other);
            } else {
                taylor_sin_cos(&a, &mut other, &mut c);
            }
        }
        OpCode::Tan => {
            let (mut s, mut co) = (vec![F::zero(); len], vec![F::zero(); len]);
            taylor_sin_cos(&a, &mut s, &mut co);
            taylor_div(&s, &co, &mut c);
        }
        OpCode::Asin => taylor_asin(&a, &mut c),
        OpCode::Acos => {
            taylor_asin(&a, &mut c);
            c[0] = a0.acos();
            for ck in c[1..].iter_mut() {
                *ck = -*ck;
            }
        }
        OpCode::Atan => taylor_atan(&a, &mut c),
        OpCode::Sinh | OpCode::Cosh => {
            let mut other = vec![F::zero(); len];
            if op == OpCode::Sinh {
                taylor_sinh_cosh(&a, &mut c, &mut other);
            } else {
                taylor_sinh_cosh(&a, &mut other, &mut c);
            }
        }
        OpCode::Tanh => {
            let (mut sh, mut ch) = (vec![F::zero(); len], vec![F::zero(); len]);
            taylor_sinh_cosh(&a, &mut sh, &mut ch);
            taylor_div(&sh, &ch, &mut c);
        }
        OpCode::Abs => {
            let sign = if a0 >= F::zero() { F::one() } else { -F::one() };
            for (ck, ak) in c.iter_mut().zip(&a) {
                *ck = sign * *ak;
            }
        }
        OpCode::Signum => c[0] = a0.signum(),
        _ => return None,
    }
    Some(c)
}

/// Coefficients of `(a0 + t)^p` for a constant exponent `p`, via `exp(p ln(a0 + t))`.
pub fn power_coefficients<F: Float>(a0: F, p: F, degree: usize) -> Vec<F> {
    let len = degree + 1;
    let mut a = vec![F::zero(); len];
    a[0] = a0;
    if len > 1 {
        a[1] = F::one();
    }
    let mut log = vec![F::zero(); len];
    taylor_ln(&a, &mut log);
    for v in log.iter_mut() {
        *v = *v * p;
    }
    let mut c = vec![F::zero(); len];
    taylor_exp(&log, &mut c);
    c[0] = a0.powf(p);
    c
}
