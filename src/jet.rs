//! Truncated multivariate Taylor polynomials ("jets").
//!
//! A jet in `k` seed variables truncated at degree `d` stores one coefficient
//! per monomial `t^α` with `|α| <= d`. Monomials are laid out by the rank of
//! their canonical multiset (see [`crate::combinatorics`]), which is exactly
//! the layout of a compressed derivative tensor: slot `r` of a jet and column
//! `r` of the engine's compressed output describe the same partial derivative.

use crate::combinatorics::{binomial, canonical_multisets, multiset_rank};
use crate::float::Float;
use crate::opcode::OpCode;
use crate::taylor_ops;

/// Monomial layout and product table for jets in `vars` variables up to `degree`.
#[derive(Clone, Debug)]
pub struct MonomialTable {
    degree: usize,
    /// Total degree of each slot.
    degrees: Vec<usize>,
    /// `Π α_i!` per slot: converts a Taylor coefficient into a derivative.
    factorials: Vec<usize>,
    /// For each slot `γ`, every pair `(α, β)` with `α + β = γ`.
    products: Vec<Vec<(u32, u32)>>,
    /// Slot of each linear monomial `t_j`.
    linear: Vec<usize>,
}

impl MonomialTable {
    /// Build the layout for `vars` seed variables truncated at `degree`.
    pub fn new(vars: usize, degree: usize) -> Self {
        let multisets = canonical_multisets(vars, degree);
        let size = multisets.len();

        let exponents: Vec<Vec<usize>> = multisets
            .iter()
            .map(|ms| {
                let mut alpha = vec![0usize; vars];
                for &v in ms.iter().filter(|&&v| v != 0) {
                    alpha[v - 1] += 1;
                }
                alpha
            })
            .collect();
        let degrees: Vec<usize> = exponents.iter().map(|a| a.iter().sum()).collect();
        let factorials = exponents
            .iter()
            .map(|a| a.iter().map(|&e| (1..=e).product::<usize>()).product())
            .collect();

        // Walk every α <= γ componentwise; β = γ - α is then fixed.
        let mut products = Vec::with_capacity(size);
        let mut alpha = vec![0usize; vars];
        let mut beta = vec![0usize; vars];
        for gamma in &exponents {
            let mut pairs = Vec::new();
            alpha.fill(0);
            loop {
                for ((b, &g), &a) in beta.iter_mut().zip(gamma).zip(&alpha) {
                    *b = g - a;
                }
                let p = exponent_rank(&alpha, degree) as u32;
                let q = exponent_rank(&beta, degree) as u32;
                pairs.push((p, q));
                let Some(i) = (0..vars).find(|&i| alpha[i] < gamma[i]) else {
                    break;
                };
                alpha[i] += 1;
                alpha[..i].fill(0);
            }
            products.push(pairs);
        }

        let linear = (1..=vars)
            .map(|j| {
                let mut ms = vec![0usize; degree.max(1)];
                ms[0] = j;
                multiset_rank(&ms)
            })
            .collect();

        MonomialTable {
            degree,
            degrees,
            factorials,
            products,
            linear,
        }
    }

    /// Number of coefficients per jet, `C(vars + degree, degree)`.
    pub fn len(&self) -> usize {
        self.degrees.len()
    }

    /// Always false: the constant slot exists at every degree.
    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty()
    }

    /// `Π α_i!` for the monomial in `slot`.
    pub fn factorial(&self, slot: usize) -> usize {
        self.factorials[slot]
    }

    /// Jet of a constant.
    pub fn constant<F: Float>(&self, value: F) -> Vec<F> {
        let mut jet = vec![F::zero(); self.len()];
        jet[0] = value;
        jet
    }

    /// Jet of `value + Σ_j direction[j] t_j`.
    pub fn affine<F: Float>(&self, value: F, direction: &[F]) -> Vec<F> {
        let mut jet = self.constant(value);
        if self.degree > 0 {
            for (&slot, &d) in self.linear.iter().zip(direction) {
                jet[slot] = d;
            }
        }
        jet
    }

    /// `c = a * b`, truncated.
    pub fn mul<F: Float>(&self, a: &[F], b: &[F], c: &mut [F]) {
        for (slot, pairs) in self.products.iter().enumerate() {
            let mut sum = F::zero();
            for &(p, q) in pairs {
                sum = sum + a[p as usize] * b[q as usize];
            }
            c[slot] = sum;
        }
    }

    /// `Σ_j coeffs[j] (a - a₀)^j` by Horner's rule: composes a univariate
    /// expansion around `a₀ = a[0]` with the jet `a`.
    pub fn compose<F: Float>(&self, coeffs: &[F], a: &[F]) -> Vec<F> {
        let mut h = a.to_vec();
        h[0] = F::zero();

        let mut acc = self.constant(coeffs[self.degree.min(coeffs.len() - 1)]);
        let mut scratch = vec![F::zero(); self.len()];
        for &c in coeffs[..self.degree.min(coeffs.len() - 1)].iter().rev() {
            self.mul(&acc, &h, &mut scratch);
            std::mem::swap(&mut acc, &mut scratch);
            acc[0] = acc[0] + c;
        }
        acc
    }

    /// Apply a unary opcode (`powi` excluded) to a jet.
    pub fn unary<F: Float>(&self, op: OpCode, a: &[F]) -> Vec<F> {
        match taylor_ops::elementary_coefficients(op, a[0], self.degree) {
            Some(coeffs) => self.compose(&coeffs, a),
            None => unreachable!("{op:?} is not a unary elementary opcode"),
        }
    }

    /// `a^exp` by repeated squaring; negative exponents go through `recip`.
    pub fn powi<F: Float>(&self, a: &[F], exp: i32) -> Vec<F> {
        let base = if exp < 0 {
            self.unary(OpCode::Recip, a)
        } else {
            a.to_vec()
        };
        let mut result = self.constant(F::one());
        let mut power = base;
        let mut scratch = vec![F::zero(); self.len()];
        let mut e = exp.unsigned_abs();
        while e > 0 {
            if e & 1 == 1 {
                self.mul(&result, &power, &mut scratch);
                std::mem::swap(&mut result, &mut scratch);
            }
            e >>= 1;
            if e > 0 {
                self.mul(&power, &power, &mut scratch);
                std::mem::swap(&mut power, &mut scratch);
            }
        }
        result
    }

    /// Apply a binary opcode to two jets.
    pub fn binary<F: Float>(&self, op: OpCode, a: &[F], b: &[F]) -> Vec<F> {
        let mut c = vec![F::zero(); self.len()];
        match op {
            OpCode::Add => {
                for ((ci, &ai), &bi) in c.iter_mut().zip(a).zip(b) {
                    *ci = ai + bi;
                }
            }
            OpCode::Sub => {
                for ((ci, &ai), &bi) in c.iter_mut().zip(a).zip(b) {
                    *ci = ai - bi;
                }
            }
            OpCode::Mul => self.mul(a, b, &mut c),
            OpCode::Div => {
                let inv = self.unary(OpCode::Recip, b);
                self.mul(a, &inv, &mut c);
            }
            OpCode::Powf => {
                if self.is_constant(b) {
                    let coeffs = taylor_ops::power_coefficients(a[0], b[0], self.degree);
                    return self.compose(&coeffs, a);
                }
                // a^b = exp(b ln a)
                let log = self.unary(OpCode::Ln, a);
                let mut prod = vec![F::zero(); self.len()];
                self.mul(b, &log, &mut prod);
                return self.unary(OpCode::Exp, &prod);
            }
            OpCode::Max => c.copy_from_slice(if a[0] >= b[0] { a } else { b }),
            OpCode::Min => c.copy_from_slice(if a[0] <= b[0] { a } else { b }),
            _ => unreachable!("{op:?} is not a binary opcode"),
        }
        c
    }

    fn is_constant<F: Float>(&self, a: &[F]) -> bool {
        a[1..].iter().all(|v| v.is_zero())
    }
}

/// Slot of the monomial `t^alpha`: the rank of its canonical multiset,
/// accumulated straight from the exponents. Padding zeros add nothing.
fn exponent_rank(alpha: &[usize], degree: usize) -> usize {
    let mut rank = 0;
    let mut pos = 0;
    for (j, &e) in alpha.iter().enumerate().rev() {
        for _ in 0..e {
            rank += binomial(j + degree - pos, degree - pos);
            pos += 1;
        }
    }
    rank
}
