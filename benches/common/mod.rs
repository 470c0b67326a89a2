#![allow(dead_code)]

use adsweep::Scalar;

// ─── Rosenbrock ────────────────────────────────────────────────────────────

pub fn rosenbrock<T: Scalar>(x: &[T]) -> T {
    let one = T::one();
    let hundred = T::from_f(T::Float::from_f64(100.0).unwrap());
    let mut sum = T::zero();
    for i in 0..x.len() - 1 {
        let t1 = one - x[i];
        let t2 = x[i + 1] - x[i] * x[i];
        sum = sum + t1 * t1 + hundred * t2 * t2;
    }
    sum
}

// ─── Broyden-style residuals ───────────────────────────────────────────────
// m = n outputs, tridiagonal Jacobian.

pub fn broyden<T: Scalar>(x: &[T]) -> Vec<T> {
    let n = x.len();
    let two = T::one() + T::one();
    let three = two + T::one();
    (0..n)
        .map(|i| {
            let mut r = (three - two * x[i]) * x[i] + T::one();
            if i > 0 {
                r = r - x[i - 1];
            }
            if i + 1 < n {
                r = r - two * x[i + 1];
            }
            r
        })
        .collect()
}

// ─── Smooth mixed ──────────────────────────────────────────────────────────
// Few outputs over many inputs; exercises transcendental jets.

pub fn mixed<T: Scalar>(x: &[T]) -> Vec<T> {
    let mut s = T::zero();
    let mut p = T::one();
    for &xi in x {
        s = s + xi.sin() * xi.exp();
        p = p * (T::one() + xi * xi).sqrt();
    }
    vec![s, p.ln(), (s * p).atan()]
}

pub fn point(n: usize) -> Vec<f64> {
    (0..n).map(|i| 0.5 + 0.01 * i as f64).collect()
}
