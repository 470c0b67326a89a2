//! Abs-normal form: the piecewise-linear model of a nonsmooth function.
//!
//! Every `abs`, `min` and `max` on the tape contributes one switching variable
//! `z_j` (its argument, or `a - b` for `min`/`max`). Linearizing all smooth
//! operations at a point `x̊` gives
//!
//! ```text
//! z = cz + Z x + L |z|
//! y = cy + Y x + J |z|
//! ```
//!
//! with `L` strictly lower triangular, so `z` can be resolved switch by switch.
//! Field names: `Y = dy_dx`, `J = dy_dabs`, `Z = dz_dx`, `L = dz_dabs`.

use ndarray::{Array1, Array2};

use crate::engine::TapeId;
use crate::float::Float;

/// Identity of a cached abs-normal problem. Reusing a tape for the abs-normal
/// mode requires every field to match the cached value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbsNormalProblem {
    pub tape_id: TapeId,
    pub num_outputs: usize,
    pub num_inputs: usize,
    pub num_switches: usize,
}

/// Value, switching variables and the four linear blocks at one point.
#[derive(Clone, Debug)]
pub struct AbsNormalForm<F: Float> {
    pub problem: AbsNormalProblem,
    /// Evaluation point `x̊`.
    pub x: Array1<F>,
    /// `f(x̊)`, length `m`.
    pub y: Array1<F>,
    /// Switching values at `x̊`, length `s`.
    pub z: Array1<F>,
    /// Offset of the switching equations, length `s`.
    pub cz: Array1<F>,
    /// Offset of the output equations, length `m`.
    pub cy: Array1<F>,
    /// `Y`, `m × n`.
    pub dy_dx: Array2<F>,
    /// `J`, `m × s`.
    pub dy_dabs: Array2<F>,
    /// `Z`, `s × n`.
    pub dz_dx: Array2<F>,
    /// `L`, `s × s`, strictly lower triangular.
    pub dz_dabs: Array2<F>,
}

impl<F: Float> AbsNormalForm<F> {
    /// Zero-filled blocks shaped for `problem`.
    pub fn zeros(problem: AbsNormalProblem) -> Self {
        let AbsNormalProblem {
            num_outputs: m,
            num_inputs: n,
            num_switches: s,
            ..
        } = problem;
        AbsNormalForm {
            problem,
            x: Array1::zeros(n),
            y: Array1::zeros(m),
            z: Array1::zeros(s),
            cz: Array1::zeros(s),
            cy: Array1::zeros(m),
            dy_dx: Array2::zeros((m, n)),
            dy_dabs: Array2::zeros((m, s)),
            dz_dx: Array2::zeros((s, n)),
            dz_dabs: Array2::zeros((s, s)),
        }
    }

    /// Number of switching variables `s`.
    pub fn num_switches(&self) -> usize {
        self.problem.num_switches
    }

    /// Evaluate the piecewise-linear model at `x`, returning `(y, z)`.
    ///
    /// At the linearization point this reproduces `(self.y, self.z)`; for a
    /// piecewise-linear `f` it reproduces `f` everywhere.
    pub fn evaluate(&self, x: &[F]) -> (Array1<F>, Array1<F>) {
        assert_eq!(x.len(), self.problem.num_inputs, "wrong number of inputs");
        let x = Array1::from_vec(x.to_vec());
        let s = self.num_switches();

        let mut z = Array1::zeros(s);
        let mut abs_z = Array1::zeros(s);
        for j in 0..s {
            let mut zj = self.cz[j] + self.dz_dx.row(j).dot(&x);
            for k in 0..j {
                zj = zj + self.dz_dabs[[j, k]] * abs_z[k];
            }
            z[j] = zj;
            abs_z[j] = zj.abs();
        }

        let y = &self.cy + &self.dy_dx.dot(&x) + &self.dy_dabs.dot(&abs_z);
        (y, z)
    }
}
