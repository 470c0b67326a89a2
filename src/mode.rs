//! Derivative modes and the forward/reverse crossover policy.

use std::fmt;

/// What [`derivative`](crate::dispatch::derivative) computes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Full Jacobian `J` (`m × n`).
    Jac,
    /// Jacobian-vector product `J v`.
    JacVec,
    /// Jacobian-matrix product `J V`.
    JacMat,
    /// Vector-Jacobian product `wᵀ J`.
    VecJac,
    /// Matrix-Jacobian product `W J`.
    MatJac,
    /// Per-component Hessians (order 2).
    Hess,
    /// Abs-normal form of a nonsmooth function.
    AbsNormal,
}

impl Mode {
    /// Every mode, in declaration order.
    pub const ALL: [Mode; 7] = [
        Mode::Jac,
        Mode::JacVec,
        Mode::JacMat,
        Mode::VecJac,
        Mode::MatJac,
        Mode::Hess,
        Mode::AbsNormal,
    ];

    /// Lower-case name, also used by `Display`.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Jac => "jac",
            Mode::JacVec => "jac_vec",
            Mode::JacMat => "jac_mat",
            Mode::VecJac => "vec_jac",
            Mode::MatJac => "mat_jac",
            Mode::Hess => "hess",
            Mode::AbsNormal => "abs_normal",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Forward mode is chosen for a full Jacobian when `n < FORWARD_CROSSOVER_RATIO * m`.
pub const FORWARD_CROSSOVER_RATIO: usize = 2;

/// How a full Jacobian is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JacobianStrategy {
    /// `m == 1`: one reverse sweep.
    Gradient,
    /// One forward sweep per input direction.
    Forward,
    /// One reverse sweep per output, seeded with the identity.
    Reverse,
}

/// Pick the Jacobian strategy for `m` outputs and `n` inputs.
///
/// At `n == 2m` reverse mode wins.
pub fn select_jacobian_strategy(m: usize, n: usize) -> JacobianStrategy {
    if m == 1 {
        JacobianStrategy::Gradient
    } else if n < FORWARD_CROSSOVER_RATIO * m {
        JacobianStrategy::Forward
    } else {
        JacobianStrategy::Reverse
    }
}
