//! Derivative dispatch over a re-evaluable bytecode tape.
//!
//! The crate sits between a user function and a tape-based AD engine:
//! [`derivative`] picks the sweeps for a request ([`Mode`]), the
//! [`BufferPlanner`] shapes and scopes the result buffer, and the
//! [`partial`], [`tensor`] and [`seed`] modules encode mixed partial
//! derivatives into the compressed symmetric tensors the engine produces.
//!
//! User functions are written once against [`Scalar`] and run on
//! [`BReverse`] (recording) or [`Dual`] (tangent propagation).

pub mod abs_normal;
pub mod api;
pub mod breverse;
pub mod buffer;
pub mod bytecode_tape;
pub mod combinatorics;
pub mod dispatch;
pub mod dual;
pub mod engine;
pub mod error;
pub mod float;
pub mod jet;
pub mod mode;
pub mod opcode;
pub mod partial;
pub mod scalar;
pub mod seed;
pub mod taylor_ops;
pub mod tensor;

pub use abs_normal::{AbsNormalForm, AbsNormalProblem};
pub use api::{grad, hessian, jacobian, jvp, record, record_multi};
pub use breverse::BReverse;
pub use buffer::{AllocationShape, Buffer, BufferGuard, BufferPlanner, Dimensions};
pub use bytecode_tape::{BytecodeTape, RecordingGuard, TapeFloat};
pub use combinatorics::multiset_rank;
pub use dispatch::{
    derivative, derivative_into, higher_order_tensor, Derivative, DerivativeOptions, Partials,
    Seeds,
};
pub use dual::Dual;
pub use engine::{Engine, TapeContext, TapeId, TapeRegistry};
pub use error::{AdError, Result};
pub use float::{Elementary, Float};
pub use mode::{select_jacobian_strategy, JacobianStrategy, Mode, FORWARD_CROSSOVER_RATIO};
pub use partial::{from_adolc_format, is_canonical, to_adolc_format, to_adolc_format_into};
pub use scalar::Scalar;
pub use seed::{
    expand_from_seed_space, seed_indices, seed_indices_adolc, seed_matrix, to_seed_space,
    to_seed_space_adolc,
};
pub use tensor::{address, build_tensor, tensor_size};

/// Type alias for forward-mode dual numbers over `f64`.
pub type Dual64 = Dual<f64>;
/// Type alias for forward-mode dual numbers over `f32`.
pub type Dual32 = Dual<f32>;
/// Type alias for tape-recording variables over `f64`.
pub type BReverse64 = BReverse<f64>;
/// Type alias for tape-recording variables over `f32`.
pub type BReverse32 = BReverse<f32>;
