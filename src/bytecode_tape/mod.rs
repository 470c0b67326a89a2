//! Bytecode tape for re-evaluable AD.
//!
//! The tape stores opcodes rather than precomputed multipliers, so it can be
//! re-evaluated at different inputs without re-recording. Every sweep the
//! [`Engine`](crate::engine::Engine) offers is an `impl` block on
//! [`BytecodeTape`] in one of the submodules.
//!
//! # Limitations
//!
//! The tape records one execution path. If the recorded function contains
//! branches (`if x > 0 { ... } else { ... }`), re-evaluating at inputs that
//! take a different branch produces incorrect results. `abs`, `min` and `max`
//! are recorded as opcodes and are therefore re-evaluated correctly.

use crate::float::Float;
use crate::opcode::{self, OpCode, UNUSED};

mod abs_normal;
mod forward;
mod hessian;
mod higher_order;
mod reverse;

mod recording;
pub use self::recording::{with_recording_tape, RecordingGuard, TapeFloat};

/// Sentinel index for constant entries (not tracked).
pub const CONSTANT: u32 = u32::MAX;

/// A bytecode tape that can be re-evaluated at different inputs.
///
/// Created via [`crate::api::record`]. After recording, call
/// [`forward`](Self::forward) to re-evaluate and
/// [`reverse_seeded`](Self::reverse_seeded) to compute adjoints.
#[derive(Clone, Debug)]
pub struct BytecodeTape<F: Float> {
    pub(crate) opcodes: Vec<OpCode>,
    pub(crate) arg_indices: Vec<[u32; 2]>,
    pub(crate) values: Vec<F>,
    pub(crate) num_inputs: u32,
    pub(crate) num_variables: u32,
    pub(crate) output_indices: Vec<u32>,
}

impl<F: Float> BytecodeTape<F> {
    /// Create an empty bytecode tape.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a bytecode tape with pre-allocated capacity.
    pub fn with_capacity(est_ops: usize) -> Self {
        BytecodeTape {
            opcodes: Vec::with_capacity(est_ops),
            arg_indices: Vec::with_capacity(est_ops),
            values: Vec::with_capacity(est_ops),
            num_inputs: 0,
            num_variables: 0,
            output_indices: Vec::new(),
        }
    }

    /// Register a new input variable. Returns its index.
    ///
    /// Inputs must be registered before any operation so that input `i`
    /// lives at tape index `i`.
    #[inline]
    pub fn new_input(&mut self, value: F) -> u32 {
        debug_assert_eq!(
            self.num_inputs, self.num_variables,
            "inputs must precede all other tape entries"
        );
        self.num_inputs += 1;
        self.push_entry(OpCode::Input, [UNUSED, UNUSED], value)
    }

    /// Register a scalar constant. Returns its index.
    #[inline]
    pub fn push_const(&mut self, value: F) -> u32 {
        self.push_entry(OpCode::Const, [UNUSED, UNUSED], value)
    }

    /// Record an operation. Returns the result index.
    ///
    /// **Constant folding**: if all operands point to `Const` entries (not `Input`),
    /// the operation is replaced by a single `Const` with the already-computed value.
    #[inline]
    pub fn push_op(&mut self, op: OpCode, arg0: u32, arg1: u32, value: F) -> u32 {
        let arg0_const = self.opcodes[arg0 as usize] == OpCode::Const;
        let arg1_const = arg1 == UNUSED || self.opcodes[arg1 as usize] == OpCode::Const;
        if arg0_const && arg1_const {
            return self.push_const(value);
        }
        self.push_entry(op, [arg0, arg1], value)
    }

    /// Record a powi operation. The `i32` exponent is stored in `arg_indices[1]`.
    #[inline]
    pub fn push_powi(&mut self, arg0: u32, exp: i32, value: F) -> u32 {
        if self.opcodes[arg0 as usize] == OpCode::Const {
            return self.push_const(value);
        }
        if exp == 1 {
            return arg0;
        }
        self.push_entry(OpCode::Powi, [arg0, opcode::powi_exp_encode(exp)], value)
    }

    #[inline]
    fn push_entry(&mut self, op: OpCode, args: [u32; 2], value: F) -> u32 {
        let idx = self.num_variables;
        self.num_variables += 1;
        self.opcodes.push(op);
        self.arg_indices.push(args);
        self.values.push(value);
        idx
    }

    /// Mark the output variables, in output-component order.
    pub fn set_outputs(&mut self, indices: &[u32]) {
        self.output_indices = indices.to_vec();
    }

    /// Number of input variables (`n`).
    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs as usize
    }

    /// Number of output variables (`m`).
    #[inline]
    pub fn num_outputs(&self) -> usize {
        self.output_indices.len()
    }

    /// Number of operations (including inputs and constants).
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.opcodes.len()
    }

    /// Number of switching operations (`abs`, `min`, `max`) on the tape.
    ///
    /// Each becomes one switching variable of the abs-normal form. The count is
    /// structural, so it is fixed once the tape is recorded.
    pub fn num_switches(&self) -> usize {
        self.opcodes.iter().filter(|op| op.is_switch()).count()
    }

    /// Output values at the last evaluation point.
    pub fn output_values(&self) -> Vec<F> {
        self.output_indices
            .iter()
            .map(|&idx| self.values[idx as usize])
            .collect()
    }

    /// Slice view of all opcodes in the tape.
    #[inline]
    pub fn opcodes_slice(&self) -> &[OpCode] {
        &self.opcodes
    }

    /// Operand indices of entry `i`, with the second slot resolved to `None`
    /// for unary ops and `powi`.
    #[inline]
    pub(crate) fn operands(&self, i: usize) -> (usize, Option<usize>) {
        let [a, b] = self.arg_indices[i];
        if self.opcodes[i].is_binary() {
            (a as usize, Some(b as usize))
        } else {
            (a as usize, None)
        }
    }

    /// Exponent of the `powi` entry at `i`.
    #[inline]
    pub(crate) fn powi_exp(&self, i: usize) -> i32 {
        opcode::powi_exp_decode(self.arg_indices[i][1])
    }
}

impl<F: Float> Default for BytecodeTape<F> {
    fn default() -> Self {
        Self::new()
    }
}
