//! The tape engine seen by the dispatcher.
//!
//! [`Engine`] lists the sweeps the dispatcher may request; [`TapeRegistry`]
//! implements them on top of [`BytecodeTape`]. Tapes are keyed by a
//! caller-chosen [`TapeId`] and live in the registry, which is passed by
//! `&mut` into every dispatch call.

use std::collections::HashMap;

use log::{debug, trace};
use ndarray::{Array2, Array3, ArrayView2, ArrayViewMut2};

use crate::abs_normal::{AbsNormalForm, AbsNormalProblem};
use crate::breverse::BReverse;
use crate::bytecode_tape::{BytecodeTape, RecordingGuard, TapeFloat, CONSTANT};
use crate::error::{AdError, Result};

/// Caller-chosen key of a recorded tape.
pub type TapeId = usize;

/// Capabilities the dispatcher needs from a tape-based AD engine.
///
/// Every method taking `x` re-evaluates the tape at `x` first. Dimensions are
/// checked against the recorded tape; a tape id that was never recorded gives
/// [`AdError::UnknownTape`].
pub trait Engine<F: TapeFloat> {
    /// Record `f` at `x` under `id`, replacing any tape already stored there.
    /// Returns `f(x)`.
    fn record(
        &mut self,
        id: TapeId,
        x: &[F],
        f: impl FnOnce(&[BReverse<F>]) -> Vec<BReverse<F>>,
    ) -> Vec<F>;

    /// Record `f` at `x` under `id` only if it produces `num_outputs` values.
    /// On a mismatch nothing is stored and the tape already recorded under
    /// `id`, if any, is left untouched.
    fn record_checked(
        &mut self,
        id: TapeId,
        x: &[F],
        num_outputs: usize,
        f: impl FnOnce(&[BReverse<F>]) -> Vec<BReverse<F>>,
    ) -> Result<Vec<F>>;

    /// `(m, n)` of the tape recorded under `id`.
    fn dimensions(&self, id: TapeId) -> Result<(usize, usize)>;

    /// Zero-order forward sweep: `f(x)`.
    fn zos_forward(&mut self, id: TapeId, x: &[F]) -> Result<Vec<F>>;

    /// First-order scalar forward sweep: `(f(x), J v)`.
    fn fos_forward(&mut self, id: TapeId, x: &[F], v: &[F]) -> Result<(Vec<F>, Vec<F>)>;

    /// First-order vector forward sweep. Returns `(f(x), J V)` with `J V`
    /// stored as `m` rows of `p` entries.
    fn fov_forward(
        &mut self,
        id: TapeId,
        x: &[F],
        directions: &[Vec<F>],
    ) -> Result<(Vec<F>, Vec<Vec<F>>)>;

    /// Higher-order vector forward sweep: univariate Taylor coefficients
    /// `1..=degree` along each direction, shaped `m × p × degree`.
    fn hov_forward(
        &mut self,
        id: TapeId,
        degree: usize,
        x: &[F],
        directions: &[Vec<F>],
    ) -> Result<(Vec<F>, Array3<F>)>;

    /// First-order scalar reverse sweep: `wᵀ J`.
    fn fos_reverse(&mut self, id: TapeId, x: &[F], weights: &[F]) -> Result<Vec<F>>;

    /// First-order vector reverse sweep: `W J` for `q` weight vectors.
    fn fov_reverse(&mut self, id: TapeId, x: &[F], weights: &[Vec<F>]) -> Result<Vec<Vec<F>>>;

    /// Dense Hessian of output `component` written into `out` (`n × n`).
    fn hessian(
        &mut self,
        id: TapeId,
        component: usize,
        x: &[F],
        out: ArrayViewMut2<F>,
    ) -> Result<()>;

    /// Number of `abs`/`min`/`max` switches on the tape.
    fn num_switches(&self, id: TapeId) -> Result<usize>;

    /// The abs-normal problem cached for `id` by the last
    /// [`abs_normal`](Self::abs_normal) call, if any.
    fn abs_normal_problem(&self, id: TapeId) -> Result<Option<AbsNormalProblem>>;

    /// Abs-normal form at `x`. `problem` must describe the tape exactly; it is
    /// cached for later reuse checks.
    fn abs_normal(
        &mut self,
        id: TapeId,
        problem: AbsNormalProblem,
        x: &[F],
    ) -> Result<AbsNormalForm<F>>;

    /// Compressed derivative tensor of `t ↦ f(x + S t)` up to `degree`, where
    /// `S = seed` is `n × k`. Shape `m × C(k + degree, degree)`.
    fn tensor_eval(
        &mut self,
        id: TapeId,
        degree: usize,
        x: &[F],
        seed: ArrayView2<F>,
    ) -> Result<Array2<F>>;
}

/// One recorded tape together with its cached dimensions.
#[derive(Clone, Debug)]
pub struct TapeContext<F: TapeFloat> {
    tape: BytecodeTape<F>,
    num_outputs: usize,
    num_inputs: usize,
    abs_normal: Option<AbsNormalProblem>,
}

impl<F: TapeFloat> TapeContext<F> {
    fn new(tape: BytecodeTape<F>) -> Self {
        TapeContext {
            num_outputs: tape.num_outputs(),
            num_inputs: tape.num_inputs(),
            tape,
            abs_normal: None,
        }
    }

    /// The recorded bytecode.
    pub fn tape(&self) -> &BytecodeTape<F> {
        &self.tape
    }

    /// Output count `m` fixed at recording time.
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Input count `n` fixed at recording time.
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Abs-normal problem cached by the last successful abs-normal sweep.
    pub fn abs_normal_problem(&self) -> Option<AbsNormalProblem> {
        self.abs_normal
    }

    fn check_inputs(&self, x: &[F]) -> Result<()> {
        if x.len() != self.num_inputs {
            return Err(AdError::mismatch("input count", self.num_inputs, x.len()));
        }
        Ok(())
    }

    fn check_outputs(&self, what: &'static str, len: usize) -> Result<()> {
        if len != self.num_outputs {
            return Err(AdError::mismatch(what, self.num_outputs, len));
        }
        Ok(())
    }
}

/// In-crate [`Engine`]: a map from [`TapeId`] to recorded bytecode tapes.
#[derive(Clone, Debug)]
pub struct TapeRegistry<F: TapeFloat> {
    tapes: HashMap<TapeId, TapeContext<F>>,
}

impl<F: TapeFloat> Default for TapeRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: TapeFloat> TapeRegistry<F> {
    /// An empty registry.
    pub fn new() -> Self {
        TapeRegistry {
            tapes: HashMap::new(),
        }
    }

    /// Whether a tape is recorded under `id`.
    pub fn contains(&self, id: TapeId) -> bool {
        self.tapes.contains_key(&id)
    }

    /// The context recorded under `id`.
    pub fn context(&self, id: TapeId) -> Result<&TapeContext<F>> {
        self.tapes.get(&id).ok_or(AdError::UnknownTape(id))
    }

    /// Drop the tape recorded under `id`, returning whether one existed.
    pub fn remove(&mut self, id: TapeId) -> bool {
        self.tapes.remove(&id).is_some()
    }

    /// Number of recorded tapes.
    pub fn len(&self) -> usize {
        self.tapes.len()
    }

    /// Whether no tape is recorded.
    pub fn is_empty(&self) -> bool {
        self.tapes.is_empty()
    }

    fn insert(&mut self, id: TapeId, tape: BytecodeTape<F>) {
        debug!(
            "recorded tape {id}: {} inputs, {} outputs, {} ops",
            tape.num_inputs(),
            tape.num_outputs(),
            tape.num_ops()
        );
        if self.tapes.insert(id, TapeContext::new(tape)).is_some() {
            debug!("tape {id} overwritten");
        }
    }

    fn context_mut(&mut self, id: TapeId) -> Result<&mut TapeContext<F>> {
        self.tapes.get_mut(&id).ok_or(AdError::UnknownTape(id))
    }

    /// Context for `id` with `x` checked and the tape re-evaluated at `x`.
    fn evaluated(&mut self, id: TapeId, x: &[F]) -> Result<&mut TapeContext<F>> {
        let ctx = self.context_mut(id)?;
        ctx.check_inputs(x)?;
        ctx.tape.forward(x);
        Ok(ctx)
    }
}

/// Record `f` at `x` into a fresh tape. Outputs that never touched an input
/// are pushed as constants so every output has a tape entry.
pub(crate) fn record_tape<F: TapeFloat>(
    x: &[F],
    f: impl FnOnce(&[BReverse<F>]) -> Vec<BReverse<F>>,
) -> (BytecodeTape<F>, Vec<F>) {
    let mut tape = BytecodeTape::with_capacity(x.len() * 10);
    let inputs: Vec<BReverse<F>> = x
        .iter()
        .map(|&val| BReverse::from_tape(val, tape.new_input(val)))
        .collect();

    let outputs = {
        let _guard = RecordingGuard::new(&mut tape);
        f(&inputs)
    };

    let indices: Vec<u32> = outputs
        .iter()
        .map(|o| {
            if o.index == CONSTANT {
                tape.push_const(o.value)
            } else {
                o.index
            }
        })
        .collect();
    tape.set_outputs(&indices);
    let values = outputs.iter().map(|o| o.value).collect();
    (tape, values)
}

impl<F: TapeFloat> Engine<F> for TapeRegistry<F> {
    fn record(
        &mut self,
        id: TapeId,
        x: &[F],
        f: impl FnOnce(&[BReverse<F>]) -> Vec<BReverse<F>>,
    ) -> Vec<F> {
        let (tape, values) = record_tape(x, f);
        self.insert(id, tape);
        values
    }

    fn record_checked(
        &mut self,
        id: TapeId,
        x: &[F],
        num_outputs: usize,
        f: impl FnOnce(&[BReverse<F>]) -> Vec<BReverse<F>>,
    ) -> Result<Vec<F>> {
        let (tape, values) = record_tape(x, f);
        if values.len() != num_outputs {
            debug!("tape {id} not recorded: output count mismatch");
            return Err(AdError::mismatch("output count", num_outputs, values.len()));
        }
        self.insert(id, tape);
        Ok(values)
    }

    fn dimensions(&self, id: TapeId) -> Result<(usize, usize)> {
        let ctx = self.context(id)?;
        Ok((ctx.num_outputs, ctx.num_inputs))
    }

    fn zos_forward(&mut self, id: TapeId, x: &[F]) -> Result<Vec<F>> {
        trace!("zos_forward on tape {id}");
        Ok(self.evaluated(id, x)?.tape.output_values())
    }

    fn fos_forward(&mut self, id: TapeId, x: &[F], v: &[F]) -> Result<(Vec<F>, Vec<F>)> {
        trace!("fos_forward on tape {id}");
        let ctx = self.context(id)?;
        ctx.check_inputs(x)?;
        if v.len() != ctx.num_inputs {
            return Err(AdError::mismatch(
                "direction length",
                ctx.num_inputs,
                v.len(),
            ));
        }
        let (values, tangents) = ctx.tape.forward_directions(x, &[v.to_vec()]);
        Ok((values, tangents.into_iter().map(|row| row[0]).collect()))
    }

    fn fov_forward(
        &mut self,
        id: TapeId,
        x: &[F],
        directions: &[Vec<F>],
    ) -> Result<(Vec<F>, Vec<Vec<F>>)> {
        trace!(
            "fov_forward on tape {id} with {} directions",
            directions.len()
        );
        let ctx = self.context(id)?;
        ctx.check_inputs(x)?;
        check_vectors("direction length", ctx.num_inputs, directions)?;
        Ok(ctx.tape.forward_directions(x, directions))
    }

    fn hov_forward(
        &mut self,
        id: TapeId,
        degree: usize,
        x: &[F],
        directions: &[Vec<F>],
    ) -> Result<(Vec<F>, Array3<F>)> {
        trace!("hov_forward on tape {id}, degree {degree}");
        let ctx = self.context(id)?;
        ctx.check_inputs(x)?;
        check_vectors("direction length", ctx.num_inputs, directions)?;
        Ok(ctx.tape.hov_forward(degree, x, directions))
    }

    fn fos_reverse(&mut self, id: TapeId, x: &[F], weights: &[F]) -> Result<Vec<F>> {
        trace!("fos_reverse on tape {id}");
        let ctx = self.context(id)?;
        ctx.check_outputs("weight length", weights.len())?;
        let ctx = self.evaluated(id, x)?;
        Ok(ctx.tape.reverse_seeded(weights))
    }

    fn fov_reverse(&mut self, id: TapeId, x: &[F], weights: &[Vec<F>]) -> Result<Vec<Vec<F>>> {
        trace!("fov_reverse on tape {id} with {} weights", weights.len());
        let ctx = self.context(id)?;
        check_vectors("weight length", ctx.num_outputs, weights)?;
        let ctx = self.evaluated(id, x)?;
        Ok(weights.iter().map(|w| ctx.tape.reverse_seeded(w)).collect())
    }

    fn hessian(
        &mut self,
        id: TapeId,
        component: usize,
        x: &[F],
        mut out: ArrayViewMut2<F>,
    ) -> Result<()> {
        trace!("hessian on tape {id}, component {component}");
        let ctx = self.context(id)?;
        ctx.check_inputs(x)?;
        if component >= ctx.num_outputs {
            return Err(AdError::invalid(format!(
                "output component {component} out of range for {} outputs",
                ctx.num_outputs
            )));
        }
        let n = ctx.num_inputs;
        if out.dim() != (n, n) {
            return Err(AdError::invalid(format!(
                "Hessian buffer has shape {:?}, expected ({n}, {n})",
                out.dim()
            )));
        }
        let hess = ctx.tape.hessian_component(x, component);
        for (i, row) in hess.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                out[[i, j]] = v;
            }
        }
        Ok(())
    }

    fn num_switches(&self, id: TapeId) -> Result<usize> {
        Ok(self.context(id)?.tape.num_switches())
    }

    fn abs_normal_problem(&self, id: TapeId) -> Result<Option<AbsNormalProblem>> {
        Ok(self.context(id)?.abs_normal)
    }

    fn abs_normal(
        &mut self,
        id: TapeId,
        problem: AbsNormalProblem,
        x: &[F],
    ) -> Result<AbsNormalForm<F>> {
        trace!("abs_normal on tape {id}");
        let ctx = self.context_mut(id)?;
        ctx.check_inputs(x)?;
        if problem.tape_id != id {
            return Err(AdError::mismatch("abs-normal tape id", id, problem.tape_id));
        }
        if problem.num_outputs != ctx.num_outputs {
            return Err(AdError::mismatch(
                "output count",
                ctx.num_outputs,
                problem.num_outputs,
            ));
        }
        if problem.num_inputs != ctx.num_inputs {
            return Err(AdError::mismatch(
                "input count",
                ctx.num_inputs,
                problem.num_inputs,
            ));
        }
        let switches = ctx.tape.num_switches();
        if problem.num_switches != switches {
            return Err(AdError::mismatch(
                "switch count",
                switches,
                problem.num_switches,
            ));
        }
        ctx.abs_normal = Some(problem);
        Ok(ctx.tape.abs_normal(x, problem))
    }

    fn tensor_eval(
        &mut self,
        id: TapeId,
        degree: usize,
        x: &[F],
        seed: ArrayView2<F>,
    ) -> Result<Array2<F>> {
        trace!(
            "tensor_eval on tape {id}, degree {degree}, {} seeds",
            seed.ncols()
        );
        let ctx = self.context(id)?;
        ctx.check_inputs(x)?;
        if seed.nrows() != ctx.num_inputs {
            return Err(AdError::mismatch("seed rows", ctx.num_inputs, seed.nrows()));
        }
        Ok(ctx.tape.tensor_eval(degree, x, seed))
    }
}

fn check_vectors<F>(what: &'static str, expected: usize, vectors: &[Vec<F>]) -> Result<()> {
    match vectors.iter().find(|v| v.len() != expected) {
        Some(v) => Err(AdError::mismatch(what, expected, v.len())),
        None => Ok(()),
    }
}
