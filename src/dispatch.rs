//! Mode dispatch: turn a derivative request into engine sweeps.
//!
//! [`derivative`] records (or reuses) the tape, plans and allocates the
//! result buffer, routes the request to the sweeps that compute it and
//! releases the buffer guard on every exit path.
//!
//! ```
//! use adsweep::{derivative, BufferPlanner, DerivativeOptions, Mode, TapeRegistry};
//!
//! let mut engine = TapeRegistry::<f64>::new();
//! let planner = BufferPlanner::new();
//! let jac = derivative(
//!     &mut engine,
//!     &planner,
//!     |x| vec![x[0] * x[1], x[0] + x[1]],
//!     2,
//!     2,
//!     &[3.0, 4.0],
//!     Mode::Jac,
//!     &DerivativeOptions::default(),
//! )
//! .unwrap();
//! let jac = jac.buffer().and_then(|b| b.as_matrix()).unwrap();
//! assert_eq!(jac[[0, 0]], 4.0);
//! assert_eq!(jac[[1, 1]], 1.0);
//! ```

use log::debug;
use ndarray::{ArrayD, Axis};

use crate::abs_normal::{AbsNormalForm, AbsNormalProblem};
use crate::breverse::BReverse;
use crate::buffer::{AllocationShape, Buffer, BufferPlanner, Dimensions};
use crate::bytecode_tape::TapeFloat;
use crate::engine::{Engine, TapeId};
use crate::error::{AdError, Result};
use crate::mode::{select_jacobian_strategy, JacobianStrategy, Mode};
use crate::partial::{is_canonical, to_adolc_format};
use crate::seed::{
    seed_indices, seed_indices_adolc, seed_matrix, to_seed_space, to_seed_space_adolc,
};
use crate::tensor::{address, build_tensor};

/// One vector or a batch of vectors (directions or weights).
#[derive(Clone, Copy, Debug)]
pub enum Seeds<'a, F> {
    One(&'a [F]),
    Many(&'a [Vec<F>]),
}

impl<F: Copy> Seeds<'_, F> {
    fn count(&self) -> usize {
        match self {
            Seeds::One(_) => 1,
            Seeds::Many(vs) => vs.len(),
        }
    }

    fn to_vecs(self) -> Vec<Vec<F>> {
        match self {
            Seeds::One(v) => vec![v.to_vec()],
            Seeds::Many(vs) => vs.to_vec(),
        }
    }
}

/// A batch of mixed partial derivatives to extract.
#[derive(Clone, Copy, Debug)]
pub enum Partials<'a> {
    /// Per-variable order vectors, each of length `n`.
    Partial(&'a [Vec<usize>]),
    /// Canonical ADOLC-format multisets of 1-based variable indices.
    Adolc(&'a [Vec<usize>]),
}

impl Partials<'_> {
    fn len(&self) -> usize {
        match self {
            Partials::Partial(ps) | Partials::Adolc(ps) => ps.len(),
        }
    }
}

/// Optional parameters of [`derivative`].
#[derive(Clone, Copy, Debug)]
pub struct DerivativeOptions<'a, F> {
    /// Derivative order: 1, or 2 for `Hess` and Taylor `JacVec`/`JacMat`.
    pub order: usize,
    /// Directions for `JacVec` (one) and `JacMat` (any number).
    pub direction: Option<Seeds<'a, F>>,
    /// Weights for `VecJac` (one) and `MatJac` (any number).
    pub weights: Option<Seeds<'a, F>>,
    /// When set, the result is one column per requested partial and `mode`
    /// and `order` are ignored.
    pub partials: Option<Partials<'a>>,
    /// Engine key under which `f` is recorded or, with `reuse_tape`, looked up.
    pub tape_id: TapeId,
    /// Replay the tape recorded under `tape_id` instead of recording `f`.
    pub reuse_tape: bool,
}

impl<F> Default for DerivativeOptions<'_, F> {
    fn default() -> Self {
        DerivativeOptions {
            order: 1,
            direction: None,
            weights: None,
            partials: None,
            tape_id: 0,
            reuse_tape: false,
        }
    }
}

/// Result of [`derivative`].
#[derive(Clone, Debug)]
pub enum Derivative<F: TapeFloat> {
    /// Vector, matrix or tensor laid out as planned by [`BufferPlanner`].
    Dense(Buffer<F>),
    /// Output of `Mode::AbsNormal`.
    AbsNormal(Box<AbsNormalForm<F>>),
}

impl<F: TapeFloat> Derivative<F> {
    /// The dense result, or `None` for an abs-normal form.
    pub fn buffer(&self) -> Option<&Buffer<F>> {
        match self {
            Derivative::Dense(b) => Some(b),
            Derivative::AbsNormal(_) => None,
        }
    }

    /// The abs-normal form, if that is what was computed.
    pub fn abs_normal(&self) -> Option<&AbsNormalForm<F>> {
        match self {
            Derivative::AbsNormal(form) => Some(form),
            Derivative::Dense(_) => None,
        }
    }

    /// Owned variant of [`buffer`](Self::buffer).
    pub fn into_buffer(self) -> Option<Buffer<F>> {
        match self {
            Derivative::Dense(b) => Some(b),
            Derivative::AbsNormal(_) => None,
        }
    }
}

/// Compute the derivative of `f : Rⁿ → Rᵐ` at `x` described by `mode` and
/// `options`.
///
/// `f` is recorded under `options.tape_id` unless `options.reuse_tape` is
/// set, in which case the stored tape must have exactly `m` outputs and `n`
/// inputs. A recording that does not yield `m` outputs is discarded, leaving
/// whatever was stored under `options.tape_id` in place.
#[allow(clippy::too_many_arguments)]
pub fn derivative<F, E>(
    engine: &mut E,
    planner: &BufferPlanner,
    f: impl FnOnce(&[BReverse<F>]) -> Vec<BReverse<F>>,
    m: usize,
    n: usize,
    x: &[F],
    mode: Mode,
    options: &DerivativeOptions<'_, F>,
) -> Result<Derivative<F>>
where
    F: TapeFloat,
    E: Engine<F>,
{
    let shape = plan_request(mode, m, n, options)?;
    prepare_tape(engine, f, m, n, x, options)?;

    let Some(shape) = shape else {
        let form = abs_normal(engine, m, n, x, options)?;
        return Ok(Derivative::AbsNormal(Box::new(form)));
    };

    let mut guard = planner.allocate::<F>(shape);
    compute_into(engine, m, n, x, mode, options, &mut guard)?;
    Ok(Derivative::Dense(guard.into_inner()))
}

/// Like [`derivative`], writing into a caller-owned buffer.
///
/// `result` must have exactly the planned shape; otherwise the call fails
/// with [`AdError::InvalidArgument`] before `f` is recorded. The abs-normal
/// mode has no buffer form and is rejected.
#[allow(clippy::too_many_arguments)]
pub fn derivative_into<F, E>(
    engine: &mut E,
    f: impl FnOnce(&[BReverse<F>]) -> Vec<BReverse<F>>,
    m: usize,
    n: usize,
    x: &[F],
    mode: Mode,
    options: &DerivativeOptions<'_, F>,
    result: &mut Buffer<F>,
) -> Result<()>
where
    F: TapeFloat,
    E: Engine<F>,
{
    let Some(shape) = plan_request(mode, m, n, options)? else {
        return Err(AdError::invalid(
            "the abs-normal form owns its storage; use derivative()",
        ));
    };
    if result.shape() != shape {
        return Err(AdError::invalid(format!(
            "result buffer has shape {:?}, expected {shape:?}",
            result.shape()
        )));
    }
    prepare_tape(engine, f, m, n, x, options)?;
    compute_into(engine, m, n, x, mode, options, result)
}

/// Dense derivative tensor of order `order`, shape `[n; order] ++ [m]`,
/// computed from one compressed tensor evaluation over all `n` inputs.
pub fn higher_order_tensor<F, E>(
    engine: &mut E,
    f: impl FnOnce(&[BReverse<F>]) -> Vec<BReverse<F>>,
    m: usize,
    n: usize,
    x: &[F],
    order: usize,
    options: &DerivativeOptions<'_, F>,
) -> Result<ArrayD<F>>
where
    F: TapeFloat,
    E: Engine<F>,
{
    check_len("input count", n, x.len())?;
    prepare_tape(engine, f, m, n, x, options)?;
    let all: Vec<usize> = (1..=n).collect();
    let seed = seed_matrix(n, &all)?;
    let compressed = engine.tensor_eval(options.tape_id, order, x, seed.view())?;
    build_tensor(order, m, n, compressed.view())
}

// ── Planning ──

fn plan_request<F>(
    mode: Mode,
    m: usize,
    n: usize,
    options: &DerivativeOptions<'_, F>,
) -> Result<Option<AllocationShape>>
where
    F: Copy,
{
    if let Some(partials) = options.partials {
        return Ok(Some(AllocationShape::Matrix(m, partials.len())));
    }
    let dims = Dimensions::new(m, n)
        .with_directions(options.direction.map_or(0, |d| d.count()))
        .with_weights(options.weights.map_or(0, |w| w.count()));
    match (mode, options.order) {
        (Mode::JacVec, 1 | 2) | (Mode::VecJac, 1) => {
            let seeds = match mode {
                Mode::VecJac => options.weights,
                _ => options.direction,
            };
            if !matches!(seeds, Some(s) if s.count() == 1) {
                let msg = format!("mode {mode} needs exactly one vector");
                return Err(AdError::invalid(msg));
            }
        }
        (Mode::JacMat, 1 | 2) if options.direction.is_none() => {
            return Err(AdError::invalid("mode jac_mat needs directions"));
        }
        (Mode::MatJac, 1) if options.weights.is_none() => {
            return Err(AdError::invalid("mode mat_jac needs weights"));
        }
        _ => {}
    }
    BufferPlanner::plan(mode, options.order, dims)
}

// ── Tape lifecycle ──

fn prepare_tape<F, E>(
    engine: &mut E,
    f: impl FnOnce(&[BReverse<F>]) -> Vec<BReverse<F>>,
    m: usize,
    n: usize,
    x: &[F],
    options: &DerivativeOptions<'_, F>,
) -> Result<()>
where
    F: TapeFloat,
    E: Engine<F>,
{
    let id = options.tape_id;
    check_len("input count", n, x.len())?;
    if options.reuse_tape {
        let (tm, tn) = engine.dimensions(id)?;
        check_len("output count", tm, m)?;
        check_len("input count", tn, n)?;
        debug!("reusing tape {id} ({m} outputs, {n} inputs)");
    } else {
        engine.record_checked(id, x, m, f)?;
    }
    Ok(())
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(AdError::mismatch(what, expected, found));
    }
    Ok(())
}

// ── Routing ──

fn compute_into<F, E>(
    engine: &mut E,
    m: usize,
    n: usize,
    x: &[F],
    mode: Mode,
    options: &DerivativeOptions<'_, F>,
    out: &mut Buffer<F>,
) -> Result<()>
where
    F: TapeFloat,
    E: Engine<F>,
{
    if let Some(partials) = options.partials {
        return partial_derivatives(engine, n, x, partials, options.tape_id, out);
    }
    match options.order {
        1 => first_order(engine, m, n, x, mode, options, out),
        2 => second_order(engine, m, x, mode, options, out),
        order => Err(AdError::NotImplemented(format!("derivative order {order}"))),
    }
}

fn first_order<F, E>(
    engine: &mut E,
    m: usize,
    n: usize,
    x: &[F],
    mode: Mode,
    options: &DerivativeOptions<'_, F>,
    out: &mut Buffer<F>,
) -> Result<()>
where
    F: TapeFloat,
    E: Engine<F>,
{
    let id = options.tape_id;
    match mode {
        Mode::Jac => {
            let strategy = select_jacobian_strategy(m, n);
            debug!("jac on tape {id}: {strategy:?} (m = {m}, n = {n})");
            let jac = matrix_mut(out)?;
            match strategy {
                JacobianStrategy::Gradient => {
                    let grad = engine.fos_reverse(id, x, &[F::one()])?;
                    fill_rows(jac, &[grad]);
                }
                JacobianStrategy::Forward => {
                    let (_, tangents) = engine.fov_forward(id, x, &identity(n))?;
                    fill_rows(jac, &tangents);
                }
                JacobianStrategy::Reverse => {
                    let rows = engine.fov_reverse(id, x, &identity(m))?;
                    fill_rows(jac, &rows);
                }
            }
        }
        Mode::JacVec => {
            let dirs = seeds(options.direction, mode)?;
            let (_, tangent) = engine.fos_forward(id, x, &dirs[0])?;
            fill_vector(out, &tangent)?;
        }
        Mode::JacMat => {
            let dirs = seeds(options.direction, mode)?;
            let (_, tangents) = engine.fov_forward(id, x, &dirs)?;
            fill_rows(matrix_mut(out)?, &tangents);
        }
        Mode::VecJac => {
            let weights = seeds(options.weights, mode)?;
            let adjoint = engine.fos_reverse(id, x, &weights[0])?;
            fill_vector(out, &adjoint)?;
        }
        Mode::MatJac => {
            let weights = seeds(options.weights, mode)?;
            let rows = engine.fov_reverse(id, x, &weights)?;
            fill_rows(matrix_mut(out)?, &rows);
        }
        Mode::Hess | Mode::AbsNormal => {
            let msg = format!("mode {mode} into a dense buffer");
            return Err(AdError::NotImplemented(msg));
        }
    }
    Ok(())
}

fn second_order<F, E>(
    engine: &mut E,
    m: usize,
    x: &[F],
    mode: Mode,
    options: &DerivativeOptions<'_, F>,
    out: &mut Buffer<F>,
) -> Result<()>
where
    F: TapeFloat,
    E: Engine<F>,
{
    let id = options.tape_id;
    let Some(tensor) = out.as_tensor_mut() else {
        return Err(AdError::invalid("second-order results need a tensor"));
    };
    match mode {
        Mode::Hess => {
            debug!("hess on tape {id}: {m} dense Hessian sweeps");
            for c in 0..m {
                engine.hessian(id, c, x, tensor.index_axis_mut(Axis(0), c))?;
            }
            Ok(())
        }
        Mode::JacVec | Mode::JacMat => {
            let dirs = seeds(options.direction, mode)?;
            let (_, coeffs) = engine.hov_forward(id, 2, x, &dirs)?;
            tensor.assign(&coeffs);
            Ok(())
        }
        _ => Err(AdError::NotImplemented(format!("mode {mode} at order 2"))),
    }
}

fn abs_normal<F, E>(
    engine: &mut E,
    m: usize,
    n: usize,
    x: &[F],
    options: &DerivativeOptions<'_, F>,
) -> Result<AbsNormalForm<F>>
where
    F: TapeFloat,
    E: Engine<F>,
{
    let id = options.tape_id;
    let problem = AbsNormalProblem {
        tape_id: id,
        num_outputs: m,
        num_inputs: n,
        num_switches: engine.num_switches(id)?,
    };
    if options.reuse_tape {
        if let Some(cached) = engine.abs_normal_problem(id)? {
            check_len("abs-normal tape id", cached.tape_id, problem.tape_id)?;
            check_len("output count", cached.num_outputs, problem.num_outputs)?;
            check_len("input count", cached.num_inputs, problem.num_inputs)?;
            check_len("switch count", cached.num_switches, problem.num_switches)?;
        }
    }
    debug!("abs_normal on tape {id}: {} switches", problem.num_switches);
    engine.abs_normal(id, problem, x)
}

// ── Partial derivatives ──

fn partial_derivatives<F, E>(
    engine: &mut E,
    n: usize,
    x: &[F],
    partials: Partials<'_>,
    id: TapeId,
    out: &mut Buffer<F>,
) -> Result<()>
where
    F: TapeFloat,
    E: Engine<F>,
{
    // Seed-space multisets, each padded to the common degree.
    let (seeds, reduced) = match partials {
        Partials::Partial(ps) => {
            if let Some(p) = ps.iter().find(|p| p.len() != n) {
                return Err(AdError::mismatch("partial length", n, p.len()));
            }
            let seeds = seed_indices(ps);
            let degree = ps
                .iter()
                .map(|p| p.iter().sum::<usize>())
                .max()
                .unwrap_or(0);
            let reduced = to_seed_space(ps, Some(&seeds))
                .iter()
                .map(|r| to_adolc_format(r, degree))
                .collect::<Result<Vec<_>>>()?;
            (seeds, reduced)
        }
        Partials::Adolc(ps) => {
            for p in ps {
                if !is_canonical(p) {
                    return Err(AdError::invalid(format!("partial {p:?} is not canonical")));
                }
            }
            let seeds = seed_indices_adolc(ps);
            let degree = ps
                .iter()
                .map(|p| p.iter().filter(|&&v| v != 0).count())
                .max()
                .unwrap_or(0);
            let mut reduced = to_seed_space_adolc(ps, Some(&seeds))?;
            for r in reduced.iter_mut() {
                r.retain(|&v| v != 0);
                r.resize(degree, 0);
            }
            (seeds, reduced)
        }
    };
    let degree = reduced.first().map_or(0, Vec::len);

    let seed = seed_matrix(n, &seeds)?;
    debug!(
        "partials on tape {id}: {} requests, {} seed directions, degree {degree}",
        reduced.len(),
        seeds.len()
    );
    let compressed = engine.tensor_eval(id, degree, x, seed.view())?;

    let result = matrix_mut(out)?;
    for (j, multiset) in reduced.iter().enumerate() {
        let col = address(degree, multiset) - 1;
        result.column_mut(j).assign(&compressed.column(col));
    }
    Ok(())
}

// ── Helpers ──

fn seeds<F: Copy>(seeds: Option<Seeds<'_, F>>, mode: Mode) -> Result<Vec<Vec<F>>> {
    match seeds {
        Some(seeds) => Ok(seeds.to_vecs()),
        None => Err(AdError::invalid(format!("mode {mode} needs seed vectors"))),
    }
}

fn identity<F: TapeFloat>(k: usize) -> Vec<Vec<F>> {
    (0..k)
        .map(|i| {
            let mut e = vec![F::zero(); k];
            e[i] = F::one();
            e
        })
        .collect()
}

fn matrix_mut<F: TapeFloat>(out: &mut Buffer<F>) -> Result<&mut ndarray::Array2<F>> {
    out.as_matrix_mut()
        .ok_or_else(|| AdError::invalid("result needs a matrix buffer"))
}

fn fill_vector<F: TapeFloat>(out: &mut Buffer<F>, values: &[F]) -> Result<()> {
    let v = out
        .as_vector_mut()
        .ok_or_else(|| AdError::invalid("result needs a vector buffer"))?;
    for (dst, &src) in v.iter_mut().zip(values) {
        *dst = src;
    }
    Ok(())
}

fn fill_rows<F: TapeFloat>(out: &mut ndarray::Array2<F>, rows: &[Vec<F>]) {
    for (mut dst, src) in out.rows_mut().into_iter().zip(rows) {
        for (d, &s) in dst.iter_mut().zip(src) {
            *d = s;
        }
    }
}
