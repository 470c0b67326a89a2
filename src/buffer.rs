//! Result buffers: shape planning and scoped allocation.
//!
//! [`BufferPlanner::plan`] maps a request to the shape of its result, and
//! [`BufferPlanner::allocate`] hands out a zero-filled buffer wrapped in a
//! [`BufferGuard`]. The planner counts live guards, so a caller can check that
//! every buffer of a failed dispatch was released.

use std::cell::Cell;
use std::ops::{Deref, DerefMut};

use ndarray::{Array1, Array2, Array3};

use crate::error::{AdError, Result};
use crate::float::Float;
use crate::mode::Mode;

/// Shape of a result buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AllocationShape {
    Vector(usize),
    /// Rows, columns.
    Matrix(usize, usize),
    /// Leading axis indexes outputs.
    Tensor(usize, usize, usize),
}

/// Sizes a plan depends on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dimensions {
    /// Output count `m`.
    pub outputs: usize,
    /// Input count `n`.
    pub inputs: usize,
    /// Number of direction vectors `p`.
    pub directions: usize,
    /// Number of weight vectors `q`.
    pub weights: usize,
}

impl Dimensions {
    /// `m` outputs, `n` inputs and no seed vectors.
    pub fn new(outputs: usize, inputs: usize) -> Self {
        Dimensions {
            outputs,
            inputs,
            ..Default::default()
        }
    }

    /// Set the direction count `p`.
    pub fn with_directions(mut self, directions: usize) -> Self {
        self.directions = directions;
        self
    }

    /// Set the weight count `q`.
    pub fn with_weights(mut self, weights: usize) -> Self {
        self.weights = weights;
        self
    }
}

/// A dense result buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum Buffer<F: Float> {
    Vector(Array1<F>),
    Matrix(Array2<F>),
    Tensor(Array3<F>),
}

impl<F: Float> Buffer<F> {
    /// Zero-filled buffer of the given shape.
    pub fn zeros(shape: AllocationShape) -> Self {
        match shape {
            AllocationShape::Vector(len) => Buffer::Vector(Array1::zeros(len)),
            AllocationShape::Matrix(r, c) => Buffer::Matrix(Array2::zeros((r, c))),
            AllocationShape::Tensor(a, b, c) => Buffer::Tensor(Array3::zeros((a, b, c))),
        }
    }

    /// Shape this buffer was allocated with.
    pub fn shape(&self) -> AllocationShape {
        match self {
            Buffer::Vector(v) => AllocationShape::Vector(v.len()),
            Buffer::Matrix(a) => {
                let (r, c) = a.dim();
                AllocationShape::Matrix(r, c)
            }
            Buffer::Tensor(a) => {
                let (x, y, z) = a.dim();
                AllocationShape::Tensor(x, y, z)
            }
        }
    }

    /// The data if this is a vector.
    pub fn as_vector(&self) -> Option<&Array1<F>> {
        match self {
            Buffer::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// The data if this is a matrix.
    pub fn as_matrix(&self) -> Option<&Array2<F>> {
        match self {
            Buffer::Matrix(a) => Some(a),
            _ => None,
        }
    }

    /// The data if this is a third-order tensor.
    pub fn as_tensor(&self) -> Option<&Array3<F>> {
        match self {
            Buffer::Tensor(a) => Some(a),
            _ => None,
        }
    }

    pub(crate) fn as_vector_mut(&mut self) -> Option<&mut Array1<F>> {
        match self {
            Buffer::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn as_matrix_mut(&mut self) -> Option<&mut Array2<F>> {
        match self {
            Buffer::Matrix(a) => Some(a),
            _ => None,
        }
    }

    pub(crate) fn as_tensor_mut(&mut self) -> Option<&mut Array3<F>> {
        match self {
            Buffer::Tensor(a) => Some(a),
            _ => None,
        }
    }
}

/// Plans result shapes and tracks outstanding buffers.
#[derive(Debug, Default)]
pub struct BufferPlanner {
    live: Cell<usize>,
}

impl BufferPlanner {
    /// A planner with no live buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shape of the result of `mode` at `order`.
    ///
    /// `Ok(None)` means the result owns its storage (abs-normal form).
    /// Unsupported combinations are [`AdError::NotImplemented`].
    pub fn plan(mode: Mode, order: usize, dims: Dimensions) -> Result<Option<AllocationShape>> {
        let Dimensions {
            outputs: m,
            inputs: n,
            directions: p,
            weights: q,
        } = dims;
        let shape = match (mode, order) {
            (Mode::Jac, 1) => AllocationShape::Matrix(m, n),
            (Mode::JacVec, 1) => AllocationShape::Vector(m),
            (Mode::JacMat, 1) => AllocationShape::Matrix(m, p),
            (Mode::VecJac, 1) => AllocationShape::Vector(n),
            (Mode::MatJac, 1) => AllocationShape::Matrix(q, n),
            (Mode::AbsNormal, 1) => return Ok(None),
            (Mode::Hess, 2) => AllocationShape::Tensor(m, n, n),
            (Mode::JacVec, 2) => AllocationShape::Tensor(m, 1, 2),
            (Mode::JacMat, 2) => AllocationShape::Tensor(m, p, 2),
            (mode, order) => {
                return Err(AdError::NotImplemented(format!(
                    "mode {mode} at order {order}"
                )))
            }
        };
        Ok(Some(shape))
    }

    /// Zero-filled buffer of `shape`, released when the guard drops.
    pub fn allocate<F: Float>(&self, shape: AllocationShape) -> BufferGuard<'_, F> {
        self.live.set(self.live.get() + 1);
        BufferGuard {
            planner: self,
            buffer: Some(Buffer::zeros(shape)),
        }
    }

    /// Number of guards not yet dropped.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    fn release(&self) {
        self.live.set(self.live.get() - 1);
    }
}

/// Scoped ownership of a buffer handed out by [`BufferPlanner::allocate`].
#[derive(Debug)]
pub struct BufferGuard<'a, F: Float> {
    planner: &'a BufferPlanner,
    buffer: Option<Buffer<F>>,
}

impl<F: Float> BufferGuard<'_, F> {
    /// Release the guard and keep the data.
    pub fn into_inner(mut self) -> Buffer<F> {
        match self.buffer.take() {
            Some(buffer) => buffer,
            None => unreachable!("buffer is only taken by into_inner"),
        }
    }
}

impl<F: Float> Deref for BufferGuard<'_, F> {
    type Target = Buffer<F>;

    fn deref(&self) -> &Buffer<F> {
        match &self.buffer {
            Some(buffer) => buffer,
            None => unreachable!("buffer is only taken by into_inner"),
        }
    }
}

impl<F: Float> DerefMut for BufferGuard<'_, F> {
    fn deref_mut(&mut self) -> &mut Buffer<F> {
        match &mut self.buffer {
            Some(buffer) => buffer,
            None => unreachable!("buffer is only taken by into_inner"),
        }
    }
}

impl<F: Float> Drop for BufferGuard<'_, F> {
    fn drop(&mut self) {
        self.planner.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_releases_on_drop_and_into_inner() {
        let planner = BufferPlanner::new();
        {
            let _a = planner.allocate::<f64>(AllocationShape::Vector(3));
            let b = planner.allocate::<f64>(AllocationShape::Matrix(2, 2));
            assert_eq!(planner.live(), 2);
            let data = b.into_inner();
            assert_eq!(data.shape(), AllocationShape::Matrix(2, 2));
            assert_eq!(planner.live(), 1);
        }
        assert_eq!(planner.live(), 0);
    }
}
