use ndarray::{Array1, Array2, Axis};

use crate::abs_normal::{AbsNormalForm, AbsNormalProblem};
use crate::float::Float;
use crate::opcode::{self, OpCode};

impl<F: Float> super::BytecodeTape<F> {
    /// Build the abs-normal form of the recorded function at `x`.
    ///
    /// Runs a zero-order [`forward`](Self::forward) sweep, then propagates for
    /// every tape entry its linear dependence on `x` and on `|z|`. Switches are
    /// numbered in tape order.
    ///
    /// `problem` must describe this tape; the caller validates it.
    pub fn abs_normal(&mut self, x: &[F], problem: AbsNormalProblem) -> AbsNormalForm<F> {
        self.forward(x);

        let n = self.num_inputs as usize;
        let s = problem.num_switches;
        let nv = self.num_variables as usize;
        let half = F::one() / (F::one() + F::one());

        let mut form = AbsNormalForm::zeros(problem);
        form.x = Array1::from_vec(x.to_vec());

        // Row k: ∂v_k/∂x and ∂v_k/∂|z|.
        let mut gx = Array2::<F>::zeros((nv, n));
        let mut gs = Array2::<F>::zeros((nv, s));
        let mut switch = 0usize;

        for i in 0..self.opcodes.len() {
            let op = self.opcodes[i];
            match op {
                OpCode::Input => gx[[i, i]] = F::one(),
                OpCode::Const => {}
                OpCode::Abs | OpCode::Max | OpCode::Min => {
                    let (a, b) = self.operands(i);
                    let (zx, zs, zv) = match b {
                        Some(b) => (
                            &gx.row(a) - &gx.row(b),
                            &gs.row(a) - &gs.row(b),
                            self.values[a] - self.values[b],
                        ),
                        None => (gx.row(a).to_owned(), gs.row(a).to_owned(), self.values[a]),
                    };
                    form.z[switch] = zv;
                    form.dz_dx.row_mut(switch).assign(&zx);
                    form.dz_dabs.row_mut(switch).assign(&zs);

                    if let Some(b) = b {
                        // max(a, b) = (a + b)/2 + |a - b|/2, min(a, b) = (a + b)/2 - |a - b|/2
                        let mx = (&gx.row(a) + &gx.row(b)).mapv(|v| v * half);
                        let ms = (&gs.row(a) + &gs.row(b)).mapv(|v| v * half);
                        gx.row_mut(i).assign(&mx);
                        gs.row_mut(i).assign(&ms);
                        gs[[i, switch]] = if op == OpCode::Max { half } else { -half };
                    } else {
                        gs[[i, switch]] = F::one();
                    }
                    switch += 1;
                }
                OpCode::Powi => {
                    let (a, _) = self.operands(i);
                    let da = opcode::powi_partial(self.values[a], self.powi_exp(i));
                    self.linear_combine(&mut gx, &mut gs, i, (a, da), None);
                }
                _ => {
                    let (a, b) = self.operands(i);
                    let vb = b.map_or_else(F::zero, |b| self.values[b]);
                    let (da, db) =
                        opcode::reverse_partials(op, self.values[a], vb, self.values[i]);
                    self.linear_combine(&mut gx, &mut gs, i, (a, da), b.map(|b| (b, db)));
                }
            }
        }
        debug_assert_eq!(switch, s, "switch count changed since recording");

        for (row, &out) in self.output_indices.iter().enumerate() {
            let out = out as usize;
            form.y[row] = self.values[out];
            form.dy_dx.row_mut(row).assign(&gx.row(out));
            form.dy_dabs.row_mut(row).assign(&gs.row(out));
        }

        let abs_z = form.z.mapv(|v| v.abs());
        form.cz = &form.z - &form.dz_dx.dot(&form.x) - &form.dz_dabs.dot(&abs_z);
        form.cy = &form.y - &form.dy_dx.dot(&form.x) - &form.dy_dabs.dot(&abs_z);
        form
    }

    /// `g[i] = da * g[a] (+ db * g[b])` for both gradient tables.
    fn linear_combine(
        &self,
        gx: &mut Array2<F>,
        gs: &mut Array2<F>,
        i: usize,
        (a, da): (usize, F),
        b: Option<(usize, F)>,
    ) {
        for g in [gx, gs] {
            let mut row = g.row(a).mapv(|v| v * da);
            if let Some((b, db)) = b {
                row.scaled_add(db, &g.row(b));
            }
            g.index_axis_mut(Axis(0), i).assign(&row);
        }
    }
}
