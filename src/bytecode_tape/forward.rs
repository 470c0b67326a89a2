use crate::dual::Dual;
use crate::float::Float;
use crate::opcode::{self, OpCode};

impl<F: Float> super::BytecodeTape<F> {
    /// Re-evaluate the tape at new inputs (zero-order forward sweep).
    ///
    /// Overwrites `values` in place, no allocation.
    pub fn forward(&mut self, inputs: &[F]) {
        assert_eq!(
            inputs.len(),
            self.num_inputs as usize,
            "wrong number of inputs"
        );

        self.values[..inputs.len()].copy_from_slice(inputs);

        for i in 0..self.opcodes.len() {
            let op = self.opcodes[i];
            match op {
                OpCode::Input | OpCode::Const => continue,
                OpCode::Powi => {
                    let (a, _) = self.operands(i);
                    self.values[i] = opcode::eval_powi(self.values[a], self.powi_exp(i));
                }
                _ => {
                    let (a, b) = self.operands(i);
                    let va = self.values[a];
                    let vb = b.map_or_else(F::zero, |b| self.values[b]);
                    self.values[i] = opcode::eval_forward(op, va, vb);
                }
            }
        }
    }

    /// Forward sweep with tangent-carrying numbers. Reads opcodes and constants
    /// from `self`, writing results into `buf`. Does not mutate the tape.
    ///
    /// `inputs[i].eps` is the direction component for input `i`; afterwards
    /// `buf[k].eps` is the directional derivative of tape entry `k`.
    pub fn forward_tangent(&self, inputs: &[Dual<F>], buf: &mut Vec<Dual<F>>) {
        assert_eq!(
            inputs.len(),
            self.num_inputs as usize,
            "wrong number of inputs"
        );

        let n = self.num_variables as usize;
        buf.clear();
        buf.resize(n, Dual::constant(F::zero()));

        for i in 0..self.opcodes.len() {
            let op = self.opcodes[i];
            buf[i] = match op {
                OpCode::Input => inputs[i],
                OpCode::Const => Dual::constant(self.values[i]),
                OpCode::Powi => {
                    let (a, _) = self.operands(i);
                    opcode::eval_powi(buf[a], self.powi_exp(i))
                }
                _ => {
                    let (a, b) = self.operands(i);
                    let b_val = b.map_or_else(|| Dual::constant(F::zero()), |b| buf[b]);
                    opcode::eval_forward(op, buf[a], b_val)
                }
            };
        }
    }

    /// One directional derivative per column of `directions` (`n` rows each).
    ///
    /// Returns `(f(x), ẏ)` with `ẏ[c][j] = ∇f_c(x) · directions[·][j]`.
    pub fn forward_directions(&self, x: &[F], directions: &[Vec<F>]) -> (Vec<F>, Vec<Vec<F>>) {
        let m = self.output_indices.len();
        let mut values = vec![F::zero(); m];
        let mut tangents = vec![vec![F::zero(); directions.len()]; m];

        let mut inputs = Vec::with_capacity(x.len());
        let mut buf = Vec::new();
        for (col, dir) in directions.iter().enumerate() {
            assert_eq!(dir.len(), x.len(), "direction has wrong length");
            inputs.clear();
            inputs.extend(x.iter().zip(dir).map(|(&xi, &di)| Dual::new(xi, di)));
            self.forward_tangent(&inputs, &mut buf);
            for (row, &out) in self.output_indices.iter().enumerate() {
                values[row] = buf[out as usize].re;
                tangents[row][col] = buf[out as usize].eps;
            }
        }

        if directions.is_empty() {
            inputs.extend(x.iter().map(|&xi| Dual::constant(xi)));
            self.forward_tangent(&inputs, &mut buf);
            for (row, &out) in self.output_indices.iter().enumerate() {
                values[row] = buf[out as usize].re;
            }
        }

        (values, tangents)
    }
}
