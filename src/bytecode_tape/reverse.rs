use crate::float::{Elementary, Float};
use crate::opcode::{self, OpCode};

impl<F: Float> super::BytecodeTape<F> {
    /// Core reverse sweep loop shared by every adjoint variant.
    ///
    /// Expects `adjoints` pre-seeded by the caller (length = `num_variables`)
    /// and reads primal values from `values`, which is either `self.values`
    /// (`T = F`) or a tangent buffer from
    /// [`forward_tangent`](Self::forward_tangent) (`T = Dual<F>`, giving
    /// forward-over-reverse).
    pub(crate) fn reverse_sweep_core<T: Elementary>(&self, adjoints: &mut [T], values: &[T]) {
        for i in (0..self.opcodes.len()).rev() {
            let adj = adjoints[i];
            if adj.is_zero() {
                continue;
            }

            let op = self.opcodes[i];
            match op {
                OpCode::Input | OpCode::Const => continue,
                OpCode::Powi => {
                    adjoints[i] = T::zero();
                    let (a, _) = self.operands(i);
                    let da = opcode::powi_partial(values[a], self.powi_exp(i));
                    adjoints[a] = adjoints[a] + da * adj;
                }
                _ => {
                    adjoints[i] = T::zero();
                    let (a, b) = self.operands(i);
                    let vb = b.map_or_else(T::zero, |b| values[b]);
                    let (da, db) = opcode::reverse_partials(op, values[a], vb, values[i]);
                    adjoints[a] = adjoints[a] + da * adj;
                    if let Some(b) = b {
                        adjoints[b] = adjoints[b] + db * adj;
                    }
                }
            }
        }
    }

    /// Reverse sweep with weighted seeds for multiple outputs.
    ///
    /// Computes `∑_c weights[c] * ∂f_c/∂x`: a vector-Jacobian product at the
    /// point of the last [`forward`](Self::forward).
    ///
    /// Returns the adjoints of the inputs (length [`num_inputs`](Self::num_inputs)).
    pub fn reverse_seeded(&self, weights: &[F]) -> Vec<F> {
        assert_eq!(
            weights.len(),
            self.output_indices.len(),
            "weights length must match number of outputs"
        );

        let mut adjoints = vec![F::zero(); self.num_variables as usize];
        for (&out_idx, &weight) in self.output_indices.iter().zip(weights) {
            adjoints[out_idx as usize] = adjoints[out_idx as usize] + weight;
        }

        self.reverse_sweep_core(&mut adjoints, &self.values);
        adjoints.truncate(self.num_inputs as usize);
        adjoints
    }

    /// Forward + reverse: compute the gradient of output `component` at new inputs.
    pub fn gradient(&mut self, inputs: &[F], component: usize) -> Vec<F> {
        self.forward(inputs);
        let mut weights = vec![F::zero(); self.output_indices.len()];
        weights[component] = F::one();
        self.reverse_seeded(&weights)
    }
}
