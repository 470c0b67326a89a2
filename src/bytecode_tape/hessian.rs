use crate::dual::Dual;
use crate::float::Float;

impl<F: Float> super::BytecodeTape<F> {
    /// Dense Hessian of output `component` via forward-over-reverse.
    ///
    /// One tangent forward sweep plus one tangent reverse sweep per input
    /// direction: seeding input `j` gives column `j` of `∇²f_c` in the tangent
    /// parts of the input adjoints. Returns `H[i][j] = ∂²f_c/∂x_i∂x_j`.
    ///
    /// The tape is not mutated.
    pub fn hessian_component(&self, x: &[F], component: usize) -> Vec<Vec<F>> {
        let n = self.num_inputs as usize;
        assert_eq!(x.len(), n, "wrong number of inputs");
        let out_idx = self.output_indices[component] as usize;

        let mut hess = vec![vec![F::zero(); n]; n];
        let mut dual_inputs: Vec<Dual<F>> = Vec::with_capacity(n);
        let mut dual_vals = Vec::new();
        let mut adjoints: Vec<Dual<F>> = Vec::new();

        for col in 0..n {
            dual_inputs.clear();
            dual_inputs.extend(
                (0..n).map(|i| Dual::new(x[i], if i == col { F::one() } else { F::zero() })),
            );
            self.forward_tangent(&dual_inputs, &mut dual_vals);

            adjoints.clear();
            adjoints.resize(self.num_variables as usize, Dual::constant(F::zero()));
            adjoints[out_idx] = Dual::constant(F::one());
            self.reverse_sweep_core(&mut adjoints, &dual_vals);

            for (row, adj) in hess.iter_mut().zip(&adjoints[..n]) {
                row[col] = adj.eps;
            }
        }

        hess
    }
}
