use ndarray::{Array2, Array3, ArrayView2};

use crate::float::Float;
use crate::jet::MonomialTable;
use crate::opcode::OpCode;

impl<F: Float> super::BytecodeTape<F> {
    /// Propagate one jet per input through the tape and return the jets of
    /// the outputs.
    fn jet_sweep(&self, table: &MonomialTable, inputs: Vec<Vec<F>>) -> Vec<Vec<F>> {
        let mut jets: Vec<Vec<F>> = Vec::with_capacity(self.opcodes.len());
        jets.extend(inputs);

        for i in jets.len()..self.opcodes.len() {
            let op = self.opcodes[i];
            let jet = match op {
                OpCode::Input => unreachable!("inputs precede all other tape entries"),
                OpCode::Const => table.constant(self.values[i]),
                OpCode::Powi => {
                    let (a, _) = self.operands(i);
                    table.powi(&jets[a], self.powi_exp(i))
                }
                _ => match self.operands(i) {
                    (a, Some(b)) => table.binary(op, &jets[a], &jets[b]),
                    (a, None) => table.unary(op, &jets[a]),
                },
            };
            jets.push(jet);
        }

        self.output_indices
            .iter()
            .map(|&out| jets[out as usize].clone())
            .collect()
    }

    /// All derivatives up to `degree` of `t ↦ f(x + S t)` at `t = 0`, where
    /// `S = seed` is `n × k`.
    ///
    /// Returns an `m × C(k + degree, degree)` matrix: row `c` is output `c`,
    /// column `r` is the derivative whose canonical multiset has rank `r`
    /// (so column `address - 1` for a tensor address). Column 0 holds `f(x)`.
    ///
    /// Entries are derivatives, not Taylor coefficients. The tape is not mutated.
    pub fn tensor_eval(&self, degree: usize, x: &[F], seed: ArrayView2<F>) -> Array2<F> {
        let n = self.num_inputs as usize;
        assert_eq!(x.len(), n, "wrong number of inputs");
        assert_eq!(seed.nrows(), n, "seed matrix must have one row per input");

        let table = MonomialTable::new(seed.ncols(), degree);
        let inputs = x
            .iter()
            .zip(seed.rows())
            .map(|(&xi, row)| table.affine(xi, &row.to_vec()))
            .collect();
        let outputs = self.jet_sweep(&table, inputs);

        let mut result = Array2::zeros((outputs.len(), table.len()));
        for (mut row, jet) in result.rows_mut().into_iter().zip(&outputs) {
            for (slot, (r, &coeff)) in row.iter_mut().zip(jet).enumerate() {
                *r = coeff * F::from_count(table.factorial(slot));
            }
        }
        result
    }

    /// Univariate Taylor coefficients of `t ↦ f(x + t v)` for each direction `v`.
    ///
    /// `directions` holds `p` vectors of length `n`. Returns `(f(x), coeffs)`
    /// with `coeffs[[c, j, k - 1]]` the degree-`k` coefficient of output `c`
    /// along direction `j`, for `k = 1..=degree`.
    pub fn hov_forward(
        &self,
        degree: usize,
        x: &[F],
        directions: &[Vec<F>],
    ) -> (Vec<F>, Array3<F>) {
        let n = self.num_inputs as usize;
        assert_eq!(x.len(), n, "wrong number of inputs");
        let m = self.output_indices.len();

        let table = MonomialTable::new(1, degree);
        let mut coeffs = Array3::zeros((m, directions.len(), degree));
        let mut values: Vec<F> = Vec::new();

        if directions.is_empty() {
            let inputs = x.iter().map(|&xi| table.constant(xi)).collect();
            values = self
                .jet_sweep(&table, inputs)
                .iter()
                .map(|jet| jet[0])
                .collect();
        }

        for (j, dir) in directions.iter().enumerate() {
            assert_eq!(dir.len(), n, "direction has wrong length");
            let inputs = x
                .iter()
                .zip(dir)
                .map(|(&xi, &di)| table.affine(xi, &[di]))
                .collect();
            let outputs = self.jet_sweep(&table, inputs);
            values = outputs.iter().map(|jet| jet[0]).collect();
            for (c, jet) in outputs.iter().enumerate() {
                for k in 1..=degree {
                    coeffs[[c, j, k - 1]] = jet[k];
                }
            }
        }

        (values, coeffs)
    }
}
