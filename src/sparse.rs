//! Compressed sparse row (CSR) matrices and sparse kernels.
//!
//! A [`CsrMatrix`] stores the entries of a square matrix whose magnitude
//! exceeds a tolerance as three arrays:
//!
//! - `val`: the stored values in row-major scan order,
//! - `col_idx`: the column of each stored value,
//! - `row_ptr`: `n + 1` offsets, row `i` occupying `row_ptr[i]..row_ptr[i + 1]`.
//!
//! ```text
//! [ 5 0 0 ]      val     = [5, 1, 3, 2]
//! [ 0 0 0 ]  ->  col_idx = [0, 0, 1, 2]
//! [ 1 3 2 ]      row_ptr = [0, 1, 1, 4]
//! ```
//!
//! Invariants upheld by every constructor: `row_ptr[0] == 0`,
//! `row_ptr[n] == nnz`, `row_ptr` non-decreasing, columns strictly increasing
//! within each row, every column in `0..n`. An empty row has
//! `row_ptr[i] == row_ptr[i + 1]`.

use log::debug;
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::dense::DenseMatrix;
use crate::error::{ensure_dim, validation_error, Result};
use crate::utils::{try_alloc_exact, try_alloc_filled};

/// A square matrix in compressed sparse row form.
#[derive(Clone, Debug, PartialEq)]
pub struct CsrMatrix {
    n: usize,
    val: Vec<f64>,
    col_idx: Vec<usize>,
    row_ptr: Vec<usize>,
}

impl CsrMatrix {
    /// Converts a dense matrix, keeping entries with `|value| > tol`.
    ///
    /// A first pass counts the qualifying entries so that `val` and `col_idx`
    /// are allocated at their exact final size. A second, row-major pass
    /// records each row's start offset and appends its entries.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `tol` is negative or NaN and an
    /// allocation error if any of the three arrays cannot be obtained. Arrays
    /// already allocated when a later one fails are released.
    pub fn from_dense(a: &DenseMatrix, tol: f64) -> Result<Self> {
        if tol.is_nan() || tol < 0.0 {
            return Err(validation_error(format!(
                "tolerance must be a non-negative number, got {tol}"
            )));
        }

        let n = a.n();
        let nnz = a.as_slice().iter().filter(|v| v.abs() > tol).count();

        let mut val = try_alloc_exact(nnz, "CSR values")?;
        let mut col_idx = try_alloc_exact(nnz, "CSR column indices")?;
        let mut row_ptr = try_alloc_exact(n + 1, "CSR row pointers")?;

        for row in a.as_slice().chunks_exact(n) {
            row_ptr.push(val.len());
            for (j, &v) in row.iter().enumerate() {
                if v.abs() > tol {
                    val.push(v);
                    col_idx.push(j);
                }
            }
        }
        row_ptr.push(val.len());

        debug!(
            "dense to CSR: n={n}, tol={tol:e}, nnz={nnz}, density={:.6}",
            nnz as f64 / (n * n) as f64
        );

        Ok(CsrMatrix {
            n,
            val,
            col_idx,
            row_ptr,
        })
    }

    /// Assembles a CSR matrix from its three arrays, checking every
    /// structural invariant.
    pub fn from_raw_parts(
        n: usize,
        val: Vec<f64>,
        col_idx: Vec<usize>,
        row_ptr: Vec<usize>,
    ) -> Result<Self> {
        if n == 0 {
            return Err(validation_error("matrix dimension must be positive"));
        }
        let expected_len = n
            .checked_add(1)
            .ok_or_else(|| validation_error(format!("dimension {n} is too large")))?;
        if row_ptr.len() != expected_len {
            return Err(validation_error(format!(
                "row_ptr has {} entries, expected {expected_len}",
                row_ptr.len()
            )));
        }
        if val.len() != col_idx.len() {
            return Err(validation_error(format!(
                "val has {} entries but col_idx has {}",
                val.len(),
                col_idx.len()
            )));
        }
        if row_ptr[0] != 0 || row_ptr[n] != val.len() {
            return Err(validation_error(format!(
                "row_ptr must start at 0 and end at nnz = {}",
                val.len()
            )));
        }

        for (i, bounds) in row_ptr.windows(2).enumerate() {
            if bounds[0] > bounds[1] {
                return Err(validation_error(format!("row_ptr decreases at row {i}")));
            }
            if bounds[1] > col_idx.len() {
                return Err(validation_error(format!("row {i} ends past nnz")));
            }

            let cols = &col_idx[bounds[0]..bounds[1]];
            if cols.iter().any(|&j| j >= n) {
                return Err(validation_error(format!("row {i} has a column outside 0..{n}")));
            }
            if cols.windows(2).any(|w| w[0] >= w[1]) {
                return Err(validation_error(format!(
                    "row {i} columns are not strictly increasing"
                )));
            }
        }

        Ok(CsrMatrix {
            n,
            val,
            col_idx,
            row_ptr,
        })
    }

    #[inline(always)]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of stored entries.
    #[inline(always)]
    pub fn nnz(&self) -> usize {
        self.val.len()
    }

    /// Fraction of the `n * n` entries that are stored.
    pub fn density(&self) -> f64 {
        self.nnz() as f64 / (self.n as f64 * self.n as f64)
    }

    pub fn values(&self) -> &[f64] {
        &self.val
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_idx
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// The stored `(column, value)` pairs of row `i`, in column order.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.val[range].iter().copied())
    }

    /// Expands back into a dense matrix; unstored entries are zero.
    pub fn to_dense(&self) -> Result<DenseMatrix> {
        let mut m = DenseMatrix::new(self.n)?;
        for i in 0..self.n {
            let row = m.row_mut(i);
            for (j, v) in self.row(i) {
                row[j] = v;
            }
        }
        Ok(m)
    }

    /// Sparse matrix–vector product `y = A x`.
    pub fn mat_vec(&self, x: &[f64]) -> Result<Vec<f64>> {
        let mut y = try_alloc_filled(self.n, 0.0, "CSR mat-vec output")?;
        self.mat_vec_into(x, &mut y)?;
        Ok(y)
    }

    /// Sparse matrix–vector product written into `y`. Rows without stored
    /// entries produce `0.0`.
    pub fn mat_vec_into(&self, x: &[f64], y: &mut [f64]) -> Result<()> {
        ensure_dim("x", self.n, x.len())?;
        ensure_dim("y", self.n, y.len())?;

        for (y_i, bounds) in y.iter_mut().zip(self.row_ptr.windows(2)) {
            let (start, end) = (bounds[0], bounds[1]);
            let mut sum = 0.0;
            for (&a, &j) in self.val[start..end].iter().zip(&self.col_idx[start..end]) {
                sum += a * x[j];
            }
            *y_i = sum;
        }

        Ok(())
    }

    /// Sparse × dense product `C = A × B`.
    ///
    /// C is zeroed, then every stored `A[i, k]` adds `A[i, k] * B[k, ..]` to
    /// row `i` of C. This is the i-k-j dense kernel restricted to the stored
    /// entries of A.
    pub fn matmul_dense(&self, b: &DenseMatrix, c: &mut DenseMatrix) -> Result<()> {
        let n = self.n;
        ensure_dim("B", n, b.n())?;
        ensure_dim("C", n, c.n())?;

        c.zero();

        let b = b.as_slice();
        for (i, c_row) in c.as_mut_slice().chunks_exact_mut(n).enumerate() {
            self.accumulate_row(i, b, c_row);
        }

        Ok(())
    }

    /// Row-parallel [`CsrMatrix::matmul_dense`] on rayon's global pool.
    /// Produces exactly the same result.
    pub fn par_matmul_dense(&self, b: &DenseMatrix, c: &mut DenseMatrix) -> Result<()> {
        let n = self.n;
        ensure_dim("B", n, b.n())?;
        ensure_dim("C", n, c.n())?;

        c.zero();

        let b = b.as_slice();
        c.as_mut_slice()
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, c_row)| self.accumulate_row(i, b, c_row));

        Ok(())
    }

    #[inline(always)]
    fn accumulate_row(&self, i: usize, b: &[f64], c_row: &mut [f64]) {
        let n = self.n;
        for (k, a) in self.row(i) {
            let b_row = &b[k * n..(k + 1) * n];
            for (c_ij, &b_kj) in c_row.iter_mut().zip(b_row) {
                *c_ij += a * b_kj;
            }
        }
    }
}

/// Converts `a` to CSR, keeping entries with `|value| > tol`.
/// See [`CsrMatrix::from_dense`].
pub fn dense_to_csr(a: &DenseMatrix, tol: f64) -> Result<CsrMatrix> {
    CsrMatrix::from_dense(a, tol)
}

/// `y = A x` for a CSR `A`. See [`CsrMatrix::mat_vec`].
pub fn csr_mat_vec(a: &CsrMatrix, x: &[f64]) -> Result<Vec<f64>> {
    a.mat_vec(x)
}

/// `C = A × B` for a CSR `A` and dense `B`. See [`CsrMatrix::matmul_dense`].
pub fn csr_matmul_dense(a: &CsrMatrix, b: &DenseMatrix, c: &mut DenseMatrix) -> Result<()> {
    a.matmul_dense(b, c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatmulError;

    #[test]
    fn test_small_conversion() {
        let a = DenseMatrix::from_rows(&[[5.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 3.0, 2.0]])
            .unwrap();
        let csr = CsrMatrix::from_dense(&a, 0.0).unwrap();

        assert_eq!(csr.nnz(), 4);
        assert_eq!(csr.values(), &[5.0, 1.0, 3.0, 2.0]);
        assert_eq!(csr.col_indices(), &[0, 0, 1, 2]);
        assert_eq!(csr.row_ptr(), &[0, 1, 1, 4]);
        assert_eq!(csr.row(1).count(), 0);
        assert_eq!(csr.to_dense().unwrap(), a);
    }

    #[test]
    fn test_tolerance_drops_small_entries() {
        let a = DenseMatrix::from_rows(&[[1e-13, -0.5], [-1e-3, 0.0]]).unwrap();
        let csr = CsrMatrix::from_dense(&a, 1e-12).unwrap();
        assert_eq!(csr.values(), &[-0.5, -1e-3]);
        assert_eq!(csr.col_indices(), &[1, 0]);

        let coarse = CsrMatrix::from_dense(&a, 1e-2).unwrap();
        assert_eq!(coarse.values(), &[-0.5]);
        assert_eq!(coarse.row_ptr(), &[0, 1, 1]);
    }

    #[test]
    fn test_invalid_tolerance() {
        let a = DenseMatrix::new(2).unwrap();
        assert!(CsrMatrix::from_dense(&a, -1.0).is_err());
        assert!(CsrMatrix::from_dense(&a, f64::NAN).is_err());
    }

    #[test]
    fn test_mat_vec_with_empty_row() {
        let a = DenseMatrix::from_rows(&[[1.0, 2.0], [0.0, 0.0]]).unwrap();
        let csr = CsrMatrix::from_dense(&a, 0.0).unwrap();
        assert_eq!(csr.mat_vec(&[3.0, 4.0]).unwrap(), vec![11.0, 0.0]);
    }

    #[test]
    fn test_mat_vec_length_checked() {
        let csr = CsrMatrix::from_dense(&DenseMatrix::identity(3).unwrap(), 0.0).unwrap();
        assert_eq!(
            csr.mat_vec(&[1.0, 2.0]),
            Err(MatmulError::DimensionMismatch {
                operand: "x",
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_matmul_dense_two_by_two() {
        let a = DenseMatrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let b = DenseMatrix::from_rows(&[[5.0, 6.0], [7.0, 8.0]]).unwrap();
        let csr = CsrMatrix::from_dense(&a, 1e-12).unwrap();

        let mut c = DenseMatrix::from_vec(2, vec![9.0; 4]).unwrap();
        csr.matmul_dense(&b, &mut c).unwrap();
        assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);

        let mut c_par = DenseMatrix::new(2).unwrap();
        csr.par_matmul_dense(&b, &mut c_par).unwrap();
        assert_eq!(c_par, c);
    }

    #[test]
    fn test_from_raw_parts_validation() {
        assert!(CsrMatrix::from_raw_parts(2, vec![1.0], vec![1], vec![0, 1, 1]).is_ok());
        // wrong row_ptr length
        assert!(CsrMatrix::from_raw_parts(2, vec![1.0], vec![1], vec![0, 1]).is_err());
        // does not end at nnz
        assert!(CsrMatrix::from_raw_parts(2, vec![1.0], vec![1], vec![0, 1, 2]).is_err());
        // decreasing
        assert!(
            CsrMatrix::from_raw_parts(2, vec![1.0, 2.0], vec![0, 1], vec![0, 2, 1]).is_err()
        );
        // column out of range
        assert!(CsrMatrix::from_raw_parts(2, vec![1.0], vec![2], vec![0, 1, 1]).is_err());
        // interior offset past nnz
        assert!(CsrMatrix::from_raw_parts(2, vec![1.0], vec![0], vec![0, 5, 1]).is_err());
        // duplicate column in a row
        assert!(
            CsrMatrix::from_raw_parts(2, vec![1.0, 2.0], vec![1, 1], vec![0, 2, 2]).is_err()
        );
        // dimension with no representable row_ptr length
        assert!(matches!(
            CsrMatrix::from_raw_parts(usize::MAX, vec![], vec![], vec![]),
            Err(MatmulError::ValidationError { .. })
        ));
        // mismatched array lengths
        assert!(CsrMatrix::from_raw_parts(2, vec![1.0, 2.0], vec![1], vec![0, 1, 1]).is_err());
    }
}
