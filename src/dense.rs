//! Square, row-major dense matrices.
//!
//! A [`DenseMatrix`] owns a contiguous buffer of `n * n` `f64` values. Element
//! `(i, j)` lives at offset `i * n + j`. The buffer is released when the
//! matrix is dropped.

use std::fmt;
use std::ops::{Index, IndexMut};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{validation_error, Result};
use crate::utils::{square_len, try_alloc_filled};

/// A square `n`×`n` matrix of `f64` stored in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// Allocates an `n`×`n` matrix with every entry set to zero.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `n == 0` and an allocation error if the
    /// buffer cannot be obtained.
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(validation_error("matrix dimension must be positive"));
        }

        let len = square_len(n)?;
        let data = try_alloc_filled(len, 0.0, "dense matrix")?;

        Ok(DenseMatrix { n, data })
    }

    /// Wraps an existing row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless `n > 0` and `data.len() == n * n`.
    pub fn from_vec(n: usize, data: Vec<f64>) -> Result<Self> {
        if n == 0 {
            return Err(validation_error("matrix dimension must be positive"));
        }
        let len = square_len(n)?;
        if data.len() != len {
            return Err(validation_error(format!(
                "buffer holds {} values, a {n}x{n} matrix needs {len}",
                data.len()
            )));
        }

        Ok(DenseMatrix { n, data })
    }

    /// Builds a matrix from a slice of rows. Every row must have exactly as
    /// many entries as there are rows.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let n = rows.len();
        let mut m = Self::new(n)?;

        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n {
                return Err(validation_error(format!(
                    "row {i} has {} entries, expected {n}",
                    row.len()
                )));
            }
            m.row_mut(i).copy_from_slice(row);
        }

        Ok(m)
    }

    /// The `n`×`n` identity matrix.
    pub fn identity(n: usize) -> Result<Self> {
        let mut m = Self::new(n)?;
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        Ok(m)
    }

    /// A matrix filled with uniform values in `[0, 1)` from a generator
    /// seeded with `seed`. The same seed always yields the same matrix.
    pub fn random(n: usize, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut m = Self::new(n)?;
        m.fill_random(&mut rng);
        Ok(m)
    }

    /// Like [`DenseMatrix::random`] but each entry is nonzero only with
    /// probability `density`.
    pub fn random_with_density(n: usize, density: f64, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut m = Self::new(n)?;
        m.fill_random_with_density(&mut rng, density)?;
        Ok(m)
    }

    /// Dimension of the matrix.
    #[inline(always)]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Row `i` as a slice of `n` values.
    #[inline(always)]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    #[inline(always)]
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let n = self.n;
        &mut self.data[i * n..(i + 1) * n]
    }

    /// Reads entry `(i, j)`. Bounds are the caller's responsibility and are
    /// only checked in debug builds beyond the buffer's own bounds check.
    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.n && j < self.n);
        self.data[i * self.n + j]
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        debug_assert!(i < self.n && j < self.n);
        self.data[i * self.n + j] = value;
    }

    /// Sets every entry to zero.
    #[inline]
    pub fn zero(&mut self) {
        self.data.fill(0.0);
    }

    /// Fills the matrix with uniform values in `[0, 1)` drawn from `rng`.
    pub fn fill_random<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for x in self.data.iter_mut() {
            *x = rng.random::<f64>();
        }
    }

    /// Fills the matrix so that each entry is a uniform value in `[0, 1)`
    /// with probability `density` and exactly `0.0` otherwise.
    ///
    /// The uniform draw itself may produce zero, so `density` is a target
    /// rather than a guarantee.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `density` is not in `[0, 1]`.
    pub fn fill_random_with_density<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        density: f64,
    ) -> Result<()> {
        if !(0.0..=1.0).contains(&density) {
            return Err(validation_error(format!(
                "density must lie in [0, 1], got {density}"
            )));
        }

        for x in self.data.iter_mut() {
            let r = rng.random::<f64>();
            *x = if r < density { rng.random::<f64>() } else { 0.0 };
        }

        Ok(())
    }

    /// Returns the transpose as a newly allocated matrix.
    pub fn transpose(&self) -> Result<DenseMatrix> {
        let n = self.n;
        let mut t = DenseMatrix::new(n)?;

        for (i, row) in self.data.chunks_exact(n).enumerate() {
            for (j, &value) in row.iter().enumerate() {
                t.data[j * n + i] = value;
            }
        }

        Ok(t)
    }

    /// Largest absolute difference between corresponding entries, or `None`
    /// if the dimensions differ.
    pub fn max_abs_diff(&self, other: &DenseMatrix) -> Option<f64> {
        if self.n != other.n {
            return None;
        }

        Some(
            self.data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max),
        )
    }

    /// `true` iff both matrices have the same dimension and every pair of
    /// corresponding entries differs by at most `tol`.
    pub fn approx_eq(&self, other: &DenseMatrix, tol: f64) -> bool {
        self.n == other.n
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| (a - b).abs() <= tol)
    }

    /// Number of entries that are not exactly zero.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&x| x != 0.0).count()
    }
}

/// Allocates a zeroed `n`×`n` matrix. See [`DenseMatrix::new`].
pub fn allocate(n: usize) -> Result<DenseMatrix> {
    DenseMatrix::new(n)
}

impl Index<(usize, usize)> for DenseMatrix {
    type Output = f64;

    #[inline(always)]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        debug_assert!(i < self.n && j < self.n);
        &self.data[i * self.n + j]
    }
}

impl IndexMut<(usize, usize)> for DenseMatrix {
    #[inline(always)]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        debug_assert!(i < self.n && j < self.n);
        &mut self.data[i * self.n + j]
    }
}

impl fmt::Display for DenseMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks_exact(self.n) {
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, "\t")?;
                }
                write!(f, "{value}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatmulError;

    #[test]
    fn test_new_is_zeroed() {
        let m = DenseMatrix::new(3).unwrap();
        assert_eq!(m.n(), 3);
        assert_eq!(m.as_slice().len(), 9);
        assert!(m.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(allocate(0).is_err());
        assert!(matches!(
            DenseMatrix::new(0),
            Err(MatmulError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_from_vec_length_checked() {
        assert!(DenseMatrix::from_vec(2, vec![1.0, 2.0, 3.0, 4.0]).is_ok());
        assert!(DenseMatrix::from_vec(2, vec![1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        let rows: [&[f64]; 2] = [&[1.0, 2.0], &[3.0]];
        assert!(DenseMatrix::from_rows(&rows).is_err());
    }

    #[test]
    fn test_row_major_layout() {
        let m = DenseMatrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(m.get(0, 1), 2.0);
        assert_eq!(m[(1, 0)], 3.0);
        assert_eq!(m.row(1), &[3.0, 4.0]);
    }

    #[test]
    fn test_set_and_zero() {
        let mut m = DenseMatrix::new(2).unwrap();
        m.set(1, 1, 5.0);
        m[(0, 1)] = 2.0;
        assert_eq!(m.as_slice(), &[0.0, 2.0, 0.0, 5.0]);
        m.zero();
        assert_eq!(m.count_nonzero(), 0);
    }

    #[test]
    fn test_transpose() {
        let m = DenseMatrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]])
            .unwrap();
        let t = m.transpose().unwrap();
        assert_eq!(
            t.as_slice(),
            &[1.0, 4.0, 7.0, 2.0, 5.0, 8.0, 3.0, 6.0, 9.0]
        );
        assert_eq!(t.transpose().unwrap(), m);
    }

    #[test]
    fn test_random_is_deterministic() {
        let a = DenseMatrix::random(16, 42).unwrap();
        let b = DenseMatrix::random(16, 42).unwrap();
        let c = DenseMatrix::random(16, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.as_slice().iter().all(|&x| (0.0..1.0).contains(&x)));
    }

    #[test]
    fn test_density_zero_gives_zero_matrix() {
        let m = DenseMatrix::random_with_density(8, 0.0, 1).unwrap();
        assert_eq!(m.count_nonzero(), 0);
    }

    #[test]
    fn test_density_out_of_range_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut m = DenseMatrix::new(2).unwrap();
        assert!(m.fill_random_with_density(&mut rng, 1.5).is_err());
        assert!(m.fill_random_with_density(&mut rng, -0.1).is_err());
        assert!(m.fill_random_with_density(&mut rng, f64::NAN).is_err());
    }

    #[test]
    fn test_approx_eq() {
        let a = DenseMatrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let mut b = a.clone();
        b[(1, 1)] += 1e-10;
        assert!(a.approx_eq(&b, 1e-8));
        b[(0, 0)] += 1e-3;
        assert!(!a.approx_eq(&b, 1e-8));
        assert!((a.max_abs_diff(&b).unwrap() - 1e-3).abs() < 1e-12);

        let other = DenseMatrix::new(3).unwrap();
        assert!(!a.approx_eq(&other, 1.0));
        assert!(a.max_abs_diff(&other).is_none());
    }

    #[test]
    fn test_display() {
        let m = DenseMatrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert_eq!(format!("{m}"), "1\t2\n3\t4\n");
    }
}
