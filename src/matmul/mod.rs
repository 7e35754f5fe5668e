//! Dense matrix multiplication kernels, `C = A × B`.
//!
//! Every kernel takes two square operands of the same dimension and fully
//! overwrites a caller-owned output of that dimension: the output is zeroed
//! first and then accumulated into, so stale contents never leak into the
//! result. Operand dimensions are checked before any work is done.
//!
//! | Kernel | Function |
//! |---|---|
//! | naive, three loop orders | [`naive::matmul_naive`] |
//! | cache-blocked over a transposed B | [`blocked::matmul_blocked`] |
//! | 4-lane SIMD, i-k-j order | [`simd::matmul_simd`] |
//! | fixed row partition over worker threads | [`crate::parallel::matmul_parallel`] |
//! | rayon row-parallel | [`crate::parallel::matmul_rayon_rows`] |
//!
//! All kernels agree with each other to within floating-point summation-order
//! tolerance ([`crate::VERIFY_TOLERANCE`]). The i-k-j family (naive i-k-j,
//! SIMD, both parallel variants) performs the same operations in the same
//! order and agrees bit for bit.

use std::fmt;

use crate::dense::DenseMatrix;
use crate::error::{ensure_dim, Result};
use crate::parallel::{self, RowKernel};

pub mod blocked;
pub mod naive;
pub mod simd;

pub use blocked::matmul_blocked;
pub use naive::{matmul_naive, LoopOrder};
pub use simd::matmul_simd;

/// A multiplication strategy, as selected by the benchmark harness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Naive(LoopOrder),
    Blocked { block_size: usize },
    Simd,
    Parallel { threads: usize, kernel: RowKernel },
    RayonRows,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Naive(order) => write!(f, "naive_{order}"),
            Strategy::Blocked { block_size } => write!(f, "blocked_{block_size}"),
            Strategy::Simd => write!(f, "simd"),
            Strategy::Parallel { threads, kernel } => write!(f, "parallel_{kernel}_{threads}"),
            Strategy::RayonRows => write!(f, "rayon_rows"),
        }
    }
}

/// Computes `C = A × B` with the chosen strategy.
pub fn multiply(
    a: &DenseMatrix,
    b: &DenseMatrix,
    c: &mut DenseMatrix,
    strategy: Strategy,
) -> Result<()> {
    match strategy {
        Strategy::Naive(order) => naive::matmul_naive(a, b, c, order),
        Strategy::Blocked { block_size } => blocked::matmul_blocked(a, b, c, block_size),
        Strategy::Simd => simd::matmul_simd(a, b, c),
        Strategy::Parallel { threads, kernel } => parallel::matmul_parallel(a, b, c, threads, kernel),
        Strategy::RayonRows => parallel::matmul_rayon_rows(a, b, c),
    }
}

/// Checks that `b` and `c` share `a`'s dimension and returns it.
#[inline]
pub(crate) fn check_operands(a: &DenseMatrix, b: &DenseMatrix, c: &DenseMatrix) -> Result<usize> {
    let n = a.n();
    ensure_dim("B", n, b.n())?;
    ensure_dim("C", n, c.n())?;
    Ok(n)
}

/// Accumulates rows `row_begin..row_begin + c_rows.len() / n` of `A × B` into
/// `c_rows` in i-k-j order. `c_rows` must already hold the starting values
/// (normally zero).
///
/// This is the per-worker body shared by the plain i-k-j kernel and the
/// parallel dispatchers.
#[inline]
pub(crate) fn ikj_rows(a: &[f64], b: &[f64], c_rows: &mut [f64], row_begin: usize, n: usize) {
    for (local_i, c_row) in c_rows.chunks_exact_mut(n).enumerate() {
        let i = row_begin + local_i;
        let a_row = &a[i * n..(i + 1) * n];

        for (k, &aik) in a_row.iter().enumerate() {
            let b_row = &b[k * n..(k + 1) * n];
            for (c_ij, &b_kj) in c_row.iter_mut().zip(b_row) {
                *c_ij += aik * b_kj;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatmulError;

    fn two_by_two() -> (DenseMatrix, DenseMatrix) {
        (
            DenseMatrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap(),
            DenseMatrix::from_rows(&[[5.0, 6.0], [7.0, 8.0]]).unwrap(),
        )
    }

    #[test]
    fn test_every_strategy_on_two_by_two() {
        let (a, b) = two_by_two();
        let strategies = [
            Strategy::Naive(LoopOrder::Ijk),
            Strategy::Naive(LoopOrder::Ikj),
            Strategy::Naive(LoopOrder::Jik),
            Strategy::Blocked { block_size: 1 },
            Strategy::Blocked { block_size: 32 },
            Strategy::Simd,
            Strategy::Parallel { threads: 2, kernel: RowKernel::Plain },
            Strategy::Parallel { threads: 2, kernel: RowKernel::Simd },
            Strategy::RayonRows,
        ];

        for strategy in strategies {
            let mut c = DenseMatrix::new(2).unwrap();
            c.as_mut_slice().fill(f64::NAN);
            multiply(&a, &b, &mut c, strategy).unwrap();
            assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0], "strategy {strategy}");
        }
    }

    #[test]
    fn test_mismatched_output_is_rejected() {
        let (a, b) = two_by_two();
        let mut c = DenseMatrix::new(3).unwrap();
        let err = multiply(&a, &b, &mut c, Strategy::Simd).unwrap_err();
        assert_eq!(
            err,
            MatmulError::DimensionMismatch {
                operand: "C",
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::Naive(LoopOrder::Jik).to_string(), "naive_jik");
        assert_eq!(Strategy::Blocked { block_size: 16 }.to_string(), "blocked_16");
        assert_eq!(
            Strategy::Parallel { threads: 4, kernel: RowKernel::Simd }.to_string(),
            "parallel_simd_4"
        );
    }
}
