//! Multi-threaded dense multiplication.
//!
//! [`matmul_parallel`] splits the output rows into one contiguous range per
//! worker, decided up front by [`row_partition`], and runs each range on its
//! own scoped thread. Workers share read-only `A` and `B` and each receives an
//! exclusive `&mut` sub-slice of `C`, so no locks or atomics are involved.
//! The call returns once every worker has been joined.
//!
//! [`matmul_rayon_rows`] is the work-stealing counterpart: every output row is
//! an independent rayon task.

use std::fmt;
use std::mem;
use std::ops::Range;
use std::str::FromStr;
use std::thread;

use log::debug;
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::dense::DenseMatrix;
use crate::error::{thread_error, validation_error, MatmulError, Result};
use crate::matmul::{check_operands, ikj_rows, naive, simd};

/// Per-worker kernel run by the parallel dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowKernel {
    /// Scalar i-k-j accumulation into rows of C.
    Plain,
    /// 4-lane SIMD i-k-j accumulation into rows of C.
    Simd,
}

impl RowKernel {
    #[inline(always)]
    fn run(self, a: &[f64], b: &[f64], c_rows: &mut [f64], row_begin: usize, n: usize) {
        match self {
            RowKernel::Plain => ikj_rows(a, b, c_rows, row_begin, n),
            RowKernel::Simd => simd::simd_rows(a, b, c_rows, row_begin, n),
        }
    }
}

impl fmt::Display for RowKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKernel::Plain => f.write_str("plain"),
            RowKernel::Simd => f.write_str("simd"),
        }
    }
}

impl FromStr for RowKernel {
    type Err = MatmulError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "basic" => Ok(RowKernel::Plain),
            "simd" => Ok(RowKernel::Simd),
            other => Err(validation_error(format!("unknown row kernel '{other}'"))),
        }
    }
}

/// Splits `0..n` into `threads` contiguous, non-overlapping ranges.
///
/// Every range gets `n / threads` rows and the first `n % threads` ranges get
/// one more, so sizes differ by at most one. When `threads > n` the trailing
/// ranges are empty. A `threads` of zero is treated as one.
pub fn row_partition(n: usize, threads: usize) -> Vec<Range<usize>> {
    let threads = threads.max(1);
    let rows_per_thread = n / threads;
    let extra = n % threads;

    let mut current_row = 0;
    (0..threads)
        .map(|t| {
            let start = current_row;
            let count = rows_per_thread + usize::from(t < extra);
            current_row = start + count;
            start..current_row
        })
        .collect()
}

/// Computes `C = A × B` on `threads` worker threads.
///
/// At most `n` workers are started, since a worker with no rows has nothing
/// to do. When that leaves one worker or fewer this delegates to the
/// single-threaded kernel chosen by `kernel` and spawns nothing, producing
/// bit-identical output. Otherwise C is zeroed once, the rows are partitioned
/// with [`row_partition`] and one worker per partition accumulates its rows.
/// Because each row is computed in the same order as the single-threaded
/// kernel, the result is identical for any thread count.
///
/// A worker that never finishes blocks this call; there is no timeout.
///
/// # Errors
///
/// Returns a dimension mismatch if the operands disagree and a thread error
/// if a worker cannot be started. Workers already running are joined before
/// the error is returned, and C is left partially computed.
pub fn matmul_parallel(
    a: &DenseMatrix,
    b: &DenseMatrix,
    c: &mut DenseMatrix,
    threads: usize,
    kernel: RowKernel,
) -> Result<()> {
    let n = check_operands(a, b, c)?;
    let workers = threads.min(n);

    if workers <= 1 {
        return match kernel {
            RowKernel::Plain => naive::matmul_naive(a, b, c, naive::LoopOrder::Ikj),
            RowKernel::Simd => simd::matmul_simd(a, b, c),
        };
    }

    let partitions = row_partition(n, workers);

    debug!(
        "parallel matmul: n={n}, threads={threads}, workers={workers}, kernel={kernel}, partitions={partitions:?}"
    );

    c.zero();

    let (a, b) = (a.as_slice(), b.as_slice());

    let mut rest = c.as_mut_slice();

    thread::scope(|scope| {
        for (worker, range) in partitions.into_iter().enumerate() {
            let (c_rows, tail) = mem::take(&mut rest).split_at_mut(range.len() * n);
            rest = tail;

            thread::Builder::new()
                .name(format!("matmul-worker-{worker}"))
                .spawn_scoped(scope, move || kernel.run(a, b, c_rows, range.start, n))
                .map_err(|e| thread_error(format!("worker {worker} of {workers}: {e}")))?;
        }
        Ok(())
    })
}

/// Computes `C = A × B` with one rayon task per output row.
///
/// Rows are scheduled by rayon's global pool rather than a fixed partition.
/// Each row uses scalar i-k-j accumulation.
pub fn matmul_rayon_rows(a: &DenseMatrix, b: &DenseMatrix, c: &mut DenseMatrix) -> Result<()> {
    let n = check_operands(a, b, c)?;

    debug!(
        "rayon row matmul: n={n}, pool threads={}",
        rayon::current_num_threads()
    );

    c.zero();

    let (a, b) = (a.as_slice(), b.as_slice());

    c.as_mut_slice()
        .par_chunks_mut(n)
        .enumerate()
        .for_each(|(i, c_row)| ikj_rows(a, b, c_row, i, n));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_sizes() {
        assert_eq!(row_partition(10, 3), vec![0..4, 4..7, 7..10]);
        assert_eq!(row_partition(8, 4), vec![0..2, 2..4, 4..6, 6..8]);
        assert_eq!(row_partition(2, 4), vec![0..1, 1..2, 2..2, 2..2]);
        assert_eq!(row_partition(5, 0), vec![0..5]);
    }

    #[test]
    fn test_partition_covers_range_exactly_once() {
        for n in 0..40 {
            for threads in 1..=n + 2 {
                let parts = row_partition(n, threads);
                assert_eq!(parts.len(), threads);

                let mut next = 0;
                for part in &parts {
                    assert_eq!(part.start, next, "n={n} threads={threads}");
                    next = part.end;
                }
                assert_eq!(next, n);

                let max = parts.iter().map(|p| p.len()).max().unwrap();
                let min = parts.iter().map(|p| p.len()).min().unwrap();
                assert!(max - min <= 1, "n={n} threads={threads}");
            }
        }
    }

    #[test]
    fn test_any_thread_count_matches_single_thread() {
        let n = 11;
        let a = DenseMatrix::random(n, 100).unwrap();
        let b = DenseMatrix::random(n, 101).unwrap();

        for kernel in [RowKernel::Plain, RowKernel::Simd] {
            let mut expected = DenseMatrix::new(n).unwrap();
            matmul_parallel(&a, &b, &mut expected, 1, kernel).unwrap();

            for threads in 2..=n + 3 {
                let mut c = DenseMatrix::new(n).unwrap();
                matmul_parallel(&a, &b, &mut c, threads, kernel).unwrap();
                assert_eq!(c, expected, "kernel={kernel} threads={threads}");
            }
        }
    }

    #[test]
    fn test_huge_thread_count_is_capped_at_n() {
        let n = 4;
        let a = DenseMatrix::random(n, 30).unwrap();
        let b = DenseMatrix::random(n, 31).unwrap();

        let mut expected = DenseMatrix::new(n).unwrap();
        naive::matmul_naive(&a, &b, &mut expected, naive::LoopOrder::Ikj).unwrap();

        for threads in [usize::MAX / 2, usize::MAX] {
            for kernel in [RowKernel::Plain, RowKernel::Simd] {
                let mut c = DenseMatrix::new(n).unwrap();
                matmul_parallel(&a, &b, &mut c, threads, kernel).unwrap();
                assert_eq!(c, expected, "kernel={kernel} threads={threads}");
            }
        }
    }

    #[test]
    fn test_single_row_never_spawns() {
        let a = DenseMatrix::from_vec(1, vec![3.0]).unwrap();
        let b = DenseMatrix::from_vec(1, vec![4.0]).unwrap();
        let mut c = DenseMatrix::new(1).unwrap();
        matmul_parallel(&a, &b, &mut c, 64, RowKernel::Simd).unwrap();
        assert_eq!(c.as_slice(), &[12.0]);
    }

    #[test]
    fn test_single_thread_delegates() {
        let a = DenseMatrix::random(5, 1).unwrap();
        let b = DenseMatrix::random(5, 2).unwrap();

        let mut naive_c = DenseMatrix::new(5).unwrap();
        naive::matmul_naive(&a, &b, &mut naive_c, naive::LoopOrder::Ikj).unwrap();

        let mut c = DenseMatrix::new(5).unwrap();
        matmul_parallel(&a, &b, &mut c, 1, RowKernel::Plain).unwrap();
        assert_eq!(c, naive_c);

        matmul_parallel(&a, &b, &mut c, 0, RowKernel::Simd).unwrap();
        assert_eq!(c, naive_c);
    }

    #[test]
    fn test_rayon_rows_matches_ikj() {
        let a = DenseMatrix::random(19, 5).unwrap();
        let b = DenseMatrix::random(19, 6).unwrap();

        let mut expected = DenseMatrix::new(19).unwrap();
        naive::matmul_naive(&a, &b, &mut expected, naive::LoopOrder::Ikj).unwrap();

        let mut c = DenseMatrix::new(19).unwrap();
        matmul_rayon_rows(&a, &b, &mut c).unwrap();
        assert_eq!(c, expected);
    }

    #[test]
    fn test_parallel_dimension_mismatch() {
        let a = DenseMatrix::new(4).unwrap();
        let b = DenseMatrix::new(4).unwrap();
        let mut c = DenseMatrix::new(5).unwrap();
        assert!(matmul_parallel(&a, &b, &mut c, 3, RowKernel::Plain).is_err());
    }

    #[test]
    fn test_row_kernel_parse() {
        assert_eq!("SIMD".parse::<RowKernel>().unwrap(), RowKernel::Simd);
        assert_eq!("plain".parse::<RowKernel>().unwrap(), RowKernel::Plain);
        assert!("gpu".parse::<RowKernel>().is_err());
    }
}
