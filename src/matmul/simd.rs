//! SIMD multiplication in i-k-j order.
//!
//! For each `(i, k)` the scalar `A[i, k]` is broadcast to every lane and the
//! row `C[i, ..] += A[i, k] * B[k, ..]` is updated four columns at a time.
//! The last `n % 4` columns are finished with scalar code, so every column is
//! touched exactly once. Lanes perform a separate multiply and add, matching
//! the scalar i-k-j kernel bit for bit.

use log::debug;

use crate::dense::DenseMatrix;
use crate::error::Result;
use crate::matmul::check_operands;
use crate::simd::fallback;
use crate::simd::SimdLanes;

/// Computes `C = A × B` using 4-lane vectors for the innermost loop.
///
/// Uses AVX when it was detected at build time and is present at run time,
/// and the portable lane type otherwise.
pub fn matmul_simd(a: &DenseMatrix, b: &DenseMatrix, c: &mut DenseMatrix) -> Result<()> {
    let n = check_operands(a, b, c)?;

    debug!("simd matmul: n={n}, backend={}", crate::simd::backend());

    c.zero();
    simd_rows(a.as_slice(), b.as_slice(), c.as_mut_slice(), 0, n);

    Ok(())
}

/// Accumulates rows `row_begin..` of `A × B` into `c_rows` with the best
/// available lane type. Shared with the parallel dispatcher.
#[inline]
pub(crate) fn simd_rows(a: &[f64], b: &[f64], c_rows: &mut [f64], row_begin: usize, n: usize) {
    #[cfg(all(avx2, any(target_arch = "x86", target_arch = "x86_64")))]
    {
        if is_x86_feature_detected!("avx") {
            // SAFETY: AVX support was just confirmed.
            unsafe { simd_rows_avx(a, b, c_rows, row_begin, n) };
            return;
        }
    }

    // SAFETY: the portable lane type has no CPU requirements.
    unsafe { accumulate_rows::<fallback::F64x4>(a, b, c_rows, row_begin, n) };
}

#[cfg(all(avx2, any(target_arch = "x86", target_arch = "x86_64")))]
#[target_feature(enable = "avx")]
unsafe fn simd_rows_avx(a: &[f64], b: &[f64], c_rows: &mut [f64], row_begin: usize, n: usize) {
    use crate::simd::avx2::f64x4::F64x4;

    unsafe { accumulate_rows::<F64x4>(a, b, c_rows, row_begin, n) };
}

/// i-k-j accumulation with `V::LANES` columns per step and a scalar tail.
///
/// # Safety
///
/// The CPU must support the instruction set `V` uses.
#[inline(always)]
unsafe fn accumulate_rows<V: SimdLanes>(
    a: &[f64],
    b: &[f64],
    c_rows: &mut [f64],
    row_begin: usize,
    n: usize,
) {
    let split = n - n % V::LANES;

    for (local_i, c_row) in c_rows.chunks_exact_mut(n).enumerate() {
        let i = row_begin + local_i;
        let a_row = &a[i * n..(i + 1) * n];

        for (k, &aik) in a_row.iter().enumerate() {
            let b_row = &b[k * n..(k + 1) * n];
            let (b_body, b_tail) = b_row.split_at(split);
            let (c_body, c_tail) = c_row.split_at_mut(split);

            let a_vec = unsafe { V::splat(aik) };

            for (c_chunk, b_chunk) in c_body
                .chunks_exact_mut(V::LANES)
                .zip(b_body.chunks_exact(V::LANES))
            {
                unsafe {
                    let sum = V::load(c_chunk) + a_vec * V::load(b_chunk);
                    sum.store(c_chunk);
                }
            }

            for (c_ij, &b_kj) in c_tail.iter_mut().zip(b_tail) {
                *c_ij += aik * b_kj;
            }
        }
    }
}
