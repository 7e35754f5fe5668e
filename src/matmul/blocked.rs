//! Cache-blocked multiplication over a transposed copy of B.
//!
//! B is transposed into a scratch matrix `BT` so that every inner dot product
//! reads a row of A and a row of `BT`, both contiguous. The `i`/`j`/`k` index
//! space is then walked in `block`×`block`×`block` tiles. Tiles on the last
//! row, column or contraction step are clamped to `n` when `block` does not
//! divide `n`.
//!
//! Each `C[i, j]` is read back at the start of every `k` tile and written at
//! the end, so partial sums carry across tiles. C is zeroed once before the
//! tile loops.

use std::cmp::min;

use log::debug;

use crate::dense::DenseMatrix;
use crate::error::{validation_error, Result};
use crate::matmul::check_operands;

/// Computes `C = A × B` with `block`-sized tiles.
///
/// The transposed copy of B lives only for the duration of the call and is
/// released on every return path.
///
/// # Errors
///
/// Returns a validation error if `block == 0`, a dimension mismatch if the
/// operands disagree, and an allocation error if the transposed buffer cannot
/// be obtained.
pub fn matmul_blocked(
    a: &DenseMatrix,
    b: &DenseMatrix,
    c: &mut DenseMatrix,
    block: usize,
) -> Result<()> {
    if block == 0 {
        return Err(validation_error("block size must be positive"));
    }
    let n = check_operands(a, b, c)?;

    debug!("blocked matmul: n={n}, block={block}");

    let bt = b.transpose()?;
    c.zero();

    let (a, bt, c) = (a.as_slice(), bt.as_slice(), c.as_mut_slice());

    for ii in (0..n).step_by(block) {
        let i_max = min(ii + block, n);

        for jj in (0..n).step_by(block) {
            let j_max = min(jj + block, n);

            for kk in (0..n).step_by(block) {
                let k_max = min(kk + block, n);

                for i in ii..i_max {
                    let a_tile = &a[i * n + kk..i * n + k_max];

                    for j in jj..j_max {
                        let bt_tile = &bt[j * n + kk..j * n + k_max];

                        let mut sum = c[i * n + j];
                        for (&a_ik, &bt_jk) in a_tile.iter().zip(bt_tile) {
                            sum += a_ik * bt_jk;
                        }
                        c[i * n + j] = sum;
                    }
                }
            }
        }
    }

    Ok(())
}
