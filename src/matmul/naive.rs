//! Textbook triple-loop multiplication in three loop orders.

use std::fmt;
use std::str::FromStr;

use crate::dense::DenseMatrix;
use crate::error::{validation_error, MatmulError, Result};
use crate::matmul::{check_operands, ikj_rows};

/// Nesting order of the row (`i`), column (`j`) and contraction (`k`) loops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoopOrder {
    /// Dot product per output entry, accumulated in a scalar.
    Ijk,
    /// Scaled rows of B accumulated into rows of C. Streams both B and C
    /// row-major.
    Ikj,
    /// Like `Ijk` but walks C column by column.
    Jik,
}

impl LoopOrder {
    pub const ALL: [LoopOrder; 3] = [LoopOrder::Ijk, LoopOrder::Ikj, LoopOrder::Jik];
}

impl fmt::Display for LoopOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopOrder::Ijk => "ijk",
            LoopOrder::Ikj => "ikj",
            LoopOrder::Jik => "jik",
        };
        f.write_str(name)
    }
}

impl FromStr for LoopOrder {
    type Err = MatmulError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ijk" => Ok(LoopOrder::Ijk),
            "ikj" => Ok(LoopOrder::Ikj),
            "jik" => Ok(LoopOrder::Jik),
            other => Err(validation_error(format!("unknown loop order '{other}'"))),
        }
    }
}

/// Computes `C = A × B` with three nested loops in the given order.
///
/// # Errors
///
/// Returns a dimension mismatch if `B` or `C` differ in size from `A`.
pub fn matmul_naive(
    a: &DenseMatrix,
    b: &DenseMatrix,
    c: &mut DenseMatrix,
    order: LoopOrder,
) -> Result<()> {
    let n = check_operands(a, b, c)?;
    c.zero();

    let (a, b, c) = (a.as_slice(), b.as_slice(), c.as_mut_slice());

    match order {
        LoopOrder::Ijk => {
            for i in 0..n {
                for j in 0..n {
                    c[i * n + j] = dot_column(a, b, i, j, n);
                }
            }
        }
        LoopOrder::Ikj => ikj_rows(a, b, c, 0, n),
        LoopOrder::Jik => {
            for j in 0..n {
                for i in 0..n {
                    c[i * n + j] = dot_column(a, b, i, j, n);
                }
            }
        }
    }

    Ok(())
}

/// `Σ_k A[i,k] * B[k,j]`, accumulated left to right.
#[inline(always)]
fn dot_column(a: &[f64], b: &[f64], i: usize, j: usize, n: usize) -> f64 {
    let a_row = &a[i * n..(i + 1) * n];
    let mut sum = 0.0;
    for (k, &aik) in a_row.iter().enumerate() {
        sum += aik * b[k * n + j];
    }
    sum
}
