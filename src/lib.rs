//! Matrix multiplication kernels and a benchmark harness that compares them.
//!
//! The kernels compute `C = A × B` for square, row-major `f64` matrices:
//!
//! - naive triple loops in three orders ([`matmul::naive`]),
//! - cache-blocked multiplication over a transposed B ([`matmul::blocked`]),
//! - 4-lane SIMD multiplication ([`matmul::simd`]),
//! - fixed-partition multi-threaded and rayon row-parallel
//!   multiplication ([`parallel`]),
//! - CSR sparse × vector and sparse × dense products ([`sparse`]).
//!
//! ```
//! use matbench::{matmul, DenseMatrix, Strategy};
//!
//! let a = DenseMatrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
//! let b = DenseMatrix::from_rows(&[[5.0, 6.0], [7.0, 8.0]]).unwrap();
//! let mut c = DenseMatrix::new(2).unwrap();
//!
//! matmul::multiply(&a, &b, &mut c, Strategy::Simd).unwrap();
//! assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
//! ```

pub mod dense;
pub mod error;
pub mod harness;
pub mod matmul;
pub mod parallel;
pub mod simd;
pub mod sparse;
mod utils;

pub use dense::DenseMatrix;
pub use error::{MatmulError, Result};
pub use matmul::{LoopOrder, Strategy};
pub use parallel::RowKernel;
pub use sparse::CsrMatrix;

/// Tile edge used by the blocked kernel when none is given.
pub const DEFAULT_BLOCK_SIZE: usize = 32;

/// Magnitude at or below which an entry is dropped when converting to CSR.
pub const DEFAULT_CSR_TOLERANCE: f64 = 1e-12;

/// Largest entry-wise difference accepted when cross-checking kernels.
pub const VERIFY_TOLERANCE: f64 = 1e-8;

/// Seed used for reproducible random matrices when none is given.
pub const DEFAULT_SEED: u64 = 12345;
