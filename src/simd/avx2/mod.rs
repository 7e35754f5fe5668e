//! AVX implementations for 256-bit vector operations.
//!
//! Compiled only when the build script detects AVX2 on the host. Callers must
//! still confirm AVX at run time with `is_x86_feature_detected!("avx")`
//! before touching [`f64x4::F64x4`].
//!
//! The lane type itself needs only AVX. A CPU with AVX but without AVX2 never
//! gets this module and runs the portable lanes, which give the same results.

pub mod f64x4;
