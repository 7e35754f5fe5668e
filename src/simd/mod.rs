//! Fixed-width `f64` vectors used by the SIMD kernels.
//!
//! [`fallback::F64x4`] is always available. [`avx2::f64x4::F64x4`] is
//! compiled on x86 hosts where the build script detected AVX2.

#[cfg(all(avx2, any(target_arch = "x86", target_arch = "x86_64")))]
pub mod avx2;

pub mod fallback;

pub mod traits;

pub use traits::SimdLanes;

/// Name of the lane implementation the SIMD kernels will use on this machine.
pub fn backend() -> &'static str {
    #[cfg(all(avx2, any(target_arch = "x86", target_arch = "x86_64")))]
    {
        if is_x86_feature_detected!("avx") {
            return "avx";
        }
    }

    "portable"
}
