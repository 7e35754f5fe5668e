//! AVX 4-lane f64 SIMD vector implementation.
//!
//! `F64x4` wraps the `__m256d` register type: four double-precision values
//! processed by a single 256-bit instruction. Every intrinsic used here is
//! plain AVX; AVX2 is only the build-time gate of the enclosing module.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::ops::{Add, Mul};

use crate::simd::traits::SimdLanes;

/// AVX memory alignment requirement in bytes.
pub(crate) const AVX_ALIGNMENT: usize = 32;

/// Number of f64 elements that fit in a 256-bit vector.
pub(crate) const LANE_COUNT: usize = 4;

/// AVX SIMD vector containing 4 packed f64 values.
#[derive(Copy, Clone, Debug)]
pub struct F64x4 {
    pub elements: __m256d,
}

impl F64x4 {
    /// Checks if a pointer is aligned for `_mm256_load_pd`/`_mm256_store_pd`.
    #[inline(always)]
    pub fn is_aligned(ptr: *const f64) -> bool {
        (ptr as usize) % AVX_ALIGNMENT == 0
    }

    /// Copies the lanes out into an array.
    #[inline(always)]
    pub fn to_array(self) -> [f64; LANE_COUNT] {
        let mut out = [0.0; LANE_COUNT];
        unsafe { _mm256_storeu_pd(out.as_mut_ptr(), self.elements) };
        out
    }
}

impl SimdLanes for F64x4 {
    const LANES: usize = LANE_COUNT;

    #[inline(always)]
    unsafe fn splat(value: f64) -> Self {
        Self {
            elements: unsafe { _mm256_set1_pd(value) },
        }
    }

    /// Picks the aligned load when the chunk happens to start on a 32-byte
    /// boundary. Row starts of an `n`×`n` buffer are aligned only for some `n`.
    #[inline(always)]
    unsafe fn load(chunk: &[f64]) -> Self {
        debug_assert!(chunk.len() >= LANE_COUNT, "chunk must hold {LANE_COUNT} lanes");

        let ptr = chunk.as_ptr();
        let elements = match F64x4::is_aligned(ptr) {
            true => unsafe { _mm256_load_pd(ptr) },
            false => unsafe { _mm256_loadu_pd(ptr) },
        };

        Self { elements }
    }

    #[inline(always)]
    unsafe fn store(&self, chunk: &mut [f64]) {
        debug_assert!(chunk.len() >= LANE_COUNT, "chunk must hold {LANE_COUNT} lanes");

        let ptr = chunk.as_mut_ptr();
        match F64x4::is_aligned(ptr) {
            true => unsafe { _mm256_store_pd(ptr, self.elements) },
            false => unsafe { _mm256_storeu_pd(ptr, self.elements) },
        }
    }
}

impl Add for F64x4 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self {
            elements: unsafe { _mm256_add_pd(self.elements, rhs.elements) },
        }
    }
}

impl Mul for F64x4 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Self {
            elements: unsafe { _mm256_mul_pd(self.elements, rhs.elements) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splat_mul_add_matches_scalar() {
        if !is_x86_feature_detected!("avx") {
            return;
        }

        let b = [1.5, -2.0, 3.25, 4.0];
        let c = [10.0, 20.0, 30.0, 40.0];
        let aik = 0.3;

        let v = unsafe { F64x4::load(&c) + F64x4::splat(aik) * F64x4::load(&b) };

        let expected: Vec<f64> = c.iter().zip(b.iter()).map(|(c, b)| c + aik * b).collect();
        assert_eq!(v.to_array().to_vec(), expected);
    }

    #[test]
    fn test_store_unaligned_offset() {
        if !is_x86_feature_detected!("avx") {
            return;
        }

        let mut out = [0.0; 6];
        let v = unsafe { F64x4::load(&[1.0, 2.0, 3.0, 4.0]) };
        unsafe { v.store(&mut out[1..]) };
        assert_eq!(out, [0.0, 1.0, 2.0, 3.0, 4.0, 0.0]);
    }
}
