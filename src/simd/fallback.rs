//! Portable 4-lane `f64` vector.
//!
//! Used when AVX is not available at compile time or run time. Each lane
//! operation is a plain scalar multiply or add, so results are bit-identical
//! to the AVX implementation and to scalar code that performs the same
//! operations in the same order.

use std::ops::{Add, Mul};

use crate::simd::traits::SimdLanes;

/// Number of lanes, matching a 256-bit AVX register of `f64`.
pub(crate) const LANE_COUNT: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct F64x4 {
    pub elements: [f64; LANE_COUNT],
}

impl SimdLanes for F64x4 {
    const LANES: usize = LANE_COUNT;

    #[inline(always)]
    unsafe fn splat(value: f64) -> Self {
        Self {
            elements: [value; LANE_COUNT],
        }
    }

    #[inline(always)]
    unsafe fn load(chunk: &[f64]) -> Self {
        debug_assert!(chunk.len() >= LANE_COUNT, "chunk must hold {LANE_COUNT} lanes");

        let mut elements = [0.0; LANE_COUNT];
        elements.copy_from_slice(&chunk[..LANE_COUNT]);
        Self { elements }
    }

    #[inline(always)]
    unsafe fn store(&self, chunk: &mut [f64]) {
        debug_assert!(chunk.len() >= LANE_COUNT, "chunk must hold {LANE_COUNT} lanes");

        chunk[..LANE_COUNT].copy_from_slice(&self.elements);
    }
}

impl Add for F64x4 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        let mut elements = self.elements;
        for (x, y) in elements.iter_mut().zip(rhs.elements) {
            *x += y;
        }
        Self { elements }
    }
}

impl Mul for F64x4 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        let mut elements = self.elements;
        for (x, y) in elements.iter_mut().zip(rhs.elements) {
            *x *= y;
        }
        Self { elements }
    }
}
