//! Lane-level operations the SIMD kernels are written against.

use std::ops::{Add, Mul};

/// A fixed-width vector of `f64` lanes.
///
/// The multiplication kernels only need to broadcast a scalar, load a full
/// chunk of lanes, multiply, add, and store the chunk back. Remainders shorter
/// than [`SimdLanes::LANES`] are never handed to these methods; callers finish
/// them with scalar code.
pub trait SimdLanes: Copy + Add<Output = Self> + Mul<Output = Self> {
    /// Number of `f64` values processed per vector.
    const LANES: usize;

    /// Broadcasts `value` to every lane.
    ///
    /// # Safety
    ///
    /// The CPU must support the instruction set the implementation uses.
    unsafe fn splat(value: f64) -> Self;

    /// Loads exactly `LANES` values from `chunk`.
    ///
    /// # Safety
    ///
    /// The CPU must support the instruction set the implementation uses and
    /// `chunk.len()` must be at least `LANES`.
    unsafe fn load(chunk: &[f64]) -> Self;

    /// Stores all lanes into the first `LANES` slots of `chunk`.
    ///
    /// # Safety
    ///
    /// Same requirements as [`SimdLanes::load`].
    unsafe fn store(&self, chunk: &mut [f64]);
}
