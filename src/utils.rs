//! Fallible buffer allocation shared by the dense and CSR stores.
//!
//! Every matrix buffer in this crate is a plain `Vec` obtained through
//! [`Vec::try_reserve_exact`], so an allocation that cannot be satisfied comes
//! back as [`MatmulError::AllocationError`](crate::error::MatmulError) instead
//! of aborting the process. Buffers are released when their owner goes out of
//! scope, including on every early-return error path.

use std::mem;

use crate::error::{allocation_error, Result};

/// Number of bytes needed for `len` elements of `T`, or an allocation error
/// if the request overflows `usize`.
#[inline(always)]
fn byte_size<T>(len: usize, what: &str) -> Result<usize> {
    len.checked_mul(mem::size_of::<T>())
        .ok_or_else(|| allocation_error(usize::MAX, format!("{what}: size overflows usize")))
}

/// Allocates an empty `Vec<T>` with capacity for exactly `capacity` elements.
///
/// Used where the final length is known up front and the buffer is filled by
/// pushing, e.g. the CSR value and column arrays.
pub(crate) fn try_alloc_exact<T>(capacity: usize, what: &str) -> Result<Vec<T>> {
    let bytes = byte_size::<T>(capacity, what)?;

    let mut v = Vec::new();
    v.try_reserve_exact(capacity)
        .map_err(|e| allocation_error(bytes, format!("{what}: {e}")))?;

    Ok(v)
}

/// Allocates a `Vec<T>` of length `len` with every element set to `value`.
pub(crate) fn try_alloc_filled<T: Clone>(len: usize, value: T, what: &str) -> Result<Vec<T>> {
    let mut v = try_alloc_exact(len, what)?;
    v.resize(len, value);
    Ok(v)
}

/// Element count of an `n`×`n` matrix, or an allocation error on overflow.
#[inline(always)]
pub(crate) fn square_len(n: usize) -> Result<usize> {
    n.checked_mul(n)
        .ok_or_else(|| allocation_error(usize::MAX, format!("{n}x{n} matrix: size overflows usize")))
}
