//! Write-then-verify helpers.
//!
//! Each byte of a payload is written with a value derived from a seed and its offset, so that a payload overlapping
//! another, or shifted, is detected on verification.

use std::{ptr::NonNull, slice};

/// The first byte of a payload not matching the expected pattern.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Mismatch {
    /// Offset of the byte within the payload.
    pub offset: usize,
    /// Expected value.
    pub expected: u8,
    /// Actual value.
    pub actual: u8,
}

/// Fills `size` bytes at `pointer` with the pattern of `seed`.
///
/// #   Safety
///
/// -   Assumes that `pointer` points to at least `size` bytes, writable.
pub unsafe fn fill(pointer: NonNull<u8>, size: usize, seed: u8) {
    let payload = slice::from_raw_parts_mut(pointer.as_ptr(), size);

    for (offset, byte) in payload.iter_mut().enumerate() {
        *byte = expected(seed, offset);
    }
}

/// Checks that `size` bytes at `pointer` match the pattern of `seed`.
///
/// #   Safety
///
/// -   Assumes that `pointer` points to at least `size` bytes, readable.
pub unsafe fn verify(pointer: NonNull<u8>, size: usize, seed: u8) -> Result<(), Mismatch> {
    let payload = slice::from_raw_parts(pointer.as_ptr(), size);

    for (offset, actual) in payload.iter().enumerate() {
        let expected = expected(seed, offset);

        if *actual != expected {
            return Err(Mismatch { offset, expected, actual: *actual });
        }
    }

    Ok(())
}

/// Checks that `size` bytes at `pointer` are all zero.
///
/// #   Safety
///
/// -   Assumes that `pointer` points to at least `size` bytes, readable.
pub unsafe fn is_zeroed(pointer: NonNull<u8>, size: usize) -> bool {
    slice::from_raw_parts(pointer.as_ptr(), size).iter().all(|byte| *byte == 0)
}

fn expected(seed: u8, offset: usize) -> u8 { seed.wrapping_add((offset % 251) as u8) }

// mod tests
