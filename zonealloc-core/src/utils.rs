//! A collection of utilities.

use core::ptr::NonNull;

use crate::AllocError;
use crate::internals::blocks::{HEADER_SIZE, MAXIMUM_BLOCK_SIZE};

/// The alignment of every payload, and the granularity of every block size.
pub const ALIGNMENT: usize = 4;

/// Returns `size` rounded up to the next multiple of `ALIGNMENT`.
///
/// A request for 0 bytes is not an allocation, and a request which a block header cannot describe is refused.
pub(crate) fn aligned_size(size: usize) -> Result<usize, AllocError> {
    if size == 0 {
        return Err(AllocError::AllocationRefused);
    }

    let aligned = ((size - 1) / ALIGNMENT * ALIGNMENT)
        .checked_add(ALIGNMENT)
        .ok_or(AllocError::SizeOverflow)?;

    if aligned > MAXIMUM_BLOCK_SIZE {
        return Err(AllocError::SizeOverflow);
    }

    Ok(aligned)
}

/// Returns the number of bytes spanned by a block of `size` payload bytes, header included.
pub(crate) fn footprint(size: usize) -> usize { size + HEADER_SIZE }

/// Returns whether the pointer is sufficiently aligned for a payload, or a header.
pub(crate) fn is_aligned(ptr: NonNull<u8>) -> bool { (ptr.as_ptr() as usize) % ALIGNMENT == 0 }

// mod tests
