//! Errors
//!
//! The failures an allocation, or a deallocation, may encounter.

use thiserror::Error;

/// Error returned by the heaps.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum AllocError {
    /// The request was not an allocation, such as a request for 0 bytes.
    #[error("allocation refused")]
    AllocationRefused,
    /// The request could not be satisfied by the memory available.
    #[error("out of memory")]
    OutOfMemory,
    /// A null pointer was supplied where a live allocation was expected.
    #[error("null pointer")]
    NullPointer,
    /// The pointer supplied was not returned by this heap, or was already deallocated.
    #[error("invalid pointer")]
    InvalidPointer,
    /// The size requested cannot be represented.
    #[error("size overflow")]
    SizeOverflow,
    /// The multi-threaded heap is not available, either not yet created or already destroyed.
    #[error("heap not created")]
    HeapNotCreated,
}

// mod tests
