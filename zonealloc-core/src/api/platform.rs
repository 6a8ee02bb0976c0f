//! Platform
//!
//! The Platform and ProgramBreak traits are used to request memory directly from the OS. By abstracting the underlying
//! platform, it becomes possible to easily port the code to a different OS, or to test the heaps against fake memory.

use core::{
    alloc::Layout,
    ptr::NonNull,
};

/// Abstraction of platform specific memory allocation and deallocation, used to obtain the regions backing Zones.
pub trait Platform {
    /// Allocates a fresh block of memory as per the specified layout.
    ///
    /// May return None if the allocation request cannot be satisfied.
    ///
    /// #   Safety
    ///
    /// The caller may assume that if the returned pointer is not null then:
    /// -   The number of usable bytes is _at greater than or equal_ to `layout.size()`.
    /// -   The pointer is _at least_ aligned to `layout.align()`.
    ///
    /// `allocate` assumes that:
    /// -   `layout.size()` is a multiple of `layout.align()`.
    /// -   `layout.align()` is non-zero, and is a power of 2.
    unsafe fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Deallocates the supplied block of memory.
    ///
    /// #   Safety
    ///
    /// The caller should no longer reference the memory after calling this function.
    ///
    /// `deallocate` assumes that:
    /// -   `pointer` was allocated by this instance of `Platform`, with `layout` as argument.
    /// -   `pointer` is the value returned by `Plaform`, and not an interior pointer.
    unsafe fn deallocate(&self, pointer: NonNull<u8>, layout: Layout);
}

/// Abstraction of a program break: the end of a contiguous data segment which can be moved up and down.
///
/// The break may be moved by other parties in between calls, hence successive extensions are not guaranteed to be
/// contiguous.
pub trait ProgramBreak {
    /// Moves the break up by `increment` bytes, returns the previous break.
    ///
    /// Returns None, without moving the break, if the request cannot be satisfied.
    ///
    /// #   Safety
    ///
    /// The caller may assume that if the returned pointer is not null then:
    /// -   The `increment` bytes starting at the returned pointer are usable, until the break is moved below them.
    unsafe fn grow(&self, increment: usize) -> Option<NonNull<u8>>;

    /// Moves the break to `address`, returns whether it succeeded.
    ///
    /// #   Safety
    ///
    /// The caller should no longer reference the memory past `address` after calling this function.
    ///
    /// `set` assumes that:
    /// -   `address` was previously returned by `grow`.
    unsafe fn set(&self, address: NonNull<u8>) -> bool;
}
