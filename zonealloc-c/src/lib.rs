#![deny(missing_docs)]

//! Exposition of the zonealloc API via a C ABI.
//!
//! All functions return NULL, or a negative value, on failure; the reason is logged through the `log` facade.

use core::ptr::{self, NonNull};

use zonealloc::{BreakAllocator, ZoneAllocator};

/// Allocates `size` bytes of memory from the program break, aligned on at least 4 bytes.
///
/// Returns NULL if `size` is 0. Aborts if the program break cannot be moved.
///
/// #   Safety
///
/// -   Assumes that no other thread calls any of the `za_` single-threaded functions concurrently.
#[no_mangle]
pub unsafe extern "C" fn za_malloc(size: usize) -> *mut u8 { into_raw(BREAK_ALLOCATOR.malloc(size)) }

/// Deallocates the memory located at `pointer`, allocated by `za_malloc`, `za_calloc`, or `za_realloc`.
///
/// #   Safety
///
/// -   Assumes that no other thread calls any of the `za_` single-threaded functions concurrently.
/// -   Assumes the memory pointed by `pointer` is no longer in use.
#[no_mangle]
pub unsafe extern "C" fn za_free(pointer: *mut u8) { BREAK_ALLOCATOR.free(pointer) }

/// Allocates `count * size` bytes of zeroed memory from the program break.
///
/// #   Safety
///
/// -   Assumes that no other thread calls any of the `za_` single-threaded functions concurrently.
#[no_mangle]
pub unsafe extern "C" fn za_calloc(count: usize, size: usize) -> *mut u8 {
    into_raw(BREAK_ALLOCATOR.calloc(count, size))
}

/// Resizes the memory located at `pointer` to `size` bytes.
///
/// #   Safety
///
/// -   Assumes that no other thread calls any of the `za_` single-threaded functions concurrently.
/// -   Assumes the memory pointed by `pointer` is no longer in use, if a different pointer is returned.
#[no_mangle]
pub unsafe extern "C" fn za_realloc(pointer: *mut u8, size: usize) -> *mut u8 {
    into_raw(BREAK_ALLOCATOR.realloc(pointer, size))
}

/// Creates the multi-threaded heap, unless it already exists.
///
/// Returns 0 on success, and a negative value otherwise.
#[cold]
#[no_mangle]
pub extern "C" fn za_heap_create() -> i32 { if ZONE_ALLOCATOR.heap_create().is_ok() { 0 } else { -1 } }

/// Destroys the multi-threaded heap, returning all its memory to the OS.
///
/// #   Safety
///
/// -   Assumes that no memory allocated by the `za_mt_` functions is used afterwards.
#[cold]
#[no_mangle]
pub unsafe extern "C" fn za_heap_kill() { ZONE_ALLOCATOR.heap_kill() }

/// Allocates `size` bytes of memory from the multi-threaded heap, aligned on at least 4 bytes.
#[no_mangle]
pub extern "C" fn za_mt_malloc(size: usize) -> *mut u8 { into_raw(ZONE_ALLOCATOR.mt_malloc(size)) }

/// Deallocates the memory located at `pointer`, allocated by `za_mt_malloc`, `za_mt_calloc`, or `za_mt_realloc`.
///
/// #   Safety
///
/// -   Assumes the memory pointed by `pointer` is no longer in use.
#[no_mangle]
pub unsafe extern "C" fn za_mt_free(pointer: *mut u8) { ZONE_ALLOCATOR.mt_free(pointer) }

/// Allocates `count * size` bytes of zeroed memory from the multi-threaded heap.
#[no_mangle]
pub extern "C" fn za_mt_calloc(count: usize, size: usize) -> *mut u8 { into_raw(ZONE_ALLOCATOR.mt_calloc(count, size)) }

/// Resizes the memory located at `pointer` to `size` bytes.
///
/// #   Safety
///
/// -   Assumes the memory pointed by `pointer` is no longer in use, if a different pointer is returned.
#[no_mangle]
pub unsafe extern "C" fn za_mt_realloc(pointer: *mut u8, size: usize) -> *mut u8 {
    into_raw(ZONE_ALLOCATOR.mt_realloc(pointer, size))
}

//
//  Implementation
//

static BREAK_ALLOCATOR: BreakAllocator = BreakAllocator::new();
static ZONE_ALLOCATOR: ZoneAllocator = ZoneAllocator::new();

fn into_raw(pointer: Option<NonNull<u8>>) -> *mut u8 {
    pointer.map(|pointer| pointer.as_ptr()).unwrap_or(ptr::null_mut())
}

// mod tests
