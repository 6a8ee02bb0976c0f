//! Allocator
//!
//! Process-wide entry points, over a single `Heap` carved out of the program break, and a single `ZonedHeap`.

use core::{cell::UnsafeCell, ptr::NonNull};

use std::process;

use parking_lot::RwLock;
use zonealloc_core::{AllocError, Heap, ZonedHeap};

use crate::{LinuxConfiguration, LinuxPlatform, SystemBreak};

/// Single-threaded allocator, over the program break.
///
/// All instances share the same process-wide heap. Running out of memory is fatal: the error is logged, then the
/// process aborts. Other errors are logged, and result in a None result.
#[derive(Default)]
pub struct BreakAllocator;

impl BreakAllocator {
    /// Creates an instance.
    pub const fn new() -> Self { Self }

    /// Allocates `size` bytes of memory, aligned on at least 4 bytes.
    ///
    /// Returns None if `size` is 0, or too large to be described.
    ///
    /// #   Safety
    ///
    /// -   Assumes that no other thread uses any `BreakAllocator` concurrently.
    pub unsafe fn malloc(&self, size: usize) -> Option<NonNull<u8>> {
        report_fatal("malloc", heap().allocate(size))
    }

    /// Deallocates the memory located at `pointer`.
    ///
    /// Null, or unknown, pointers are reported and otherwise ignored.
    ///
    /// #   Safety
    ///
    /// -   Assumes that no other thread uses any `BreakAllocator` concurrently.
    /// -   Assumes the memory pointed by `pointer` is no longer in use.
    pub unsafe fn free(&self, pointer: *mut u8) { report_fatal("free", heap().deallocate(pointer)); }

    /// Allocates `count * size` bytes of zeroed memory.
    ///
    /// #   Safety
    ///
    /// -   Assumes that no other thread uses any `BreakAllocator` concurrently.
    pub unsafe fn calloc(&self, count: usize, size: usize) -> Option<NonNull<u8>> {
        report_fatal("calloc", heap().allocate_zeroed(count, size))
    }

    /// Resizes the memory located at `pointer` to `size` bytes, preserving its content up to the smaller size.
    ///
    /// A null `pointer` allocates, a 0 `size` deallocates.
    ///
    /// #   Safety
    ///
    /// -   Assumes that no other thread uses any `BreakAllocator` concurrently.
    /// -   Assumes the memory pointed by `pointer` is no longer in use, if a different pointer is returned.
    pub unsafe fn realloc(&self, pointer: *mut u8, size: usize) -> Option<NonNull<u8>> {
        report_fatal("realloc", heap().reallocate(pointer, size))
    }
}

/// Multi-threaded allocator, over a set of Zones.
///
/// All instances share the same process-wide heap, which only exists in between `heap_create` and `heap_kill`. Any
/// error, including running out of memory, is logged, and results in a None result.
#[derive(Default)]
pub struct ZoneAllocator;

impl ZoneAllocator {
    /// Creates an instance.
    pub const fn new() -> Self { Self }

    /// Creates the process-wide heap, and its initial Zones, unless it already exists.
    ///
    /// #   Errors
    ///
    /// -   OutOfMemory, if the initial Zones cannot be allocated.
    #[cold]
    pub fn heap_create(&self) -> Result<(), AllocError> {
        let mut slot = ZONED_HEAP.write();

        if slot.is_some() {
            return Ok(());
        }

        let heap = ZonedHeap::new(LinuxPlatform::new()).ok_or(AllocError::OutOfMemory)?;

        log::debug!("ZoneAllocator::heap_create - {} zones", heap.number_zones());

        *slot = Some(heap);
        Ok(())
    }

    /// Destroys the process-wide heap, returning all its Zones to the OS.
    ///
    /// Does nothing if the heap does not exist.
    ///
    /// #   Safety
    ///
    /// -   Assumes that no memory allocated from the heap is used afterwards.
    #[cold]
    pub unsafe fn heap_kill(&self) {
        let heap = ZONED_HEAP.write().take();

        //  Zones are released outside the lock.
        drop(heap);
    }

    /// Allocates `size` bytes of memory, aligned on at least 4 bytes.
    pub fn mt_malloc(&self, size: usize) -> Option<NonNull<u8>> {
        with_heap("mt_malloc", |heap| heap.allocate(size))
    }

    /// Deallocates the memory located at `pointer`.
    ///
    /// Null, or unknown, pointers are reported and otherwise ignored.
    ///
    /// #   Safety
    ///
    /// -   Assumes the memory pointed by `pointer` is no longer in use.
    pub unsafe fn mt_free(&self, pointer: *mut u8) {
        //  Safety:
        //  -   Forwarded from the caller.
        with_heap("mt_free", |heap| unsafe { heap.deallocate(pointer) });
    }

    /// Allocates `count * size` bytes of zeroed memory.
    pub fn mt_calloc(&self, count: usize, size: usize) -> Option<NonNull<u8>> {
        with_heap("mt_calloc", |heap| heap.allocate_zeroed(count, size))
    }

    /// Resizes the memory located at `pointer` to `size` bytes, preserving its content up to the smaller size.
    ///
    /// A null `pointer` allocates, a 0 `size` deallocates.
    ///
    /// #   Safety
    ///
    /// -   Assumes the memory pointed by `pointer` is no longer in use, if a different pointer is returned.
    pub unsafe fn mt_realloc(&self, pointer: *mut u8, size: usize) -> Option<NonNull<u8>> {
        //  Safety:
        //  -   Forwarded from the caller.
        with_heap("mt_realloc", |heap| unsafe { heap.reallocate(pointer, size) })
    }
}

//
//  Integration test backdoors.
//
//  Unfortunately the backdoors have to be exposed as part of the public API for use in integration tests.
//

impl ZoneAllocator {
    /// Exposes the number of Zones of the heap, if it exists.
    #[cold]
    #[doc(hidden)]
    pub fn number_zones(&self) -> Option<usize> { ZONED_HEAP.read().as_ref().map(|heap| heap.number_zones()) }
}

//
//  Implementation
//

type BreakHeap = Heap<SystemBreak>;
type ProcessHeap = ZonedHeap<LinuxConfiguration, LinuxPlatform>;

struct BreakSlot(UnsafeCell<BreakHeap>);

//  Safety:
//  -   Concurrent access is ruled out by the contract of `BreakAllocator`.
unsafe impl Sync for BreakSlot {}

static BREAK_HEAP: BreakSlot = BreakSlot(UnsafeCell::new(Heap::new(SystemBreak::new())));

static ZONED_HEAP: RwLock<Option<ProcessHeap>> = parking_lot::const_rwlock(None);

//  #   Safety
//
//  -   Assumes that no other reference to the heap is alive.
unsafe fn heap() -> &'static mut BreakHeap { &mut *BREAK_HEAP.0.get() }

fn with_heap<T, F>(operation: &str, function: F) -> Option<T>
    where
        F: FnOnce(&ProcessHeap) -> Result<T, AllocError>,
{
    let slot = ZONED_HEAP.read();

    let result = slot.as_ref().ok_or(AllocError::HeapNotCreated).and_then(function);

    report(operation, result)
}

//  Reports the error, if any, aborting on OutOfMemory.
fn report_fatal<T>(operation: &str, result: Result<T, AllocError>) -> Option<T> {
    if let Err(AllocError::OutOfMemory) = result {
        log::error!("BreakAllocator::{} - {}, aborting", operation, AllocError::OutOfMemory);
        process::abort();
    }

    report(operation, result)
}

//  Reports the error, if any.
fn report<T>(operation: &str, result: Result<T, AllocError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        //  A 0-sized request is not a caller error.
        Err(AllocError::AllocationRefused) => None,
        Err(error) => {
            log::warn!("{} - {}", operation, error);
            None
        }
    }
}
