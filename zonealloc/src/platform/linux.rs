//! Implementation of Linux specific calls.

use core::{alloc::Layout, cell::Cell, ptr::{self, NonNull}};

use zonealloc_core::{Configuration, Platform, ProgramBreak};

/// Implementation of the Configuration trait, for Linux.
#[derive(Default)]
pub struct LinuxConfiguration;

impl Configuration for LinuxConfiguration {
    //  64 KB
    const ZONE_SIZE: usize = 64 * 1024;

    const INITIAL_ZONES: usize = 8;
}

/// Implementation of the Platform trait, for Linux.
///
/// Each region is a private anonymous mapping of its own.
#[derive(Default)]
pub struct LinuxPlatform;

impl LinuxPlatform {
    /// Creates an instance.
    pub const fn new() -> Self { Self }
}

impl Platform for LinuxPlatform {
    unsafe fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        assert!(layout.align() <= page_size(),
            "Incorrect alignment: {} > {}", layout.align(), page_size());

        mmap_allocate(layout.size(), 0)
    }

    unsafe fn deallocate(&self, pointer: NonNull<u8>, layout: Layout) {
        munmap_deallocate(pointer.as_ptr(), layout.size());
    }
}

/// Implementation of the ProgramBreak trait, over the process data segment.
///
/// The break is shared with any other user of `sbrk` in the process, such as the C library allocator.
#[derive(Default)]
pub struct SystemBreak;

impl SystemBreak {
    /// Creates an instance.
    pub const fn new() -> Self { Self }
}

impl ProgramBreak for SystemBreak {
    unsafe fn grow(&self, increment: usize) -> Option<NonNull<u8>> {
        let increment = libc::intptr_t::try_from(increment).ok()?;

        let previous = libc::sbrk(increment);

        //  `sbrk` signals failure with `(void*) -1`.
        if previous as isize == -1 {
            return None;
        }

        NonNull::new(previous as *mut u8)
    }

    unsafe fn set(&self, address: NonNull<u8>) -> bool { libc::brk(address.as_ptr() as *mut libc::c_void) == 0 }
}

/// Implementation of the ProgramBreak trait, over a private reservation of address space.
///
/// The reservation is mapped once, without reserving swap, and the break moves within it. Pages above a lowered break
/// are handed back to the OS, and the whole reservation is unmapped on drop.
///
/// Unlike `SystemBreak`, nobody else moves this break, which makes it suitable for running a `Heap` alongside the C
/// library allocator.
pub struct MappedBreak {
    base: NonNull<u8>,
    reservation: usize,
    current: Cell<usize>,
}

impl MappedBreak {
    /// Reserves `reservation` bytes of address space, rounded up to a multiple of the page size.
    ///
    /// Returns None if `reservation` is 0, or the reservation cannot be mapped.
    pub fn new(reservation: usize) -> Option<Self> {
        if reservation == 0 {
            return None;
        }

        let reservation = reservation.checked_add(page_size() - 1)? / page_size() * page_size();

        let base = mmap_allocate(reservation, libc::MAP_NORESERVE)?;

        Some(Self { base, reservation, current: Cell::new(0) })
    }

    /// Returns the start of the reservation, which is the initial break.
    pub fn begin(&self) -> NonNull<u8> { self.base }

    /// Returns the size of the reservation.
    pub fn reservation(&self) -> usize { self.reservation }

    /// Returns the distance between the start of the reservation and the current break.
    pub fn offset(&self) -> usize { self.current.get() }
}

impl ProgramBreak for MappedBreak {
    unsafe fn grow(&self, increment: usize) -> Option<NonNull<u8>> {
        let current = self.current.get();

        if increment > self.reservation - current {
            return None;
        }

        self.current.set(current + increment);

        NonNull::new(self.base.as_ptr().add(current))
    }

    unsafe fn set(&self, address: NonNull<u8>) -> bool {
        let begin = self.base.as_ptr() as usize;
        let address = address.as_ptr() as usize;

        if address < begin || address - begin > self.reservation {
            return false;
        }

        let offset = address - begin;
        let current = self.current.get();

        if offset < current {
            let page = page_size();

            //  Only whole pages above the new break are given back.
            let first = (offset + page - 1) / page * page;
            let last = (current + page - 1) / page * page;

            if first < last {
                //  Safety:
                //  -   `[first, last)` lies within the reservation, and above the break.
                madvise_dont_need(self.base.as_ptr().add(first), last - first);
            }
        }

        self.current.set(offset);
        true
    }
}

impl Drop for MappedBreak {
    fn drop(&mut self) {
        //  Safety:
        //  -   `self.base` points to a `mmap`ed area of `self.reservation` bytes.
        //  -   The memory is no longer in use, as the break is no longer.
        unsafe { munmap_deallocate(self.base.as_ptr(), self.reservation) };
    }
}

//  Returns the size of a page.
fn page_size() -> usize {
    //  Safety:
    //  -   `_SC_PAGESIZE` is always a valid name.
    let result = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

    if result > 0 { result as usize } else { 4096 }
}

//  Wrapper around `mmap`.
//
//  Returns a pointer to `size` bytes of memory, aligned on a page boundary.
fn mmap_allocate(size: usize, extra_flags: i32) -> Option<NonNull<u8>> {
    let length = size;
    let prot = libc::PROT_READ | libc::PROT_WRITE;
    let flags = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | extra_flags;

    //  No specific address hint.
    let addr = ptr::null_mut();
    //  When used in conjunction with MAP_ANONYMOUS, fd is mandated to be -1 on some implementations.
    let fd = -1;
    //  When used in conjunction with MAP_ANONYMOUS, offset is mandated to be 0 on some implementations.
    let offset = 0;

    //  Safety:
    //  -   `addr`, `fd`, and `offset` are suitable for MAP_ANONYMOUS.
    let result = unsafe { libc::mmap(addr, length, prot, flags, fd, offset) };

    let result = if result != libc::MAP_FAILED { result as *mut u8 } else { ptr::null_mut() };
    NonNull::new(result)
}

//  Wrapper around `munmap`.
//
//  #   Panics
//
//  If `munmap` returns a non-0 result.
//
//  #   Safety
//
//  -   Assumes that `addr` points to a `mmap`ed area of at least `size` bytes.
//  -   Assumes that the range `[addr, addr + size)` is no longer in use.
unsafe fn munmap_deallocate(addr: *mut u8, size: usize) {
    let result = libc::munmap(addr as *mut libc::c_void, size);
    assert!(result == 0, "Could not munmap {:x}, {}: {}", addr as usize, size, result);
}

//  Wrapper around `madvise(MADV_DONTNEED)`.
//
//  Failure is benign: the pages simply stay resident.
//
//  #   Safety
//
//  -   Assumes that `addr` is page-aligned, and points to a `mmap`ed area of at least `size` bytes.
//  -   Assumes that the range `[addr, addr + size)` is no longer in use.
unsafe fn madvise_dont_need(addr: *mut u8, size: usize) {
    let result = libc::madvise(addr as *mut libc::c_void, size, libc::MADV_DONTNEED);

    if result != 0 {
        log::debug!("madvise_dont_need - {:x}, {}: {}", addr as usize, size, result);
    }
}

// mod tests
