#![deny(missing_docs)]

//! A malloc family library, over Linux.
//!
//! Two families of allocation functions are provided:
//!
//! -   `BreakAllocator`, a single-threaded allocator carving its blocks out of the program break.
//! -   `ZoneAllocator`, a multi-threaded allocator spreading its blocks across independently locked Zones.
//!
//! Both rely on `zonealloc-core` for the heaps themselves, this library only provides the Linux platform and the
//! process-wide instances.
//!
//! #   Warning
//!
//! The program break is shared with the C library allocator, hence `MappedBreak` should be preferred whenever a
//! private `Heap` is good enough.

mod allocator;
mod platform;

pub use allocator::{BreakAllocator, ZoneAllocator};
pub use platform::{LinuxConfiguration, LinuxPlatform, MappedBreak, SystemBreak};

pub use zonealloc_core::{AllocError, Configuration, Heap, Platform, ProgramBreak, Properties, ZonedHeap};
pub use zonealloc_core::{ALIGNMENT, HEADER_SIZE};
