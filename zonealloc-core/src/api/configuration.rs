//! The configuration of zonealloc-core.
//!
//! The multi-threaded heap carves its allocations out of Zones: fixed-size regions obtained from the Platform. The
//! Configuration instance allows adjusting the size of those regions, and how many are created up-front, to better
//! match the underlying platform native page sizes and the expected workload.
//!
//! Each region starts with the meta-data of its Zone, the remainder being the capacity available to blocks.

use core::{alloc::Layout, cmp, mem};

use crate::internals::{blocks::{HEADER_SIZE, MINIMUM_BLOCK_SIZE}, zone::Zone};
use crate::utils::ALIGNMENT;

/// Configuration
///
/// The Configuration instance allows adjusting the size and number of Zones.
pub trait Configuration {
    /// The size of the region backing a Zone, meta-data included.
    ///
    /// The size should be a multiple of the alignment of the Zone meta-data, typically 8 bytes.
    const ZONE_SIZE: usize;

    /// The number of Zones created alongside the heap, at least 1.
    const INITIAL_ZONES: usize;
}

/// Properties
///
/// Properties of a given Configuration.
///
/// Work-around for the inability to implement static methods directly on a trait.
pub struct Properties<C>(C);

impl<C> Properties<C>
    where
        C: Configuration
{
    /// Returns the layout of the region backing a Zone, if `ZONE_SIZE` is representable.
    pub fn zone_layout() -> Option<Layout> { Layout::from_size_align(C::ZONE_SIZE, Self::zone_alignment()).ok() }

    /// Returns the alignment of the region backing a Zone.
    pub fn zone_alignment() -> usize { cmp::max(mem::align_of::<Zone>(), ALIGNMENT) }

    /// Returns the offset, from the start of the region, of the first block of a Zone.
    pub fn zone_offset() -> usize { (mem::size_of::<Zone>() + ALIGNMENT - 1) / ALIGNMENT * ALIGNMENT }

    /// Returns the number of bytes available to blocks, headers included, in a Zone.
    pub fn zone_capacity() -> usize { C::ZONE_SIZE.saturating_sub(Self::zone_offset()) / ALIGNMENT * ALIGNMENT }

    /// Returns the largest payload which a Zone can provide.
    ///
    /// Requests beyond this size cannot be satisfied, however many Zones are created.
    pub fn largest_allocation() -> usize { Self::zone_capacity().saturating_sub(HEADER_SIZE) }

    /// Returns whether the Configuration is usable.
    pub fn is_valid() -> bool {
        C::INITIAL_ZONES >= 1
            && C::ZONE_SIZE % Self::zone_alignment() == 0
            && Self::zone_layout().is_some()
            && Self::largest_allocation() >= MINIMUM_BLOCK_SIZE
            && Self::zone_capacity() <= u32::MAX as usize
    }
}

#[cfg(test)]
mod tests {

use super::*;

struct TestConfiguration;

impl Configuration for TestConfiguration {
    const ZONE_SIZE: usize = 1024;
    const INITIAL_ZONES: usize = 8;
}

type TestProperties = Properties<TestConfiguration>;

#[test]
fn properties_zone_layout() {
    let layout = TestProperties::zone_layout().unwrap();

    assert_eq!(1024, layout.size());
    assert_eq!(TestProperties::zone_alignment(), layout.align());
    assert!(layout.align() >= mem::align_of::<Zone>());
}

#[test]
fn properties_zone_offset() {
    let offset = TestProperties::zone_offset();

    assert!(offset >= mem::size_of::<Zone>());
    assert!(offset < mem::size_of::<Zone>() + ALIGNMENT);
    assert_eq!(0, offset % ALIGNMENT);
}

#[test]
fn properties_zone_capacity() {
    let capacity = TestProperties::zone_capacity();

    assert_eq!(0, capacity % ALIGNMENT);
    assert!(TestProperties::zone_offset() + capacity <= 1024);
    assert!(TestProperties::zone_offset() + capacity + ALIGNMENT > 1024);

    assert_eq!(capacity - HEADER_SIZE, TestProperties::largest_allocation());
}

#[test]
fn properties_is_valid() {
    struct Empty;

    impl Configuration for Empty {
        const ZONE_SIZE: usize = 1024;
        const INITIAL_ZONES: usize = 0;
    }

    struct Tiny;

    impl Configuration for Tiny {
        const ZONE_SIZE: usize = 16;
        const INITIAL_ZONES: usize = 8;
    }

    struct Misaligned;

    impl Configuration for Misaligned {
        const ZONE_SIZE: usize = 1030;
        const INITIAL_ZONES: usize = 8;
    }

    assert!(TestProperties::is_valid());

    assert!(!Properties::<Empty>::is_valid());
    assert!(!Properties::<Tiny>::is_valid());
    assert!(!Properties::<Misaligned>::is_valid());
}

} // mod tests
