//! Zoned Heap
//!
//! A multi-threaded heap, spreading its allocations across Zones so that threads seldom contend on the same lock.
//!
//! Each allocation starts from a Zone picked in round-robin fashion, and falls back to its siblings, in order, if the
//! Zone cannot satisfy it. A thread never holds more than one Zone lock at a time.

use core::{
    cmp,
    ptr::{self, NonNull},
};

use crate::{AllocError, Configuration, Platform, Properties};
use crate::internals::zone_directory::ZoneDirectory;
use crate::utils::aligned_size;

/// ZonedHeap.
///
/// The Zones are created alongside the heap, and all released with it.
pub struct ZonedHeap<C, P>
    where
        C: Configuration,
        P: Platform,
{
    directory: ZoneDirectory<C>,
    platform: P,
}

impl<C, P> ZonedHeap<C, P>
    where
        C: Configuration,
        P: Platform,
{
    /// Creates a heap, with `C::INITIAL_ZONES` Zones obtained from `platform`.
    ///
    /// Returns None if the Configuration is invalid, or if the Platform cannot provide the Zones; in the latter
    /// case, any Zone already obtained is returned to the Platform.
    pub fn new(platform: P) -> Option<Self> {
        if !Properties::<C>::is_valid() {
            log::error!("ZonedHeap::new - invalid configuration, zone size {}", C::ZONE_SIZE);
            return None;
        }

        let directory = ZoneDirectory::new(&platform)?;

        log::debug!("ZonedHeap::new - {} zones of {} bytes", directory.len(), C::ZONE_SIZE);

        Some(Self { directory, platform })
    }

    /// Returns a reference to the platform.
    pub fn platform(&self) -> &P { &self.platform }

    /// Returns the number of Zones.
    pub fn number_zones(&self) -> usize { self.directory.len() }

    /// Allocates a block of at least `size` bytes, aligned on 4 bytes.
    ///
    /// The content of the block is uninitialized.
    ///
    /// #   Errors
    ///
    /// -   `AllocationRefused` if `size` is 0.
    /// -   `SizeOverflow` if `size` is too large to be described by a block.
    /// -   `OutOfMemory` if `size` exceeds the capacity of a Zone, or no Zone can satisfy it.
    pub fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let size = aligned_size(size)?;

        self.allocate_block(size).map(|(pointer, _)| pointer)
    }

    /// Deallocates the block whose payload is `pointer`.
    ///
    /// Only the lock of the Zone containing the block is taken, and none if the pointer is not within any Zone.
    ///
    /// #   Errors
    ///
    /// -   `NullPointer` if `pointer` is null.
    /// -   `InvalidPointer` if `pointer` is not the payload of an allocated block of this heap.
    ///
    /// #   Safety
    ///
    /// -   Assumes that the block, if valid, is no longer referenced.
    pub unsafe fn deallocate(&self, pointer: *mut u8) -> Result<(), AllocError> {
        let pointer = NonNull::new(pointer).ok_or(AllocError::NullPointer)?;
        let zone = self.directory.find(pointer).ok_or(AllocError::InvalidPointer)?;

        zone.lock().deallocate(pointer)
    }

    /// Allocates a block for `count` elements of `size` bytes, zeroed.
    ///
    /// #   Errors
    ///
    /// -   `AllocationRefused` if the total is 0.
    /// -   `SizeOverflow` if the total overflows, or is too large to be described by a block.
    /// -   `OutOfMemory` if the total exceeds the capacity of a Zone, or no Zone can satisfy it.
    pub fn allocate_zeroed(&self, count: usize, size: usize) -> Result<NonNull<u8>, AllocError> {
        let total = count.checked_mul(size).ok_or(AllocError::SizeOverflow)?;
        let size = aligned_size(total)?;

        let (pointer, usable) = self.allocate_block(size)?;

        //  Safety:
        //  -   The payload spans `usable` bytes, exclusively accessible.
        unsafe { ptr::write_bytes(pointer.as_ptr(), 0, usable) };

        Ok(pointer)
    }

    /// Reallocates the block whose payload is `pointer` to hold `size` bytes.
    ///
    /// A null `pointer` is a fresh allocation. Shrinking keeps the block in place whenever its tail can be carved
    /// off, the carving and the release of the tail happening under the lock of its Zone; otherwise the content is
    /// moved to a new block, possibly in another Zone, the old block being deallocated.
    ///
    /// #   Errors
    ///
    /// -   `AllocationRefused` if `size` is 0, in which case the block is deallocated.
    /// -   `InvalidPointer` if `pointer` is not the payload of an allocated block of this heap.
    /// -   `SizeOverflow` if `size` is too large to be described by a block.
    /// -   `OutOfMemory` if no Zone can satisfy the request; the block is left untouched.
    ///
    /// #   Safety
    ///
    /// -   Assumes that the block, if valid, is no longer referenced unless the result is an error.
    pub unsafe fn reallocate(&self, pointer: *mut u8, size: usize) -> Result<NonNull<u8>, AllocError> {
        let Some(pointer) = NonNull::new(pointer) else { return self.allocate(size) };

        let zone = self.directory.find(pointer).ok_or(AllocError::InvalidPointer)?;

        if size == 0 {
            zone.lock().deallocate(pointer)?;
            return Err(AllocError::AllocationRefused);
        }

        let size = aligned_size(size)?;

        let current = {
            let mut state = zone.lock();
            let current = state.usable_size(pointer)?;

            if size < current && state.shrink(pointer, size)? {
                return Ok(pointer);
            }

            current
        };

        let (fresh, _) = self.allocate_block(size)?;

        //  Safety:
        //  -   Both payloads are distinct blocks, large enough.
        ptr::copy_nonoverlapping(pointer.as_ptr(), fresh.as_ptr(), cmp::min(current, size));

        zone.lock().deallocate(pointer)?;

        Ok(fresh)
    }

    //  Allocates a block of `size` bytes, `size` being aligned, returns its payload and usable size.
    fn allocate_block(&self, size: usize) -> Result<(NonNull<u8>, usize), AllocError> {
        if size > Properties::<C>::largest_allocation() {
            return Err(AllocError::OutOfMemory);
        }

        let mut zone = self.directory.select();
        let mut state = zone.lock();

        if !state.has_room_for(size) && self.directory.grow(&self.platform).is_none() {
            log::warn!("ZonedHeap::allocate - failed to append a zone, {} zones", self.directory.len());
        }

        let mut candidates = self.directory.len();

        loop {
            if let Some(result) = state.allocate(size) {
                return Ok(result);
            }

            candidates -= 1;

            if candidates == 0 {
                return Err(AllocError::OutOfMemory);
            }

            drop(state);

            zone = self.directory.next_wrapping(zone);
            state = zone.lock();
        }
    }
}

impl<C, P> Drop for ZonedHeap<C, P>
    where
        C: Configuration,
        P: Platform,
{
    fn drop(&mut self) {
        log::debug!("ZonedHeap::drop - releasing {} zones", self.directory.len());

        //  Safety:
        //  -   `self.platform` provided all Zones.
        //  -   Exclusive access to `self` guarantees no concurrent use, and allocations do not outlive the heap.
        unsafe { self.directory.close(&self.platform) };
    }
}

// mod tests
