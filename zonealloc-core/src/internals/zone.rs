//! Zone
//!
//! A Zone is a fixed-capacity region of memory, obtained from the Platform, carved up by a Chain of its own.
//!
//! The meta-data of the Zone is constructed in place at the start of the region, the blocks of its Chain occupying
//! the remainder of the region:
//!
//! [ Zone | Block | payload | Block | payload | ... ]
//!
//! The Chain, and the count of remaining bytes, are protected by a per-Zone lock; the Zones themselves form a
//! singly-linked list which is only ever appended to, and is thus traversed without locking.

use core::{
    alloc::Layout,
    ptr::{self, NonNull},
    sync::atomic::{AtomicPtr, Ordering},
};

use parking_lot::{Mutex, MutexGuard};

use crate::{AllocError, Configuration, Platform, Properties};
use crate::utils::footprint;

use super::blocks::{Chain, HEADER_SIZE};

/// Zone.
pub(crate) struct Zone {
    //  Start of the Chain, right after the Zone itself.
    start: NonNull<u8>,
    capacity: usize,
    state: Mutex<ZoneState>,
    next: AtomicPtr<Zone>,
}

/// The mutable state of a Zone, protected by its lock.
pub(crate) struct ZoneState {
    chain: Chain,
    //  Sum of the footprints, headers included, of the free blocks.
    remaining: usize,
}

impl Zone {
    /// Allocates a region from the Platform, and constructs a Zone in place.
    ///
    /// The Chain of the Zone initially comprises a single free block, spanning the entire capacity.
    ///
    /// Returns None if the Platform cannot provide the region, or the Configuration is not valid.
    pub(crate) fn bootstrap<C, P>(platform: &P) -> Option<NonNull<Zone>>
        where
            C: Configuration,
            P: Platform,
    {
        if !Properties::<C>::is_valid() {
            return None;
        }

        let layout = Properties::<C>::zone_layout()?;
        let capacity = Properties::<C>::zone_capacity();

        //  Safety:
        //  -   `layout.size()` is a multiple of `layout.align()`, as per `is_valid`.
        let region = unsafe { platform.allocate(layout) }?;

        debug_assert!(region.as_ptr() as usize % layout.align() == 0);

        //  Safety:
        //  -   `zone_offset` is less than `ZONE_SIZE`, as per `is_valid`.
        let start = unsafe { NonNull::new_unchecked(region.as_ptr().add(Properties::<C>::zone_offset())) };

        //  Safety:
        //  -   The capacity lies within the region, exclusively accessible.
        //  -   `start` and `capacity` are aligned, as per `Properties`.
        let chain = unsafe { Chain::initialize(start, capacity - HEADER_SIZE, true) };

        let zone = Zone {
            start,
            capacity,
            state: Mutex::new(ZoneState { chain, remaining: capacity }),
            next: AtomicPtr::default(),
        };

        let result = region.cast::<Zone>();

        //  Safety:
        //  -   `region` is sufficiently sized and aligned for a Zone, as per `Properties`.
        //  -   Access to `region` is exclusive.
        unsafe { ptr::write(result.as_ptr(), zone) };

        Some(result)
    }

    /// Destroys the Zone, and returns its region to the Platform.
    ///
    /// #   Safety
    ///
    /// -   Assumes that `zone` was created by `bootstrap::<C, P>`, with this `platform`.
    /// -   Assumes that neither the Zone, nor any of its allocations, is referenced any longer.
    pub(crate) unsafe fn release<C, P>(zone: NonNull<Zone>, platform: &P)
        where
            C: Configuration,
            P: Platform,
    {
        //  Safety:
        //  -   `bootstrap` validated the layout.
        let layout = Layout::from_size_align_unchecked(C::ZONE_SIZE, Properties::<C>::zone_alignment());

        ptr::drop_in_place(zone.as_ptr());

        platform.deallocate(zone.cast(), layout);
    }

    /// Returns whether the header preceding `payload` lies within the capacity of the Zone.
    pub(crate) fn contains(&self, payload: NonNull<u8>) -> bool {
        let start = self.start.as_ptr() as usize;
        let header = (payload.as_ptr() as usize).wrapping_sub(HEADER_SIZE);

        header >= start && header < start + self.capacity
    }

    /// Locks the Zone.
    pub(crate) fn lock(&self) -> MutexGuard<'_, ZoneState> { self.state.lock() }

    /// Returns the next Zone, if any.
    pub(crate) fn next(&self) -> Option<NonNull<Zone>> { NonNull::new(self.next.load(Ordering::Acquire)) }

    /// Sets the next Zone.
    ///
    /// The next Zone may only be set once, it is never unset.
    pub(crate) fn set_next(&self, next: NonNull<Zone>) {
        debug_assert!(self.next().is_none());

        self.next.store(next.as_ptr(), Ordering::Release);
    }
}

impl ZoneState {
    /// Returns whether the Zone may be able to satisfy an allocation of `size` bytes.
    ///
    /// Even when it has room, the fragmentation of the Zone may prevent it from satisfying the allocation.
    pub(crate) fn has_room_for(&self, size: usize) -> bool { self.remaining >= footprint(size) }

    /// Allocates a block of at least `size` bytes, returns its payload and its usable size.
    ///
    /// `size` is assumed to be aligned.
    pub(crate) fn allocate(&mut self, size: usize) -> Option<(NonNull<u8>, usize)> {
        if !self.has_room_for(size) {
            return None;
        }

        let block = self.chain.best_fit(size)?;

        self.chain.occupy(block);
        self.chain.split(block, size);

        let usable = self.chain.size_of(block);

        debug_assert!(self.remaining >= footprint(usable));

        self.remaining -= footprint(usable);

        Some((self.chain.payload(block), usable))
    }

    /// Deallocates the block whose payload is `payload`.
    ///
    /// Fails if `payload` is not the payload of an allocated block of this Zone.
    pub(crate) fn deallocate(&mut self, payload: NonNull<u8>) -> Result<(), AllocError> {
        let location = self.chain.locate(payload).ok_or(AllocError::InvalidPointer)?;
        let size = self.chain.size_of(location.block);

        self.chain.release(location);
        self.remaining += footprint(size);

        Ok(())
    }

    /// Returns the usable size of the allocated block whose payload is `payload`.
    pub(crate) fn usable_size(&self, payload: NonNull<u8>) -> Result<usize, AllocError> {
        let location = self.chain.locate(payload).ok_or(AllocError::InvalidPointer)?;

        Ok(self.chain.size_of(location.block))
    }

    /// Shrinks the allocated block whose payload is `payload` to `size` bytes, in place.
    ///
    /// Returns false, leaving the block untouched, if its tail is too small to be turned into a block.
    pub(crate) fn shrink(&mut self, payload: NonNull<u8>, size: usize) -> Result<bool, AllocError> {
        let location = self.chain.locate(payload).ok_or(AllocError::InvalidPointer)?;
        let current = self.chain.size_of(location.block);

        debug_assert!(size <= current);

        let Some(carved) = self.chain.carve(location, size) else { return Ok(false) };

        self.chain.release(carved);
        self.remaining += current - size;

        Ok(true)
    }
}

#[cfg(test)]
impl ZoneState {
    /// Returns the number of bytes, headers included, in the free blocks of the Zone.
    pub(crate) fn remaining(&self) -> usize { self.remaining }

    /// Checks that the remaining count matches the blocks, and that the Chain is coherent.
    pub(crate) fn assert_coherent(&self) {
        self.chain.assert_coherent();

        assert_eq!(self.chain.free_footprint(), self.remaining);
    }
}

// mod tests
