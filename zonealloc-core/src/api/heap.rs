//! Heap
//!
//! A single-threaded heap, carving its allocations out of a single Chain grown, and shrunk, by moving the program
//! break.
//!
//! The Heap starts empty. Its Chain is created on the first allocation, extended whenever no free block fits a
//! request, and its free tail is returned to the OS as soon as it appears; when the last block is returned, the
//! Chain is empty anew.

use core::{
    cmp,
    ptr::{self, NonNull},
};

use crate::{AllocError, ProgramBreak};
use crate::internals::blocks::{Chain, Location, BlockOffset};
use crate::utils::{self, aligned_size, footprint, ALIGNMENT};

/// Heap.
///
/// The Heap has no internal synchronization, all its operations require exclusive access.
pub struct Heap<B> {
    program_break: B,
    chain: Chain,
}

impl<B> Heap<B> {
    /// Creates an empty Heap.
    pub const fn new(program_break: B) -> Self { Self { program_break, chain: Chain::new() } }

    /// Returns a reference to the program break.
    pub fn program_break(&self) -> &B { &self.program_break }

    /// Returns whether the Heap manages no memory at all.
    pub fn is_empty(&self) -> bool { self.chain.is_empty() }
}

impl<B> Heap<B>
    where
        B: ProgramBreak,
{
    /// Allocates a block of at least `size` bytes, aligned on 4 bytes.
    ///
    /// The content of the block is uninitialized.
    ///
    /// #   Errors
    ///
    /// -   `AllocationRefused` if `size` is 0.
    /// -   `SizeOverflow` if `size` is too large to be described by a block.
    /// -   `OutOfMemory` if the break cannot be moved.
    pub fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let size = aligned_size(size)?;

        self.allocate_block(size).map(|(pointer, _)| pointer)
    }

    /// Deallocates the block whose payload is `pointer`.
    ///
    /// If the block, once merged with its neighbours, ends the Chain, its memory is returned to the OS.
    ///
    /// #   Errors
    ///
    /// -   `NullPointer` if `pointer` is null.
    /// -   `InvalidPointer` if `pointer` is not the payload of an allocated block of this Heap.
    /// -   `OutOfMemory` if the break cannot be lowered; the block remains available in the Heap.
    ///
    /// #   Safety
    ///
    /// -   Assumes that the block, if valid, is no longer referenced.
    pub unsafe fn deallocate(&mut self, pointer: *mut u8) -> Result<(), AllocError> {
        let pointer = NonNull::new(pointer).ok_or(AllocError::NullPointer)?;
        let location = self.chain.locate(pointer).ok_or(AllocError::InvalidPointer)?;

        self.release(location)
    }

    /// Allocates a block for `count` elements of `size` bytes, zeroed.
    ///
    /// #   Errors
    ///
    /// -   `AllocationRefused` if the total is 0.
    /// -   `SizeOverflow` if the total overflows, or is too large to be described by a block.
    /// -   `OutOfMemory` if the break cannot be moved.
    pub fn allocate_zeroed(&mut self, count: usize, size: usize) -> Result<NonNull<u8>, AllocError> {
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
    /// off, otherwise the content is moved to a new block, the old block being deallocated.
    ///
    /// #   Errors
    ///
    /// -   `AllocationRefused` if `size` is 0, in which case the block is deallocated.
    /// -   `InvalidPointer` if `pointer` is not the payload of an allocated block of this Heap.
    /// -   `SizeOverflow` if `size` is too large to be described by a block.
    /// -   `OutOfMemory` if the break cannot be moved; the block is left untouched.
    ///
    /// #   Safety
    ///
    /// -   Assumes that the block, if valid, is no longer referenced unless the result is an error.
    pub unsafe fn reallocate(&mut self, pointer: *mut u8, size: usize) -> Result<NonNull<u8>, AllocError> {
        let Some(pointer) = NonNull::new(pointer) else { return self.allocate(size) };

        let location = self.chain.locate(pointer).ok_or(AllocError::InvalidPointer)?;

        //  A refused lowering of the break leaves the free tail within the Chain, hence is not an error here.
        if size == 0 {
            let _ = self.release(location);
            return Err(AllocError::AllocationRefused);
        }

        let size = aligned_size(size)?;
        let current = self.chain.size_of(location.block);

        if size < current {
            if let Some(carved) = self.chain.carve(location, size) {
                let _ = self.release(carved);
                return Ok(pointer);
            }
        }

        let (fresh, _) = self.allocate_block(size)?;

        //  Safety:
        //  -   Both payloads are distinct blocks, large enough.
        ptr::copy_nonoverlapping(pointer.as_ptr(), fresh.as_ptr(), cmp::min(current, size));

        //  The old block is located anew, as the allocation may have split its predecessor.
        let _ = self.deallocate(pointer.as_ptr());

        Ok(fresh)
    }

    //  Allocates a block of `size` bytes, `size` being aligned, returns its payload and usable size.
    fn allocate_block(&mut self, size: usize) -> Result<(NonNull<u8>, usize), AllocError> {
        if let Some(block) = self.chain.best_fit(size) {
            self.chain.occupy(block);
            self.chain.split(block, size);

            return Ok((self.chain.payload(block), self.chain.size_of(block)));
        }

        self.extend(size).map(|block| (self.chain.payload(block), size))
    }

    //  Extends the Chain with a new allocated block of `size` bytes, by moving the break.
    fn extend(&mut self, size: usize) -> Result<BlockOffset, AllocError> {
        let (previous, at) = self.grow(footprint(size))?;

        if self.chain.is_empty() {
            //  Safety:
            //  -   `at` points to `footprint(size)` bytes past the previous break, aligned.
            self.chain = unsafe { Chain::initialize(at, size, false) };

            return self.chain.head().ok_or(AllocError::OutOfMemory);
        }

        //  Safety:
        //  -   `at` points to `footprint(size)` bytes past the previous break, aligned.
        match unsafe { self.chain.append(at, size) } {
            Some(block) => Ok(block),
            None => {
                log::warn!("Heap::extend - {:?} cannot be appended to the chain", at);

                //  Safety:
                //  -   `previous` was returned by `grow`.
                unsafe { self.program_break.set(previous) };

                Err(AllocError::OutOfMemory)
            },
        }
    }

    //  Moves the break up by at least `increment` bytes, returns the previous break and the aligned start.
    fn grow(&mut self, increment: usize) -> Result<(NonNull<u8>, NonNull<u8>), AllocError> {
        //  Safety:
        //  -   The memory past the break is not referenced.
        let previous = unsafe { self.program_break.grow(increment) }.ok_or(AllocError::OutOfMemory)?;

        if utils::is_aligned(previous) {
            log::debug!("Heap::grow - {:?} by {}", previous, increment);

            return Ok((previous, previous));
        }

        let padding = ALIGNMENT - previous.as_ptr() as usize % ALIGNMENT;

        //  Safety:
        //  -   The memory past the break is not referenced.
        if unsafe { self.program_break.grow(padding) }.is_none() {
            //  Safety:
            //  -   `previous` was returned by `grow`.
            unsafe { self.program_break.set(previous) };

            return Err(AllocError::OutOfMemory);
        }

        //  Safety:
        //  -   `padding` bytes were obtained in addition to `increment`.
        let at = unsafe { NonNull::new_unchecked(previous.as_ptr().add(padding)) };

        log::debug!("Heap::grow - {:?} by {}, padded by {}", at, increment, padding);

        Ok((previous, at))
    }

    //  Releases an allocated block, and returns the free tail of the Chain, if any, to the OS.
    fn release(&mut self, location: Location) -> Result<(), AllocError> {
        let released = self.chain.release(location);

        if self.chain.next_of(released.block).is_some() {
            return Ok(());
        }

        let header = self.chain.header(released.block);
        let end = self.chain.payload(released.block).as_ptr() as usize + self.chain.size_of(released.block);

        //  Safety:
        //  -   Growing by 0 only queries the break.
        let current = unsafe { self.program_break.grow(0) };

        //  The break was moved past the tail by another party, the tail remains available to this Heap.
        if current.map(|current| current.as_ptr() as usize) != Some(end) {
            log::debug!("Heap::release - break moved past {:?}, keeping tail", header);
            return Ok(());
        }

        //  The tail is unlinked first, its header lying past the break once lowered.
        let truncated = self.chain.truncate(released);

        //  Safety:
        //  -   The tail is free, hence no longer referenced.
        if !unsafe { self.program_break.set(header) } {
            log::warn!("Heap::release - failed to lower break to {:?}", header);

            //  Safety:
            //  -   The Chain was not modified since, and the memory of the tail was not released.
            unsafe { self.chain.restore(truncated) };

            return Err(AllocError::OutOfMemory);
        }

        log::debug!("Heap::release - break lowered to {:?}", header);

        Ok(())
    }
}

// mod tests
