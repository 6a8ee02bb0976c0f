//! The header of a Block.

use core::{
    mem,
    num::NonZeroU32,
    ptr::{self, NonNull},
};

use crate::utils::{self, ALIGNMENT};

/// The number of bytes occupied by the header in front of each payload.
pub const HEADER_SIZE: usize = mem::size_of::<Block>();

/// The smallest payload a block may have.
pub(crate) const MINIMUM_BLOCK_SIZE: usize = ALIGNMENT;

/// The largest payload a block may have, so that its header and payload can be spanned by a 32-bits offset.
pub(crate) const MAXIMUM_BLOCK_SIZE: usize = (u32::MAX as usize & !(ALIGNMENT - 1)) - HEADER_SIZE;

/// Block.
///
/// The header stores 32-bits offsets, rather than pointers, so that it only requires an alignment of 4 bytes.
#[repr(C)]
pub(crate) struct Block {
    size: u32,
    next: Option<NonZeroU32>,
    free: bool,
}

impl Block {
    /// In-place constructs a `Block`.
    ///
    /// #   Safety
    ///
    /// -   Assumes that access to the memory location is exclusive.
    /// -   Assumes that there is sufficient memory available, for the header and the payload.
    /// -   Assumes that the pointer is correctly aligned.
    #[allow(clippy::cast_ptr_alignment)]
    pub(crate) unsafe fn initialize(at: NonNull<u8>, size: usize, next: Option<BlockOffset>, free: bool)
        -> NonNull<Block>
    {
        debug_assert!(utils::is_aligned(at));
        debug_assert!(size >= MINIMUM_BLOCK_SIZE && size <= MAXIMUM_BLOCK_SIZE);
        debug_assert!(size % ALIGNMENT == 0);

        let block = Block { size: size as u32, next: None, free };

        //  Safety:
        //  -   `at` is assumed to be sufficiently aligned.
        let ptr = at.as_ptr() as *mut Block;

        //  Safety:
        //  -   Access to the memory location is exclusive.
        //  -   `ptr` is assumed to be sufficiently sized.
        ptr::write(ptr, block);

        let mut result: NonNull<Block> = at.cast();
        result.as_mut().set_next(next);

        result
    }

    /// Returns the size of the payload.
    pub(crate) fn size(&self) -> usize { self.size as usize }

    /// Sets the size of the payload.
    pub(crate) fn set_size(&mut self, size: usize) {
        debug_assert!(size >= MINIMUM_BLOCK_SIZE && size <= MAXIMUM_BLOCK_SIZE);
        debug_assert!(size % ALIGNMENT == 0);

        self.size = size as u32;
    }

    /// Returns the offset of the next block, if any.
    pub(crate) fn next(&self) -> Option<BlockOffset> { self.next.map(|next| BlockOffset(next.get())) }

    /// Sets the offset of the next block.
    ///
    /// The head of a chain is never the successor of any block.
    pub(crate) fn set_next(&mut self, next: Option<BlockOffset>) {
        debug_assert!(next != Some(BlockOffset::HEAD));

        self.next = next.and_then(|next| NonZeroU32::new(next.0));
    }

    /// Returns whether the block is free.
    pub(crate) fn is_free(&self) -> bool { self.free }

    /// Sets whether the block is free.
    pub(crate) fn set_free(&mut self, free: bool) { self.free = free; }
}

/// BlockOffset.
///
/// The offset of a block header, relative to the base of its chain.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct BlockOffset(u32);

impl BlockOffset {
    /// The offset of the first block of any chain.
    pub(crate) const HEAD: BlockOffset = BlockOffset(0);

    /// Creates an instance, if `offset` can be represented.
    pub(crate) fn new(offset: usize) -> Option<Self> {
        debug_assert!(offset % ALIGNMENT == 0);

        u32::try_from(offset).ok().map(BlockOffset)
    }

    /// Returns the offset, in bytes.
    pub(crate) fn value(&self) -> usize { self.0 as usize }
}

// mod tests
