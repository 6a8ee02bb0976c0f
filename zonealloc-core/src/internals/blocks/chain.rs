//! Chain
//!
//! A Chain is an address-ordered singly-linked list of blocks, all located after its base.
//!
//! The blocks of a Chain are normally laid out back-to-back, however a Chain may be extended by appending a block
//! further away than the end of its current tail, in which case the two blocks are linked but not adjacent. Hence,
//! blocks are only ever merged when they are physically adjacent.
//!
//! The Chain maintains the following invariants:
//! -   The blocks are linked in strictly increasing address order, the first one lying at the base.
//! -   No two adjacent blocks are both free; a release immediately merges with free neighbours.
//! -   Every block has a payload of at least `MINIMUM_BLOCK_SIZE` bytes, multiple of `ALIGNMENT`.

use core::{iter, ptr::NonNull};

use crate::utils::{footprint, ALIGNMENT};

use super::{Block, BlockOffset, HEADER_SIZE, MAXIMUM_BLOCK_SIZE, MINIMUM_BLOCK_SIZE};

/// Chain.
pub(crate) struct Chain {
    base: Option<NonNull<u8>>,
    //  Offset of the first byte past the tail block.
    end: u32,
}

/// The location of an allocated block within its Chain, alongside its two predecessors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Location {
    /// The predecessor of `prev`, if any.
    pub(crate) before: Option<BlockOffset>,
    /// The predecessor of `block`, if any.
    pub(crate) prev: Option<BlockOffset>,
    /// The block.
    pub(crate) block: BlockOffset,
}

/// The free block resulting from the release of a block, alongside its predecessor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Released {
    /// The free block, possibly a predecessor of the released block, if they merged.
    pub(crate) block: BlockOffset,
    /// The predecessor of `block`, if any.
    pub(crate) predecessor: Option<BlockOffset>,
}

/// A tail block unlinked from its Chain.
#[must_use]
#[derive(Clone, Copy, Debug)]
pub(crate) struct Truncated {
    base: Option<NonNull<u8>>,
    end: u32,
    released: Released,
}

impl Chain {
    /// Creates an empty Chain.
    pub(crate) const fn new() -> Self { Self { base: None, end: 0 } }

    /// Creates a Chain comprising a single block, whose header lies at `at`.
    ///
    /// #   Safety
    ///
    /// -   Assumes that `at` points to `HEADER_SIZE + size` bytes, exclusively accessible for the lifetime of the Chain.
    /// -   Assumes that `at` is sufficiently aligned.
    /// -   Assumes that `size` is a multiple of `ALIGNMENT`, within `MINIMUM_BLOCK_SIZE` and `MAXIMUM_BLOCK_SIZE`.
    pub(crate) unsafe fn initialize(at: NonNull<u8>, size: usize, free: bool) -> Self {
        debug_assert!(size >= MINIMUM_BLOCK_SIZE && size <= MAXIMUM_BLOCK_SIZE);

        //  Safety:
        //  -   Forwarded to the caller.
        Block::initialize(at, size, None, free);

        Self { base: Some(at), end: footprint(size) as u32 }
    }

    /// Returns whether the Chain contains no block.
    pub(crate) fn is_empty(&self) -> bool { self.base.is_none() }

    /// Returns the first block, if any.
    pub(crate) fn head(&self) -> Option<BlockOffset> { self.base.map(|_| BlockOffset::HEAD) }

    /// Returns the last block, if any.
    pub(crate) fn tail(&self) -> Option<BlockOffset> { self.blocks().last() }

    /// Returns an iterator over the blocks, in address order.
    pub(crate) fn blocks(&self) -> impl Iterator<Item = BlockOffset> + '_ {
        iter::successors(self.head(), move |block| self.next_of(*block))
    }

    /// Returns the size of the payload of the block.
    pub(crate) fn size_of(&self, block: BlockOffset) -> usize { self.block(block).size() }

    /// Returns whether the block is free.
    pub(crate) fn is_free(&self, block: BlockOffset) -> bool { self.block(block).is_free() }

    /// Returns the successor of the block, if any.
    pub(crate) fn next_of(&self, block: BlockOffset) -> Option<BlockOffset> { self.block(block).next() }

    /// Returns the address of the header of the block.
    pub(crate) fn header(&self, block: BlockOffset) -> NonNull<u8> { self.address(block.value()) }

    /// Returns the address of the payload of the block.
    pub(crate) fn payload(&self, block: BlockOffset) -> NonNull<u8> { self.address(block.value() + HEADER_SIZE) }

    /// Returns the free block whose payload is the smallest of at least `size` bytes, if any.
    ///
    /// Ties are resolved in favor of the lowest address, and an exact match ends the search.
    pub(crate) fn best_fit(&self, size: usize) -> Option<BlockOffset> {
        let mut best: Option<(BlockOffset, usize)> = None;

        for block in self.blocks() {
            let header = self.block(block);

            if !header.is_free() || header.size() < size {
                continue;
            }

            if header.size() == size {
                return Some(block);
            }

            if best.map_or(true, |(_, best_size)| header.size() < best_size) {
                best = Some((block, header.size()));
            }
        }

        best.map(|(block, _)| block)
    }

    /// Marks the free block as allocated.
    pub(crate) fn occupy(&mut self, block: BlockOffset) {
        debug_assert!(self.is_free(block));

        self.block_mut(block).set_free(false);
    }

    /// Splits the free remainder of the block beyond `size` bytes into a new free block, if large enough.
    ///
    /// The remainder is large enough if it can hold a header and a minimal payload. Returns the new block, if any.
    pub(crate) fn split(&mut self, block: BlockOffset, size: usize) -> Option<BlockOffset> {
        self.divide(block, size, true)
    }

    /// Splits the remainder of the allocated block beyond `size` bytes into a new allocated block, if large enough.
    ///
    /// The new block can then be released as any other, to return the remainder to the Chain.
    pub(crate) fn carve(&mut self, location: Location, size: usize) -> Option<Location> {
        debug_assert!(!self.is_free(location.block));

        self.divide(location.block, size, false)
            .map(|carved| Location { before: location.prev, prev: Some(location.block), block: carved })
    }

    /// Appends a new allocated block, whose header lies at `at`, returns its offset.
    ///
    /// Returns None if the Chain is empty, if `at` lies before the end of the tail block, or if the block lies
    /// beyond what offsets can represent.
    ///
    /// #   Safety
    ///
    /// -   Assumes that `at` points to `HEADER_SIZE + size` bytes, exclusively accessible for the lifetime of the Chain.
    /// -   Assumes that `at` is sufficiently aligned.
    /// -   Assumes that `size` is a multiple of `ALIGNMENT`, within `MINIMUM_BLOCK_SIZE` and `MAXIMUM_BLOCK_SIZE`.
    pub(crate) unsafe fn append(&mut self, at: NonNull<u8>, size: usize) -> Option<BlockOffset> {
        let base = self.base?;

        let offset = (at.as_ptr() as usize).checked_sub(base.as_ptr() as usize)?;
        let end = offset.checked_add(footprint(size))?;

        if offset < self.end as usize || end > u32::MAX as usize {
            return None;
        }

        let block = BlockOffset::new(offset)?;
        let tail = self.tail()?;

        //  Safety:
        //  -   Forwarded to the caller.
        Block::initialize(at, size, None, false);

        self.block_mut(tail).set_next(Some(block));
        self.end = end as u32;

        Some(block)
    }

    /// Locates the allocated block whose payload starts at `payload`.
    ///
    /// Returns None if no block of the Chain has this payload, or if the block is free.
    pub(crate) fn locate(&self, payload: NonNull<u8>) -> Option<Location> {
        let base = self.base?.as_ptr() as usize;

        let offset = (payload.as_ptr() as usize)
            .checked_sub(base)?
            .checked_sub(HEADER_SIZE)?;

        if offset >= self.end as usize || offset % ALIGNMENT != 0 {
            return None;
        }

        let (mut before, mut prev) = (None, None);

        for block in self.blocks() {
            if block.value() == offset {
                return if self.is_free(block) { None } else { Some(Location { before, prev, block }) };
            }

            if block.value() > offset {
                return None;
            }

            before = prev;
            prev = Some(block);
        }

        None
    }

    /// Releases the allocated block, merging it with its free adjacent neighbours.
    ///
    /// The successor is absorbed first, then the block is absorbed into its predecessor, if applicable.
    pub(crate) fn release(&mut self, location: Location) -> Released {
        let Location { before, prev, block } = location;

        debug_assert!(!self.is_free(block));
        debug_assert!(prev.map_or(true, |prev| self.next_of(prev) == Some(block)));

        self.block_mut(block).set_free(true);

        if let Some(next) = self.next_of(block) {
            if self.is_free(next) && self.are_adjacent(block, next) {
                self.absorb(block, next);
            }
        }

        match prev {
            Some(prev) if self.is_free(prev) && self.are_adjacent(prev, block) => {
                self.absorb(prev, block);
                Released { block: prev, predecessor: before }
            },
            _ => Released { block, predecessor: prev },
        }
    }

    /// Unlinks the released tail block from the Chain, returns what `restore` needs to link it back.
    ///
    /// If the tail block was also the head block, the Chain is now empty. The header of the tail block is not
    /// accessed afterwards, so that its memory may be handed back to the OS.
    pub(crate) fn truncate(&mut self, released: Released) -> Truncated {
        debug_assert!(self.is_free(released.block));
        debug_assert!(self.next_of(released.block).is_none());

        let truncated = Truncated { base: self.base, end: self.end, released };

        match released.predecessor {
            None => {
                debug_assert_eq!(BlockOffset::HEAD, released.block);

                *self = Self::new();
            },
            Some(predecessor) => {
                self.block_mut(predecessor).set_next(None);
                self.end = released.block.value() as u32;
            },
        }

        truncated
    }

    /// Links back the tail block unlinked by `truncate`.
    ///
    /// #   Safety
    ///
    /// -   Assumes that the Chain was not modified since `truncate`.
    /// -   Assumes that the memory of the tail block is still accessible, untouched.
    pub(crate) unsafe fn restore(&mut self, truncated: Truncated) {
        let Truncated { base, end, released } = truncated;

        self.base = base;
        self.end = end;

        if let Some(predecessor) = released.predecessor {
            self.block_mut(predecessor).set_next(Some(released.block));
        }
    }

    //  Sets the size of `block` to `size`, and turns the remainder into a new block with the given status.
    fn divide(&mut self, block: BlockOffset, size: usize, free: bool) -> Option<BlockOffset> {
        let current = self.size_of(block);

        debug_assert!(size <= current);
        debug_assert!(size % ALIGNMENT == 0);

        if current - size < HEADER_SIZE + MINIMUM_BLOCK_SIZE {
            return None;
        }

        let remainder = BlockOffset::new(block.value() + footprint(size))?;
        let next = self.next_of(block);

        //  Safety:
        //  -   The remainder lies within the payload of `block`, exclusively accessible to the Chain.
        //  -   The remainder is aligned, as `block` and `size` are.
        unsafe { Block::initialize(self.header(remainder), current - footprint(size), next, free) };

        let header = self.block_mut(block);
        header.set_size(size);
        header.set_next(Some(remainder));

        Some(remainder)
    }

    //  Absorbs the header and payload of `victim` into `into`, its adjacent predecessor.
    fn absorb(&mut self, into: BlockOffset, victim: BlockOffset) {
        debug_assert!(self.are_adjacent(into, victim));

        let (size, next) = {
            let victim = self.block(victim);
            (victim.size(), victim.next())
        };

        let into = self.block_mut(into);
        into.set_size(into.size() + footprint(size));
        into.set_next(next);
    }

    //  Returns whether `first` ends exactly where `second` starts.
    fn are_adjacent(&self, first: BlockOffset, second: BlockOffset) -> bool {
        first.value() + footprint(self.size_of(first)) == second.value()
    }

    fn block(&self, block: BlockOffset) -> &Block {
        debug_assert!(block.value() + HEADER_SIZE <= self.end as usize);

        //  Safety:
        //  -   `block` was handed out by this Chain, hence points to a header.
        unsafe { self.address(block.value()).cast::<Block>().as_ref() }
    }

    fn block_mut(&mut self, block: BlockOffset) -> &mut Block {
        debug_assert!(block.value() + HEADER_SIZE <= self.end as usize);

        //  Safety:
        //  -   `block` was handed out by this Chain, hence points to a header.
        //  -   Access to the headers is exclusive, as `self` is borrowed mutably.
        unsafe { self.address(block.value()).cast::<Block>().as_mut() }
    }

    fn address(&self, offset: usize) -> NonNull<u8> {
        match self.base {
            //  Safety:
            //  -   `offset` is within the memory spanned by the Chain.
            Some(base) => unsafe { NonNull::new_unchecked(base.as_ptr().add(offset)) },
            None => unreachable!("No block in an empty chain"),
        }
    }
}

#[cfg(test)]
impl Chain {
    /// Checks the structural invariants of the Chain, and the contiguity of its blocks.
    pub(crate) fn assert_coherent(&self) {
        let mut previous: Option<BlockOffset> = None;

        for block in self.blocks() {
            let size = self.size_of(block);

            assert!(size >= MINIMUM_BLOCK_SIZE, "{:?} is undersized: {}", block, size);
            assert_eq!(0, size % ALIGNMENT, "{:?} is misaligned: {}", block, size);
            assert!(crate::utils::is_aligned(self.payload(block)));

            if let Some(previous) = previous {
                assert!(previous < block);
                assert!(self.are_adjacent(previous, block), "{:?} and {:?} not contiguous", previous, block);
                assert!(!(self.is_free(previous) && self.is_free(block)), "{:?} and {:?} both free", previous, block);
            }

            previous = Some(block);
        }

        if let Some(tail) = previous {
            assert_eq!(self.end as usize, tail.value() + footprint(self.size_of(tail)));
        }
    }

    /// Returns the total footprint of the free blocks.
    pub(crate) fn free_footprint(&self) -> usize {
        self.blocks()
            .filter(|block| self.is_free(*block))
            .map(|block| footprint(self.size_of(block)))
            .sum()
    }
}

//  Safety:
//  -   The Chain exclusively owns the headers of its blocks, wherever they are.
unsafe impl Send for Chain {}

#[cfg(test)]
mod tests {

use super::*;
use super::super::Store;

const STORE_BLOCK: usize = Store::SIZE - HEADER_SIZE;

fn create(store: &Store) -> Chain { unsafe { Chain::initialize(store.begin(), STORE_BLOCK, true) } }

//  Allocates a block of `size` bytes from the chain, as a heap would.
fn take(chain: &mut Chain, size: usize) -> BlockOffset {
    let block = chain.best_fit(size).unwrap();
    chain.occupy(block);
    chain.split(block, size);
    block
}

fn give(chain: &mut Chain, block: BlockOffset) -> Released {
    let location = chain.locate(chain.payload(block)).unwrap();
    chain.release(location)
}

fn sizes(chain: &Chain) -> Vec<(usize, bool)> {
    chain.blocks().map(|block| (chain.size_of(block), chain.is_free(block))).collect()
}

#[test]
fn chain_new() {
    let chain = Chain::new();

    assert!(chain.is_empty());
    assert_eq!(None, chain.head());
    assert_eq!(None, chain.tail());
    assert_eq!(None, chain.best_fit(4));
}

#[test]
fn chain_initialize() {
    let store = Store::default();
    let chain = create(&store);

    assert!(!chain.is_empty());
    assert_eq!(Some(BlockOffset::HEAD), chain.head());
    assert_eq!(Some(BlockOffset::HEAD), chain.tail());
    assert_eq!(vec![(STORE_BLOCK, true)], sizes(&chain));
    assert_eq!(store.begin(), chain.header(BlockOffset::HEAD));
    assert_eq!(store.at(HEADER_SIZE), chain.payload(BlockOffset::HEAD));

    chain.assert_coherent();
}

#[test]
fn chain_split_threshold() {
    let store = Store::default();

    //  Remainder of 12 bytes: too small for header and payload.
    let mut chain = create(&store);
    let block = take(&mut chain, STORE_BLOCK - 12);

    assert_eq!(vec![(STORE_BLOCK, false)], sizes(&chain));
    assert_eq!(None, chain.split(block, STORE_BLOCK - 12));

    //  Remainder of 16 bytes: just enough.
    let mut chain = create(&store);
    take(&mut chain, STORE_BLOCK - 16);

    assert_eq!(vec![(STORE_BLOCK - 16, false), (4, true)], sizes(&chain));

    chain.assert_coherent();
}

#[test]
fn chain_best_fit() {
    let store = Store::default();
    let mut chain = create(&store);

    let a = take(&mut chain, 200);
    take(&mut chain, 12);
    let h = take(&mut chain, 100);
    take(&mut chain, 12);

    give(&mut chain, a);
    give(&mut chain, h);

    chain.assert_coherent();

    assert_eq!(Some(h), chain.best_fit(80));
    assert_eq!(Some(h), chain.best_fit(100));
    assert_eq!(Some(a), chain.best_fit(150));
    assert_eq!(Some(a), chain.best_fit(200));
    assert_eq!(None, chain.best_fit(STORE_BLOCK));
}

#[test]
fn chain_best_fit_exact_match() {
    let store = Store::default();
    let mut chain = create(&store);

    let a = take(&mut chain, 100);
    take(&mut chain, 12);
    let b = take(&mut chain, 60);
    take(&mut chain, 12);

    give(&mut chain, a);
    give(&mut chain, b);

    //  The tail is larger than both, `a` is the first large enough, `b` the exact match.
    assert_eq!(Some(b), chain.best_fit(60));
    assert_eq!(Some(b), chain.best_fit(52));
    assert_eq!(Some(a), chain.best_fit(64));
}

#[test]
fn chain_locate() {
    let store = Store::default();
    let mut chain = create(&store);

    let a = take(&mut chain, 40);
    let b = take(&mut chain, 40);
    let c = take(&mut chain, 40);

    assert_eq!(
        Some(Location { before: None, prev: None, block: a }),
        chain.locate(chain.payload(a))
    );
    assert_eq!(
        Some(Location { before: None, prev: Some(a), block: b }),
        chain.locate(chain.payload(b))
    );
    assert_eq!(
        Some(Location { before: Some(a), prev: Some(b), block: c }),
        chain.locate(chain.payload(c))
    );

    //  Interior pointers, headers, and free blocks are not located.
    assert_eq!(None, chain.locate(store.at(HEADER_SIZE + 4)));
    assert_eq!(None, chain.locate(store.begin()));
    assert_eq!(None, chain.locate(chain.header(b)));

    let tail = chain.tail().unwrap();
    assert!(chain.is_free(tail));
    assert_eq!(None, chain.locate(chain.payload(tail)));

    //  Pointers outside the chain are not located.
    let outside = Store::default();
    assert_eq!(None, chain.locate(outside.at(HEADER_SIZE)));
    assert_eq!(None, Chain::new().locate(store.at(HEADER_SIZE)));
}

#[test]
fn chain_release_isolated() {
    let store = Store::default();
    let mut chain = create(&store);

    let a = take(&mut chain, 40);
    let b = take(&mut chain, 40);
    let c = take(&mut chain, 40);

    let released = give(&mut chain, b);

    assert_eq!(Released { block: b, predecessor: Some(a) }, released);
    assert_eq!(vec![(40, false), (40, true), (40, false), (STORE_BLOCK - 156, true)], sizes(&chain));
    assert_eq!(Some(c), chain.next_of(b));

    chain.assert_coherent();
}

#[test]
fn chain_release_coalesce() {
    let store = Store::default();
    let mut chain = create(&store);

    let a = take(&mut chain, 100);
    let b = take(&mut chain, 100);
    let c = take(&mut chain, 100);
    take(&mut chain, 12);

    //  Merge with predecessor.
    give(&mut chain, a);
    let released = give(&mut chain, b);

    assert_eq!(Released { block: a, predecessor: None }, released);
    assert_eq!(212, chain.size_of(a));

    chain.assert_coherent();

    //  Merge with both neighbours.
    let d = take(&mut chain, 100);
    assert_eq!(a, d);
    assert_eq!(vec![(100, false), (100, true), (100, false), (12, false), (STORE_BLOCK - 360, true)], sizes(&chain));

    give(&mut chain, c);
    assert_eq!(vec![(100, false), (212, true), (12, false), (STORE_BLOCK - 360, true)], sizes(&chain));

    let released = give(&mut chain, d);
    assert_eq!(Released { block: a, predecessor: None }, released);
    assert_eq!(vec![(324, true), (12, false), (STORE_BLOCK - 360, true)], sizes(&chain));

    chain.assert_coherent();
    assert_eq!(Some(a), chain.best_fit(324));
}

#[test]
fn chain_release_merge_successor() {
    let store = Store::default();
    let mut chain = create(&store);

    let a = take(&mut chain, 40);
    let b = take(&mut chain, 40);

    let released = give(&mut chain, b);

    assert_eq!(Released { block: b, predecessor: Some(a) }, released);
    assert_eq!(vec![(40, false), (STORE_BLOCK - 52, true)], sizes(&chain));
    assert_eq!(None, chain.next_of(b));

    chain.assert_coherent();
}

#[test]
fn chain_truncate() {
    let store = Store::default();
    let mut chain = create(&store);

    let a = take(&mut chain, 40);
    let b = take(&mut chain, 40);

    //  Release the free tail, merged with `b`.
    let released = give(&mut chain, b);
    let _ = chain.truncate(released);

    assert_eq!(vec![(40, false)], sizes(&chain));
    assert_eq!(Some(a), chain.tail());

    chain.assert_coherent();

    //  Release the last block.
    let released = give(&mut chain, a);
    assert_eq!(Released { block: a, predecessor: None }, released);

    let _ = chain.truncate(released);

    assert!(chain.is_empty());
}

#[test]
fn chain_restore() {
    let store = Store::default();
    let mut chain = create(&store);

    let a = take(&mut chain, 40);
    let b = take(&mut chain, 40);

    //  Restore a truncated tail.
    let released = give(&mut chain, b);
    let truncated = chain.truncate(released);

    unsafe { chain.restore(truncated) };

    assert_eq!(vec![(40, false), (STORE_BLOCK - 52, true)], sizes(&chain));
    assert_eq!(Some(b), chain.tail());

    chain.assert_coherent();

    //  Restore a truncated head.
    let released = give(&mut chain, a);
    let truncated = chain.truncate(released);

    assert!(chain.is_empty());

    unsafe { chain.restore(truncated) };

    assert_eq!(vec![(STORE_BLOCK, true)], sizes(&chain));
    assert_eq!(Some(a), chain.best_fit(STORE_BLOCK));

    chain.assert_coherent();
}

#[test]
fn chain_carve() {
    let store = Store::default();
    let mut chain = create(&store);

    let a = take(&mut chain, 200);
    let b = take(&mut chain, 40);

    let location = chain.locate(chain.payload(a)).unwrap();

    //  Too little left to carve.
    assert_eq!(None, chain.carve(location, 188));

    let carved = chain.carve(location, 52).unwrap();

    assert_eq!(Some(a), carved.prev);
    assert_eq!(None, carved.before);
    assert_eq!(52 + HEADER_SIZE, carved.block.value());
    assert_eq!(vec![(52, false), (136, false), (40, false), (STORE_BLOCK - 264, true)], sizes(&chain));

    chain.release(carved);
    assert_eq!(vec![(52, false), (136, true), (40, false), (STORE_BLOCK - 264, true)], sizes(&chain));

    chain.assert_coherent();

    //  Carving the block preceding a free block merges the remainder into it.
    let location = chain.locate(chain.payload(b)).unwrap();
    let carved = chain.carve(location, 20).unwrap();
    let released = chain.release(carved);

    assert_eq!(Released { block: carved.block, predecessor: Some(b) }, released);
    assert_eq!(vec![(52, false), (136, true), (20, false), (STORE_BLOCK - 244, true)], sizes(&chain));

    chain.assert_coherent();
}

#[test]
fn chain_append() {
    let store = Store::default();

    let mut chain = unsafe { Chain::initialize(store.begin(), 100, false) };

    //  Overlapping the tail.
    assert_eq!(None, unsafe { chain.append(store.at(108), 40) });

    let next = unsafe { chain.append(store.at(112), 200) };

    assert_eq!(BlockOffset::new(112), next);
    assert_eq!(next, chain.tail());
    assert_eq!(vec![(100, false), (200, false)], sizes(&chain));

    chain.assert_coherent();

    //  Non-adjacent blocks are linked, but never merged.
    let far = unsafe { chain.append(store.at(400), 40) }.unwrap();

    assert_eq!(vec![(100, false), (200, false), (40, false)], sizes(&chain));

    let released = give(&mut chain, next.unwrap());
    assert_eq!(Released { block: next.unwrap(), predecessor: Some(BlockOffset::HEAD) }, released);

    let released = give(&mut chain, far);
    assert_eq!(Released { block: far, predecessor: next }, released);
    assert_eq!(vec![(100, false), (200, true), (40, true)], sizes(&chain));

    //  Empty chains cannot be appended to.
    assert_eq!(None, unsafe { Chain::new().append(store.begin(), 40) });
}

#[test]
fn chain_free_footprint() {
    let store = Store::default();
    let mut chain = create(&store);

    assert_eq!(Store::SIZE, chain.free_footprint());

    let a = take(&mut chain, 100);
    take(&mut chain, 40);

    assert_eq!(Store::SIZE - 100 - 40 - 2 * HEADER_SIZE, chain.free_footprint());

    give(&mut chain, a);

    assert_eq!(Store::SIZE - 40 - HEADER_SIZE, chain.free_footprint());
}

} // mod tests
