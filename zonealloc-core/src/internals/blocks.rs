//! Blocks
//!
//! A Block represent a unit of allocation: a header immediately followed by its payload.
//!
//! Whilst allocated, the payload is purely in the hands of the user. The header, however, is owned by the Chain the
//! block belongs to, and records the size of the payload, whether the block is free, and where the next block of the
//! Chain lives.
//!
//! Note: Blocks are never _constructed_ by value, instead raw memory is reinterpreted as blocks.

mod block;
mod chain;

pub use block::HEADER_SIZE;

pub(crate) use block::{Block, BlockOffset, MAXIMUM_BLOCK_SIZE, MINIMUM_BLOCK_SIZE};
pub(crate) use chain::{Chain, Location};


#[cfg(test)]
pub(crate) use test::Store;
