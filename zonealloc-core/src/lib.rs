#![deny(missing_docs)]

//! Building blocks for a dual malloc family.
//!
//! zonealloc-core is a set of building blocks to build a custom malloc replacement with ease. It contains:
//! -   A single-threaded `Heap`, carving a single chain of blocks out of memory obtained by moving a program break.
//! -   A multi-threaded `ZonedHeap`, spreading allocations across independently locked Zones.
//! -   The `ProgramBreak` and `Platform` traits, used to obtain raw memory from the OS, leaving it up to the user to
//!     pick the appropriate OS primitives.

mod api;
mod internals;
mod utils;

pub use api::*;
