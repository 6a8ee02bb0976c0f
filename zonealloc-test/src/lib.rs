#![deny(missing_docs)]

//! Test support for zonealloc.
//!
//! -   `LockStep`, a multi-thread runner executing user-specified steps in lock-step across threads.
//! -   `fill` and `verify`, to write a pattern into a payload, then check that no other allocation overwrote it.
//! -   `read_number`, to read the knobs of a test from the environment.

mod environment;
mod lock_step;
mod pattern;

pub use environment::read_number;
pub use lock_step::LockStep;
pub use pattern::{fill, is_zeroed, verify, Mismatch};
