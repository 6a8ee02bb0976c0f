//! The internals of zonealloc-core.
//!
//! The internals provide all the heavy-lifting.

pub(crate) mod blocks;
pub(crate) mod zone;
pub(crate) mod zone_directory;
