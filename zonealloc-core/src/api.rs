//! The API of zonealloc-core.

mod configuration;
mod error;
mod heap;
mod platform;
mod zoned_heap;

pub use configuration::{Configuration, Properties};
pub use error::AllocError;
pub use heap::Heap;
pub use platform::{Platform, ProgramBreak};
pub use zoned_heap::ZonedHeap;

pub use crate::internals::blocks::HEADER_SIZE;
pub use crate::utils::ALIGNMENT;
