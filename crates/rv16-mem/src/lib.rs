//! Unified memory backed by a 32-set / 8-way tree-PLRU cache.

mod cache;
mod memory;

pub use cache::{NUM_SETS, NUM_WAYS};
pub use memory::{Memory, NUM_CELLS};
