//! Core types for RagMem.

mod identifiers;
mod memory;

pub use identifiers::*;
pub use memory::*;
