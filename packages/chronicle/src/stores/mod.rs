//! Collaborator implementations backed by process memory.

pub mod memory;

pub use memory::MemoryStore;
