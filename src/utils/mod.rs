//! Utility modules

pub mod memory_store;
pub mod validation;

pub use memory_store::MemoryRunStore;
pub use validation::validate_pool;
