// hartirq/src/trap/collections/mod.rs

//! # Subsystem Collections Module
//!
//! Fixed-capacity data structures backed by caller-provided storage. Nothing
//! here allocates; capacity is decided by whoever supplies the memory.

pub mod slot_pool;

// Re-export the SlotPool for easy access.
pub use self::slot_pool::SlotPool;
