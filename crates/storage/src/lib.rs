//! Storage scheme model and path-listing abstraction for the strato planner.
//!
//! Architecture role:
//! - names the storage backends worker inputs/outputs refer to
//! - exposes the read-only [`Storage`] listing seam the split planner uses
//! - ships local-filesystem and in-memory implementations
//!
//! Key modules:
//! - [`scheme`]
//! - [`provider`]
//! - [`local`]
//! - [`memory`]

pub mod local;
pub mod memory;
pub mod provider;
pub mod scheme;

pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use provider::Storage;
pub use scheme::Scheme;
