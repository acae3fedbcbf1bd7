#![deny(missing_docs)]

//! Shared configuration, error types, and IDs for strato crates.
//!
//! Architecture role:
//! - defines the executor configuration passed across layers
//! - provides common [`StratoError`] / [`Result`] contracts
//! - hosts strongly-typed identifier wrappers
//!
//! Key modules:
//! - [`config`]
//! - [`error`]
//! - [`ids`]

/// Executor configuration types.
pub mod config;
/// Shared error taxonomy.
pub mod error;
/// Strongly-typed identifier wrappers.
pub mod ids;

pub use config::{ExecutorConfig, SplitsIndexKind};
pub use error::{Result, StratoError};
pub use ids::QueryId;
