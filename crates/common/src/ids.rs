//! Typed identifiers shared across planner components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable query identifier.
///
/// The id is part of every intermediate path the compiler emits, so it must
/// be unique across concurrently running queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryId(
    /// Raw numeric id value.
    pub u64,
);

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
