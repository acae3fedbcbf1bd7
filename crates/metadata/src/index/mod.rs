//! Split and projection indices plus their process-wide factory.

pub mod column_set;
pub mod factory;
pub mod projections_index;
pub mod splits_index;

pub use column_set::ColumnSet;
pub use factory::IndexFactory;
pub use projections_index::ProjectionsIndex;
pub use splits_index::{CostBasedSplitsIndex, InvertedSplitsIndex, SplitsIndex};
