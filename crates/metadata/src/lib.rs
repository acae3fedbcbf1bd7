//! Metadata domain model, catalog service boundary, and split/projection
//! indices for the strato planner.
//!
//! Architecture role:
//! - typed layout/order/splits/projections model with boundary JSON decode
//! - the [`MetadataService`] seam the split planner consumes
//! - per-table split and projection indices with a snapshot cache
//!
//! Key modules:
//! - [`domain`]
//! - [`service`]
//! - [`index`]

pub mod domain;
pub mod index;
pub mod service;

pub use domain::{
    ColumnStats, Layout, Order, Projections, ProjectionPatternDef, SchemaTableName,
    SplitPatternDef, Splits,
};
pub use index::{ColumnSet, IndexFactory, ProjectionsIndex, SplitsIndex};
pub use service::MetadataService;
