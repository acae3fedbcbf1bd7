//! Plan IR, worker-input descriptors, and the serverless plan compiler.
//!
//! Architecture role:
//! - models join/aggregation plans as a logical table tree
//! - lowers plans into an operator DAG of scan, partition, join, and
//!   aggregation worker inputs connected by intermediate files
//! - sizes input splits from table layouts and their indices
//!
//! Key modules:
//! - [`plan`] — the logical table tree
//! - [`physical`] — worker-input descriptors and the operator DAG
//! - [`compiler`] — the recursive plan compiler
//! - [`splits`] — input-split sizing
//! - [`advisor`] — the join cost oracle seam
//! - [`layout`] — intermediate-path construction

pub mod advisor;
pub mod compiler;
pub mod layout;
pub mod physical;
pub mod plan;
mod splits;

pub use advisor::{JoinAdvisor, StaticJoinAdvisor};
pub use compiler::{PlanCompiler, PlannerEnv};
pub use physical::*;
pub use plan::*;
