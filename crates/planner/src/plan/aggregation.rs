use serde::{Deserialize, Serialize};
use strato_storage::Scheme;

use crate::plan::table::Table;

/// Aggregate function applied to one aggregate column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionType {
    /// Summation.
    Sum,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
    /// Row count.
    Count,
}

/// Final destination of an aggregation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputEndPoint {
    /// Storage scheme of the destination.
    pub scheme: Scheme,
    /// Destination folder; a trailing slash is enforced when paths are built.
    pub folder: String,
    /// Storage endpoint, when the scheme needs one.
    pub endpoint: Option<String>,
    /// Access credential.
    pub access_key: Option<String>,
    /// Secret credential.
    pub secret_key: Option<String>,
}

/// One aggregation node of the plan tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    /// The table being aggregated (base or joined).
    pub origin_table: Box<Table>,
    /// Group-key column ids within the origin table's columns.
    pub group_key_column_ids: Vec<usize>,
    /// Output aliases of the group-key columns.
    pub group_key_column_alias: Vec<String>,
    /// Bitmask selecting which group-key columns survive into the final
    /// result.
    pub group_key_column_projection: Vec<bool>,
    /// Aggregated column ids within the origin table's columns.
    pub aggregate_column_ids: Vec<usize>,
    /// Output aliases of the aggregate results.
    pub result_column_alias: Vec<String>,
    /// Display types of the aggregate results.
    pub result_column_types: Vec<String>,
    /// Aggregate function per aggregate column.
    pub function_types: Vec<FunctionType>,
    /// Where the final result is written.
    pub output_end_point: OutputEndPoint,
}
