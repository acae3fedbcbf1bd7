use serde::{Deserialize, Serialize};
use strato_storage::Scheme;

use crate::plan::aggregation::FunctionType;
use crate::plan::join::JoinType;

/// A contiguous slice of row groups within one columnar file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputInfo {
    /// File path.
    pub path: String,
    /// First row group of the slice.
    pub start_row_group_index: u32,
    /// Number of row groups; [`InputInfo::TO_END_OF_FILE`] reads to the end.
    pub row_group_count: i32,
}

impl InputInfo {
    /// Sentinel row-group count meaning "read to end of file".
    pub const TO_END_OF_FILE: i32 = -1;

    /// A slice of `row_group_count` row groups starting at
    /// `start_row_group_index`.
    pub fn new(path: impl Into<String>, start_row_group_index: u32, row_group_count: i32) -> Self {
        Self {
            path: path.into(),
            start_row_group_index,
            row_group_count,
        }
    }

    /// The whole file as one slice.
    pub fn whole_file(path: impl Into<String>) -> Self {
        Self::new(path, 0, Self::TO_END_OF_FILE)
    }
}

/// The unit of work read by one worker-thread slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSplit {
    /// File slices read by this slot, in order.
    pub input_infos: Vec<InputInfo>,
}

impl InputSplit {
    /// A split over the given slices.
    pub fn new(input_infos: Vec<InputInfo>) -> Self {
        Self { input_infos }
    }

    /// A split over a single slice.
    pub fn single(input_info: InputInfo) -> Self {
        Self {
            input_infos: vec![input_info],
        }
    }
}

/// Where a worker reads from or writes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    /// Storage scheme.
    pub scheme: Scheme,
    /// Endpoint, when the scheme needs one.
    pub endpoint: Option<String>,
    /// Access credential.
    pub access_key: Option<String>,
    /// Secret credential.
    pub secret_key: Option<String>,
}

impl StorageInfo {
    /// Storage named by scheme only, resolved by the worker's environment.
    pub fn bare(scheme: Scheme) -> Self {
        Self {
            scheme,
            endpoint: None,
            access_key: None,
            secret_key: None,
        }
    }
}

/// Single-file output of a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputInfo {
    /// Output file path.
    pub path: String,
    /// Whether the worker appends a random component to the path.
    pub random_file_name: bool,
    /// Where the output is written.
    pub storage_info: StorageInfo,
    /// Whether output columns are encoded.
    pub encoding: bool,
}

/// Multi-file output of a join worker: a directory plus file names inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiOutputInfo {
    /// Output directory, with a trailing slash.
    pub path: String,
    /// Where the outputs are written.
    pub storage_info: StorageInfo,
    /// Whether output columns are encoded.
    pub encoding: bool,
    /// Output file names relative to `path`.
    pub file_names: Vec<String>,
}

/// Table read by a scan or partition worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanTableInfo {
    /// Table name.
    pub table_name: String,
    /// Whether the table is a stored base table.
    pub base: bool,
    /// Splits assigned to this worker.
    pub input_splits: Vec<InputSplit>,
    /// Columns the worker reads.
    pub columns_to_read: Vec<String>,
    /// Serialized scan filter.
    pub filter: String,
}

/// Table side of a broadcast join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastTableInfo {
    /// Table name.
    pub table_name: String,
    /// Whether the table is a stored base table.
    pub base: bool,
    /// Splits this worker reads of the table.
    pub input_splits: Vec<InputSplit>,
    /// Columns the worker reads.
    pub columns_to_read: Vec<String>,
    /// Serialized scan filter.
    pub filter: String,
    /// Join-key column ids within `columns_to_read`.
    pub key_column_ids: Vec<usize>,
}

/// Table side of a partitioned join: pre-partitioned files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionedTableInfo {
    /// Table name.
    pub table_name: String,
    /// Whether the table is a stored base table.
    pub base: bool,
    /// Partitioned file paths, one per upstream partition worker.
    pub input_files: Vec<String>,
    /// Reader threads per worker.
    pub parallelism: usize,
    /// Columns the worker reads.
    pub columns_to_read: Vec<String>,
    /// Join-key column ids within `columns_to_read`.
    pub key_column_ids: Vec<usize>,
}

/// Hash-partitioning directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionInfo {
    /// Key column ids hashed for partitioning.
    pub key_column_ids: Vec<usize>,
    /// Partition fan-out.
    pub num_partition: usize,
}

/// Join directive of a broadcast join worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinInfo {
    /// Join type, oriented so the small side comes first.
    pub join_type: JoinType,
    /// Output aliases of the small side.
    pub small_column_alias: Vec<String>,
    /// Output aliases of the large side.
    pub large_column_alias: Vec<String>,
    /// Projection over the small side's columns.
    pub small_projection: Vec<bool>,
    /// Projection over the large side's columns.
    pub large_projection: Vec<bool>,
    /// Whether the worker hash-partitions its result for the parent.
    pub post_partition: bool,
    /// Post-partitioning directive when `post_partition` is set.
    pub post_partition_info: Option<PartitionInfo>,
}

/// One link of a broadcast chain: how the accumulated small-side result
/// joins the next table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainJoinInfo {
    /// Join type, oriented so the small side comes first.
    pub join_type: JoinType,
    /// Output aliases of the small side.
    pub small_column_alias: Vec<String>,
    /// Output aliases of the large side.
    pub large_column_alias: Vec<String>,
    /// Key column ids the chain result is keyed on for the next join.
    pub key_column_ids: Vec<usize>,
    /// Projection over the small side's columns.
    pub small_projection: Vec<bool>,
    /// Projection over the large side's columns.
    pub large_projection: Vec<bool>,
    /// Whether the worker hash-partitions its result for the parent.
    pub post_partition: bool,
    /// Post-partitioning directive when `post_partition` is set.
    pub post_partition_info: Option<PartitionInfo>,
}

/// Join directive of a partitioned join worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionedJoinInfo {
    /// Join type, oriented so the small side comes first.
    pub join_type: JoinType,
    /// Output aliases of the small side.
    pub small_column_alias: Vec<String>,
    /// Output aliases of the large side.
    pub large_column_alias: Vec<String>,
    /// Projection over the small side's columns.
    pub small_projection: Vec<bool>,
    /// Projection over the large side's columns.
    pub large_projection: Vec<bool>,
    /// Whether the worker hash-partitions its result for the parent.
    pub post_partition: bool,
    /// Post-partitioning directive when `post_partition` is set.
    pub post_partition_info: Option<PartitionInfo>,
    /// Common partition fan-out of both sides.
    pub num_partition: usize,
    /// Hash-bucket ids this worker joins.
    pub hash_values: Vec<usize>,
}

/// Partial-aggregation directive attached to scan and join workers feeding
/// an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialAggregationInfo {
    /// Output aliases of the group-key columns.
    pub group_key_column_alias: Vec<String>,
    /// Group-key column ids within the worker's output columns.
    pub group_key_column_ids: Vec<usize>,
    /// Aggregated column ids within the worker's output columns.
    pub aggregate_column_ids: Vec<usize>,
    /// Output aliases of the aggregate results.
    pub result_column_alias: Vec<String>,
    /// Display types of the aggregate results.
    pub result_column_types: Vec<String>,
    /// Aggregate function per aggregate column.
    pub function_types: Vec<FunctionType>,
}
