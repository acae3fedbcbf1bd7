//! Worker-input descriptors: the serializable records handed to the
//! serverless worker runtime.
//!
//! All descriptors are immutable once built, with two sanctioned exceptions
//! performed through dedicated builders:
//! - an [`IncompleteChainJoin`] is grown with [`IncompleteChainJoin::extend`]
//!   and closed with [`IncompleteChainJoin::complete`];
//! - a completed join input feeding an aggregation gets its
//!   partial-aggregation directive and rerouted output via
//!   [`JoinInput::attach_partial_aggregation`] and [`JoinInput::output_mut`].

use serde::{Deserialize, Serialize};

use strato_common::{QueryId, Result, StratoError};

use crate::physical::domain::{
    BroadcastTableInfo, ChainJoinInfo, JoinInfo, MultiOutputInfo, OutputInfo,
    PartialAggregationInfo, PartitionInfo, PartitionedJoinInfo, PartitionedTableInfo,
    ScanTableInfo, StorageInfo,
};
use crate::plan::aggregation::FunctionType;

/// Input of a scan worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanInput {
    /// Owning query.
    pub query_id: QueryId,
    /// Table and splits to scan.
    pub table_info: ScanTableInfo,
    /// Projection over the scanned columns.
    pub scan_projection: Vec<bool>,
    /// Whether the worker partially aggregates its output.
    pub partial_aggregation_present: bool,
    /// Partial-aggregation directive when present.
    pub partial_aggregation_info: Option<PartialAggregationInfo>,
    /// Where the result is written.
    pub output: OutputInfo,
}

/// Input of a partition worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionInput {
    /// Owning query.
    pub query_id: QueryId,
    /// Table and splits to scan.
    pub table_info: ScanTableInfo,
    /// Projection kept through partitioning (a superset of the join
    /// projection).
    pub projection: Vec<bool>,
    /// Partitioning directive.
    pub partition_info: PartitionInfo,
    /// Partitioned file the worker writes.
    pub output: OutputInfo,
}

/// Input of a broadcast join worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastJoinInput {
    /// Owning query.
    pub query_id: QueryId,
    /// Small side, replicated to every worker.
    pub small_table: BroadcastTableInfo,
    /// Large side shard this worker probes.
    pub large_table: BroadcastTableInfo,
    /// Join directive.
    pub join_info: JoinInfo,
    /// Whether the worker partially aggregates its output.
    pub partial_aggregation_present: bool,
    /// Partial-aggregation directive when present.
    pub partial_aggregation_info: Option<PartialAggregationInfo>,
    /// Where the result files are written.
    pub output: MultiOutputInfo,
}

/// A broadcast chain join under construction: small sides only.
///
/// Holds `chain_tables.len() - 1` chain links. It may exist only as the sole
/// input of its operator while an enclosing join pipeline is still being
/// compiled; it never reaches the worker runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompleteChainJoin {
    /// Owning query.
    pub query_id: QueryId,
    /// Small tables accumulated so far, join order.
    pub chain_tables: Vec<BroadcastTableInfo>,
    /// Chain links between consecutive tables.
    pub chain_join_infos: Vec<ChainJoinInfo>,
}

impl IncompleteChainJoin {
    /// Start a chain from its first two small tables and the link between
    /// them.
    pub fn start(
        query_id: QueryId,
        first: BroadcastTableInfo,
        second: BroadcastTableInfo,
        link: ChainJoinInfo,
    ) -> Self {
        Self {
            query_id,
            chain_tables: vec![first, second],
            chain_join_infos: vec![link],
        }
    }

    /// Append one more small table and the link joining it.
    pub fn extend(&mut self, table: BroadcastTableInfo, link: ChainJoinInfo) {
        self.chain_tables.push(table);
        self.chain_join_infos.push(link);
    }

    /// Close the chain against a shard of the probe side.
    ///
    /// The closing link is appended so a complete input always carries one
    /// chain link per chain table.
    pub fn complete(
        &self,
        closing_link: ChainJoinInfo,
        large_table: BroadcastTableInfo,
        join_info: JoinInfo,
        output: MultiOutputInfo,
    ) -> BroadcastChainJoinInput {
        let mut chain_join_infos = self.chain_join_infos.clone();
        chain_join_infos.push(closing_link);
        BroadcastChainJoinInput {
            query_id: self.query_id,
            chain_tables: self.chain_tables.clone(),
            chain_join_infos,
            large_table,
            join_info,
            partial_aggregation_present: false,
            partial_aggregation_info: None,
            output,
        }
    }
}

/// Input of a broadcast chain join worker: all small sides in memory at
/// once, probing one shard of the large side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastChainJoinInput {
    /// Owning query.
    pub query_id: QueryId,
    /// Small tables, join order.
    pub chain_tables: Vec<BroadcastTableInfo>,
    /// One chain link per chain table, the last closing onto `large_table`.
    pub chain_join_infos: Vec<ChainJoinInfo>,
    /// Large side shard this worker probes.
    pub large_table: BroadcastTableInfo,
    /// Join directive of the closing probe.
    pub join_info: JoinInfo,
    /// Whether the worker partially aggregates its output.
    pub partial_aggregation_present: bool,
    /// Partial-aggregation directive when present.
    pub partial_aggregation_info: Option<PartialAggregationInfo>,
    /// Where the result files are written.
    pub output: MultiOutputInfo,
}

/// Input of a partitioned join worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionedJoinInput {
    /// Owning query.
    pub query_id: QueryId,
    /// Small side, pre-partitioned.
    pub small_table: PartitionedTableInfo,
    /// Large side, pre-partitioned to the same fan-out.
    pub large_table: PartitionedTableInfo,
    /// Join directive, naming the bucket this worker handles.
    pub join_info: PartitionedJoinInfo,
    /// Whether the worker partially aggregates its output.
    pub partial_aggregation_present: bool,
    /// Partial-aggregation directive when present.
    pub partial_aggregation_info: Option<PartialAggregationInfo>,
    /// Where the result files are written.
    pub output: MultiOutputInfo,
}

/// Input of a partitioned chain join worker: a broadcast chain evaluated in
/// memory before the final partitioned probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionedChainJoinInput {
    /// Owning query.
    pub query_id: QueryId,
    /// Small chain tables, join order.
    pub chain_tables: Vec<BroadcastTableInfo>,
    /// One chain link per chain table, the last closing onto the partitioned
    /// probe.
    pub chain_join_infos: Vec<ChainJoinInfo>,
    /// Small side of the partitioned probe.
    pub small_table: PartitionedTableInfo,
    /// Large side of the partitioned probe.
    pub large_table: PartitionedTableInfo,
    /// Join directive of the partitioned probe.
    pub join_info: PartitionedJoinInfo,
    /// Whether the worker partially aggregates its output.
    pub partial_aggregation_present: bool,
    /// Partial-aggregation directive when present.
    pub partial_aggregation_info: Option<PartialAggregationInfo>,
    /// Where the result files are written.
    pub output: MultiOutputInfo,
}

/// Input of an aggregation worker (pre-aggregation or final).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationInput {
    /// Owning query.
    pub query_id: QueryId,
    /// Partial-aggregation files to merge.
    pub input_files: Vec<String>,
    /// Where the input files live.
    pub input_storage: StorageInfo,
    /// Group-key column names in the input files.
    pub group_key_column_names: Vec<String>,
    /// Which group-key columns survive into the output.
    pub group_key_column_projection: Vec<bool>,
    /// Result column names.
    pub result_column_names: Vec<String>,
    /// Result column display types.
    pub result_column_types: Vec<String>,
    /// Aggregate function per result column.
    pub function_types: Vec<FunctionType>,
    /// Reader threads per worker.
    pub parallelism: usize,
    /// Where the result is written.
    pub output: OutputInfo,
}

/// Any join worker input produced by the join compilers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinInput {
    /// Plain broadcast join.
    Broadcast(BroadcastJoinInput),
    /// Completed broadcast chain join.
    BroadcastChain(BroadcastChainJoinInput),
    /// Broadcast chain join still under construction.
    IncompleteChain(IncompleteChainJoin),
    /// Partitioned join.
    Partitioned(PartitionedJoinInput),
    /// Partitioned chain join.
    PartitionedChain(PartitionedChainJoinInput),
}

impl JoinInput {
    /// Whether this input can be handed to the worker runtime.
    pub fn is_complete(&self) -> bool {
        !matches!(self, Self::IncompleteChain(_))
    }

    /// The multi-file output of a complete input.
    pub fn output(&self) -> Option<&MultiOutputInfo> {
        match self {
            Self::Broadcast(input) => Some(&input.output),
            Self::BroadcastChain(input) => Some(&input.output),
            Self::Partitioned(input) => Some(&input.output),
            Self::PartitionedChain(input) => Some(&input.output),
            Self::IncompleteChain(_) => None,
        }
    }

    /// Mutable access to the output of a complete input, used to reroute a
    /// join feeding an aggregation.
    pub fn output_mut(&mut self) -> Option<&mut MultiOutputInfo> {
        match self {
            Self::Broadcast(input) => Some(&mut input.output),
            Self::BroadcastChain(input) => Some(&mut input.output),
            Self::Partitioned(input) => Some(&mut input.output),
            Self::PartitionedChain(input) => Some(&mut input.output),
            Self::IncompleteChain(_) => None,
        }
    }

    /// Attach a partial-aggregation directive to a complete input.
    pub fn attach_partial_aggregation(&mut self, info: PartialAggregationInfo) -> Result<()> {
        let (present, slot) = match self {
            Self::Broadcast(input) => (
                &mut input.partial_aggregation_present,
                &mut input.partial_aggregation_info,
            ),
            Self::BroadcastChain(input) => (
                &mut input.partial_aggregation_present,
                &mut input.partial_aggregation_info,
            ),
            Self::Partitioned(input) => (
                &mut input.partial_aggregation_present,
                &mut input.partial_aggregation_info,
            ),
            Self::PartitionedChain(input) => (
                &mut input.partial_aggregation_present,
                &mut input.partial_aggregation_info,
            ),
            Self::IncompleteChain(_) => {
                return Err(StratoError::InvalidPlan(
                    "cannot aggregate over an incomplete chain join".to_string(),
                ))
            }
        };
        *present = true;
        *slot = Some(info);
        Ok(())
    }
}
