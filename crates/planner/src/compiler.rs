//! The plan compiler: lowers a logical table tree into the operator DAG of
//! serverless worker inputs.
//!
//! Compilation is a single recursive pass. Each call returns an owned
//! [`Operator`]; a caller may rewrite the operator it received from a child
//! (growing or closing an incomplete chain join, rerouting outputs) before
//! wiring it in as its own child. The prospective parent is threaded down as
//! a [`ParentHint`] borrow — operators never point back at their parents.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use strato_common::{ExecutorConfig, QueryId, Result, StratoError};
use strato_metadata::{IndexFactory, MetadataService};
use strato_storage::{Scheme, Storage};

use crate::advisor::JoinAdvisor;
use crate::layout;
use crate::physical::domain::{
    BroadcastTableInfo, ChainJoinInfo, InputInfo, InputSplit, JoinInfo, MultiOutputInfo,
    OutputInfo, PartialAggregationInfo, PartitionInfo, PartitionedJoinInfo, PartitionedTableInfo,
    ScanTableInfo, StorageInfo,
};
use crate::physical::input::{
    AggregationInput, BroadcastJoinInput, IncompleteChainJoin, JoinInput, PartitionInput,
    PartitionedChainJoinInput, PartitionedJoinInput, ScanInput,
};
use crate::physical::operator::{
    AggregationOperator, Operator, PartitionedJoinOperator, SingleStageJoinOperator,
};
use crate::plan::filter::TableScanFilter;
use crate::plan::join::{Join, JoinAlgorithm, JoinEndian, JoinType};
use crate::plan::table::{AggregatedTable, BaseTable, JoinedTable, Table};
use crate::splits;

/// Worker fan-out above which broadcast probe splits are worth re-packing.
const SPLIT_ADJUSTMENT_MIN_WORKERS: usize = 32;

/// Collaborator handles the compiler runs against.
///
/// The compiler is a function over `(plan, env)`: all external state —
/// catalog, storage listings, cost advice, index caches, configuration — is
/// reached through these handles.
#[derive(Clone)]
pub struct PlannerEnv {
    /// Catalog service.
    pub metadata: Arc<dyn MetadataService>,
    /// Input-storage listing handle.
    pub storage: Arc<dyn Storage>,
    /// Join cost oracle.
    pub advisor: Arc<dyn JoinAdvisor>,
    /// Process-wide split/projection index cache.
    pub indexes: Arc<IndexFactory>,
    /// Executor configuration.
    pub config: ExecutorConfig,
}

/// Which child of its parent a join being compiled is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildSide {
    Left,
    Right,
}

/// Borrowed view of the join that will consume the operator currently being
/// compiled, threaded down through the recursion.
#[derive(Clone, Copy)]
struct ParentHint<'a> {
    join: &'a Join,
    side: ChildSide,
}

impl ParentHint<'_> {
    fn is_small_left_broadcast(&self) -> bool {
        self.join.join_algo == JoinAlgorithm::Broadcast
            && self.join.join_endian == JoinEndian::SmallLeft
    }

    fn is_partitioned(&self) -> bool {
        self.join.join_algo == JoinAlgorithm::Partitioned
    }
}

/// Compiles one root table into its operator DAG.
pub struct PlanCompiler {
    query_id: QueryId,
    root: Table,
    env: PlannerEnv,
    ordered_path_enabled: bool,
    compact_path_enabled: bool,
    intermediate_root: String,
    input_scheme: Scheme,
    intermediate_scheme: Scheme,
}

impl std::fmt::Debug for PlanCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanCompiler")
            .field("query_id", &self.query_id)
            .field("root", &self.root)
            .field("ordered_path_enabled", &self.ordered_path_enabled)
            .field("compact_path_enabled", &self.compact_path_enabled)
            .field("intermediate_root", &self.intermediate_root)
            .field("input_scheme", &self.input_scheme)
            .field("intermediate_scheme", &self.intermediate_scheme)
            .finish_non_exhaustive()
    }
}

impl PlanCompiler {
    /// Create a compiler for a joined or aggregated root table.
    ///
    /// The plan is validated eagerly; configuration and scheme names are
    /// resolved once so compilation itself cannot fail on config errors.
    pub fn new(
        query_id: QueryId,
        root: Table,
        env: PlannerEnv,
        ordered_path_enabled: bool,
        compact_path_enabled: bool,
    ) -> Result<Self> {
        if root.is_base() {
            return Err(StratoError::InvalidPlan(
                "the root table must be a joined or aggregated table".to_string(),
            ));
        }
        root.validate()?;
        env.config.validate()?;
        let input_scheme = Scheme::from_name(&env.config.input_storage)?;
        let intermediate_scheme = Scheme::from_name(&env.config.intermediate_storage)?;
        let intermediate_root = env.config.intermediate_root();
        Ok(Self {
            query_id,
            root,
            env,
            ordered_path_enabled,
            compact_path_enabled,
            intermediate_root,
            input_scheme,
            intermediate_scheme,
        })
    }

    /// Compile the root table into its operator DAG.
    pub fn compile(&self) -> Result<Operator> {
        let operator = match &self.root {
            Table::Joined(joined) => self.join_operator(joined, None)?,
            Table::Aggregated(aggregated) => self.aggregation_operator(aggregated)?,
            Table::Base(_) => {
                return Err(StratoError::InvalidPlan(
                    "the root table must be a joined or aggregated table".to_string(),
                ))
            }
        };
        operator.verify()?;
        Ok(operator)
    }

    fn parallelism(&self) -> usize {
        self.env.config.intra_worker_parallelism
    }

    fn input_splits(&self, table: &BaseTable) -> Result<Vec<InputSplit>> {
        splits::input_splits(
            &self.env,
            table,
            self.ordered_path_enabled,
            self.compact_path_enabled,
        )
    }

    fn table_base(&self, joined: &JoinedTable) -> String {
        layout::table_base(
            &self.intermediate_root,
            self.query_id,
            &joined.schema_name,
            &joined.table_name,
        )
    }

    fn multi_output(&self, joined: &JoinedTable, file_names: Vec<String>) -> MultiOutputInfo {
        MultiOutputInfo {
            path: self.table_base(joined),
            storage_info: StorageInfo::bare(self.intermediate_scheme),
            encoding: true,
            file_names,
        }
    }

    fn scan_table_info(
        &self,
        table: &Table,
        input_splits: Vec<InputSplit>,
    ) -> Result<ScanTableInfo> {
        Ok(ScanTableInfo {
            table_name: table.table_name().to_string(),
            base: table.is_base(),
            input_splits,
            columns_to_read: table.column_names().to_vec(),
            filter: table_filter_json(table)?,
        })
    }

    fn broadcast_table_info(
        &self,
        table: &Table,
        input_splits: Vec<InputSplit>,
        key_column_ids: &[usize],
    ) -> Result<BroadcastTableInfo> {
        Ok(BroadcastTableInfo {
            table_name: table.table_name().to_string(),
            base: table.is_base(),
            input_splits,
            columns_to_read: table.column_names().to_vec(),
            filter: table_filter_json(table)?,
            key_column_ids: key_column_ids.to_vec(),
        })
    }

    /// Post-partitioning decision for the operator being compiled: set iff
    /// the parent is a partitioned join, keyed on whichever side of the
    /// parent this operator feeds, with the parent's own fan-out.
    fn post_partition(&self, parent: Option<ParentHint<'_>>) -> (bool, Option<PartitionInfo>) {
        let Some(parent) = parent.filter(|p| p.is_partitioned()) else {
            return (false, None);
        };
        let num_partition = self.env.advisor.num_partitions(
            &parent.join.left,
            &parent.join.right,
            parent.join.join_endian,
        );
        let key_column_ids = match parent.side {
            ChildSide::Left => parent.join.left_key_column_ids.clone(),
            ChildSide::Right => parent.join.right_key_column_ids.clone(),
        };
        (
            true,
            Some(PartitionInfo {
                key_column_ids,
                num_partition,
            }),
        )
    }

    /// Compile one join pipeline rooted at `joined`.
    ///
    /// Single-pipeline joins have a base table on the right; a joined left
    /// child is compiled first and may come back as an incomplete chain join
    /// that this level extends or completes. Joins over two joined children
    /// divert to the multi-pipeline compiler.
    fn join_operator(
        &self,
        joined: &JoinedTable,
        parent: Option<ParentHint<'_>>,
    ) -> Result<Operator> {
        let join = &joined.join;
        if join.left.is_joined() && join.right.is_joined() {
            return self.multi_pipeline_join_operator(joined, parent);
        }
        let Table::Base(right_table) = join.right.as_ref() else {
            return Err(StratoError::InvalidPlan(format!(
                "right child of join '{}' must be a base table",
                joined.table_name
            )));
        };

        let right_input_splits = self.input_splits(right_table)?;

        let mut left_input_splits = Vec::new();
        let mut left_partitioned_files = Vec::new();
        let mut child_operator = None;

        match join.left.as_ref() {
            Table::Base(left_base) => {
                left_input_splits = self.input_splits(left_base)?;
                if join.join_algo == JoinAlgorithm::Broadcast {
                    if let Some(parent) = parent.filter(|p| p.is_small_left_broadcast()) {
                        // First broadcast join of a chain: capture both base
                        // tables as chain tables and let an ancestor close
                        // the chain.
                        return self.initiate_chain_join(
                            joined,
                            left_input_splits,
                            right_input_splits,
                            parent,
                        );
                    }
                }
            }
            Table::Joined(left_joined) => {
                let hint = ParentHint {
                    join,
                    side: ChildSide::Left,
                };
                let mut child = self.join_operator(left_joined, Some(hint))?;
                if child.join_algo() == Some(JoinAlgorithm::BroadcastChain)
                    && join.join_algo == JoinAlgorithm::Broadcast
                    && join.join_endian == JoinEndian::SmallLeft
                {
                    return match parent.filter(|p| p.is_small_left_broadcast()) {
                        Some(parent) => {
                            // Still inside the chain: absorb this join's base
                            // table and hand the same operator back up.
                            self.extend_chain_join(&mut child, join, right_input_splits, parent)?;
                            Ok(child)
                        }
                        None => self.complete_chain_join(child, joined, right_input_splits, parent),
                    };
                }
                match join.join_algo {
                    JoinAlgorithm::Broadcast => {
                        left_input_splits = broadcast_input_splits(child.join_inputs())?;
                    }
                    JoinAlgorithm::Partitioned => {
                        left_partitioned_files = partitioned_files(child.join_inputs())?;
                    }
                    other => {
                        return Err(StratoError::InvalidPlan(format!(
                            "join '{}' carries compiler-assigned algorithm {other:?}",
                            joined.table_name
                        )))
                    }
                }
                child_operator = Some(child);
            }
            Table::Aggregated(_) => {
                return Err(StratoError::InvalidPlan(format!(
                    "join '{}' has an aggregated child",
                    joined.table_name
                )))
            }
        }

        match join.join_algo {
            JoinAlgorithm::Broadcast => self.broadcast_join_operator(
                joined,
                parent,
                left_input_splits,
                right_input_splits,
                child_operator,
            ),
            JoinAlgorithm::Partitioned => self.partitioned_join_operator(
                joined,
                parent,
                left_input_splits,
                left_partitioned_files,
                right_input_splits,
                child_operator,
            ),
            other => Err(StratoError::InvalidPlan(format!(
                "join '{}' carries compiler-assigned algorithm {other:?}",
                joined.table_name
            ))),
        }
    }

    /// Emit the inputs of a plain broadcast join, one worker per batch of
    /// probe-side splits.
    fn broadcast_join_operator(
        &self,
        joined: &JoinedTable,
        parent: Option<ParentHint<'_>>,
        left_input_splits: Vec<InputSplit>,
        right_input_splits: Vec<InputSplit>,
        child_operator: Option<Operator>,
    ) -> Result<Operator> {
        let join = &joined.join;
        let (post_partition, post_partition_info) = self.post_partition(parent);

        // Unfiltered sides write the most rows; smaller batches raise
        // external parallelism and cut result-writing latency.
        let both_unfiltered = matches!(join.left.as_ref(), Table::Base(b) if b.filter.is_empty())
            && matches!(join.right.as_ref(), Table::Base(b) if b.filter.is_empty());
        let batch_size = if both_unfiltered { 2 } else { self.parallelism() };

        let flipped = join.join_endian == JoinEndian::LargeLeft;
        let (small_side, small_splits, small_keys, large_side, large_splits, large_keys) =
            if flipped {
                (
                    &join.right,
                    right_input_splits,
                    &join.right_key_column_ids,
                    &join.left,
                    left_input_splits,
                    &join.left_key_column_ids,
                )
            } else {
                (
                    &join.left,
                    left_input_splits,
                    &join.left_key_column_ids,
                    &join.right,
                    right_input_splits,
                    &join.right_key_column_ids,
                )
            };

        let small_table = self.broadcast_table_info(small_side, small_splits, small_keys)?;
        let join_info = JoinInfo {
            join_type: if flipped {
                join.join_type.flip()
            } else {
                join.join_type
            },
            small_column_alias: if flipped {
                join.right_column_alias.clone()
            } else {
                join.left_column_alias.clone()
            },
            large_column_alias: if flipped {
                join.left_column_alias.clone()
            } else {
                join.right_column_alias.clone()
            },
            small_projection: if flipped {
                join.right_projection.clone()
            } else {
                join.left_projection.clone()
            },
            large_projection: if flipped {
                join.left_projection.clone()
            } else {
                join.right_projection.clone()
            },
            post_partition,
            post_partition_info,
        };

        let mut large_splits = large_splits;
        if parent.map_or(false, |p| p.is_partitioned() || p.is_small_left_broadcast()) {
            // Every parent worker reads this join's output, so fewer, larger
            // probe batches are cheaper overall.
            large_splits = self.adjust_broadcast_splits(small_side, large_side, large_splits);
        }

        let mut join_inputs = Vec::new();
        for (output_id, chunk) in large_splits.chunks(batch_size).enumerate() {
            let large_table = self.broadcast_table_info(large_side, chunk.to_vec(), large_keys)?;
            let output = self.multi_output(joined, vec![format!("{output_id}/join")]);
            join_inputs.push(JoinInput::Broadcast(BroadcastJoinInput {
                query_id: self.query_id,
                small_table: small_table.clone(),
                large_table,
                join_info: join_info.clone(),
                partial_aggregation_present: false,
                partial_aggregation_info: None,
                output,
            }));
        }

        let mut operator = SingleStageJoinOperator {
            name: joined.table_name.clone(),
            join_algo: JoinAlgorithm::Broadcast,
            join_inputs,
            small_child: None,
            large_child: None,
        };
        if flipped {
            operator.large_child = child_operator.map(Box::new);
        } else {
            operator.small_child = child_operator.map(Box::new);
        }
        Ok(Operator::SingleStageJoin(operator))
    }

    /// Emit a single-pipeline partitioned join: partition workers for every
    /// side not already partitioned by a child, then one join worker per
    /// bucket.
    fn partitioned_join_operator(
        &self,
        joined: &JoinedTable,
        parent: Option<ParentHint<'_>>,
        left_input_splits: Vec<InputSplit>,
        left_partitioned_files: Vec<String>,
        right_input_splits: Vec<InputSplit>,
        child_operator: Option<Operator>,
    ) -> Result<Operator> {
        let join = &joined.join;
        let num_partition =
            self.env
                .advisor
                .num_partitions(&join.left, &join.right, join.join_endian);
        let small_left = join.join_endian == JoinEndian::SmallLeft;

        if let Some(child) = child_operator {
            // The left side was post-partitioned by the child operator; only
            // the right base table still needs a partition stage.
            let left_table_info = PartitionedTableInfo {
                table_name: join.left.table_name().to_string(),
                base: false,
                input_files: left_partitioned_files,
                parallelism: self.parallelism(),
                columns_to_read: join.left.column_names().to_vec(),
                key_column_ids: join.left_key_column_ids.clone(),
            };

            let right_partition_projection =
                partition_projection(&join.right, &join.right_projection)?;
            let right_output_base =
                format!("{}{}/", self.table_base(joined), join.right.table_name());
            let right_partition_inputs = self.partition_inputs(
                &join.right,
                right_input_splits,
                &join.right_key_column_ids,
                &right_partition_projection,
                num_partition,
                &right_output_base,
            )?;
            let right_table_info = self.partitioned_table_info(
                &join.right,
                &join.right_key_column_ids,
                &right_partition_inputs,
                &right_partition_projection,
            )?;

            let join_inputs = self.partitioned_join_inputs(
                joined,
                parent,
                num_partition,
                left_table_info,
                right_table_info,
                None,
                Some(&right_partition_projection),
            )?;

            let mut operator = PartitionedJoinOperator {
                name: joined.table_name.clone(),
                join_algo: JoinAlgorithm::Partitioned,
                small_partition_inputs: Vec::new(),
                large_partition_inputs: Vec::new(),
                join_inputs,
                small_child: None,
                large_child: None,
            };
            if small_left {
                operator.large_partition_inputs = right_partition_inputs;
                operator.small_child = Some(Box::new(child));
            } else {
                operator.small_partition_inputs = right_partition_inputs;
                operator.large_child = Some(Box::new(child));
            }
            Ok(Operator::PartitionedJoin(operator))
        } else {
            // Two base tables: partition both sides symmetrically.
            let left_partition_projection =
                partition_projection(&join.left, &join.left_projection)?;
            let left_output_base =
                format!("{}{}/", self.table_base(joined), join.left.table_name());
            let left_partition_inputs = self.partition_inputs(
                &join.left,
                left_input_splits,
                &join.left_key_column_ids,
                &left_partition_projection,
                num_partition,
                &left_output_base,
            )?;
            let left_table_info = self.partitioned_table_info(
                &join.left,
                &join.left_key_column_ids,
                &left_partition_inputs,
                &left_partition_projection,
            )?;

            let right_partition_projection =
                partition_projection(&join.right, &join.right_projection)?;
            let right_output_base =
                format!("{}{}/", self.table_base(joined), join.right.table_name());
            let right_partition_inputs = self.partition_inputs(
                &join.right,
                right_input_splits,
                &join.right_key_column_ids,
                &right_partition_projection,
                num_partition,
                &right_output_base,
            )?;
            let right_table_info = self.partitioned_table_info(
                &join.right,
                &join.right_key_column_ids,
                &right_partition_inputs,
                &right_partition_projection,
            )?;

            let join_inputs = self.partitioned_join_inputs(
                joined,
                parent,
                num_partition,
                left_table_info,
                right_table_info,
                Some(&left_partition_projection),
                Some(&right_partition_projection),
            )?;

            let (small_partition_inputs, large_partition_inputs) = if small_left {
                (left_partition_inputs, right_partition_inputs)
            } else {
                (right_partition_inputs, left_partition_inputs)
            };
            Ok(Operator::PartitionedJoin(PartitionedJoinOperator {
                name: joined.table_name.clone(),
                join_algo: JoinAlgorithm::Partitioned,
                small_partition_inputs,
                large_partition_inputs,
                join_inputs,
                small_child: None,
                large_child: None,
            }))
        }
    }

    /// Start an incomplete chain join from the first two base tables of a
    /// broadcast chain, keyed onto the parent's left keys.
    fn initiate_chain_join(
        &self,
        joined: &JoinedTable,
        left_input_splits: Vec<InputSplit>,
        right_input_splits: Vec<InputSplit>,
        parent: ParentHint<'_>,
    ) -> Result<Operator> {
        let join = &joined.join;
        let left_table_info =
            self.broadcast_table_info(&join.left, left_input_splits, &join.left_key_column_ids)?;
        let right_table_info = self.broadcast_table_info(
            &join.right,
            right_input_splits,
            &join.right_key_column_ids,
        )?;

        // Order the chain tables so the small side comes first.
        let (first, second, link) = if join.join_endian == JoinEndian::SmallLeft {
            (
                left_table_info,
                right_table_info,
                ChainJoinInfo {
                    join_type: join.join_type,
                    small_column_alias: join.left_column_alias.clone(),
                    large_column_alias: join.right_column_alias.clone(),
                    key_column_ids: parent.join.left_key_column_ids.clone(),
                    small_projection: join.left_projection.clone(),
                    large_projection: join.right_projection.clone(),
                    post_partition: false,
                    post_partition_info: None,
                },
            )
        } else {
            (
                right_table_info,
                left_table_info,
                ChainJoinInfo {
                    join_type: join.join_type.flip(),
                    small_column_alias: join.right_column_alias.clone(),
                    large_column_alias: join.left_column_alias.clone(),
                    key_column_ids: parent.join.left_key_column_ids.clone(),
                    small_projection: join.right_projection.clone(),
                    large_projection: join.left_projection.clone(),
                    post_partition: false,
                    post_partition_info: None,
                },
            )
        };

        debug!(table = %joined.table_name, "starting broadcast chain join");
        let stage = IncompleteChainJoin::start(self.query_id, first, second, link);
        Ok(Operator::SingleStageJoin(SingleStageJoinOperator {
            name: joined.table_name.clone(),
            join_algo: JoinAlgorithm::BroadcastChain,
            join_inputs: vec![JoinInput::IncompleteChain(stage)],
            small_child: None,
            large_child: None,
        }))
    }

    /// Absorb the current join's base table into the child's incomplete
    /// chain, keyed onto the parent's left keys.
    fn extend_chain_join(
        &self,
        child: &mut Operator,
        join: &Join,
        right_input_splits: Vec<InputSplit>,
        parent: ParentHint<'_>,
    ) -> Result<()> {
        let right_table_info = self.broadcast_table_info(
            &join.right,
            right_input_splits,
            &join.right_key_column_ids,
        )?;
        let link = ChainJoinInfo {
            join_type: join.join_type,
            small_column_alias: join.left_column_alias.clone(),
            large_column_alias: join.right_column_alias.clone(),
            key_column_ids: parent.join.left_key_column_ids.clone(),
            small_projection: join.left_projection.clone(),
            large_projection: join.right_projection.clone(),
            post_partition: false,
            post_partition_info: None,
        };
        let stage = sole_incomplete_chain_mut(child)?;
        stage.extend(right_table_info, link);
        debug!(table = %join.right.table_name(), "extended broadcast chain join");
        Ok(())
    }

    /// Close the child's incomplete chain against the current join's base
    /// probe side, one completed input per batch of probe splits.
    fn complete_chain_join(
        &self,
        child: Operator,
        joined: &JoinedTable,
        right_input_splits: Vec<InputSplit>,
        parent: Option<ParentHint<'_>>,
    ) -> Result<Operator> {
        let join = &joined.join;
        let (post_partition, post_partition_info) = self.post_partition(parent);

        let mut right_input_splits = right_input_splits;
        if parent.map_or(false, |p| p.is_partitioned()) {
            // Every partition worker of the parent reads this output.
            right_input_splits =
                self.adjust_broadcast_splits(&join.left, &join.right, right_input_splits);
        }

        let join_info = JoinInfo {
            join_type: join.join_type,
            small_column_alias: join.left_column_alias.clone(),
            large_column_alias: join.right_column_alias.clone(),
            small_projection: join.left_projection.clone(),
            large_projection: join.right_projection.clone(),
            post_partition,
            post_partition_info: post_partition_info.clone(),
        };

        let stage = sole_incomplete_chain(&child)?.clone();
        let mut join_inputs = Vec::new();
        for (output_id, chunk) in right_input_splits.chunks(self.parallelism()).enumerate() {
            let large_table = self.broadcast_table_info(
                &join.right,
                chunk.to_vec(),
                &join.right_key_column_ids,
            )?;
            let output = self.multi_output(joined, vec![format!("{output_id}/join")]);
            let closing_link = ChainJoinInfo {
                join_type: join.join_type,
                small_column_alias: join.left_column_alias.clone(),
                large_column_alias: join.right_column_alias.clone(),
                key_column_ids: join.right_key_column_ids.clone(),
                small_projection: join.left_projection.clone(),
                large_projection: join.right_projection.clone(),
                post_partition,
                post_partition_info: post_partition_info.clone(),
            };
            join_inputs.push(JoinInput::BroadcastChain(stage.complete(
                closing_link,
                large_table,
                join_info.clone(),
                output,
            )));
        }

        info!(
            table = %joined.table_name,
            workers = join_inputs.len(),
            chain_len = stage.chain_tables.len(),
            "completed broadcast chain join"
        );
        Ok(Operator::SingleStageJoin(SingleStageJoinOperator {
            name: joined.table_name.clone(),
            join_algo: JoinAlgorithm::BroadcastChain,
            join_inputs,
            small_child: None,
            large_child: None,
        }))
    }

    /// Compile a join whose children are both joined tables.
    fn multi_pipeline_join_operator(
        &self,
        joined: &JoinedTable,
        parent: Option<ParentHint<'_>>,
    ) -> Result<Operator> {
        let join = &joined.join;
        let (Table::Joined(left_joined), Table::Joined(right_joined)) =
            (join.left.as_ref(), join.right.as_ref())
        else {
            return Err(StratoError::InvalidPlan(format!(
                "join '{}' is not a multi-pipeline join",
                joined.table_name
            )));
        };
        if join.join_endian != JoinEndian::SmallLeft {
            return Err(StratoError::InvalidPlan(format!(
                "multi-pipeline join '{}' must be small-left",
                joined.table_name
            )));
        }

        match join.join_algo {
            JoinAlgorithm::Broadcast => {
                // The left pipeline must fold into an incomplete chain that
                // this join either closes against the right pipeline's
                // outputs or fuses into the right partitioned join.
                let left_operator = self.join_operator(
                    left_joined,
                    Some(ParentHint {
                        join,
                        side: ChildSide::Left,
                    }),
                )?;
                let right_operator = self.join_operator(right_joined, None)?;
                if left_operator.join_algo() != Some(JoinAlgorithm::BroadcastChain) {
                    // A small-left broadcast over two join pipelines cannot
                    // always be chained; such plans are rejected rather than
                    // recompiled with another algorithm.
                    return Err(StratoError::InvalidPlan(format!(
                        "the small-left child of join '{}' did not form a broadcast chain",
                        joined.table_name
                    )));
                }
                let stage = sole_incomplete_chain(&left_operator)?.clone();
                let (post_partition, post_partition_info) = self.post_partition(parent);

                match right_operator.join_algo() {
                    Some(JoinAlgorithm::Broadcast) | Some(JoinAlgorithm::BroadcastChain) => {
                        // Probe the right pipeline's output files, one split
                        // per file.
                        let right_splits = broadcast_input_splits(right_operator.join_inputs())?;
                        let join_info = JoinInfo {
                            join_type: join.join_type,
                            small_column_alias: join.left_column_alias.clone(),
                            large_column_alias: join.right_column_alias.clone(),
                            small_projection: join.left_projection.clone(),
                            large_projection: join.right_projection.clone(),
                            post_partition,
                            post_partition_info: post_partition_info.clone(),
                        };
                        let mut join_inputs = Vec::new();
                        for (output_id, chunk) in
                            right_splits.chunks(self.parallelism()).enumerate()
                        {
                            let large_table = self.broadcast_table_info(
                                &join.right,
                                chunk.to_vec(),
                                &join.right_key_column_ids,
                            )?;
                            let output =
                                self.multi_output(joined, vec![format!("{output_id}/join")]);
                            let closing_link = ChainJoinInfo {
                                join_type: join.join_type,
                                small_column_alias: join.left_column_alias.clone(),
                                large_column_alias: join.right_column_alias.clone(),
                                key_column_ids: join.right_key_column_ids.clone(),
                                small_projection: join.left_projection.clone(),
                                large_projection: join.right_projection.clone(),
                                post_partition,
                                post_partition_info: post_partition_info.clone(),
                            };
                            join_inputs.push(JoinInput::BroadcastChain(stage.complete(
                                closing_link,
                                large_table,
                                join_info.clone(),
                                output,
                            )));
                        }
                        Ok(Operator::SingleStageJoin(SingleStageJoinOperator {
                            name: joined.table_name.clone(),
                            join_algo: JoinAlgorithm::BroadcastChain,
                            join_inputs,
                            small_child: None,
                            large_child: Some(Box::new(right_operator)),
                        }))
                    }
                    Some(JoinAlgorithm::Partitioned) => {
                        // Fuse the chain in front of every partitioned probe
                        // of the right operator.
                        let closing_link = ChainJoinInfo {
                            join_type: join.join_type,
                            small_column_alias: join.left_column_alias.clone(),
                            large_column_alias: join.right_column_alias.clone(),
                            key_column_ids: join.right_key_column_ids.clone(),
                            small_projection: join.left_projection.clone(),
                            large_projection: join.right_projection.clone(),
                            post_partition,
                            post_partition_info,
                        };
                        let mut chain_join_infos = stage.chain_join_infos.clone();
                        chain_join_infos.push(closing_link);
                        let chain_tables = stage.chain_tables.clone();

                        let Operator::PartitionedJoin(right_operator) = right_operator else {
                            return Err(StratoError::InvalidPlan(format!(
                                "partitioned child of join '{}' is not a partitioned operator",
                                joined.table_name
                            )));
                        };
                        let mut join_inputs = Vec::with_capacity(right_operator.join_inputs.len());
                        for input in right_operator.join_inputs {
                            let JoinInput::Partitioned(partitioned) = input else {
                                return Err(StratoError::InvalidPlan(format!(
                                    "partitioned child of join '{}' holds a non-partitioned input",
                                    joined.table_name
                                )));
                            };
                            join_inputs.push(JoinInput::PartitionedChain(
                                PartitionedChainJoinInput {
                                    query_id: self.query_id,
                                    chain_tables: chain_tables.clone(),
                                    chain_join_infos: chain_join_infos.clone(),
                                    small_table: partitioned.small_table,
                                    large_table: partitioned.large_table,
                                    join_info: partitioned.join_info,
                                    partial_aggregation_present: false,
                                    partial_aggregation_info: None,
                                    output: partitioned.output,
                                },
                            ));
                        }
                        info!(
                            table = %joined.table_name,
                            chain_len = chain_tables.len(),
                            "fused broadcast chain into partitioned join"
                        );
                        Ok(Operator::PartitionedJoin(PartitionedJoinOperator {
                            name: joined.table_name.clone(),
                            join_algo: JoinAlgorithm::PartitionedChain,
                            small_partition_inputs: right_operator.small_partition_inputs,
                            large_partition_inputs: right_operator.large_partition_inputs,
                            join_inputs,
                            small_child: right_operator.small_child,
                            large_child: right_operator.large_child,
                        }))
                    }
                    algo => Err(StratoError::InvalidPlan(format!(
                        "the large-right child of join '{}' compiled to {algo:?}; only \
                         broadcast, broadcast-chain, or partitioned children are accepted",
                        joined.table_name
                    ))),
                }
            }
            JoinAlgorithm::Partitioned => {
                // Both pipelines post-partition their outputs; join their
                // files bucket by bucket.
                let left_operator = self.join_operator(
                    left_joined,
                    Some(ParentHint {
                        join,
                        side: ChildSide::Left,
                    }),
                )?;
                let right_operator = self.join_operator(
                    right_joined,
                    Some(ParentHint {
                        join,
                        side: ChildSide::Right,
                    }),
                )?;

                let left_table_info = PartitionedTableInfo {
                    table_name: left_joined.table_name.clone(),
                    base: false,
                    input_files: partitioned_files(left_operator.join_inputs())?,
                    parallelism: self.parallelism(),
                    columns_to_read: left_joined.column_names.clone(),
                    key_column_ids: join.left_key_column_ids.clone(),
                };
                let right_table_info = PartitionedTableInfo {
                    table_name: right_joined.table_name.clone(),
                    base: false,
                    input_files: partitioned_files(right_operator.join_inputs())?,
                    parallelism: self.parallelism(),
                    columns_to_read: right_joined.column_names.clone(),
                    key_column_ids: join.right_key_column_ids.clone(),
                };

                let num_partition =
                    self.env
                        .advisor
                        .num_partitions(&join.left, &join.right, join.join_endian);
                let join_inputs = self.partitioned_join_inputs(
                    joined,
                    parent,
                    num_partition,
                    left_table_info,
                    right_table_info,
                    None,
                    None,
                )?;
                Ok(Operator::PartitionedJoin(PartitionedJoinOperator {
                    name: joined.table_name.clone(),
                    join_algo: JoinAlgorithm::Partitioned,
                    small_partition_inputs: Vec::new(),
                    large_partition_inputs: Vec::new(),
                    join_inputs,
                    small_child: Some(Box::new(left_operator)),
                    large_child: Some(Box::new(right_operator)),
                }))
            }
            other => Err(StratoError::InvalidPlan(format!(
                "join '{}' carries compiler-assigned algorithm {other:?}",
                joined.table_name
            ))),
        }
    }

    /// One partition worker per batch of input splits, writing partitioned
    /// files back to input storage so the joiners can read them.
    fn partition_inputs(
        &self,
        table: &Table,
        input_splits: Vec<InputSplit>,
        key_column_ids: &[usize],
        partition_projection: &[bool],
        num_partition: usize,
        output_base: &str,
    ) -> Result<Vec<PartitionInput>> {
        let key_column_ids = rewrite_column_ids(key_column_ids, partition_projection)?;
        let mut inputs = Vec::new();
        for (output_id, chunk) in input_splits.chunks(self.parallelism()).enumerate() {
            let table_info = self.scan_table_info(table, chunk.to_vec())?;
            inputs.push(PartitionInput {
                query_id: self.query_id,
                table_info,
                projection: partition_projection.to_vec(),
                partition_info: PartitionInfo {
                    key_column_ids: key_column_ids.clone(),
                    num_partition,
                },
                output: OutputInfo {
                    path: format!("{output_base}{output_id}/part"),
                    random_file_name: false,
                    storage_info: StorageInfo::bare(self.input_scheme),
                    encoding: true,
                },
            });
        }
        Ok(inputs)
    }

    /// Describe a freshly partitioned table from its partition workers'
    /// outputs, with columns and key ids rewritten through the partition
    /// projection.
    fn partitioned_table_info(
        &self,
        table: &Table,
        key_column_ids: &[usize],
        partition_inputs: &[PartitionInput],
        partition_projection: &[bool],
    ) -> Result<PartitionedTableInfo> {
        let input_files = partition_inputs
            .iter()
            .map(|input| input.output.path.clone())
            .collect();
        Ok(PartitionedTableInfo {
            table_name: table.table_name().to_string(),
            base: table.is_base(),
            input_files,
            parallelism: self.parallelism(),
            columns_to_read: rewrite_columns_to_read(table.column_names(), partition_projection),
            key_column_ids: rewrite_column_ids(key_column_ids, partition_projection)?,
        })
    }

    /// One partitioned join worker per bucket in `[0, num_partition)`.
    #[allow(clippy::too_many_arguments)]
    fn partitioned_join_inputs(
        &self,
        joined: &JoinedTable,
        parent: Option<ParentHint<'_>>,
        num_partition: usize,
        left_table_info: PartitionedTableInfo,
        right_table_info: PartitionedTableInfo,
        left_partition_projection: Option<&[bool]>,
        right_partition_projection: Option<&[bool]>,
    ) -> Result<Vec<JoinInput>> {
        let join = &joined.join;
        // The parent's fan-out, never this join's own num_partition.
        let (post_partition, post_partition_info) = self.post_partition(parent);

        let left_projection = match left_partition_projection {
            Some(projection) => rewrite_projection(&join.left_projection, projection),
            None => join.left_projection.clone(),
        };
        let right_projection = match right_partition_projection {
            Some(projection) => rewrite_projection(&join.right_projection, projection),
            None => join.right_projection.clone(),
        };

        let flipped = join.join_endian == JoinEndian::LargeLeft;
        let mut join_inputs = Vec::with_capacity(num_partition);
        for bucket in 0..num_partition {
            let mut file_names = vec![format!("{bucket}/join")];
            if matches!(join.join_type, JoinType::EquiLeft | JoinType::EquiFull) {
                file_names.push(format!("{bucket}/join_left"));
            }
            let output = self.multi_output(joined, file_names);

            let join_info = PartitionedJoinInfo {
                join_type: if flipped {
                    join.join_type.flip()
                } else {
                    join.join_type
                },
                small_column_alias: if flipped {
                    join.right_column_alias.clone()
                } else {
                    join.left_column_alias.clone()
                },
                large_column_alias: if flipped {
                    join.left_column_alias.clone()
                } else {
                    join.right_column_alias.clone()
                },
                small_projection: if flipped {
                    right_projection.clone()
                } else {
                    left_projection.clone()
                },
                large_projection: if flipped {
                    left_projection.clone()
                } else {
                    right_projection.clone()
                },
                post_partition,
                post_partition_info: post_partition_info.clone(),
                num_partition,
                hash_values: vec![bucket],
            };
            let (small_table, large_table) = if flipped {
                (right_table_info.clone(), left_table_info.clone())
            } else {
                (left_table_info.clone(), right_table_info.clone())
            };
            join_inputs.push(JoinInput::Partitioned(PartitionedJoinInput {
                query_id: self.query_id,
                small_table,
                large_table,
                join_info,
                partial_aggregation_present: false,
                partial_aggregation_info: None,
                output,
            }));
        }
        Ok(join_inputs)
    }

    /// Re-pack the probe-side splits of a broadcast join whose output every
    /// parent worker reads, when the build side is much more selective.
    fn adjust_broadcast_splits(
        &self,
        small_table: &Table,
        large_table: &Table,
        large_splits: Vec<InputSplit>,
    ) -> Vec<InputSplit> {
        let num_workers = large_splits.len() / self.parallelism();
        if num_workers <= SPLIT_ADJUSTMENT_MIN_WORKERS {
            return large_splits;
        }
        let small_selectivity = self.env.advisor.table_selectivity(small_table);
        let large_selectivity = self.env.advisor.table_selectivity(large_table);
        if !(small_selectivity >= 0.0
            && large_selectivity > 0.0
            && small_selectivity < large_selectivity)
        {
            return large_splits;
        }
        if small_selectivity / large_selectivity >= 0.25 {
            // Do not adjust too aggressively.
            return large_splits;
        }

        let num_splits = large_splits.len();
        let input_infos: Vec<InputInfo> = large_splits
            .into_iter()
            .flat_map(|split| split.input_infos)
            .collect();
        let mut infos_per_split = input_infos.len() / num_splits;
        if input_infos.len() % num_splits > 0 {
            infos_per_split += 1;
        }
        infos_per_split *= 2;
        info!(
            table = %large_table.table_name(),
            infos_per_split,
            "doubling the split size of the broadcast probe side"
        );
        input_infos
            .chunks(infos_per_split.max(1))
            .map(|chunk| InputSplit::new(chunk.to_vec()))
            .collect()
    }

    /// Compile an aggregation: partial-aggregation producers (scans or a
    /// join pipeline), an optional pre-aggregation stage, and the single
    /// final aggregation.
    fn aggregation_operator(&self, aggregated: &AggregatedTable) -> Result<Operator> {
        let aggregation = &aggregated.aggregation;
        let end_point = &aggregation.output_end_point;

        let partial_info = PartialAggregationInfo {
            group_key_column_alias: aggregation.group_key_column_alias.clone(),
            group_key_column_ids: aggregation.group_key_column_ids.clone(),
            aggregate_column_ids: aggregation.aggregate_column_ids.clone(),
            result_column_alias: aggregation.result_column_alias.clone(),
            result_column_types: aggregation.result_column_types.clone(),
            function_types: aggregation.function_types.clone(),
        };

        let final_output_base = layout::with_trailing_slash(&end_point.folder);
        let intermediate_base = layout::table_base(
            &self.intermediate_root,
            self.query_id,
            &aggregated.schema_name,
            &aggregated.table_name,
        );
        let end_point_storage = StorageInfo {
            scheme: end_point.scheme,
            endpoint: end_point.endpoint.clone(),
            access_key: end_point.access_key.clone(),
            secret_key: end_point.secret_key.clone(),
        };
        let compute_final_in_server = self.env.config.compute_final_aggr_in_server;

        let mut partial_aggr_files = Vec::new();
        let mut scan_inputs = Vec::new();
        let mut join_operator = None;
        let pre_aggregate;

        match aggregation.origin_table.as_ref() {
            Table::Base(origin) => {
                let input_splits = self.input_splits(origin)?;
                let num_workers = ceil_div(input_splits.len(), self.parallelism());
                pre_aggregate = num_workers > self.env.config.pre_aggregate_threshold;
                let scan_projection = vec![true; origin.column_names.len()];

                for (output_id, chunk) in input_splits.chunks(self.parallelism()).enumerate() {
                    let table_info =
                        self.scan_table_info(aggregation.origin_table.as_ref(), chunk.to_vec())?;
                    let (folder, storage_info) = if compute_final_in_server && !pre_aggregate {
                        (final_output_base.clone(), end_point_storage.clone())
                    } else {
                        (
                            intermediate_base.clone(),
                            StorageInfo::bare(self.intermediate_scheme),
                        )
                    };
                    let file_name = format!("{folder}{output_id}/partial_aggr");
                    scan_inputs.push(ScanInput {
                        query_id: self.query_id,
                        table_info,
                        scan_projection: scan_projection.clone(),
                        partial_aggregation_present: true,
                        partial_aggregation_info: Some(partial_info.clone()),
                        output: OutputInfo {
                            path: file_name.clone(),
                            random_file_name: false,
                            storage_info,
                            encoding: true,
                        },
                    });
                    partial_aggr_files.push(file_name);
                }
            }
            Table::Joined(origin) => {
                let mut operator = self.join_operator(origin, None)?;
                let num_join_inputs = operator.join_inputs().len();
                let num_workers = ceil_div(num_join_inputs, self.parallelism());
                pre_aggregate = num_workers > self.env.config.pre_aggregate_threshold;

                let join_inputs = operator.join_inputs_mut().ok_or_else(|| {
                    StratoError::InvalidPlan(format!(
                        "aggregation '{}' origin compiled without join inputs",
                        aggregated.table_name
                    ))
                })?;
                for (output_id, join_input) in join_inputs.iter_mut().enumerate() {
                    join_input.attach_partial_aggregation(partial_info.clone())?;
                    let (folder, storage_info) = if compute_final_in_server && !pre_aggregate {
                        (final_output_base.clone(), end_point_storage.clone())
                    } else {
                        (
                            intermediate_base.clone(),
                            StorageInfo::bare(self.intermediate_scheme),
                        )
                    };
                    let file_name = format!("partial_aggr_{output_id}");
                    let output = join_input.output_mut().ok_or_else(|| {
                        StratoError::InvalidPlan(
                            "cannot aggregate over an incomplete chain join".to_string(),
                        )
                    })?;
                    output.path = folder.clone();
                    output.storage_info = storage_info;
                    output.file_names = vec![file_name.clone()];
                    partial_aggr_files.push(format!("{folder}{file_name}"));
                }
                join_operator = Some(operator);
            }
            Table::Aggregated(_) => {
                return Err(StratoError::InvalidPlan(format!(
                    "aggregation '{}' must originate from a base or joined table",
                    aggregated.table_name
                )))
            }
        }

        // Pre-aggregation stage, only when the partial fan-in is too wide
        // for the final worker alone.
        let mut pre_aggr_inputs = Vec::new();
        let final_input_files = if pre_aggregate {
            let group_key_projection = vec![true; aggregation.group_key_column_alias.len()];
            let mut final_files = Vec::new();
            for (output_id, chunk) in partial_aggr_files
                .chunks(self.env.config.pre_aggregate_threshold)
                .enumerate()
            {
                let (folder, storage_info) = if compute_final_in_server {
                    (final_output_base.clone(), end_point_storage.clone())
                } else {
                    (
                        intermediate_base.clone(),
                        StorageInfo::bare(self.intermediate_scheme),
                    )
                };
                let file_name = format!("{folder}{output_id}/pre_aggr");
                pre_aggr_inputs.push(AggregationInput {
                    query_id: self.query_id,
                    input_files: chunk.to_vec(),
                    input_storage: StorageInfo::bare(self.intermediate_scheme),
                    group_key_column_names: aggregation.group_key_column_alias.clone(),
                    // Pre-aggregation keeps every group-key column.
                    group_key_column_projection: group_key_projection.clone(),
                    result_column_names: aggregation.result_column_alias.clone(),
                    result_column_types: aggregation.result_column_types.clone(),
                    function_types: aggregation.function_types.clone(),
                    parallelism: self.parallelism(),
                    output: OutputInfo {
                        path: file_name.clone(),
                        random_file_name: false,
                        storage_info,
                        encoding: true,
                    },
                });
                final_files.push(file_name);
            }
            final_files
        } else {
            partial_aggr_files
        };

        let final_aggr_input = AggregationInput {
            query_id: self.query_id,
            input_files: final_input_files,
            input_storage: if compute_final_in_server {
                end_point_storage.clone()
            } else {
                StorageInfo::bare(self.intermediate_scheme)
            },
            group_key_column_names: aggregation.group_key_column_alias.clone(),
            group_key_column_projection: aggregation.group_key_column_projection.clone(),
            result_column_names: aggregation.result_column_alias.clone(),
            result_column_types: aggregation.result_column_types.clone(),
            function_types: aggregation.function_types.clone(),
            parallelism: self.parallelism(),
            output: OutputInfo {
                path: format!("{final_output_base}final_aggr"),
                random_file_name: false,
                storage_info: end_point_storage,
                encoding: true,
            },
        };

        Ok(Operator::Aggregation(AggregationOperator {
            name: aggregated.table_name.clone(),
            final_aggr_input,
            pre_aggr_inputs,
            scan_inputs,
            child: join_operator.map(Box::new),
        }))
    }
}

/// Serialized scan filter of any table: the base table's own filter, or an
/// all-pass stand-in for join results.
fn table_filter_json(table: &Table) -> Result<String> {
    match table {
        Table::Base(base) => base.filter.to_json(),
        _ => TableScanFilter::empty(table.schema_name(), table.table_name()).to_json(),
    }
}

/// The sole incomplete chain join input of a child operator.
fn sole_incomplete_chain(operator: &Operator) -> Result<&IncompleteChainJoin> {
    let inputs = operator.join_inputs();
    if inputs.len() != 1 {
        return Err(StratoError::InvalidPlan(format!(
            "operator '{}' should hold exactly one incomplete chain join input, found {}",
            operator.name(),
            inputs.len()
        )));
    }
    match &inputs[0] {
        JoinInput::IncompleteChain(stage) => Ok(stage),
        _ => Err(StratoError::InvalidPlan(format!(
            "operator '{}' does not hold an incomplete chain join",
            operator.name()
        ))),
    }
}

/// Mutable access to the sole incomplete chain join input of a child
/// operator.
fn sole_incomplete_chain_mut(operator: &mut Operator) -> Result<&mut IncompleteChainJoin> {
    let name = operator.name().to_string();
    let inputs = operator.join_inputs_mut().ok_or_else(|| {
        StratoError::InvalidPlan(format!("operator '{name}' has no join inputs"))
    })?;
    if inputs.len() != 1 {
        return Err(StratoError::InvalidPlan(format!(
            "operator '{name}' should hold exactly one incomplete chain join input, found {}",
            inputs.len()
        )));
    }
    match &mut inputs[0] {
        JoinInput::IncompleteChain(stage) => Ok(stage),
        _ => Err(StratoError::InvalidPlan(format!(
            "operator '{name}' does not hold an incomplete chain join"
        ))),
    }
}

/// Probe splits over a child's output files, one split per file so the
/// downstream fan-out matches the child's worker count (partitioned chain
/// joins require this).
fn broadcast_input_splits(join_inputs: &[JoinInput]) -> Result<Vec<InputSplit>> {
    let mut input_splits = Vec::new();
    for join_input in join_inputs {
        let output = join_input.output().ok_or_else(|| {
            StratoError::InvalidPlan(
                "an incomplete chain join has no readable outputs".to_string(),
            )
        })?;
        let base = layout::with_trailing_slash(&output.path);
        for file_name in &output.file_names {
            input_splits.push(InputSplit::single(InputInfo::whole_file(format!(
                "{base}{file_name}"
            ))));
        }
    }
    Ok(input_splits)
}

/// Output file paths of a child's join inputs, in submission order.
fn partitioned_files(join_inputs: &[JoinInput]) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for join_input in join_inputs {
        let output = join_input.output().ok_or_else(|| {
            StratoError::InvalidPlan(
                "an incomplete chain join has no readable outputs".to_string(),
            )
        })?;
        let base = layout::with_trailing_slash(&output.path);
        for file_name in &output.file_names {
            files.push(format!("{base}{file_name}"));
        }
    }
    Ok(files)
}

/// Projection kept through a partition stage: join-projected columns stay;
/// filtered-only columns are consumed by the partition worker's scan and
/// dropped.
fn partition_projection(table: &Table, join_projection: &[bool]) -> Result<Vec<bool>> {
    match table {
        Table::Base(base) => {
            let mut projection = vec![true; join_projection.len()];
            for (column_id, keep) in projection.iter_mut().enumerate() {
                if join_projection[column_id] {
                    continue;
                }
                if let Some(filter) = base.filter.column_filter(column_id) {
                    if filter.column_name != base.column_names[column_id] {
                        return Err(StratoError::InvalidPlan(format!(
                            "filter column '{}' does not match table column '{}'",
                            filter.column_name, base.column_names[column_id]
                        )));
                    }
                    *keep = false;
                }
            }
            Ok(projection)
        }
        _ => Ok(vec![true; join_projection.len()]),
    }
}

/// Columns surviving a partition projection.
fn rewrite_columns_to_read(columns: &[String], partition_projection: &[bool]) -> Vec<String> {
    columns
        .iter()
        .zip(partition_projection)
        .filter(|(_, keep)| **keep)
        .map(|(column, _)| column.clone())
        .collect()
}

/// A column bitmask re-indexed into the partition projection's output.
fn rewrite_projection(projection: &[bool], partition_projection: &[bool]) -> Vec<bool> {
    projection
        .iter()
        .zip(partition_projection)
        .filter(|(_, keep)| **keep)
        .map(|(value, _)| *value)
        .collect()
}

/// Column ids re-indexed into the partition projection's output. A key
/// column dropped by the projection is a plan error.
fn rewrite_column_ids(column_ids: &[usize], partition_projection: &[bool]) -> Result<Vec<usize>> {
    let mut id_map = HashMap::new();
    let mut next = 0usize;
    for (old, keep) in partition_projection.iter().enumerate() {
        if *keep {
            id_map.insert(old, next);
            next += 1;
        }
    }
    column_ids
        .iter()
        .map(|id| {
            id_map.get(id).copied().ok_or_else(|| {
                StratoError::InvalidPlan(format!(
                    "key column id {id} was dropped by the partition projection"
                ))
            })
        })
        .collect()
}

/// Ceiling division for worker counts.
fn ceil_div(numerator: usize, denominator: usize) -> usize {
    numerator.div_ceil(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::filter::{ColumnFilter, CompareOp, Predicate, ScalarValue};

    fn base_table(columns: &[&str], filter: TableScanFilter) -> Table {
        Table::Base(BaseTable {
            schema_name: "s".to_string(),
            table_name: "t".to_string(),
            column_names: columns.iter().map(|c| c.to_string()).collect(),
            filter,
        })
    }

    fn eq_filter(column: &str) -> ColumnFilter {
        ColumnFilter {
            column_name: column.to_string(),
            predicate: Predicate::Compare {
                op: CompareOp::Eq,
                value: ScalarValue::Integer(1),
            },
        }
    }

    #[test]
    fn partition_projection_drops_filter_only_columns() {
        let filter = TableScanFilter::empty("s", "t").with_column_filter(2, eq_filter("c"));
        let table = base_table(&["a", "b", "c"], filter);
        // Column c is filtered but not projected by the join: dropped.
        let projection = partition_projection(&table, &[true, true, false]).unwrap();
        assert_eq!(projection, vec![true, true, false]);
        // A filtered column that the join projects stays, and an unfiltered
        // unprojected column still flows through partitioning.
        let projection = partition_projection(&table, &[true, false, true]).unwrap();
        assert_eq!(projection, vec![true, true, true]);
    }

    #[test]
    fn partition_projection_rejects_mismatched_filter_names() {
        let filter = TableScanFilter::empty("s", "t").with_column_filter(0, eq_filter("ghost"));
        let table = base_table(&["a", "b"], filter);
        assert!(partition_projection(&table, &[false, true]).is_err());
    }

    #[test]
    fn rewrite_keeps_relative_order() {
        let keep = vec![true, false, true, true];
        assert_eq!(
            rewrite_columns_to_read(
                &[
                    "a".to_string(),
                    "b".to_string(),
                    "c".to_string(),
                    "d".to_string()
                ],
                &keep
            ),
            vec!["a".to_string(), "c".to_string(), "d".to_string()]
        );
        assert_eq!(
            rewrite_projection(&[true, true, false, true], &keep),
            vec![true, false, true]
        );
        assert_eq!(rewrite_column_ids(&[0, 2, 3], &keep).unwrap(), vec![0, 1, 2]);
        assert!(rewrite_column_ids(&[1], &keep).is_err());
    }

    #[test]
    fn ceil_div_rounds_up() {
        assert_eq!(ceil_div(8, 4), 2);
        assert_eq!(ceil_div(9, 4), 3);
        assert_eq!(ceil_div(0, 4), 0);
    }
}
