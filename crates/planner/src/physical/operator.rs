//! Operator tree driving worker submission order.
//!
//! Contract:
//! - an operator's child operators must finish before its own inputs run
//!   (children first, leaves first across the tree);
//! - within one operator, inputs are ordered by output id, which is part of
//!   the output path and therefore externally observable;
//! - partition inputs of a partitioned join run before its join inputs.

use serde::{Deserialize, Serialize};

use strato_common::{Result, StratoError};

use crate::physical::input::{AggregationInput, JoinInput, PartitionInput, ScanInput};
use crate::plan::join::JoinAlgorithm;

/// A node of the execution DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    /// Broadcast or broadcast-chain join stage.
    SingleStageJoin(SingleStageJoinOperator),
    /// Partitioned or partitioned-chain join stage with its partition
    /// producers.
    PartitionedJoin(PartitionedJoinOperator),
    /// Aggregation stage.
    Aggregation(AggregationOperator),
}

/// A join executed in one stage: broadcast or broadcast chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleStageJoinOperator {
    /// Name of the joined table this operator produces.
    pub name: String,
    /// Join algorithm of every input.
    pub join_algo: JoinAlgorithm,
    /// Worker inputs, submission order.
    pub join_inputs: Vec<JoinInput>,
    /// Operator producing the small side, if not a base table.
    pub small_child: Option<Box<Operator>>,
    /// Operator producing the large side, if not a base table.
    pub large_child: Option<Box<Operator>>,
}

/// A partitioned join with the partition workers feeding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionedJoinOperator {
    /// Name of the joined table this operator produces.
    pub name: String,
    /// `Partitioned` or `PartitionedChain`.
    pub join_algo: JoinAlgorithm,
    /// Partition workers for the small side; empty when the small side is
    /// already partitioned by a child operator.
    pub small_partition_inputs: Vec<PartitionInput>,
    /// Partition workers for the large side; empty when the large side is
    /// already partitioned by a child operator.
    pub large_partition_inputs: Vec<PartitionInput>,
    /// Join worker inputs, one per bucket, submission order.
    pub join_inputs: Vec<JoinInput>,
    /// Operator producing the small side, if not a base table.
    pub small_child: Option<Box<Operator>>,
    /// Operator producing the large side, if not a base table.
    pub large_child: Option<Box<Operator>>,
}

/// An aggregation with its partial, optional pre-aggregation, and final
/// stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationOperator {
    /// Name of the aggregated table this operator produces.
    pub name: String,
    /// The single final aggregation worker.
    pub final_aggr_input: AggregationInput,
    /// Pre-aggregation workers; empty when the partial fan-in is small
    /// enough for the final worker alone.
    pub pre_aggr_inputs: Vec<AggregationInput>,
    /// Partial-aggregation scan workers; empty when the origin is a join.
    pub scan_inputs: Vec<ScanInput>,
    /// Operator producing the origin table, when the origin is a join.
    pub child: Option<Box<Operator>>,
}

impl Operator {
    /// Operator name (the table it produces).
    pub fn name(&self) -> &str {
        match self {
            Self::SingleStageJoin(op) => &op.name,
            Self::PartitionedJoin(op) => &op.name,
            Self::Aggregation(op) => &op.name,
        }
    }

    /// Join algorithm, for join operators.
    pub fn join_algo(&self) -> Option<JoinAlgorithm> {
        match self {
            Self::SingleStageJoin(op) => Some(op.join_algo),
            Self::PartitionedJoin(op) => Some(op.join_algo),
            Self::Aggregation(_) => None,
        }
    }

    /// Join worker inputs, empty for aggregation operators.
    pub fn join_inputs(&self) -> &[JoinInput] {
        match self {
            Self::SingleStageJoin(op) => &op.join_inputs,
            Self::PartitionedJoin(op) => &op.join_inputs,
            Self::Aggregation(_) => &[],
        }
    }

    pub(crate) fn join_inputs_mut(&mut self) -> Option<&mut Vec<JoinInput>> {
        match self {
            Self::SingleStageJoin(op) => Some(&mut op.join_inputs),
            Self::PartitionedJoin(op) => Some(&mut op.join_inputs),
            Self::Aggregation(_) => None,
        }
    }

    /// Child operators, submission-order dependencies of this operator.
    pub fn children(&self) -> Vec<&Operator> {
        let mut children = Vec::new();
        match self {
            Self::SingleStageJoin(op) => {
                if let Some(c) = &op.small_child {
                    children.push(c.as_ref());
                }
                if let Some(c) = &op.large_child {
                    children.push(c.as_ref());
                }
            }
            Self::PartitionedJoin(op) => {
                if let Some(c) = &op.small_child {
                    children.push(c.as_ref());
                }
                if let Some(c) = &op.large_child {
                    children.push(c.as_ref());
                }
            }
            Self::Aggregation(op) => {
                if let Some(c) = &op.child {
                    children.push(c.as_ref());
                }
            }
        }
        children
    }

    /// Check that no incomplete chain join survives anywhere in the tree.
    pub fn verify(&self) -> Result<()> {
        for input in self.join_inputs() {
            if !input.is_complete() {
                return Err(StratoError::InvalidPlan(format!(
                    "operator '{}' still holds an incomplete chain join",
                    self.name()
                )));
            }
        }
        for child in self.children() {
            child.verify()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strato_common::QueryId;

    use crate::physical::domain::{BroadcastTableInfo, ChainJoinInfo};
    use crate::physical::input::IncompleteChainJoin;
    use crate::plan::join::JoinType;

    fn chain_table(name: &str) -> BroadcastTableInfo {
        BroadcastTableInfo {
            table_name: name.to_string(),
            base: true,
            input_splits: vec![],
            columns_to_read: vec![],
            filter: "{}".to_string(),
            key_column_ids: vec![0],
        }
    }

    fn link() -> ChainJoinInfo {
        ChainJoinInfo {
            join_type: JoinType::Inner,
            small_column_alias: vec![],
            large_column_alias: vec![],
            key_column_ids: vec![0],
            small_projection: vec![],
            large_projection: vec![],
            post_partition: false,
            post_partition_info: None,
        }
    }

    #[test]
    fn verify_rejects_incomplete_chain() {
        let incomplete = IncompleteChainJoin::start(
            QueryId(7),
            chain_table("a"),
            chain_table("b"),
            link(),
        );
        let op = Operator::SingleStageJoin(SingleStageJoinOperator {
            name: "a_join_b".to_string(),
            join_algo: JoinAlgorithm::BroadcastChain,
            join_inputs: vec![JoinInput::IncompleteChain(incomplete)],
            small_child: None,
            large_child: None,
        });
        assert!(op.verify().is_err());
    }
}
