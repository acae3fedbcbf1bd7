//! Worker-facing physical model: descriptors and the operator DAG.

pub mod domain;
pub mod input;
pub mod operator;

pub use domain::{
    BroadcastTableInfo, ChainJoinInfo, InputInfo, InputSplit, JoinInfo, MultiOutputInfo,
    OutputInfo, PartialAggregationInfo, PartitionInfo, PartitionedJoinInfo, PartitionedTableInfo,
    ScanTableInfo, StorageInfo,
};
pub use input::{
    AggregationInput, BroadcastChainJoinInput, BroadcastJoinInput, IncompleteChainJoin, JoinInput,
    PartitionInput, PartitionedChainJoinInput, PartitionedJoinInput, ScanInput,
};
pub use operator::{
    AggregationOperator, Operator, PartitionedJoinOperator, SingleStageJoinOperator,
};
