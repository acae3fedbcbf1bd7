use serde::{Deserialize, Serialize};

use strato_common::{Result, StratoError};

use crate::plan::aggregation::Aggregation;
use crate::plan::filter::TableScanFilter;
use crate::plan::join::{Join, JoinAlgorithm, JoinEndian, JoinType};

/// A logical table: the node type of the plan tree handed to the compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Table {
    /// A stored table scanned from input storage.
    Base(BaseTable),
    /// The result of a join.
    Joined(JoinedTable),
    /// The result of an aggregation.
    Aggregated(AggregatedTable),
}

/// A stored table with its scan filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseTable {
    /// Schema name.
    pub schema_name: String,
    /// Table name.
    pub table_name: String,
    /// Columns the plan reads, in output order.
    pub column_names: Vec<String>,
    /// Scan filter (all-pass when empty).
    pub filter: TableScanFilter,
}

/// A join result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedTable {
    /// Schema name used for intermediate paths.
    pub schema_name: String,
    /// Table name used for intermediate paths and operator naming.
    pub table_name: String,
    /// Output column names of the join.
    pub column_names: Vec<String>,
    /// The join producing this table.
    pub join: Join,
}

/// An aggregation result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedTable {
    /// Schema name used for intermediate paths.
    pub schema_name: String,
    /// Table name used for intermediate paths and operator naming.
    pub table_name: String,
    /// Output column names of the aggregation.
    pub column_names: Vec<String>,
    /// The aggregation producing this table.
    pub aggregation: Aggregation,
}

impl Table {
    /// Schema name of any table kind.
    pub fn schema_name(&self) -> &str {
        match self {
            Self::Base(t) => &t.schema_name,
            Self::Joined(t) => &t.schema_name,
            Self::Aggregated(t) => &t.schema_name,
        }
    }

    /// Table name of any table kind.
    pub fn table_name(&self) -> &str {
        match self {
            Self::Base(t) => &t.table_name,
            Self::Joined(t) => &t.table_name,
            Self::Aggregated(t) => &t.table_name,
        }
    }

    /// Column names of any table kind.
    pub fn column_names(&self) -> &[String] {
        match self {
            Self::Base(t) => &t.column_names,
            Self::Joined(t) => &t.column_names,
            Self::Aggregated(t) => &t.column_names,
        }
    }

    /// Whether this is a base table.
    pub fn is_base(&self) -> bool {
        matches!(self, Self::Base(_))
    }

    /// Whether this is a joined table.
    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined(_))
    }

    /// Validate the structural invariants of the whole plan tree.
    ///
    /// Rules enforced:
    /// - a join over two joined children must be small-left;
    /// - otherwise the right child of a join must be a base table;
    /// - LEFT/FULL outer joins may not use the broadcast algorithm;
    /// - user plans carry only broadcast or partitioned algorithms — the
    ///   chain algorithms are compiler-assigned;
    /// - key id lists of a join are non-empty, of equal length, and inside
    ///   the child projections; projections match child column counts;
    /// - aggregations originate from base or joined tables;
    /// - base-table filters reference only existing column ids.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Base(t) => t.validate(),
            Self::Joined(t) => t.validate(),
            Self::Aggregated(t) => t.validate(),
        }
    }
}

impl BaseTable {
    fn validate(&self) -> Result<()> {
        for id in self.filter.filtered_column_ids() {
            if id >= self.column_names.len() {
                return Err(StratoError::InvalidPlan(format!(
                    "filter on table '{}' references column id {id} out of {} columns",
                    self.table_name,
                    self.column_names.len()
                )));
            }
        }
        Ok(())
    }
}

impl JoinedTable {
    fn validate(&self) -> Result<()> {
        let join = &self.join;
        if matches!(join.left.as_ref(), Table::Aggregated(_))
            || matches!(join.right.as_ref(), Table::Aggregated(_))
        {
            return Err(StratoError::InvalidPlan(format!(
                "join '{}' has an aggregated child; aggregations may only sit at the root",
                self.table_name
            )));
        }
        if join.left.is_joined() && join.right.is_joined() {
            if join.join_endian != JoinEndian::SmallLeft {
                return Err(StratoError::InvalidPlan(format!(
                    "join '{}' over two joined children must be small-left",
                    self.table_name
                )));
            }
        } else if !join.right.is_base() {
            return Err(StratoError::InvalidPlan(format!(
                "right child of join '{}' must be a base table",
                self.table_name
            )));
        }
        if matches!(join.join_type, JoinType::EquiLeft | JoinType::EquiFull)
            && join.join_algo == JoinAlgorithm::Broadcast
        {
            return Err(StratoError::InvalidPlan(format!(
                "join '{}': broadcast cannot preserve the unmatched side of a LEFT/FULL outer join",
                self.table_name
            )));
        }
        if !matches!(
            join.join_algo,
            JoinAlgorithm::Broadcast | JoinAlgorithm::Partitioned
        ) {
            return Err(StratoError::InvalidPlan(format!(
                "join '{}' carries compiler-assigned algorithm {:?}",
                self.table_name, join.join_algo
            )));
        }
        if join.left_key_column_ids.is_empty()
            || join.left_key_column_ids.len() != join.right_key_column_ids.len()
        {
            return Err(StratoError::InvalidPlan(format!(
                "join '{}' needs matching non-empty key column lists",
                self.table_name
            )));
        }
        if join.left_projection.len() != join.left.column_names().len()
            || join.right_projection.len() != join.right.column_names().len()
        {
            return Err(StratoError::InvalidPlan(format!(
                "join '{}' projections must cover the child columns",
                self.table_name
            )));
        }
        if join
            .left_key_column_ids
            .iter()
            .any(|&id| id >= join.left_projection.len())
            || join
                .right_key_column_ids
                .iter()
                .any(|&id| id >= join.right_projection.len())
        {
            return Err(StratoError::InvalidPlan(format!(
                "join '{}' key column ids fall outside the child columns",
                self.table_name
            )));
        }
        join.left.validate()?;
        join.right.validate()
    }
}

impl AggregatedTable {
    fn validate(&self) -> Result<()> {
        let aggregation = &self.aggregation;
        if matches!(aggregation.origin_table.as_ref(), Table::Aggregated(_)) {
            return Err(StratoError::InvalidPlan(format!(
                "aggregation '{}' must originate from a base or joined table",
                self.table_name
            )));
        }
        let n = aggregation.aggregate_column_ids.len();
        if aggregation.function_types.len() != n
            || aggregation.result_column_alias.len() != n
            || aggregation.result_column_types.len() != n
        {
            return Err(StratoError::InvalidPlan(format!(
                "aggregation '{}' needs one function, alias, and type per aggregate column",
                self.table_name
            )));
        }
        if aggregation.group_key_column_alias.len() != aggregation.group_key_column_ids.len()
            || aggregation.group_key_column_projection.len()
                != aggregation.group_key_column_ids.len()
        {
            return Err(StratoError::InvalidPlan(format!(
                "aggregation '{}' needs one alias and projection flag per group key",
                self.table_name
            )));
        }
        aggregation.origin_table.validate()
    }
}
