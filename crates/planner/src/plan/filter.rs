use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use strato_common::{Result, StratoError};

/// Literal operand of a scan predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    /// 64-bit integer literal.
    Integer(i64),
    /// 64-bit float literal.
    Float(f64),
    /// UTF-8 string literal.
    Text(String),
    /// Boolean literal.
    Boolean(bool),
}

/// Comparison operator of a scan predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// Predicate tree over a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Compare the column against a literal.
    Compare {
        /// Comparison operator.
        op: CompareOp,
        /// Right-hand literal.
        value: ScalarValue,
    },
    /// Closed range test.
    Between {
        /// Inclusive lower bound.
        low: ScalarValue,
        /// Inclusive upper bound.
        high: ScalarValue,
    },
    /// Membership in a discrete value set.
    In(Vec<ScalarValue>),
    /// Null test.
    IsNull,
    /// Negation.
    Not(Box<Predicate>),
    /// Conjunction.
    And(Vec<Predicate>),
    /// Disjunction.
    Or(Vec<Predicate>),
}

/// Filter over one column of a scanned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFilter {
    /// Column name, kept redundantly with the column id for worker-side
    /// sanity checks.
    pub column_name: String,
    /// Predicate evaluated against the column.
    pub predicate: Predicate,
}

/// Scan filter of a base table: per-column predicates keyed by column id.
///
/// The filter stays structured inside the plan; it is serialized to JSON only
/// when a worker-input descriptor is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableScanFilter {
    /// Schema name of the filtered table.
    pub schema_name: String,
    /// Table name of the filtered table.
    pub table_name: String,
    /// Per-column filters keyed by column id within the table's column list.
    pub column_filters: BTreeMap<usize, ColumnFilter>,
}

impl TableScanFilter {
    /// An empty (all-pass) filter, also used to stand in for non-base tables
    /// in worker-input descriptors.
    pub fn empty(schema_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            column_filters: BTreeMap::new(),
        }
    }

    /// Add a column filter, replacing any previous filter on the column.
    pub fn with_column_filter(mut self, column_id: usize, filter: ColumnFilter) -> Self {
        self.column_filters.insert(column_id, filter);
        self
    }

    /// Whether the filter passes every row.
    pub fn is_empty(&self) -> bool {
        self.column_filters.is_empty()
    }

    /// Filter on the given column, if any.
    pub fn column_filter(&self, column_id: usize) -> Option<&ColumnFilter> {
        self.column_filters.get(&column_id)
    }

    /// Ids of the filtered columns, ascending.
    pub fn filtered_column_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.column_filters.keys().copied()
    }

    /// Serialize for embedding into a worker-input descriptor.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| StratoError::InvalidPlan(format!("scan filter encode failed: {e}")))
    }
}
