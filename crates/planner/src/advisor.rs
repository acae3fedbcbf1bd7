use std::collections::HashMap;

use crate::plan::join::JoinEndian;
use crate::plan::table::Table;

/// Join cost oracle the compiler consults for partition fan-outs and table
/// selectivities.
///
/// Contract:
/// - `num_partitions` must be positive and deterministic for a given pair of
///   tables;
/// - `table_selectivity` returns the fraction of rows passing the table's
///   filters, or a negative value when unknown.
pub trait JoinAdvisor: Send + Sync {
    /// Partition fan-out for a partitioned join of `left` and `right`.
    fn num_partitions(&self, left: &Table, right: &Table, endian: JoinEndian) -> usize;

    /// Selectivity of the table's filters; negative means unknown.
    fn table_selectivity(&self, table: &Table) -> f64;
}

/// Advisor with fixed answers, for hosts without a cost model and for tests.
#[derive(Debug, Clone)]
pub struct StaticJoinAdvisor {
    default_num_partitions: usize,
    pair_num_partitions: HashMap<(String, String), usize>,
    selectivities: HashMap<String, f64>,
}

impl StaticJoinAdvisor {
    /// Advisor answering `default_num_partitions` for every pair and
    /// "unknown" for every selectivity.
    pub fn new(default_num_partitions: usize) -> Self {
        Self {
            default_num_partitions,
            pair_num_partitions: HashMap::new(),
            selectivities: HashMap::new(),
        }
    }

    /// Override the fan-out for one (left, right) table-name pair.
    pub fn with_num_partitions(mut self, left: &str, right: &str, n: usize) -> Self {
        self.pair_num_partitions
            .insert((left.to_string(), right.to_string()), n);
        self
    }

    /// Override the selectivity of one table by name.
    pub fn with_selectivity(mut self, table: &str, selectivity: f64) -> Self {
        self.selectivities.insert(table.to_string(), selectivity);
        self
    }
}

impl JoinAdvisor for StaticJoinAdvisor {
    fn num_partitions(&self, left: &Table, right: &Table, _endian: JoinEndian) -> usize {
        self.pair_num_partitions
            .get(&(left.table_name().to_string(), right.table_name().to_string()))
            .copied()
            .unwrap_or(self.default_num_partitions)
    }

    fn table_selectivity(&self, table: &Table) -> f64 {
        self.selectivities
            .get(table.table_name())
            .copied()
            .unwrap_or(-1.0)
    }
}
