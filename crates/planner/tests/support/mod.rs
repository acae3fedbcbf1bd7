//! Shared fixtures for planner integration tests: an in-memory catalog,
//! in-memory storage, and plan builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use strato_common::{ExecutorConfig, Result, StratoError};
use strato_metadata::domain::{ColumnStats, Layout, Order, Projections, Splits};
use strato_metadata::service::MetadataService;
use strato_metadata::IndexFactory;
use strato_planner::advisor::StaticJoinAdvisor;
use strato_planner::compiler::PlannerEnv;
use strato_planner::physical::{JoinInput, Operator};
use strato_planner::plan::{
    Aggregation, AggregatedTable, BaseTable, FunctionType, Join, JoinAlgorithm, JoinEndian,
    JoinType, JoinedTable, OutputEndPoint, Table, TableScanFilter,
};
use strato_storage::{MemoryStorage, Scheme};

/// In-memory catalog fixture.
#[derive(Debug, Default)]
pub struct MockMetadata {
    layouts: HashMap<(String, String), Vec<Layout>>,
    stats: HashMap<(String, String), Vec<ColumnStats>>,
}

impl MockMetadata {
    pub fn add_layout(&mut self, schema: &str, table: &str, layout: Layout) {
        self.layouts
            .entry((schema.to_string(), table.to_string()))
            .or_default()
            .push(layout);
    }

    pub fn add_stats(&mut self, schema: &str, table: &str, stats: Vec<ColumnStats>) {
        self.stats.insert((schema.to_string(), table.to_string()), stats);
    }
}

impl MetadataService for MockMetadata {
    fn get_layouts(&self, schema: &str, table: &str) -> Result<Vec<Layout>> {
        self.layouts
            .get(&(schema.to_string(), table.to_string()))
            .cloned()
            .ok_or_else(|| {
                StratoError::MetadataUnavailable(format!("no layouts for {schema}.{table}"))
            })
    }

    fn column_stats(&self, schema: &str, table: &str) -> Result<Vec<ColumnStats>> {
        self.stats
            .get(&(schema.to_string(), table.to_string()))
            .cloned()
            .ok_or_else(|| {
                StratoError::MetadataUnavailable(format!("no stats for {schema}.{table}"))
            })
    }
}

/// A layout with an ordered path only.
pub fn ordered_layout(ordered_path: &str, columns: &[&str], num_row_group_in_block: u32) -> Layout {
    Layout {
        version: 1,
        ordered_path: ordered_path.to_string(),
        compact_path: String::new(),
        order: serde_json::to_string(&Order {
            column_order: columns.iter().map(|c| c.to_string()).collect(),
        })
        .unwrap(),
        splits: serde_json::to_string(&Splits {
            num_row_group_in_block,
            split_patterns: vec![],
        })
        .unwrap(),
        projections: serde_json::to_string(&Projections {
            projection_patterns: vec![],
        })
        .unwrap(),
    }
}

/// Catalog + storage pair that registers base tables consistently.
#[derive(Debug)]
pub struct Fixture {
    pub metadata: MockMetadata,
    pub storage: MemoryStorage,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            metadata: MockMetadata::default(),
            storage: MemoryStorage::new(Scheme::S3),
        }
    }

    /// Register a base table backed by `num_files` ordered files.
    pub fn add_base_table(&mut self, schema: &str, table: &str, columns: &[&str], num_files: usize) {
        let ordered = format!("/data/{schema}/{table}/ordered/");
        self.storage.add_files(&ordered, "f", num_files);
        self.metadata
            .add_layout(schema, table, ordered_layout(&ordered, columns, 16));
    }

    pub fn env(self, advisor: StaticJoinAdvisor, config: ExecutorConfig) -> PlannerEnv {
        PlannerEnv {
            metadata: Arc::new(self.metadata),
            storage: Arc::new(self.storage),
            advisor: Arc::new(advisor),
            indexes: Arc::new(IndexFactory::new()),
            config,
        }
    }
}

/// Config with the knobs the scenarios vary.
pub fn config(fixed_split_size: u32, parallelism: usize) -> ExecutorConfig {
    ExecutorConfig {
        fixed_split_size,
        intra_worker_parallelism: parallelism,
        intermediate_folder: "/inter/".to_string(),
        ..ExecutorConfig::default()
    }
}

/// An unfiltered base table.
pub fn base(schema: &str, table: &str, columns: &[&str]) -> Table {
    Table::Base(BaseTable {
        schema_name: schema.to_string(),
        table_name: table.to_string(),
        column_names: columns.iter().map(|c| c.to_string()).collect(),
        filter: TableScanFilter::empty(schema, table),
    })
}

/// A joined table over `left` and `right` keyed on each side's first column,
/// projecting every column through.
pub fn join_of(
    name: &str,
    left: Table,
    right: Table,
    algo: JoinAlgorithm,
    endian: JoinEndian,
) -> Table {
    join_typed(name, left, right, algo, endian, JoinType::Inner)
}

pub fn join_typed(
    name: &str,
    left: Table,
    right: Table,
    algo: JoinAlgorithm,
    endian: JoinEndian,
    join_type: JoinType,
) -> Table {
    let schema_name = left.schema_name().to_string();
    let left_columns = left.column_names().to_vec();
    let right_columns = right.column_names().to_vec();
    let column_names: Vec<String> = left_columns
        .iter()
        .chain(right_columns.iter())
        .cloned()
        .collect();
    Table::Joined(JoinedTable {
        schema_name,
        table_name: name.to_string(),
        column_names,
        join: Join {
            left_key_column_ids: vec![0],
            right_key_column_ids: vec![0],
            left_projection: vec![true; left_columns.len()],
            right_projection: vec![true; right_columns.len()],
            left_column_alias: left_columns,
            right_column_alias: right_columns,
            join_type,
            join_algo: algo,
            join_endian: endian,
            left: Box::new(left),
            right: Box::new(right),
        },
    })
}

/// An aggregated table grouping on the origin's first column and summing its
/// second.
pub fn aggregate_of(name: &str, origin: Table, output_folder: &str) -> Table {
    let schema_name = origin.schema_name().to_string();
    Table::Aggregated(AggregatedTable {
        schema_name,
        table_name: name.to_string(),
        column_names: vec!["group_key".to_string(), "sum_value".to_string()],
        aggregation: Aggregation {
            group_key_column_ids: vec![0],
            group_key_column_alias: vec!["group_key".to_string()],
            group_key_column_projection: vec![true],
            aggregate_column_ids: vec![1],
            result_column_alias: vec!["sum_value".to_string()],
            result_column_types: vec!["bigint".to_string()],
            function_types: vec![FunctionType::Sum],
            output_end_point: OutputEndPoint {
                scheme: Scheme::S3,
                folder: output_folder.to_string(),
                endpoint: None,
                access_key: None,
                secret_key: None,
            },
            origin_table: Box::new(origin),
        },
    })
}

/// Every output path emitted anywhere in the operator tree, one entry per
/// output file.
pub fn collect_output_paths(operator: &Operator, out: &mut Vec<String>) {
    match operator {
        Operator::SingleStageJoin(op) => {
            for input in &op.join_inputs {
                push_join_input_paths(input, out);
            }
        }
        Operator::PartitionedJoin(op) => {
            for input in op
                .small_partition_inputs
                .iter()
                .chain(op.large_partition_inputs.iter())
            {
                out.push(input.output.path.clone());
            }
            for input in &op.join_inputs {
                push_join_input_paths(input, out);
            }
        }
        Operator::Aggregation(op) => {
            for input in &op.scan_inputs {
                out.push(input.output.path.clone());
            }
            for input in &op.pre_aggr_inputs {
                out.push(input.output.path.clone());
            }
            out.push(op.final_aggr_input.output.path.clone());
        }
    }
    for child in operator.children() {
        collect_output_paths(child, out);
    }
}

fn push_join_input_paths(input: &JoinInput, out: &mut Vec<String>) {
    if let Some(output) = input.output() {
        for file_name in &output.file_names {
            out.push(format!("{}{}", output.path, file_name));
        }
    }
}
