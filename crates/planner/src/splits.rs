//! Split sizing: turns a base table's layouts into the ordered list of
//! [`InputSplit`]s the join and aggregation compilers distribute to workers.

use std::sync::Arc;

use tracing::{debug, info};

use strato_common::{Result, SplitsIndexKind};
use strato_metadata::domain::{Layout, Order, SchemaTableName, Splits};
use strato_metadata::index::splits_index::{CostBasedSplitsIndex, InvertedSplitsIndex};
use strato_metadata::index::{ColumnSet, ProjectionsIndex, SplitsIndex};

use crate::compiler::PlannerEnv;
use crate::physical::domain::{InputInfo, InputSplit};
use crate::plan::table::{BaseTable, Table};

/// Compute the input splits of a base table across all of its layouts.
///
/// Per layout: pick a split size (fixed override, or the splits index
/// adjusted by table selectivity), optionally substitute a
/// projection-optimized compact path, then emit ordered-path file chunks and
/// compact-path row-group strides in encountered order.
pub(crate) fn input_splits(
    env: &PlannerEnv,
    table: &BaseTable,
    ordered_path_enabled: bool,
    compact_path_enabled: bool,
) -> Result<Vec<InputSplit>> {
    let layouts = env
        .metadata
        .get_layouts(&table.schema_name, &table.table_name)?;
    let table_ref = Table::Base(table.clone());
    let column_set = ColumnSet::from_columns(table.column_names.iter().cloned());
    let mut splits = Vec::new();

    for layout in &layouts {
        let order = layout.decode_order()?;
        let splits_cfg = layout.decode_splits()?;

        let split_size = if env.config.fixed_split_size > 0 {
            env.config.fixed_split_size
        } else {
            let index = splits_index_for(env, table, layout, &order, &splits_cfg)?;
            let mut size = index.search(&column_set);
            info!(
                table = %table.table_name,
                split_size = size,
                "split size from splits index"
            );
            let selectivity = env.advisor.table_selectivity(&table_ref);
            if selectivity >= 0.0 {
                // Low selectivity leaves workers underfed; widen their splits.
                if selectivity < 0.25 {
                    size = size.saturating_mul(4);
                } else if selectivity < 0.5 {
                    size = size.saturating_mul(2);
                }
                size = size.min(index.max_split_size());
                debug!(
                    table = %table.table_name,
                    split_size = size,
                    selectivity,
                    "split size after selectivity adjustment"
                );
            }
            size
        };
        let split_size = split_size.max(1);

        let compact_path = if env.config.projection_read_enabled {
            let index = projections_index_for(env, table, layout, &order)?;
            match index.search(&column_set) {
                Some(path) => {
                    debug!(path, "using projection-optimized compact path");
                    path.to_string()
                }
                None => layout.compact_path.clone(),
            }
        } else {
            layout.compact_path.clone()
        };

        if ordered_path_enabled {
            let ordered_files = env.storage.list_paths(&layout.ordered_path)?;
            for chunk in ordered_files.chunks(split_size as usize) {
                splits.push(InputSplit::new(
                    chunk
                        .iter()
                        .map(|path| InputInfo::new(path.clone(), 0, 1))
                        .collect(),
                ));
            }
        }
        if compact_path_enabled {
            let compact_files = env.storage.list_paths(&compact_path)?;
            for path in &compact_files {
                let mut row_group = 0u32;
                while row_group < splits_cfg.num_row_group_in_block {
                    splits.push(InputSplit::single(InputInfo::new(
                        path.clone(),
                        row_group,
                        split_size as i32,
                    )));
                    row_group += split_size;
                }
            }
        }
    }

    Ok(splits)
}

/// Cached splits index for the table, rebuilt on miss or when the cached
/// version predates the layout.
fn splits_index_for(
    env: &PlannerEnv,
    table: &BaseTable,
    layout: &Layout,
    order: &Order,
    splits_cfg: &Splits,
) -> Result<Arc<SplitsIndex>> {
    let key = SchemaTableName::new(&table.schema_name, &table.table_name);
    if let Some(index) = env.indexes.splits_index(&key) {
        if index.version() >= layout.version {
            return Ok(index);
        }
        debug!(table = %key, "splits index is stale, rebuilding");
    } else {
        debug!(table = %key, "splits index not cached, building");
    }
    let index = match env.config.splits_index_type {
        SplitsIndexKind::Inverted => SplitsIndex::Inverted(InvertedSplitsIndex::new(
            layout.version,
            order,
            splits_cfg,
        )?),
        SplitsIndexKind::CostBased => {
            let stats = env
                .metadata
                .column_stats(&table.schema_name, &table.table_name)?;
            SplitsIndex::CostBased(CostBasedSplitsIndex::new(layout.version, &stats, splits_cfg))
        }
    };
    let index = Arc::new(index);
    env.indexes.cache_splits_index(key, index.clone());
    Ok(index)
}

/// Cached projections index for the table, rebuilt on miss or when stale.
fn projections_index_for(
    env: &PlannerEnv,
    table: &BaseTable,
    layout: &Layout,
    order: &Order,
) -> Result<Arc<ProjectionsIndex>> {
    let key = SchemaTableName::new(&table.schema_name, &table.table_name);
    if let Some(index) = env.indexes.projections_index(&key) {
        if index.version() >= layout.version {
            return Ok(index);
        }
        debug!(table = %key, "projections index is stale, rebuilding");
    }
    let projections = layout.decode_projections()?;
    let index = Arc::new(ProjectionsIndex::new(layout.version, order, &projections)?);
    env.indexes.cache_projections_index(key, index.clone());
    Ok(index)
}
