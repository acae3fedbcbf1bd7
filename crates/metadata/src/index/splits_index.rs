use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::domain::{ColumnStats, Order, Splits};
use crate::index::column_set::ColumnSet;
use strato_common::{Result, StratoError};

/// Bytes one split is budgeted to read under the cost-based index.
const SPLIT_READ_BUDGET_BYTES: u64 = 64 * 1024 * 1024;

/// Split-size index over one table, either flavor.
#[derive(Debug)]
pub enum SplitsIndex {
    /// Exact-match pattern lookup.
    Inverted(InvertedSplitsIndex),
    /// Statistics-driven sizing.
    CostBased(CostBasedSplitsIndex),
}

impl SplitsIndex {
    /// Layout version the index was built from.
    pub fn version(&self) -> u32 {
        match self {
            Self::Inverted(i) => i.version,
            Self::CostBased(i) => i.version,
        }
    }

    /// Upper bound for any split size this index returns.
    pub fn max_split_size(&self) -> u32 {
        match self {
            Self::Inverted(i) => i.max_split_size,
            Self::CostBased(i) => i.max_split_size,
        }
    }

    /// Split size (row groups) for the given accessed-column set, already
    /// bounded by [`Self::max_split_size`].
    pub fn search(&self, columns: &ColumnSet) -> u32 {
        match self {
            Self::Inverted(i) => i.search(columns),
            Self::CostBased(i) => i.search(columns),
        }
    }
}

/// Exact-match split index: pre-computed patterns keyed by accessed-column
/// set, falling back to a whole-block split when no pattern matches.
#[derive(Debug)]
pub struct InvertedSplitsIndex {
    version: u32,
    patterns: HashMap<BTreeSet<String>, u32>,
    default_split_size: u32,
    max_split_size: u32,
}

impl InvertedSplitsIndex {
    /// Build from a layout's column order and split configuration.
    ///
    /// Patterns naming columns outside the layout order are rejected as
    /// `MalformedMetadata`.
    pub fn new(version: u32, order: &Order, splits: &Splits) -> Result<Self> {
        let known: BTreeSet<&str> = order.column_order.iter().map(String::as_str).collect();
        let mut patterns = HashMap::with_capacity(splits.split_patterns.len());
        let mut max_split_size = splits.num_row_group_in_block.max(1);
        for pattern in &splits.split_patterns {
            for column in &pattern.accessed_columns {
                if !known.contains(column.as_str()) {
                    return Err(StratoError::MalformedMetadata(format!(
                        "split pattern references unknown column '{column}'"
                    )));
                }
            }
            let key: BTreeSet<String> = pattern.accessed_columns.iter().cloned().collect();
            max_split_size = max_split_size.max(pattern.num_row_group_in_split);
            patterns.insert(key, pattern.num_row_group_in_split.max(1));
        }
        Ok(Self {
            version,
            patterns,
            default_split_size: splits.num_row_group_in_block.max(1),
            max_split_size,
        })
    }

    fn search(&self, columns: &ColumnSet) -> u32 {
        match self.patterns.get(columns.as_btree()) {
            Some(size) => (*size).min(self.max_split_size),
            None => {
                debug!(columns = %columns, "no exact split pattern, using default");
                self.default_split_size
            }
        }
    }
}

/// Statistics-driven split index: picks the largest split whose estimated
/// read volume for the accessed columns stays inside a fixed per-split
/// budget.
#[derive(Debug)]
pub struct CostBasedSplitsIndex {
    version: u32,
    column_chunk_bytes: HashMap<String, u64>,
    max_split_size: u32,
}

impl CostBasedSplitsIndex {
    /// Build from per-column chunk statistics and the layout's split
    /// configuration.
    pub fn new(version: u32, stats: &[ColumnStats], splits: &Splits) -> Self {
        let column_chunk_bytes = stats
            .iter()
            .map(|s| (s.column_name.clone(), s.chunk_size_bytes))
            .collect();
        Self {
            version,
            column_chunk_bytes,
            max_split_size: splits.num_row_group_in_block.max(1),
        }
    }

    fn search(&self, columns: &ColumnSet) -> u32 {
        let cost_per_row_group: u64 = columns
            .iter()
            .filter_map(|c| self.column_chunk_bytes.get(c))
            .sum();
        if cost_per_row_group == 0 {
            return self.max_split_size;
        }
        let size = SPLIT_READ_BUDGET_BYTES / cost_per_row_group;
        (size as u32).clamp(1, self.max_split_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SplitPatternDef;

    fn order(cols: &[&str]) -> Order {
        Order {
            column_order: cols.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn splits(block: u32, patterns: Vec<(&[&str], u32)>) -> Splits {
        Splits {
            num_row_group_in_block: block,
            split_patterns: patterns
                .into_iter()
                .map(|(cols, size)| SplitPatternDef {
                    accessed_columns: cols.iter().map(|c| c.to_string()).collect(),
                    num_row_group_in_split: size,
                })
                .collect(),
        }
    }

    #[test]
    fn inverted_exact_match_and_fallback() {
        let index = InvertedSplitsIndex::new(
            2,
            &order(&["a", "b", "c"]),
            &splits(32, vec![(&["a", "b"], 8), (&["c"], 16)]),
        )
        .unwrap();

        assert_eq!(index.search(&ColumnSet::from_columns(["b", "a"])), 8);
        assert_eq!(index.search(&ColumnSet::from_columns(["c"])), 16);
        // No pattern for {a}: whole block.
        assert_eq!(index.search(&ColumnSet::from_columns(["a"])), 32);
    }

    #[test]
    fn inverted_rejects_unknown_pattern_column() {
        let err = InvertedSplitsIndex::new(
            1,
            &order(&["a"]),
            &splits(32, vec![(&["ghost"], 8)]),
        )
        .unwrap_err();
        assert!(matches!(err, StratoError::MalformedMetadata(_)));
    }

    #[test]
    fn cost_based_clamps_to_block() {
        let stats = vec![
            ColumnStats {
                column_name: "wide".to_string(),
                chunk_size_bytes: 256 * 1024 * 1024,
            },
            ColumnStats {
                column_name: "narrow".to_string(),
                chunk_size_bytes: 1024 * 1024,
            },
        ];
        let index = CostBasedSplitsIndex::new(1, &stats, &splits(32, vec![]));
        let wrapped = SplitsIndex::CostBased(index);

        // 64MiB budget over a 256MiB chunk: clamped up to 1.
        assert_eq!(wrapped.search(&ColumnSet::from_columns(["wide"])), 1);
        // 64MiB budget over a 1MiB chunk: 64, clamped down to the block.
        assert_eq!(wrapped.search(&ColumnSet::from_columns(["narrow"])), 32);
        assert_eq!(wrapped.max_split_size(), 32);
    }
}
