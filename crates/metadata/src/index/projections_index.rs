use std::collections::{BTreeSet, HashMap};

use crate::domain::{Order, Projections};
use crate::index::column_set::ColumnSet;
use strato_common::{Result, StratoError};

/// Exact-match projection index: maps an accessed-column set to a compact
/// path holding only those columns. No fallback — a miss means the layout's
/// own compact path stays in effect.
#[derive(Debug)]
pub struct ProjectionsIndex {
    version: u32,
    patterns: HashMap<BTreeSet<String>, String>,
}

impl ProjectionsIndex {
    /// Build from a layout's column order and projection configuration.
    pub fn new(version: u32, order: &Order, projections: &Projections) -> Result<Self> {
        let known: BTreeSet<&str> = order.column_order.iter().map(String::as_str).collect();
        let mut patterns = HashMap::with_capacity(projections.projection_patterns.len());
        for pattern in &projections.projection_patterns {
            for column in &pattern.accessed_columns {
                if !known.contains(column.as_str()) {
                    return Err(StratoError::MalformedMetadata(format!(
                        "projection pattern references unknown column '{column}'"
                    )));
                }
            }
            let key: BTreeSet<String> = pattern.accessed_columns.iter().cloned().collect();
            patterns.insert(key, pattern.path.clone());
        }
        Ok(Self { version, patterns })
    }

    /// Layout version the index was built from.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Projection-optimized compact path for the column set, if one exists.
    pub fn search(&self, columns: &ColumnSet) -> Option<&str> {
        self.patterns.get(columns.as_btree()).map(String::as_str)
    }
}
