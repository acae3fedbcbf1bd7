use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::SchemaTableName;
use crate::index::projections_index::ProjectionsIndex;
use crate::index::splits_index::SplitsIndex;

/// Process-wide cache of per-table split and projection indices.
///
/// Contract:
/// - lookup takes a shared snapshot (read lock) of the latest cached index;
/// - caching an index atomically replaces the previous snapshot for the key;
/// - readers may observe a stale-but-valid index — the caller compares the
///   index version against the current layout version and rebuilds when
///   stale.
#[derive(Debug, Default)]
pub struct IndexFactory {
    splits: RwLock<HashMap<SchemaTableName, Arc<SplitsIndex>>>,
    projections: RwLock<HashMap<SchemaTableName, Arc<ProjectionsIndex>>>,
}

impl IndexFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest cached splits index for the table, if any.
    pub fn splits_index(&self, table: &SchemaTableName) -> Option<Arc<SplitsIndex>> {
        self.splits
            .read()
            .expect("splits index lock poisoned")
            .get(table)
            .cloned()
    }

    /// Cache a rebuilt splits index, replacing any previous snapshot.
    pub fn cache_splits_index(&self, table: SchemaTableName, index: Arc<SplitsIndex>) {
        self.splits
            .write()
            .expect("splits index lock poisoned")
            .insert(table, index);
    }

    /// Latest cached projections index for the table, if any.
    pub fn projections_index(&self, table: &SchemaTableName) -> Option<Arc<ProjectionsIndex>> {
        self.projections
            .read()
            .expect("projections index lock poisoned")
            .get(table)
            .cloned()
    }

    /// Cache a rebuilt projections index, replacing any previous snapshot.
    pub fn cache_projections_index(&self, table: SchemaTableName, index: Arc<ProjectionsIndex>) {
        self.projections
            .write()
            .expect("projections index lock poisoned")
            .insert(table, index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Order, Splits};
    use crate::index::splits_index::InvertedSplitsIndex;

    fn index(version: u32) -> Arc<SplitsIndex> {
        let order = Order {
            column_order: vec!["a".to_string()],
        };
        let splits = Splits {
            num_row_group_in_block: 16,
            split_patterns: vec![],
        };
        Arc::new(SplitsIndex::Inverted(
            InvertedSplitsIndex::new(version, &order, &splits).unwrap(),
        ))
    }

    #[test]
    fn cache_replaces_snapshot() {
        let factory = IndexFactory::new();
        let key = SchemaTableName::new("s", "t");
        assert!(factory.splits_index(&key).is_none());

        factory.cache_splits_index(key.clone(), index(1));
        assert_eq!(factory.splits_index(&key).unwrap().version(), 1);

        factory.cache_splits_index(key.clone(), index(2));
        assert_eq!(factory.splits_index(&key).unwrap().version(), 2);
    }
}
