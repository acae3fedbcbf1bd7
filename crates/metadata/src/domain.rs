use serde::{Deserialize, Serialize};
use std::fmt;

use strato_common::{Result, StratoError};

/// Fully qualified table name, the cache key for all per-table indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaTableName {
    /// Schema (database) name.
    pub schema_name: String,
    /// Table name.
    pub table_name: String,
}

impl SchemaTableName {
    /// Create a qualified table name.
    pub fn new(schema_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
        }
    }
}

impl fmt::Display for SchemaTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema_name, self.table_name)
    }
}

/// One physical layout version of a table.
///
/// The order/splits/projections fields are stored serialized in the catalog;
/// [`Layout::decode_order`] and friends parse them on demand. Decode failures
/// are `MalformedMetadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Monotonically increasing layout version.
    pub version: u32,
    /// Directory of append-only single-row-group files.
    pub ordered_path: String,
    /// Directory of compacted multi-row-group files.
    pub compact_path: String,
    /// Serialized column order ([`Order`] as JSON).
    pub order: String,
    /// Serialized split patterns ([`Splits`] as JSON).
    pub splits: String,
    /// Serialized projection patterns ([`Projections`] as JSON).
    pub projections: String,
}

impl Layout {
    /// Decode the column order.
    pub fn decode_order(&self) -> Result<Order> {
        serde_json::from_str(&self.order).map_err(|e| {
            StratoError::MalformedMetadata(format!("layout v{} order: {e}", self.version))
        })
    }

    /// Decode the split patterns.
    pub fn decode_splits(&self) -> Result<Splits> {
        serde_json::from_str(&self.splits).map_err(|e| {
            StratoError::MalformedMetadata(format!("layout v{} splits: {e}", self.version))
        })
    }

    /// Decode the projection patterns.
    pub fn decode_projections(&self) -> Result<Projections> {
        serde_json::from_str(&self.projections).map_err(|e| {
            StratoError::MalformedMetadata(format!("layout v{} projections: {e}", self.version))
        })
    }
}

/// Physical column order of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Column names in physical order.
    pub column_order: Vec<String>,
}

/// Split configuration of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Splits {
    /// Row groups per compacted block; the upper bound for any split size.
    pub num_row_group_in_block: u32,
    /// Pre-computed split patterns.
    #[serde(default)]
    pub split_patterns: Vec<SplitPatternDef>,
}

/// One pre-computed split pattern: for this exact accessed-column set, read
/// this many row groups per split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitPatternDef {
    /// Accessed column names the pattern was computed for.
    pub accessed_columns: Vec<String>,
    /// Row groups per split.
    pub num_row_group_in_split: u32,
}

/// Projection configuration of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projections {
    /// Pre-computed projection patterns.
    #[serde(default)]
    pub projection_patterns: Vec<ProjectionPatternDef>,
}

/// One projection pattern: for this exact accessed-column set, a compact path
/// holding only those columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPatternDef {
    /// Accessed column names the pattern was computed for.
    pub accessed_columns: Vec<String>,
    /// Alternate compact path.
    pub path: String,
}

/// Per-column storage statistics used by the cost-based splits index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStats {
    /// Column name.
    pub column_name: String,
    /// Average bytes one row group of this column occupies.
    pub chunk_size_bytes: u64,
}
