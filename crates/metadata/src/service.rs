use crate::domain::{ColumnStats, Layout};
use strato_common::Result;

/// Read-only catalog boundary the planner compiles against.
///
/// Contract:
/// - `get_layouts` returns all layout versions of a table, oldest first;
/// - `column_stats` backs the cost-based splits index;
/// - failures surface as `MetadataUnavailable`.
///
/// Implementations are typically RPC clients against the metadata server
/// named by `metadata.server.host`/`metadata.server.port`; tests use
/// in-memory fixtures.
pub trait MetadataService: Send + Sync {
    /// All layout versions of `schema.table`.
    fn get_layouts(&self, schema: &str, table: &str) -> Result<Vec<Layout>>;

    /// Per-column chunk statistics of `schema.table`.
    fn column_stats(&self, schema: &str, table: &str) -> Result<Vec<ColumnStats>>;
}
