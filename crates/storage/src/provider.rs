use crate::scheme::Scheme;
use strato_common::Result;

/// Read-only path listing over a storage backend.
///
/// Contract:
/// - `list_paths` returns every file under the given prefix, in lexicographic
///   order — compilation output must be deterministic, and listing order
///   leaks into split and worker ordering;
/// - listing failures surface as `StorageUnavailable`.
pub trait Storage: Send + Sync {
    /// The scheme this handle reads from.
    fn scheme(&self) -> Scheme;

    /// List all file paths under `prefix`, sorted lexicographically.
    fn list_paths(&self, prefix: &str) -> Result<Vec<String>>;
}
