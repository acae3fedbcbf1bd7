use std::collections::BTreeSet;

use crate::provider::Storage;
use crate::scheme::Scheme;
use strato_common::Result;

/// In-memory storage handle listing a fixed set of registered paths.
///
/// Used by embedded hosts that know their file inventory up front and by the
/// planner test suite. The backing set is ordered, so listings are sorted by
/// construction.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    scheme: Scheme,
    paths: BTreeSet<String>,
}

impl MemoryStorage {
    /// Create an empty in-memory storage reporting the given scheme.
    pub fn new(scheme: Scheme) -> Self {
        Self {
            scheme,
            paths: BTreeSet::new(),
        }
    }

    /// Register a file path.
    pub fn add_path(&mut self, path: impl Into<String>) {
        self.paths.insert(path.into());
    }

    /// Register `count` files named `<prefix><i>` under a directory prefix.
    pub fn add_files(&mut self, dir: &str, stem: &str, count: usize) {
        let base = if dir.ends_with('/') {
            dir.to_string()
        } else {
            format!("{dir}/")
        };
        for i in 0..count {
            self.paths.insert(format!("{base}{stem}{i}"));
        }
    }
}

impl Storage for MemoryStorage {
    fn scheme(&self) -> Scheme {
        self.scheme
    }

    fn list_paths(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .paths
            .iter()
            .filter(|p| p.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_by_prefix_in_order() {
        let mut storage = MemoryStorage::new(Scheme::Memory);
        storage.add_files("/data/t/ordered", "f", 3);
        storage.add_path("/data/other/f0");

        let paths = storage.list_paths("/data/t/").unwrap();
        assert_eq!(
            paths,
            vec![
                "/data/t/ordered/f0".to_string(),
                "/data/t/ordered/f1".to_string(),
                "/data/t/ordered/f2".to_string(),
            ]
        );
    }
}
