use std::fs;
use std::path::Path;

use crate::provider::Storage;
use crate::scheme::Scheme;
use strato_common::{Result, StratoError};

/// Local-filesystem storage handle.
///
/// A prefix is interpreted as a directory; its direct file children are the
/// listed paths. Nested directories are walked depth-first so compact layouts
/// organized into sub-directories still enumerate fully.
#[derive(Debug, Default, Clone)]
pub struct LocalStorage;

impl LocalStorage {
    /// Create a local storage handle.
    pub fn new() -> Self {
        Self
    }

    fn walk(dir: &Path, out: &mut Vec<String>) -> std::io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                Self::walk(&path, out)?;
            } else {
                out.push(path.to_string_lossy().into_owned());
            }
        }
        Ok(())
    }
}

impl Storage for LocalStorage {
    fn scheme(&self) -> Scheme {
        Scheme::Local
    }

    fn list_paths(&self, prefix: &str) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        Self::walk(Path::new(prefix), &mut paths).map_err(|e| {
            StratoError::StorageUnavailable(format!("failed to list '{prefix}': {e}"))
        })?;
        paths.sort();
        Ok(paths)
    }
}
