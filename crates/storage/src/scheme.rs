use serde::{Deserialize, Serialize};
use std::fmt;
use strato_common::{Result, StratoError};

/// Storage backend identifier carried in worker output descriptors.
///
/// The planner never talks to these backends itself; it only names them so
/// workers know where to read inputs and write results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Amazon S3 or any S3-compatible endpoint.
    S3,
    /// MinIO object storage.
    Minio,
    /// Redis-backed intermediate storage.
    Redis,
    /// Local filesystem.
    Local,
    /// In-process memory storage, used by embedded hosts and tests.
    Memory,
}

impl Scheme {
    /// Parse a scheme from its configured name, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "minio" => Ok(Self::Minio),
            "redis" => Ok(Self::Redis),
            "local" => Ok(Self::Local),
            "memory" => Ok(Self::Memory),
            other => Err(StratoError::InvalidConfig(format!(
                "unknown storage scheme '{other}'"
            ))),
        }
    }

    /// The lowercase name used in configuration and serialized descriptors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Minio => "minio",
            Self::Redis => "redis",
            Self::Local => "local",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(Scheme::from_name("S3").unwrap(), Scheme::S3);
        assert_eq!(Scheme::from_name("minio").unwrap(), Scheme::Minio);
        assert!(Scheme::from_name("tape").is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Scheme::Redis).unwrap(), "\"redis\"");
    }
}
