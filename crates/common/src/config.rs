use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, StratoError};

/// Split-index flavor used when no fixed split size is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitsIndexKind {
    /// Exact-match lookup over pre-computed column-set patterns.
    Inverted,
    /// Split size derived from column chunk statistics.
    CostBased,
}

impl Default for SplitsIndexKind {
    fn default() -> Self {
        Self::Inverted
    }
}

/// Executor configuration shared by the plan compiler and its hosts.
///
/// Serialized field names are the flat dotted keys the engine has always
/// recognized, so a config file written for the server deploys unchanged
/// against this library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Storage scheme the base tables are read from.
    #[serde(rename = "executor.input.storage", default = "default_storage")]
    pub input_storage: String,
    /// Storage scheme intermediate results are written to.
    #[serde(rename = "executor.intermediate.storage", default = "default_storage")]
    pub intermediate_storage: String,
    /// Path prefix for intermediate results; a trailing slash is enforced.
    #[serde(rename = "executor.intermediate.folder", default = "default_intermediate_folder")]
    pub intermediate_folder: String,
    /// Number of input splits assigned to one worker invocation.
    #[serde(rename = "executor.intra.worker.parallelism", default = "default_parallelism")]
    pub intra_worker_parallelism: usize,
    /// Partial-aggregation worker count above which a pre-aggregation stage
    /// is inserted.
    #[serde(rename = "aggregation.pre-aggregate.threshold", default = "default_pre_aggr_threshold")]
    pub pre_aggregate_threshold: usize,
    /// Whether partial aggregation results are written to the final output
    /// endpoint when no pre-aggregation stage exists.
    #[serde(rename = "aggregation.compute.final.in.server", default)]
    pub compute_final_aggr_in_server: bool,
    /// Fixed row-group count per split; `0` defers to the splits index.
    #[serde(rename = "fixed.split.size", default)]
    pub fixed_split_size: u32,
    /// Whether projection-optimized compact paths may substitute the
    /// layout's compact path.
    #[serde(rename = "projection.read.enabled", default)]
    pub projection_read_enabled: bool,
    /// Split-index flavor.
    #[serde(rename = "splits.index.type", default)]
    pub splits_index_type: SplitsIndexKind,
    /// Metadata server host.
    #[serde(rename = "metadata.server.host", default = "default_metadata_host")]
    pub metadata_host: String,
    /// Metadata server port.
    #[serde(rename = "metadata.server.port", default = "default_metadata_port")]
    pub metadata_port: u16,
}

fn default_storage() -> String {
    "s3".to_string()
}

fn default_intermediate_folder() -> String {
    "strato-intermediate/".to_string()
}

fn default_parallelism() -> usize {
    4
}

fn default_pre_aggr_threshold() -> usize {
    8
}

fn default_metadata_host() -> String {
    "localhost".to_string()
}

fn default_metadata_port() -> u16 {
    18888
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            input_storage: default_storage(),
            intermediate_storage: default_storage(),
            intermediate_folder: default_intermediate_folder(),
            intra_worker_parallelism: default_parallelism(),
            pre_aggregate_threshold: default_pre_aggr_threshold(),
            compute_final_aggr_in_server: false,
            fixed_split_size: 0,
            projection_read_enabled: false,
            splits_index_type: SplitsIndexKind::default(),
            metadata_host: default_metadata_host(),
            metadata_port: default_metadata_port(),
        }
    }
}

impl ExecutorConfig {
    /// Load configuration from a `.json` or `.toml` file.
    pub fn load(path: &str) -> Result<Self> {
        match Path::new(path).extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let s = fs::read_to_string(path)?;
                serde_json::from_str(&s).map_err(|e| {
                    StratoError::InvalidConfig(format!("config json decode failed: {e}"))
                })
            }
            Some("toml") => {
                let s = fs::read_to_string(path)?;
                toml::from_str(&s).map_err(|e| {
                    StratoError::InvalidConfig(format!("config toml decode failed: {e}"))
                })
            }
            Some(other) => Err(StratoError::InvalidConfig(format!(
                "unsupported config extension '.{other}'; use .json or .toml"
            ))),
            None => Err(StratoError::InvalidConfig(
                "config path must include extension .json or .toml".to_string(),
            )),
        }
    }

    /// Validate value-range contracts that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.intra_worker_parallelism == 0 {
            return Err(StratoError::InvalidConfig(
                "executor.intra.worker.parallelism must be positive".to_string(),
            ));
        }
        if self.pre_aggregate_threshold == 0 {
            return Err(StratoError::InvalidConfig(
                "aggregation.pre-aggregate.threshold must be positive".to_string(),
            ));
        }
        if self.intermediate_folder.is_empty() {
            return Err(StratoError::InvalidConfig(
                "executor.intermediate.folder must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The intermediate folder with its trailing slash enforced.
    pub fn intermediate_root(&self) -> String {
        if self.intermediate_folder.ends_with('/') {
            self.intermediate_folder.clone()
        } else {
            format!("{}/", self.intermediate_folder)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = ExecutorConfig::default();
        cfg.validate().expect("default config is valid");
        assert!(cfg.intermediate_root().ends_with('/'));
    }

    #[test]
    fn dotted_keys_round_trip() {
        let cfg = ExecutorConfig::default();
        let s = serde_json::to_string(&cfg).unwrap();
        assert!(s.contains("executor.intra.worker.parallelism"));
        assert!(s.contains("splits.index.type"));
        let back: ExecutorConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: ExecutorConfig =
            serde_json::from_str(r#"{"fixed.split.size": 8, "splits.index.type": "COST_BASED"}"#)
                .unwrap();
        assert_eq!(cfg.fixed_split_size, 8);
        assert_eq!(cfg.splits_index_type, SplitsIndexKind::CostBased);
        assert_eq!(cfg.intra_worker_parallelism, 4);
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let cfg = ExecutorConfig {
            intra_worker_parallelism: 0,
            ..ExecutorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn trailing_slash_is_appended() {
        let cfg = ExecutorConfig {
            intermediate_folder: "/tmp/strato".to_string(),
            ..ExecutorConfig::default()
        };
        assert_eq!(cfg.intermediate_root(), "/tmp/strato/");
    }
}
