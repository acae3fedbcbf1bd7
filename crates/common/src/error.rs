use thiserror::Error;

/// Canonical strato error taxonomy used across crates.
///
/// Classification guidance:
/// - [`StratoError::InvalidPlan`]: plan-shape violations discovered during
///   validation or compilation (endian/algorithm constraints, impossible
///   chain-join states, unsupported algorithms in user plans)
/// - [`StratoError::MetadataUnavailable`]: the metadata service or an index
///   rebuild failed
/// - [`StratoError::StorageUnavailable`]: a storage listing failed
/// - [`StratoError::MalformedMetadata`]: layout fields failed to decode
/// - [`StratoError::InvalidConfig`]: configuration contract violations
/// - [`StratoError::Io`]: raw filesystem IO failures from std APIs
///
/// All variants are fatal to the current compilation; no partial operator
/// tree is returned and no retries are attempted by the compiler.
#[derive(Debug, Error)]
pub enum StratoError {
    /// The plan violates a structural invariant or requests an impossible
    /// compilation (e.g. LEFT/FULL outer join over broadcast, an incomplete
    /// chain join surfacing at the root).
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// The metadata service failed or returned no usable layouts.
    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// A storage path listing failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A serialized layout field (order/splits/projections) failed to decode.
    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),

    /// Invalid or inconsistent configuration.
    ///
    /// Examples:
    /// - unknown storage scheme name
    /// - non-positive worker parallelism or pre-aggregation threshold
    /// - unsupported config file extension
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Transparent std IO failures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Standard strato result alias.
pub type Result<T> = std::result::Result<T, StratoError>;
