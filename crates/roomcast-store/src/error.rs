//! Error types for the shared-store layer.

/// Errors that can occur talking to the shared store.
///
/// A store error fails the single request that issued it; it is never
/// fatal to the process. The gateway logs it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A Redis command or connection failed.
    #[cfg(feature = "redis")]
    #[error("redis command failed: {0}")]
    Redis(#[from] redis::RedisError),

    /// The operation did not complete within the configured bound.
    #[error("store operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A counter field holds a value that is not an integer.
    #[error("value at {key}.{field} is not an integer")]
    NotAnInteger { key: String, field: String },
}
