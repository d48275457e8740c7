//! Error types for the coordination layer.

use roomcast_store::StoreError;

/// Errors that can occur during a coordination operation.
#[derive(Debug, thiserror::Error)]
pub enum CoordError {
    /// The underlying shared-store round trip failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A room event could not be serialized for publishing.
    #[error("event encoding failed: {0}")]
    EncodeEvent(#[from] serde_json::Error),
}
