//! Unified error type for the Roomcast server.

use roomcast_coord::CoordError;
use roomcast_protocol::ProtocolError;
use roomcast_store::StoreError;
use roomcast_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically. A value
/// of this type always scopes a failure to one request or one
/// connection — nothing here is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum RoomcastError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A shared-store error (command failure, timeout).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A coordination-layer error (registry, queue, game state).
    #[error(transparent)]
    Coord(#[from] CoordError),

    /// The process configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}
