//! Wire protocol for Roomcast.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Action`],
//!   [`PlayerState`]) — the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! Every message in either direction is a `{"type": ..., "payload": ...}`
//! envelope. Inbound kinds are the upper-case command set
//! (`ECHO`/`JOIN`/`LEAVE`/`CHAT`/`MATCH_START`/`PLAYER_ACTION`); outbound
//! kinds are lower-case (`echo`/`server`/`match_start`/`state_update`).
//!
//! The protocol layer sits between the transport (raw bytes) and the
//! gateway (connection context). It doesn't know about connections,
//! rooms, or the shared store — it only knows how to serialize and
//! deserialize messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Action, ChatBody, ClientMessage, PlayerState, ServerMessage,
    FULL_HEALTH,
};
