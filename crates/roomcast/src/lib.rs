//! # Roomcast
//!
//! A realtime multiplayer session coordinator over persistent WebSocket
//! connections: it registers connected clients, groups waiting players
//! into rooms in FIFO order, tracks room membership, applies gameplay
//! actions to per-room shared state, and fans state changes out to room
//! members.
//!
//! All cross-connection state — membership sets, the matchmaking queue,
//! player attributes — lives in a shared store (Redis in production, an
//! in-memory twin in tests), so any number of server processes can serve
//! the same rooms. The only process-local state is the live connection
//! registry owned by this process's gateway.
//!
//! ```text
//! client ──ws──► gateway ──► registry / queue / game state ──► store
//!                   │                                            │
//!                   ◄──────────── broadcaster ◄──────────────────┘
//! ```

mod broadcast;
mod config;
mod error;
mod gateway;
mod server;

pub use broadcast::Broadcaster;
pub use config::ServerConfig;
pub use error::RoomcastError;
pub use gateway::{ConnectionRegistry, ConnectionState};
pub use server::{RoomcastServer, RoomcastServerBuilder};

/// Convenience re-exports for embedding or driving a server.
pub mod prelude {
    pub use crate::{
        RoomcastError, RoomcastServer, RoomcastServerBuilder,
        ServerConfig,
    };
    pub use roomcast_coord::{
        GameStateStore, MatchmakingQueue, RoomRegistry,
    };
    pub use roomcast_protocol::{
        Action, ClientMessage, PlayerState, ServerMessage,
    };
    pub use roomcast_store::{MemoryStore, SharedStore};
}
