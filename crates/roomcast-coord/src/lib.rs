//! Coordination layer for Roomcast.
//!
//! Everything here is shared across server processes through the store:
//!
//! - [`RoomRegistry`] — which players are in which room
//!   (`room:<roomId>:players` sets)
//! - [`MatchmakingQueue`] — who is waiting for a match
//!   (`matchmaking:queue` list)
//! - [`GameStateStore`] — per-room player attributes and the room event
//!   channel (`game:<roomId>:state` hash, `game:<roomId>:events`)
//!
//! Each component is a thin struct over an injected
//! [`SharedStore`](roomcast_store::SharedStore) (no ambient singletons),
//! constructed at process start and cheap to clone. None of them hold client-side locks: mutations that must be
//! safe under concurrent callers are expressed as single atomic store
//! operations, everything else is best-effort.
//!
//! ```text
//! gateway ──► RoomRegistry ────┐
//!         ──► MatchmakingQueue ├──► SharedStore (Redis)
//!         ──► GameStateStore ──┘
//! ```

pub mod keys;

mod error;
mod game_state;
mod matchmaking;
mod registry;

pub use error::CoordError;
pub use game_state::{
    ActionEvent, GameStateStore, DEFAULT_ATTACK_DAMAGE, HEAL_AMOUNT,
};
pub use matchmaking::{MatchmakingQueue, DEFAULT_ROOM_SIZE};
pub use registry::RoomRegistry;
