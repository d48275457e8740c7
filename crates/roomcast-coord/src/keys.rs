//! Shared-store key conventions.
//!
//! These formats are part of the external interface: any other process or
//! tool that reads the store (or subscribes to a room's event channel)
//! depends on them, so they are pinned here and by tests.

/// The matchmaking FIFO list.
pub const MATCHMAKING_QUEUE: &str = "matchmaking:queue";

/// The membership set of a room.
pub fn room_players(room_id: &str) -> String {
    format!("room:{room_id}:players")
}

/// The per-room player attribute hash.
pub fn game_state(room_id: &str) -> String {
    format!("game:{room_id}:state")
}

/// The per-room event channel.
pub fn game_events(room_id: &str) -> String {
    format!("game:{room_id}:events")
}

/// A player's attribute field inside the room state hash.
pub fn player_field(player_id: &str, attr: &str) -> String {
    format!("{player_id}:{attr}")
}
