//! Core protocol types for Roomcast's wire format.
//!
//! Inbound and outbound messages are closed tagged-variant enums. The
//! `#[serde(tag = "type", content = "payload")]` attribute produces the
//! `{"type": ..., "payload": ...}` envelope used in both directions, and
//! exhaustive `match` replaces the string-keyed dispatch a dynamic
//! implementation would need. A message whose `type` is not one of the
//! variants simply fails to decode, which the gateway logs and drops.

use serde::{Deserialize, Serialize};

/// Health a player spawns with, and the ceiling heals are clamped to.
pub const FULL_HEALTH: i64 = 100;

// ---------------------------------------------------------------------------
// PlayerState
// ---------------------------------------------------------------------------

/// Per-player mutable attributes, scoped to a room.
///
/// Serializes as `{"id": ..., "x": ..., "y": ..., "health": ...}` — the
/// element shape of the `state_update` payload. The canonical copy lives in
/// the shared store's per-room hash; this struct is the reconstructed view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: String,
    pub x: i64,
    pub y: i64,
    pub health: i64,
}

impl PlayerState {
    /// The state a player has when a room is initialized: origin position,
    /// full health.
    pub fn spawned(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: 0,
            y: 0,
            health: FULL_HEALTH,
        }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A gameplay action applied to per-room player state.
///
/// Internally tagged on `type`: `{"type": "move", "dx": 5, "dy": -3}`.
/// `dx`/`dy` may each be omitted; `damage` defaults at application time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    /// Relative position change for the acting player.
    Move { dx: Option<i64>, dy: Option<i64> },

    /// Damage dealt to `target_id`'s health (clamped at 0).
    Attack {
        #[serde(rename = "targetId")]
        target_id: Option<String>,
        damage: Option<i64>,
    },

    /// Fixed self-heal, capped at [`FULL_HEALTH`].
    Heal {},
}

// ---------------------------------------------------------------------------
// Inbound messages
// ---------------------------------------------------------------------------

/// The payload of a `CHAT` message.
///
/// Only `room` is meaningful to the server; everything else is relayed
/// verbatim to the other room members, so it is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBody {
    pub room: String,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

/// A message received from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Echo request; the payload is opaque and returned as-is.
    #[serde(rename = "ECHO")]
    Echo(serde_json::Value),

    /// Join a named room.
    #[serde(rename = "JOIN")]
    Join { room: String },

    /// Leave a named room.
    #[serde(rename = "LEAVE")]
    Leave { room: String },

    /// Relay the payload to the other members of `room`.
    #[serde(rename = "CHAT")]
    Chat(ChatBody),

    /// Enter the matchmaking queue. Payload is an empty object.
    #[serde(rename = "MATCH_START")]
    MatchStart {},

    /// Apply a gameplay action in `room`.
    #[serde(rename = "PLAYER_ACTION")]
    PlayerAction { room: String, action: Action },
}

// ---------------------------------------------------------------------------
// Outbound messages
// ---------------------------------------------------------------------------

/// A message sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Reply to `ECHO`, carrying the original payload.
    #[serde(rename = "echo")]
    Echo(serde_json::Value),

    /// Server-origin relay of another member's `CHAT` payload.
    #[serde(rename = "server")]
    Server(serde_json::Value),

    /// A match formed: the new room and everyone in it.
    #[serde(rename = "match_start")]
    MatchStart { room: String, players: Vec<String> },

    /// Authoritative per-room player state after a change.
    #[serde(rename = "state_update")]
    StateUpdate { players: Vec<PlayerState> },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is fixed by the envelope convention: these tests
    //! pin the exact JSON shapes so a client written against the protocol
    //! cannot be broken by a serde attribute change.

    use super::*;
    use serde_json::json;

    // =====================================================================
    // PlayerState
    // =====================================================================

    #[test]
    fn test_player_state_spawned_defaults() {
        let p = PlayerState::spawned("abc");
        assert_eq!(p.id, "abc");
        assert_eq!((p.x, p.y), (0, 0));
        assert_eq!(p.health, FULL_HEALTH);
    }

    #[test]
    fn test_player_state_json_shape() {
        let p = PlayerState {
            id: "p1".into(),
            x: 5,
            y: -3,
            health: 70,
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v, json!({"id": "p1", "x": 5, "y": -3, "health": 70}));
    }

    // =====================================================================
    // Action
    // =====================================================================

    #[test]
    fn test_action_move_parses_with_partial_deltas() {
        let a: Action =
            serde_json::from_value(json!({"type": "move", "dx": 5}))
                .unwrap();
        assert_eq!(
            a,
            Action::Move {
                dx: Some(5),
                dy: None
            }
        );
    }

    #[test]
    fn test_action_attack_field_names_are_camel_case() {
        let a = Action::Attack {
            target_id: Some("p2".into()),
            damage: Some(30),
        };
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(
            v,
            json!({"type": "attack", "targetId": "p2", "damage": 30})
        );
    }

    #[test]
    fn test_action_attack_damage_is_optional() {
        let a: Action = serde_json::from_value(
            json!({"type": "attack", "targetId": "p2"}),
        )
        .unwrap();
        assert_eq!(
            a,
            Action::Attack {
                target_id: Some("p2".into()),
                damage: None
            }
        );
    }

    #[test]
    fn test_action_heal_round_trip() {
        let a: Action =
            serde_json::from_value(json!({"type": "heal"})).unwrap();
        assert_eq!(a, Action::Heal {});
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["type"], "heal");
    }

    #[test]
    fn test_action_unknown_kind_fails() {
        let result: Result<Action, _> =
            serde_json::from_value(json!({"type": "teleport", "dx": 1}));
        assert!(result.is_err());
    }

    // =====================================================================
    // ClientMessage
    // =====================================================================

    #[test]
    fn test_client_echo_keeps_payload_opaque() {
        let msg: ClientMessage = serde_json::from_value(
            json!({"type": "ECHO", "payload": {"anything": [1, 2, 3]}}),
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Echo(json!({"anything": [1, 2, 3]}))
        );
    }

    #[test]
    fn test_client_join_json_format() {
        let msg: ClientMessage = serde_json::from_value(
            json!({"type": "JOIN", "payload": {"room": "lobby"}}),
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Join {
                room: "lobby".into()
            }
        );
    }

    #[test]
    fn test_client_leave_round_trip() {
        let msg = ClientMessage::Leave {
            room: "lobby".into(),
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: ClientMessage =
            serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_client_chat_preserves_extra_fields() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "CHAT",
            "payload": {"room": "lobby", "text": "hi", "emote": 7}
        }))
        .unwrap();
        let ClientMessage::Chat(body) = msg else {
            panic!("expected Chat");
        };
        assert_eq!(body.room, "lobby");
        assert_eq!(body.rest["text"], "hi");
        assert_eq!(body.rest["emote"], 7);

        // And the payload survives re-serialization intact.
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(
            v,
            json!({"room": "lobby", "text": "hi", "emote": 7})
        );
    }

    #[test]
    fn test_client_match_start_takes_empty_payload() {
        let msg: ClientMessage = serde_json::from_value(
            json!({"type": "MATCH_START", "payload": {}}),
        )
        .unwrap();
        assert_eq!(msg, ClientMessage::MatchStart {});
    }

    #[test]
    fn test_client_player_action_json_format() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "PLAYER_ACTION",
            "payload": {
                "room": "match-1",
                "action": {"type": "move", "dx": 5, "dy": -3}
            }
        }))
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::PlayerAction {
                room: "match-1".into(),
                action: Action::Move {
                    dx: Some(5),
                    dy: Some(-3)
                },
            }
        );
    }

    #[test]
    fn test_client_unrecognized_kind_fails_to_decode() {
        let result: Result<ClientMessage, _> = serde_json::from_value(
            json!({"type": "FLY_TO_MOON", "payload": {"speed": 9000}}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_client_garbage_fails_to_decode() {
        let result: Result<ClientMessage, _> =
            serde_json::from_slice(b"not json at all");
        assert!(result.is_err());
    }

    // =====================================================================
    // ServerMessage
    // =====================================================================

    #[test]
    fn test_server_echo_json_format() {
        let msg = ServerMessage::Echo(json!({"hello": 1}));
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            v,
            json!({"type": "echo", "payload": {"hello": 1}})
        );
    }

    #[test]
    fn test_server_relay_json_format() {
        let msg = ServerMessage::Server(json!({"room": "r", "text": "hi"}));
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "server");
        assert_eq!(v["payload"]["text"], "hi");
    }

    #[test]
    fn test_server_match_start_json_format() {
        let msg = ServerMessage::MatchStart {
            room: "match-17".into(),
            players: vec!["a".into(), "b".into()],
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            v,
            json!({
                "type": "match_start",
                "payload": {"room": "match-17", "players": ["a", "b"]}
            })
        );
    }

    #[test]
    fn test_server_state_update_json_format() {
        let msg = ServerMessage::StateUpdate {
            players: vec![PlayerState::spawned("a")],
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            v,
            json!({
                "type": "state_update",
                "payload": {
                    "players": [{"id": "a", "x": 0, "y": 0, "health": 100}]
                }
            })
        );
    }

    #[test]
    fn test_server_message_round_trip() {
        let msg = ServerMessage::StateUpdate {
            players: vec![PlayerState {
                id: "a".into(),
                x: 1,
                y: 2,
                health: 50,
            }],
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: ServerMessage =
            serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }
}
