//! End-to-end tests: a real server on an OS-assigned port, driven by
//! `tokio-tungstenite` clients over the JSON wire protocol.
//!
//! The server runs over a `MemoryStore`; the test keeps a clone of it to
//! assert what actually landed in the shared store. Because a
//! connection's messages are handled sequentially, an `ECHO` round trip
//! doubles as a barrier: once the echo is back, every message sent
//! before it has been fully processed.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use roomcast::RoomcastServerBuilder;
use roomcast_coord::keys;
use roomcast_store::{MemoryStore, SharedStore};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// =========================================================================
// Helpers
// =========================================================================

/// Starts a server on a random port; returns its address and the store.
async fn start_server() -> (String, MemoryStore) {
    let store = MemoryStore::new();
    let server = RoomcastServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(store.clone())
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, store)
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send_json(ws: &mut ClientWs, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send should succeed");
}

async fn recv_json(ws: &mut ClientWs) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for a message")
        .expect("stream should not end")
        .expect("recv should succeed");
    serde_json::from_slice(&msg.into_data()).expect("server sends JSON")
}

/// Sends an `ECHO` with a marker and waits for it to come back. Everything
/// sent on this connection beforehand is fully processed once this returns.
async fn barrier(ws: &mut ClientWs, marker: &str) {
    send_json(
        ws,
        json!({"type": "ECHO", "payload": {"barrier": marker}}),
    )
    .await;
    let reply = recv_json(ws).await;
    assert_eq!(reply["type"], "echo");
    assert_eq!(reply["payload"]["barrier"], marker);
}

/// Runs both clients through `MATCH_START` and returns the room id and
/// member ids from the `match_start` notifications.
async fn form_match(
    c1: &mut ClientWs,
    c2: &mut ClientWs,
) -> (String, Vec<String>) {
    send_json(c1, json!({"type": "MATCH_START", "payload": {}})).await;
    barrier(c1, "queued").await;

    send_json(c2, json!({"type": "MATCH_START", "payload": {}})).await;

    let n1 = recv_json(c1).await;
    let n2 = recv_json(c2).await;
    assert_eq!(n1["type"], "match_start");
    assert_eq!(n1, n2, "both players get the same notification");

    let room = n1["payload"]["room"].as_str().unwrap().to_string();
    let players: Vec<String> = n1["payload"]["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap().to_string())
        .collect();
    (room, players)
}

fn positions(update: &Value) -> Vec<(i64, i64, i64)> {
    let mut players: Vec<(i64, i64, i64)> = update["payload"]
        ["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| {
            (
                p["x"].as_i64().unwrap(),
                p["y"].as_i64().unwrap(),
                p["health"].as_i64().unwrap(),
            )
        })
        .collect();
    players.sort();
    players
}

// =========================================================================
// Echo and error recovery
// =========================================================================

#[tokio::test]
async fn test_echo_round_trip() {
    let (addr, _) = start_server().await;
    let mut ws = connect(&addr).await;

    send_json(
        &mut ws,
        json!({"type": "ECHO", "payload": {"ping": 1, "tags": ["a"]}}),
    )
    .await;

    let reply = recv_json(&mut ws).await;
    assert_eq!(
        reply,
        json!({"type": "echo", "payload": {"ping": 1, "tags": ["a"]}})
    );
}

#[tokio::test]
async fn test_malformed_message_is_dropped_and_connection_survives() {
    let (addr, _) = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Text("definitely not json".into()))
        .await
        .unwrap();
    send_json(&mut ws, json!({"type": "WHO_KNOWS", "payload": {}}))
        .await;

    // No error response for either — and the connection still works.
    barrier(&mut ws, "still-alive").await;
}

// =========================================================================
// Join, leave, chat
// =========================================================================

#[tokio::test]
async fn test_join_adds_connection_to_room_set() {
    let (addr, store) = start_server().await;
    let mut ws = connect(&addr).await;

    send_json(&mut ws, json!({"type": "JOIN", "payload": {"room": "lobby"}}))
        .await;
    barrier(&mut ws, "joined").await;

    let members =
        store.smembers(&keys::room_players("lobby")).await.unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn test_chat_relays_to_other_members_only() {
    let (addr, store) = start_server().await;
    let mut c1 = connect(&addr).await;
    let mut c2 = connect(&addr).await;

    for ws in [&mut c1, &mut c2] {
        send_json(ws, json!({"type": "JOIN", "payload": {"room": "lobby"}}))
            .await;
        barrier(ws, "joined").await;
    }
    assert_eq!(
        store
            .smembers(&keys::room_players("lobby"))
            .await
            .unwrap()
            .len(),
        2
    );

    send_json(
        &mut c1,
        json!({"type": "CHAT", "payload": {"room": "lobby", "text": "hi"}}),
    )
    .await;

    // The other member gets the raw payload in a server envelope.
    let relayed = recv_json(&mut c2).await;
    assert_eq!(
        relayed,
        json!({
            "type": "server",
            "payload": {"room": "lobby", "text": "hi"}
        })
    );

    // The sender gets nothing: the next thing c1 sees is its barrier
    // echo, which was queued after the chat was fully handled.
    barrier(&mut c1, "no-self-relay").await;
}

#[tokio::test]
async fn test_leave_removes_membership_and_player_state() {
    let (addr, store) = start_server().await;
    let mut c1 = connect(&addr).await;
    let mut c2 = connect(&addr).await;

    let (room, _) = form_match(&mut c1, &mut c2).await;
    assert_eq!(
        store.hlen(&keys::game_state(&room)).await.unwrap(),
        6,
        "two players, three fields each"
    );

    send_json(
        &mut c1,
        json!({"type": "LEAVE", "payload": {"room": &room}}),
    )
    .await;
    barrier(&mut c1, "left").await;

    let members =
        store.smembers(&keys::room_players(&room)).await.unwrap();
    assert_eq!(members.len(), 1, "only the other player remains");
    assert_eq!(
        store.hlen(&keys::game_state(&room)).await.unwrap(),
        3,
        "leaver's state fields removed with its membership"
    );

    // Last one out turns off the lights.
    send_json(
        &mut c2,
        json!({"type": "LEAVE", "payload": {"room": &room}}),
    )
    .await;
    barrier(&mut c2, "left").await;
    assert!(store
        .smembers(&keys::room_players(&room))
        .await
        .unwrap()
        .is_empty());
    assert!(store
        .hgetall(&keys::game_state(&room))
        .await
        .unwrap()
        .is_empty());
}

// =========================================================================
// Matchmaking
// =========================================================================

#[tokio::test]
async fn test_single_player_waits_in_queue() {
    let (addr, store) = start_server().await;
    let mut ws = connect(&addr).await;

    send_json(&mut ws, json!({"type": "MATCH_START", "payload": {}}))
        .await;
    barrier(&mut ws, "queued").await;

    assert_eq!(store.llen(keys::MATCHMAKING_QUEUE).await.unwrap(), 1);
}

#[tokio::test]
async fn test_two_players_match_into_initialized_room() {
    let (addr, store) = start_server().await;
    let mut c1 = connect(&addr).await;
    let mut c2 = connect(&addr).await;

    let (room, players) = form_match(&mut c1, &mut c2).await;

    assert!(room.starts_with("match-"));
    assert_eq!(players.len(), 2);
    assert_ne!(players[0], players[1]);

    // Queue is drained, membership matches the notification ...
    assert_eq!(store.llen(keys::MATCHMAKING_QUEUE).await.unwrap(), 0);
    let mut members =
        store.smembers(&keys::room_players(&room)).await.unwrap();
    members.sort();
    let mut expected = players.clone();
    expected.sort();
    assert_eq!(members, expected);

    // ... and everyone spawned at the origin with full health.
    let hash = store.hgetall(&keys::game_state(&room)).await.unwrap();
    for player in &players {
        assert_eq!(hash[&keys::player_field(player, "x")], "0");
        assert_eq!(hash[&keys::player_field(player, "y")], "0");
        assert_eq!(hash[&keys::player_field(player, "health")], "100");
    }
}

// =========================================================================
// Player actions and state fan-out
// =========================================================================

#[tokio::test]
async fn test_move_action_broadcasts_updated_state() {
    let (addr, _) = start_server().await;
    let mut c1 = connect(&addr).await;
    let mut c2 = connect(&addr).await;

    let (room, _) = form_match(&mut c1, &mut c2).await;

    send_json(
        &mut c1,
        json!({
            "type": "PLAYER_ACTION",
            "payload": {
                "room": room,
                "action": {"type": "move", "dx": 5, "dy": -3}
            }
        }),
    )
    .await;

    // Both members see the mover at (5,-3) and the other untouched.
    for ws in [&mut c1, &mut c2] {
        let update = recv_json(ws).await;
        assert_eq!(update["type"], "state_update");
        assert_eq!(
            positions(&update),
            vec![(0, 0, 100), (5, -3, 100)]
        );
    }
}

#[tokio::test]
async fn test_repeated_attacks_clamp_health_at_zero() {
    let (addr, _) = start_server().await;
    let mut c1 = connect(&addr).await;
    let mut c2 = connect(&addr).await;

    let (room, players) = form_match(&mut c1, &mut c2).await;
    let attack = json!({
        "type": "PLAYER_ACTION",
        "payload": {
            "room": room,
            "action": {
                "type": "attack",
                "targetId": &players[0],
                "damage": 30
            }
        }
    });

    send_json(&mut c1, attack.clone()).await;
    let update = recv_json(&mut c2).await;
    assert_eq!(positions(&update), vec![(0, 0, 70), (0, 0, 100)]);

    for _ in 0..3 {
        send_json(&mut c1, attack.clone()).await;
    }
    let mut last = Value::Null;
    for _ in 0..3 {
        last = recv_json(&mut c2).await;
    }
    assert_eq!(
        positions(&last),
        vec![(0, 0, 0), (0, 0, 100)],
        "fourth 30-damage attack drives health to 0, not -20"
    );
}

#[tokio::test]
async fn test_action_in_unknown_room_sends_no_followup() {
    let (addr, _) = start_server().await;
    let mut ws = connect(&addr).await;

    send_json(
        &mut ws,
        json!({
            "type": "PLAYER_ACTION",
            "payload": {
                "room": "nowhere",
                "action": {"type": "move", "dx": 1}
            }
        }),
    )
    .await;

    // The only signal is the absence of a state_update.
    barrier(&mut ws, "no-followup").await;
}

// =========================================================================
// Disconnect behavior
// =========================================================================

#[tokio::test]
async fn test_disconnect_keeps_room_membership_and_broadcast_skips_it() {
    let (addr, store) = start_server().await;
    let mut c1 = connect(&addr).await;
    let mut c2 = connect(&addr).await;

    let (room, _) = form_match(&mut c1, &mut c2).await;

    // c1 drops off without leaving.
    c1.close(None).await.unwrap();
    drop(c1);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Membership is not auto-cleaned on disconnect.
    assert_eq!(
        store
            .smembers(&keys::room_players(&room))
            .await
            .unwrap()
            .len(),
        2,
        "disconnect must not remove room membership"
    );

    // A broadcast for the room still reaches the remaining member; the
    // stale one is skipped silently.
    send_json(
        &mut c2,
        json!({
            "type": "PLAYER_ACTION",
            "payload": {
                "room": room,
                "action": {"type": "move", "dx": 1, "dy": 1}
            }
        }),
    )
    .await;
    let update = recv_json(&mut c2).await;
    assert_eq!(update["type"], "state_update");
    assert_eq!(
        update["payload"]["players"].as_array().unwrap().len(),
        2,
        "state still lists the disconnected member"
    );
}
