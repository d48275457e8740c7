//! Connection gateway: the live connection registry and inbound dispatch.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The flow is:
//!
//!   1. Register the connection id and an outbound channel
//!   2. Spawn a writer task that encodes and sends queued messages
//!   3. Loop: receive → decode → dispatch to the coordination layer
//!   4. On close or error: deregister the connection
//!
//! Dispatch failures are scoped to the message that caused them — a
//! malformed payload or a failed store round trip is logged and dropped
//! while the connection (and the process) keeps running.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use roomcast_protocol::{ClientMessage, Codec, ProtocolError, ServerMessage};
use roomcast_store::SharedStore;
use roomcast_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::RoomcastError;

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// Lifecycle of one connection, driven solely by transport events:
///
/// ```text
/// Connecting → Open → Closed
/// ```
///
/// Room joins happen while `Open` and live in the shared store, not
/// here — there is no reconnection or session-resumption state, so a
/// closed connection's id simply stops resolving in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    /// Returns `true` while the connection can send and receive.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// The next state, if any; transitions are strictly ordered.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Connecting => Some(Self::Open),
            Self::Open => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionRegistry
// ---------------------------------------------------------------------------

/// The live mapping from connection identifier to its send handle.
///
/// Exclusively owned and mutated by the gateway of this process — room
/// membership and queue contents are shared across processes through the
/// store, but this registry never is. Constructed at server build and
/// dependency-injected, so multiple servers can coexist in one process
/// (as the tests do).
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly accepted connection's send handle.
    pub(crate) fn register(
        &mut self,
        id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) {
        self.connections.insert(id, sender);
    }

    /// Removes a connection. Dropping the handle ends its writer task.
    ///
    /// This does NOT touch room or queue membership: a disconnected
    /// player stays in its rooms until an explicit leave, and the
    /// broadcaster skips ids that no longer resolve here.
    pub(crate) fn deregister(&mut self, id: &ConnectionId) {
        self.connections.remove(id);
    }

    /// Resolves a connection id to its send handle, if still live.
    pub(crate) fn sender(
        &self,
        id: &ConnectionId,
    ) -> Option<mpsc::UnboundedSender<ServerMessage>> {
        self.connections.get(id).cloned()
    }

    /// Liveness test for a connection id.
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if no connections are live.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Per-connection handler
// ---------------------------------------------------------------------------

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S: SharedStore>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S>>,
) -> Result<(), RoomcastError> {
    let conn_id = conn.id();
    let mut conn_state = ConnectionState::Connecting;
    tracing::debug!(%conn_id, state = %conn_state, "transport accepted");

    let conn = Arc::new(conn);
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state
        .connections
        .lock()
        .await
        .register(conn_id.clone(), tx);
    conn_state = ConnectionState::Open;
    tracing::info!(%conn_id, state = %conn_state, "client connected");

    // Writer task: everything queued for this connection goes out here,
    // so broadcasts never block on another connection's socket.
    let writer = {
        let conn = Arc::clone(&conn);
        let codec = state.codec;
        let conn_id = conn_id.clone();
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let bytes = match codec.encode(&msg) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(
                            %conn_id,
                            error = %e,
                            "failed to encode outbound message"
                        );
                        continue;
                    }
                };
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(
                        %conn_id,
                        error = %e,
                        "outbound send failed"
                    );
                    break;
                }
            }
        })
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                // Malformed or unrecognized: drop it, stay open.
                tracing::warn!(
                    %conn_id,
                    error = %e,
                    "dropping undecodable message"
                );
                continue;
            }
        };

        if let Err(e) = dispatch(&conn_id, msg, &state).await {
            // The failure is scoped to this one message.
            tracing::error!(
                %conn_id,
                error = %e,
                "message handling failed"
            );
        }
    }

    state.connections.lock().await.deregister(&conn_id);
    conn_state = ConnectionState::Closed;
    tracing::info!(%conn_id, state = %conn_state, "client disconnected");

    // Deregistering dropped the registry's sender; once transient clones
    // from in-flight broadcasts go, the writer drains and exits.
    let _ = writer.await;
    Ok(())
}

/// Routes one decoded message to the owning component.
async fn dispatch<S: SharedStore>(
    conn_id: &ConnectionId,
    msg: ClientMessage,
    state: &Arc<ServerState<S>>,
) -> Result<(), RoomcastError> {
    match msg {
        ClientMessage::Echo(payload) => {
            send_to(state, conn_id, ServerMessage::Echo(payload)).await;
        }

        ClientMessage::Join { room } => {
            state
                .rooms
                .add_players(&room, &[conn_id.to_string()])
                .await?;
            tracing::info!(%conn_id, %room, "player joined room");
        }

        ClientMessage::Leave { room } => {
            // Membership and player state leave together, keeping the
            // two in sync.
            state
                .rooms
                .remove_players(&room, &[conn_id.to_string()])
                .await?;
            state.game.remove_player(&room, conn_id.as_str()).await?;
            tracing::info!(%conn_id, %room, "player left room");
        }

        ClientMessage::Chat(body) => {
            let payload = serde_json::to_value(&body)
                .map_err(ProtocolError::Encode)?;
            let room = body.room;
            state.broadcaster.relay(&room, conn_id, payload).await?;
        }

        ClientMessage::MatchStart {} => {
            handle_match_start(conn_id, state).await?;
        }

        ClientMessage::PlayerAction { room, action } => {
            let applied = state
                .game
                .apply_action(&room, conn_id.as_str(), &action)
                .await?;
            if applied {
                state.broadcaster.push_state(&room).await?;
            }
        }
    }
    Ok(())
}

/// The matchmaking pipeline for one `MATCH_START`:
/// enqueue → attempt a match → on success, initialize room state, then
/// notify every matched player still connected here.
///
/// State is initialized before the notifications go out, so a client
/// acting on its `match_start` immediately finds the room ready. A
/// failed match leaves the queue conserved (see
/// [`MatchmakingQueue::try_match`](roomcast_coord::MatchmakingQueue::try_match)).
async fn handle_match_start<S: SharedStore>(
    conn_id: &ConnectionId,
    state: &Arc<ServerState<S>>,
) -> Result<(), RoomcastError> {
    state.queue.enqueue(conn_id.as_str()).await?;

    let Some(room_id) = state.queue.try_match(state.room_size).await?
    else {
        tracing::debug!(%conn_id, "queued, waiting for more players");
        return Ok(());
    };

    let players = state.rooms.list_players(&room_id).await?;
    state.game.init_room(&room_id, &players).await?;

    let msg = ServerMessage::MatchStart {
        room: room_id.clone(),
        players: players.clone(),
    };
    let connections = state.connections.lock().await;
    for player in &players {
        match connections.sender(&ConnectionId::from(player.as_str()))
        {
            Some(sender) => {
                let _ = sender.send(msg.clone());
            }
            None => tracing::debug!(
                %room_id,
                player = %player,
                "matched player not connected here, skipping notify"
            ),
        }
    }
    tracing::info!(%room_id, players = players.len(), "match started");
    Ok(())
}

/// Queues a message for one connection; silently dropped if it is gone.
async fn send_to<S: SharedStore>(
    state: &Arc<ServerState<S>>,
    conn_id: &ConnectionId,
    msg: ServerMessage,
) {
    let connections = state.connections.lock().await;
    if let Some(sender) = connections.sender(conn_id) {
        let _ = sender.send(msg);
    }
}

// =========================================================================
// Tests
// =========================================================================
