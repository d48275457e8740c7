//! Broadcaster: fans room state and chat out to connected members.
//!
//! Recipients are always computed from the canonical membership set in
//! the shared store, then intersected with this process's live
//! connection registry. A member whose connection is gone (or lives on
//! another server process) is silently skipped — there is no queuing or
//! buffering of missed updates.

use std::sync::Arc;

use roomcast_coord::{GameStateStore, RoomRegistry};
use roomcast_protocol::ServerMessage;
use roomcast_store::SharedStore;
use roomcast_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::gateway::ConnectionRegistry;
use crate::RoomcastError;

/// Reconstructs room state views and forwards them to room members.
#[derive(Clone)]
pub struct Broadcaster<S: SharedStore> {
    connections: Arc<Mutex<ConnectionRegistry>>,
    rooms: RoomRegistry<S>,
    game: GameStateStore<S>,
}

impl<S: SharedStore> Broadcaster<S> {
    /// Creates a broadcaster over the given registries.
    pub fn new(
        connections: Arc<Mutex<ConnectionRegistry>>,
        rooms: RoomRegistry<S>,
        game: GameStateStore<S>,
    ) -> Self {
        Self {
            connections,
            rooms,
            game,
        }
    }

    /// Re-reads the canonical player state for `room_id` and sends one
    /// `state_update` to every member with a live connection.
    pub async fn push_state(
        &self,
        room_id: &str,
    ) -> Result<(), RoomcastError> {
        let players = self.game.room_state(room_id).await?;
        let members = self.rooms.list_players(room_id).await?;
        let msg = ServerMessage::StateUpdate { players };

        let connections = self.connections.lock().await;
        let mut delivered = 0usize;
        for member in &members {
            match connections
                .sender(&ConnectionId::from(member.as_str()))
            {
                Some(sender) => {
                    if sender.send(msg.clone()).is_ok() {
                        delivered += 1;
                    }
                }
                None => tracing::trace!(
                    room_id,
                    member = %member,
                    "member not connected here, skipping"
                ),
            }
        }
        tracing::debug!(
            room_id,
            delivered,
            members = members.len(),
            "state update fanned out"
        );
        Ok(())
    }

    /// Relays a member's payload, wrapped in a server-origin envelope,
    /// to every other member of the room.
    pub async fn relay(
        &self,
        room_id: &str,
        sender_id: &ConnectionId,
        payload: serde_json::Value,
    ) -> Result<(), RoomcastError> {
        let members = self.rooms.list_players(room_id).await?;
        let msg = ServerMessage::Server(payload);

        let connections = self.connections.lock().await;
        for member in &members {
            if member.as_str() == sender_id.as_str() {
                continue;
            }
            if let Some(sender) = connections
                .sender(&ConnectionId::from(member.as_str()))
            {
                let _ = sender.send(msg.clone());
            }
        }
        Ok(())
    }
}
