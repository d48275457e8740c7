//! Room registry: membership sets in the shared store.

use roomcast_store::SharedStore;

use crate::{keys, CoordError};

/// Tracks which player identifiers belong to which room.
///
/// Membership is a set per room, so every operation is idempotent:
/// adding a present member or removing an absent one is a no-op. Room
/// lifecycle beyond membership is owned by the caller — the only
/// intrinsic deletion is the store dropping a set key once its last
/// member is removed.
#[derive(Clone)]
pub struct RoomRegistry<S: SharedStore> {
    store: S,
}

impl<S: SharedStore> RoomRegistry<S> {
    /// Creates a registry over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a room with the given initial members.
    ///
    /// Idempotent; an empty member list is accepted (the room then has
    /// no key, which reads back as an empty member set).
    pub async fn create_room(
        &self,
        room_id: &str,
        members: &[String],
    ) -> Result<(), CoordError> {
        let key = keys::room_players(room_id);
        for member in members {
            self.store.sadd(&key, member).await?;
        }
        tracing::info!(%room_id, members = members.len(), "room created");
        Ok(())
    }

    /// Adds players to a room's member set.
    pub async fn add_players(
        &self,
        room_id: &str,
        ids: &[String],
    ) -> Result<(), CoordError> {
        let key = keys::room_players(room_id);
        for id in ids {
            self.store.sadd(&key, id).await?;
        }
        tracing::debug!(%room_id, count = ids.len(), "players added");
        Ok(())
    }

    /// Removes players from a room's member set.
    pub async fn remove_players(
        &self,
        room_id: &str,
        ids: &[String],
    ) -> Result<(), CoordError> {
        let key = keys::room_players(room_id);
        for id in ids {
            self.store.srem(&key, id).await?;
        }
        tracing::debug!(%room_id, count = ids.len(), "players removed");
        Ok(())
    }

    /// Returns the members of a room; empty for an unknown room.
    pub async fn list_players(
        &self,
        room_id: &str,
    ) -> Result<Vec<String>, CoordError> {
        Ok(self
            .store
            .smembers(&keys::room_players(room_id))
            .await?)
    }

    /// Membership test.
    pub async fn is_member(
        &self,
        room_id: &str,
        id: &str,
    ) -> Result<bool, CoordError> {
        Ok(self
            .store
            .sismember(&keys::room_players(room_id), id)
            .await?)
    }

    /// Deletes a room's membership set outright.
    pub async fn delete_room(
        &self,
        room_id: &str,
    ) -> Result<(), CoordError> {
        self.store.del(&keys::room_players(room_id)).await?;
        tracing::info!(%room_id, "room deleted");
        Ok(())
    }
}
