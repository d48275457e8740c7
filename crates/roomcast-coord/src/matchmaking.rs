//! Matchmaking queue: strict FIFO grouping of waiting players.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use roomcast_store::SharedStore;

use crate::{keys, CoordError, RoomRegistry};

/// Players needed to form a room when no size is given.
pub const DEFAULT_ROOM_SIZE: usize = 2;

/// A FIFO of waiting player identifiers, backed by the shared-store list
/// `matchmaking:queue`.
///
/// No priority, no dedup: the same identifier may wait more than once.
/// There is no skill- or attribute-based matching — players are grouped
/// strictly in arrival order.
#[derive(Clone)]
pub struct MatchmakingQueue<S: SharedStore> {
    store: S,
    rooms: RoomRegistry<S>,
}

impl<S: SharedStore> MatchmakingQueue<S> {
    /// Creates a queue over the given store and room registry.
    pub fn new(store: S, rooms: RoomRegistry<S>) -> Self {
        Self { store, rooms }
    }

    /// Appends a player to the tail of the queue.
    pub async fn enqueue(
        &self,
        player_id: &str,
    ) -> Result<(), CoordError> {
        self.store
            .rpush(keys::MATCHMAKING_QUEUE, player_id)
            .await?;
        tracing::debug!(player_id, "player queued for matchmaking");
        Ok(())
    }

    /// Pops the head of the queue; `None` when empty.
    pub async fn dequeue_one(
        &self,
    ) -> Result<Option<String>, CoordError> {
        Ok(self.store.lpop(keys::MATCHMAKING_QUEUE).await?)
    }

    /// Current queue depth.
    pub async fn queue_len(&self) -> Result<u64, CoordError> {
        Ok(self.store.llen(keys::MATCHMAKING_QUEUE).await?)
    }

    /// Attempts to form one room of `room_size` players.
    ///
    /// Pops up to `room_size` entries. With exactly `room_size` in hand,
    /// a fresh room identifier is minted, the room is created with those
    /// members, and the identifier returned. With fewer, every popped
    /// entry is returned to the queue — multiplicity preserved, relative
    /// order to other waiters not guaranteed — and the call yields
    /// `None`. A failed room creation also hands the entries back.
    pub async fn try_match(
        &self,
        room_size: usize,
    ) -> Result<Option<String>, CoordError> {
        if room_size == 0 {
            return Ok(None);
        }

        let mut players = Vec::with_capacity(room_size);
        for _ in 0..room_size {
            match self.dequeue_one().await? {
                Some(player) => players.push(player),
                None => break,
            }
        }

        if players.len() == room_size {
            let room_id = fresh_room_id();
            if let Err(e) =
                self.rooms.create_room(&room_id, &players).await
            {
                self.requeue(&players).await;
                return Err(e);
            }
            tracing::info!(
                %room_id,
                players = players.len(),
                "match formed"
            );
            return Ok(Some(room_id));
        }

        self.requeue(&players).await;
        Ok(None)
    }

    /// Hands dequeued-but-unmatched entries back to the queue.
    async fn requeue(&self, players: &[String]) {
        for player in players {
            if let Err(e) = self.enqueue(player).await {
                tracing::error!(
                    player_id = %player,
                    error = %e,
                    "failed to return player to matchmaking queue"
                );
            }
        }
    }
}

/// Mints a room identifier that is collision-resistant across time and
/// across processes: wall-clock millis plus a random suffix.
fn fresh_room_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let mut rng = rand::rng();
    let suffix: u16 = rng.random();
    format!("match-{millis}-{suffix:04x}")
}
