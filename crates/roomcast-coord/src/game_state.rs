//! Per-room game state: player attributes in the shared store.
//!
//! The canonical copy of every player's position and health lives in the
//! hash `game:<roomId>:state`, fields `<playerId>:x` / `:y` / `:health`,
//! so any process can read the state behind any socket. Mutations are
//! expressed as single `hincrby` round trips — the store performs the
//! arithmetic — which makes move, attack, and heal safe under concurrent
//! callers from any number of processes. Clamp writes after an increment
//! are best-effort.

use std::collections::BTreeMap;

use roomcast_protocol::{Action, PlayerState, FULL_HEALTH};
use roomcast_store::SharedStore;
use serde::{Deserialize, Serialize};

use crate::{keys, CoordError};

/// Damage dealt by an attack that doesn't specify one.
pub const DEFAULT_ATTACK_DAMAGE: i64 = 10;

/// Health restored by a heal action.
pub const HEAL_AMOUNT: i64 = 20;

/// The event published on a room's channel after each applied action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvent {
    pub player_id: String,
    pub action: Action,
}

/// Owns per-room player attributes and the room's notification channel.
#[derive(Clone)]
pub struct GameStateStore<S: SharedStore> {
    store: S,
}

impl<S: SharedStore> GameStateStore<S> {
    /// Creates a game state store over the given shared store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Writes spawn-state defaults for each player into the room's hash.
    pub async fn init_room(
        &self,
        room_id: &str,
        player_ids: &[String],
    ) -> Result<(), CoordError> {
        let mut entries = Vec::with_capacity(player_ids.len() * 3);
        for id in player_ids {
            entries.push((keys::player_field(id, "x"), "0".to_string()));
            entries.push((keys::player_field(id, "y"), "0".to_string()));
            entries.push((
                keys::player_field(id, "health"),
                FULL_HEALTH.to_string(),
            ));
        }
        if entries.is_empty() {
            return Ok(());
        }
        self.store
            .hset_multi(&keys::game_state(room_id), &entries)
            .await?;
        tracing::info!(
            %room_id,
            players = player_ids.len(),
            "game state initialized"
        );
        Ok(())
    }

    /// Reconstructs one player's state from the room hash.
    ///
    /// Missing fields take spawn defaults; a player with no fields at
    /// all is `None`.
    pub async fn get_player(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<Option<PlayerState>, CoordError> {
        let key = keys::game_state(room_id);
        let x = self
            .store
            .hget(&key, &keys::player_field(player_id, "x"))
            .await?;
        let y = self
            .store
            .hget(&key, &keys::player_field(player_id, "y"))
            .await?;
        let health = self
            .store
            .hget(&key, &keys::player_field(player_id, "health"))
            .await?;

        if x.is_none() && y.is_none() && health.is_none() {
            return Ok(None);
        }

        let mut state = PlayerState::spawned(player_id);
        state.x = parse_attr(&key, "x", x.as_deref(), 0);
        state.y = parse_attr(&key, "y", y.as_deref(), 0);
        state.health =
            parse_attr(&key, "health", health.as_deref(), FULL_HEALTH);
        Ok(Some(state))
    }

    /// Applies one gameplay action for `player_id` in `room_id`.
    ///
    /// Returns `true` if state was mutated (an event is then published
    /// on the room channel). An unknown room, an uninitialized actor, or
    /// an attack without a resolvable target is a silent no-op returning
    /// `false` — the caller sends no follow-up for those.
    pub async fn apply_action(
        &self,
        room_id: &str,
        player_id: &str,
        action: &Action,
    ) -> Result<bool, CoordError> {
        let key = keys::game_state(room_id);

        // Actor must have been initialized into this room.
        let actor_health = keys::player_field(player_id, "health");
        if self.store.hget(&key, &actor_health).await?.is_none() {
            tracing::debug!(
                %room_id,
                %player_id,
                "action for unknown room or player, ignoring"
            );
            return Ok(false);
        }

        match action {
            Action::Move { dx, dy } => {
                if let Some(dx) = dx {
                    self.store
                        .hincrby(
                            &key,
                            &keys::player_field(player_id, "x"),
                            *dx,
                        )
                        .await?;
                }
                if let Some(dy) = dy {
                    self.store
                        .hincrby(
                            &key,
                            &keys::player_field(player_id, "y"),
                            *dy,
                        )
                        .await?;
                }
            }
            Action::Attack { target_id, damage } => {
                let Some(target) = target_id else {
                    return Ok(false);
                };
                let target_health =
                    keys::player_field(target, "health");
                if self.store.hget(&key, &target_health).await?.is_none()
                {
                    tracing::debug!(
                        %room_id,
                        target = %target,
                        "attack on unknown target, ignoring"
                    );
                    return Ok(false);
                }
                let damage = damage.unwrap_or(DEFAULT_ATTACK_DAMAGE);
                let after = self
                    .store
                    .hincrby(&key, &target_health, -damage)
                    .await?;
                // Health floor is 0.
                if after < 0 {
                    self.store
                        .hset(&key, &target_health, "0")
                        .await?;
                }
            }
            Action::Heal {} => {
                // Single-round-trip increment, then clamp: no window in
                // which a concurrent heal or attack is lost.
                let after = self
                    .store
                    .hincrby(&key, &actor_health, HEAL_AMOUNT)
                    .await?;
                if after > FULL_HEALTH {
                    self.store
                        .hset(
                            &key,
                            &actor_health,
                            &FULL_HEALTH.to_string(),
                        )
                        .await?;
                }
            }
        }

        let event = ActionEvent {
            player_id: player_id.to_string(),
            action: action.clone(),
        };
        self.store
            .publish(
                &keys::game_events(room_id),
                &serde_json::to_string(&event)?,
            )
            .await?;
        Ok(true)
    }

    /// Re-reads the full room state for broadcasting, ordered by player
    /// id for deterministic output.
    pub async fn room_state(
        &self,
        room_id: &str,
    ) -> Result<Vec<PlayerState>, CoordError> {
        let all =
            self.store.hgetall(&keys::game_state(room_id)).await?;
        let mut players: BTreeMap<String, PlayerState> =
            BTreeMap::new();

        for (field, value) in &all {
            let Some((player, attr)) = field.rsplit_once(':') else {
                continue;
            };
            let entry = players
                .entry(player.to_string())
                .or_insert_with(|| PlayerState::spawned(player));
            let parsed = match attr {
                "x" => Some(&mut entry.x),
                "y" => Some(&mut entry.y),
                "health" => Some(&mut entry.health),
                _ => None,
            };
            if let Some(slot) = parsed {
                match value.parse::<i64>() {
                    Ok(v) => *slot = v,
                    Err(_) => tracing::warn!(
                        %room_id,
                        field,
                        value,
                        "non-integer state field, using default"
                    ),
                }
            }
        }

        Ok(players.into_values().collect())
    }

    /// Deletes a player's fields from the room hash.
    ///
    /// When the last player's fields go, the hash key goes with them
    /// (store semantics), so an emptied room leaves no state record.
    pub async fn remove_player(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<(), CoordError> {
        let key = keys::game_state(room_id);
        let fields = [
            keys::player_field(player_id, "x"),
            keys::player_field(player_id, "y"),
            keys::player_field(player_id, "health"),
        ];
        let fields: Vec<&str> =
            fields.iter().map(String::as_str).collect();
        self.store.hdel(&key, &fields).await?;
        tracing::debug!(%room_id, %player_id, "player state removed");
        Ok(())
    }
}

/// Parses a numeric attribute, falling back to its spawn default.
fn parse_attr(
    key: &str,
    attr: &str,
    raw: Option<&str>,
    default: i64,
) -> i64 {
    match raw {
        None => default,
        Some(s) => s.parse().unwrap_or_else(|_| {
            tracing::warn!(
                key,
                attr,
                value = s,
                "non-integer state field, using default"
            );
            default
        }),
    }
}
