//! Shared-store abstraction for Roomcast.
//!
//! Room membership, the matchmaking queue, and per-room player state all
//! live in an external store so that any server process can read the state
//! behind any socket it owns. This crate defines that store's operation
//! set as the [`SharedStore`] trait and provides two implementations:
//!
//! - [`RedisStore`] — the production backend (`redis` feature, default).
//! - [`MemoryStore`] — a process-local backend with the same key
//!   semantics, used by tests and single-node development runs.
//!
//! Every operation is a suspending round trip; handlers for different
//! connections (and different processes) interleave at each call. The
//! only atomicity offered is per-operation — callers that need
//! read-modify-write safety must express the mutation as a single
//! operation (see `hincrby`).

mod error;
mod memory;
#[cfg(feature = "redis")]
mod redis_client;

pub use error::StoreError;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_client::RedisStore;

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::mpsc;

/// The fixed operation set of the shared store: sets, FIFO lists, hashes,
/// and publish/subscribe over keyed values.
///
/// Semantics follow Redis: set/hash keys vanish when their last member or
/// field is removed, `lpop` on a missing key yields `None`, and `hincrby`
/// treats a missing field as 0.
pub trait SharedStore: Clone + Send + Sync + 'static {
    // -- Sets --

    /// Adds a member to a set. No-op if already present.
    fn sadd(
        &self,
        key: &str,
        member: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes a member from a set. No-op if absent.
    fn srem(
        &self,
        key: &str,
        member: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns all members of a set; empty for an unknown key.
    fn smembers(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Set membership test.
    fn sismember(
        &self,
        key: &str,
        member: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Deletes a key of any kind.
    fn del(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    // -- Lists (FIFO queues) --

    /// Appends a value to the tail of a list.
    fn rpush(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Pops the head of a list; `None` when empty.
    fn lpop(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Current list length; 0 for an unknown key.
    fn llen(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    // -- Hashes --

    /// Sets a single hash field.
    fn hset(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Sets several hash fields in one round trip.
    fn hset_multi(
        &self,
        key: &str,
        entries: &[(String, String)],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Reads a single hash field.
    fn hget(
        &self,
        key: &str,
        field: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Reads every field of a hash; empty for an unknown key.
    fn hgetall(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<HashMap<String, String>, StoreError>> + Send;

    /// Atomically adds `delta` to an integer hash field (missing fields
    /// count as 0) and returns the new value. This is the one primitive
    /// that is safe under concurrent callers.
    fn hincrby(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Deletes hash fields.
    fn hdel(
        &self,
        key: &str,
        fields: &[&str],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Number of fields in a hash; 0 for an unknown key.
    fn hlen(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    // -- Pub/sub --

    /// Publishes a payload on a channel. Delivering to zero subscribers
    /// is a successful no-op.
    fn publish(
        &self,
        channel: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Subscribes to a channel, returning the stream of payloads
    /// published after this call.
    fn subscribe(
        &self,
        channel: &str,
    ) -> impl Future<Output = Result<mpsc::UnboundedReceiver<String>, StoreError>> + Send;
}
