//! Redis-backed [`SharedStore`].
//!
//! One multiplexed async connection is opened at startup and cloned per
//! operation; pub/sub gets a dedicated connection per subscription, as the
//! protocol requires. Every round trip is bounded by the configured
//! timeout — a stalled store call fails the one request that issued it
//! without stalling the event loop.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::mpsc;

use crate::{SharedStore, StoreError};

/// Default bound on a single store round trip.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);

/// A [`SharedStore`] backed by a Redis instance.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    conn: MultiplexedConnection,
    timeout: Duration,
}

impl RedisStore {
    /// Connects to the Redis instance at `url`.
    pub async fn connect(
        url: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = tokio::time::timeout(
            timeout,
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| StoreError::Timeout(timeout))??;
        tracing::info!(url, "connected to shared store");
        Ok(Self {
            client,
            conn,
            timeout,
        })
    }

    /// Connects with the default per-operation timeout.
    pub async fn connect_default(url: &str) -> Result<Self, StoreError> {
        Self::connect(url, DEFAULT_OP_TIMEOUT).await
    }

    /// Runs a Redis future under the per-operation timeout.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = redis::RedisResult<T>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

impl SharedStore for RedisStore {
    async fn sadd(
        &self,
        key: &str,
        member: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.sadd::<_, _, ()>(key, member)).await
    }

    async fn srem(
        &self,
        key: &str,
        member: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.srem::<_, _, ()>(key, member)).await
    }

    async fn smembers(
        &self,
        key: &str,
    ) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.smembers::<_, Vec<String>>(key)).await
    }

    async fn sismember(
        &self,
        key: &str,
        member: &str,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.sismember::<_, _, bool>(key, member))
            .await
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.del::<_, ()>(key)).await
    }

    async fn rpush(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.rpush::<_, _, ()>(key, value)).await
    }

    async fn lpop(
        &self,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.lpop::<_, Option<String>>(key, None))
            .await
    }

    async fn llen(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.llen::<_, u64>(key)).await
    }

    async fn hset(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.hset::<_, _, _, ()>(key, field, value))
            .await
    }

    async fn hset_multi(
        &self,
        key: &str,
        entries: &[(String, String)],
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.hset_multiple::<_, _, _, ()>(key, entries))
            .await
    }

    async fn hget(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.hget::<_, _, Option<String>>(key, field))
            .await
    }

    async fn hgetall(
        &self,
        key: &str,
    ) -> Result<HashMap<String, String>, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.hgetall::<_, HashMap<String, String>>(key))
            .await
    }

    async fn hincrby(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.hincr::<_, _, _, i64>(key, field, delta))
            .await
    }

    async fn hdel(
        &self,
        key: &str,
        fields: &[&str],
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.hdel::<_, _, ()>(key, fields.to_vec()))
            .await
    }

    async fn hlen(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.hlen::<_, u64>(key)).await
    }

    async fn publish(
        &self,
        channel: &str,
        payload: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.publish::<_, _, ()>(channel, payload))
            .await
    }

    async fn subscribe(
        &self,
        channel: &str,
    ) -> Result<mpsc::UnboundedReceiver<String>, StoreError> {
        let mut pubsub = tokio::time::timeout(
            self.timeout,
            self.client.get_async_pubsub(),
        )
        .await
        .map_err(|_| StoreError::Timeout(self.timeout))??;
        self.bounded(pubsub.subscribe(channel)).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let channel = channel.to_string();
        tokio::spawn(async move {
            use futures_util::StreamExt;
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(
                            %channel,
                            error = %e,
                            "dropping non-string pubsub payload"
                        );
                        continue;
                    }
                };
                if tx.send(payload).is_err() {
                    break; // receiver dropped, stop forwarding
                }
            }
        });
        Ok(rx)
    }
}
