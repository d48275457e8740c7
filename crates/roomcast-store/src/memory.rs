//! In-memory [`SharedStore`] with Redis key semantics.
//!
//! Cloning shares the underlying maps, so a test can hold one clone and a
//! server another and observe the same state — the same way two processes
//! observe one Redis instance.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::{SharedStore, StoreError};

#[derive(Default)]
struct Inner {
    sets: HashMap<String, HashSet<String>>,
    lists: HashMap<String, VecDeque<String>>,
    hashes: HashMap<String, HashMap<String, String>>,
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<String>>>,
}

/// A process-local shared store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SharedStore for MemoryStore {
    async fn sadd(
        &self,
        key: &str,
        member: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn srem(
        &self,
        key: &str,
        member: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let emptied = match inner.sets.get_mut(key) {
            Some(set) => {
                set.remove(member);
                set.is_empty()
            }
            None => false,
        };
        // Redis drops a set key once its last member is gone.
        if emptied {
            inner.sets.remove(key);
        }
        Ok(())
    }

    async fn smembers(
        &self,
        key: &str,
    ) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn sismember(
        &self,
        key: &str,
        member: &str,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sets
            .get(key)
            .is_some_and(|s| s.contains(member)))
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.sets.remove(key);
        inner.lists.remove(key);
        inner.hashes.remove(key);
        Ok(())
    }

    async fn rpush(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .lists
            .entry(key.to_string())
            .or_default()
            .push_back(value.to_string());
        Ok(())
    }

    async fn lpop(
        &self,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut inner = self.inner.lock().await;
        let (head, emptied) = match inner.lists.get_mut(key) {
            Some(list) => (list.pop_front(), list.is_empty()),
            None => return Ok(None),
        };
        if emptied {
            inner.lists.remove(key);
        }
        Ok(head)
    }

    async fn llen(&self, key: &str) -> Result<u64, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.lists.get(key).map(|l| l.len() as u64).unwrap_or(0))
    }

    async fn hset(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hset_multi(
        &self,
        key: &str,
        entries: &[(String, String)],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let hash = inner.hashes.entry(key.to_string()).or_default();
        for (field, value) in entries {
            hash.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn hget(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .hashes
            .get(key)
            .and_then(|h| h.get(field))
            .cloned())
    }

    async fn hgetall(
        &self,
        key: &str,
    ) -> Result<HashMap<String, String>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.hashes.get(key).cloned().unwrap_or_default())
    }

    async fn hincrby(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().await;
        let hash = inner.hashes.entry(key.to_string()).or_default();
        let current = match hash.get(field) {
            Some(raw) => {
                raw.parse::<i64>().map_err(|_| {
                    StoreError::NotAnInteger {
                        key: key.to_string(),
                        field: field.to_string(),
                    }
                })?
            }
            None => 0,
        };
        let next = current + delta;
        hash.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    async fn hdel(
        &self,
        key: &str,
        fields: &[&str],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let emptied = match inner.hashes.get_mut(key) {
            Some(hash) => {
                for field in fields {
                    hash.remove(*field);
                }
                hash.is_empty()
            }
            None => false,
        };
        if emptied {
            inner.hashes.remove(key);
        }
        Ok(())
    }

    async fn hlen(&self, key: &str) -> Result<u64, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.hashes.get(key).map(|h| h.len() as u64).unwrap_or(0))
    }

    async fn publish(
        &self,
        channel: &str,
        payload: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(subs) = inner.subscribers.get_mut(channel) {
            subs.retain(|tx| tx.send(payload.to_string()).is_ok());
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &str,
    ) -> Result<mpsc::UnboundedReceiver<String>, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().await;
        inner
            .subscribers
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }
}
