use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;

use crate::errors::Result;
use crate::kv::KeyValueStore;

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Process-local store bounded by `capacity`; least recently used entries
/// are evicted first. Suitable for single-instance deployments and tests.
#[derive(Clone)]
pub struct MemoryKeyValueStore {
    inner: Arc<Mutex<LruCache<String, Entry>>>,
}

impl MemoryKeyValueStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut guard = self.inner.lock().await;
        guard.put(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut guard = self.inner.lock().await;
        let value = guard
            .get(key)
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.value.clone());
        if value.is_none() {
            guard.pop(key);
        }
        Ok(value)
    }

    async fn take(&self, key: &str) -> Result<Option<String>> {
        let mut guard = self.inner.lock().await;
        Ok(guard
            .pop(key)
            .filter(Entry::is_fresh)
            .map(|entry| entry.value))
    }

    async fn consume(&self, key: &str, expected: &str) -> Result<bool> {
        let mut guard = self.inner.lock().await;
        let matches = guard
            .peek(key)
            .is_some_and(|entry| entry.is_fresh() && entry.value == expected);
        if matches {
            guard.pop(key);
        }
        Ok(matches)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut guard = self.inner.lock().await;
        guard.pop(key);
        Ok(())
    }
}
