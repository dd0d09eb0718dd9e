use std::time::Duration;

use async_trait::async_trait;

use crate::errors::Result;

/// String key-value storage with per-entry expiry. Expired entries behave as
/// absent for every operation.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Removes the entry and returns its value. Of several concurrent callers
    /// at most one observes `Some`.
    async fn take(&self, key: &str) -> Result<Option<String>>;
    /// Removes the entry only while it still holds `expected`. Returns whether
    /// this call removed it; a replaced value is left untouched.
    async fn consume(&self, key: &str, expected: &str) -> Result<bool>;
    async fn delete(&self, key: &str) -> Result<()>;
}
