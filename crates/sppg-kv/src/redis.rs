//! Redis implementation of [`KeyValueStore`].

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime, redis::AsyncCommands};

use crate::store::{KeyValueStore, StoreInfo, StoreResult};
use crate::StoreError;

/// Redis-backed key-value store over a deadpool connection pool.
///
/// All commands go through pooled multiplexed connections; pool acquisition
/// failures and command failures are mapped into [`StoreError`] with enough
/// context for the service-layer logging.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Create a store over an existing pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a store from a Redis URL (e.g. `redis://localhost:6379`).
    pub fn from_url(url: &str) -> StoreResult<Self> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::pool(e.to_string()))?;
        Ok(Self { pool })
    }

    /// The underlying pool, for collaborators that need raw access
    /// (the cache invalidation publisher uses pub/sub commands the
    /// [`KeyValueStore`] trait does not expose).
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    async fn conn(&self) -> StoreResult<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::pool(e.to_string()))
    }
}

/// TTLs are sent to Redis in whole seconds; zero is not a legal expiry.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| StoreError::command(e.to_string()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl))
            .await
            .map_err(|e| StoreError::command(e.to_string()))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let removed: i64 = conn
            .del(key)
            .await
            .map_err(|e| StoreError::command(e.to_string()))?;
        Ok(removed > 0)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        conn.expire::<_, bool>(key, ttl_secs(ttl) as i64)
            .await
            .map_err(|e| StoreError::command(e.to_string()))
    }

    async fn list_push(&self, key: &str, value: &str) -> StoreResult<u64> {
        let mut conn = self.conn().await?;
        let len: i64 = conn
            .lpush(key, value)
            .await
            .map_err(|e| StoreError::command(e.to_string()))?;
        Ok(len.max(0) as u64)
    }

    async fn list_trim(&self, key: &str, start: isize, stop: isize) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        conn.ltrim::<_, ()>(key, start, stop)
            .await
            .map_err(|e| StoreError::command(e.to_string()))
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        let mut conn = self.conn().await?;
        conn.lrange(key, start, stop)
            .await
            .map_err(|e| StoreError::command(e.to_string()))
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let added: i64 = conn
            .sadd(key, member)
            .await
            .map_err(|e| StoreError::command(e.to_string()))?;
        Ok(added > 0)
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn().await?;
        conn.smembers(key)
            .await
            .map_err(|e| StoreError::command(e.to_string()))
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let removed: i64 = conn
            .srem(key, member)
            .await
            .map_err(|e| StoreError::command(e.to_string()))?;
        Ok(removed > 0)
    }

    async fn scan_keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn().await?;
        let mut keys = Vec::new();
        let mut iter = conn
            .scan_match::<_, String>(pattern)
            .await
            .map_err(|e| StoreError::command(e.to_string()))?;
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::command(e.to_string()))?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(StoreError::command(format!("unexpected PING reply: {pong}")))
        }
    }

    async fn info(&self) -> StoreResult<StoreInfo> {
        let mut conn = self.conn().await?;
        let raw: String = redis::cmd("INFO")
            .arg("memory")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::command(e.to_string()))?;
        let key_count: i64 = redis::cmd("DBSIZE")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::command(e.to_string()))?;

        Ok(StoreInfo {
            used_memory_bytes: parse_used_memory(&raw),
            key_count: Some(key_count.max(0) as u64),
        })
    }
}

/// Pull `used_memory:<bytes>` out of an `INFO memory` reply.
fn parse_used_memory(raw: &str) -> Option<u64> {
    raw.lines()
        .find_map(|line| line.strip_prefix("used_memory:"))
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_used_memory() {
        let raw = "# Memory\r\nused_memory:1048576\r\nused_memory_human:1.00M\r\n";
        assert_eq!(parse_used_memory(raw), Some(1_048_576));
    }

    #[test]
    fn test_parse_used_memory_missing() {
        assert_eq!(parse_used_memory("# Memory\r\nmaxmemory:0\r\n"), None);
    }

    #[test]
    fn test_ttl_rounds_up_to_one_second() {
        assert_eq!(ttl_secs(Duration::from_millis(10)), 1);
        assert_eq!(ttl_secs(Duration::from_secs(30)), 30);
    }
}
