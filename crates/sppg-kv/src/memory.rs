//! In-memory implementation of [`KeyValueStore`].
//!
//! Backs the service test suites and single-instance deployments where a
//! shared Redis is not worth operating. TTL handling mirrors the store
//! contract: expiry is whole-second granularity (sub-second TTLs round up)
//! and expired entries are dropped lazily on access.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::store::{KeyValueStore, StoreInfo, StoreResult};
use crate::StoreError;

enum Value {
    Text(String),
    List(Vec<String>),
    Set(HashSet<String>),
}

impl Value {
    fn approx_bytes(&self) -> u64 {
        match self {
            Value::Text(s) => s.len() as u64,
            Value::List(items) => items.iter().map(|s| s.len() as u64).sum(),
            Value::Set(members) => members.iter().map(|s| s.len() as u64).sum(),
        }
    }
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

/// Thread-safe in-memory key-value store.
///
/// Keys created by list/set operations start without a TTL, matching the
/// Redis behavior the services rely on (they always follow up with
/// [`expire`](KeyValueStore::expire)).
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the key if its TTL has lapsed, so the mutation that follows sees
    /// a clean slate instead of resurrecting stale data.
    fn purge_if_expired(&self, key: &str) {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(key);
            }
        }
    }
}

fn wrong_type() -> StoreError {
    StoreError::command("WRONGTYPE Operation against a key holding the wrong kind of value")
}

fn effective_ttl(ttl: Duration) -> Duration {
    ttl.max(Duration::from_secs(1))
}

/// Redis-style inclusive range normalization; `None` means the range selects
/// nothing.
fn normalize_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len || stop < 0 {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}

/// Glob matcher for `scan_keys` patterns (`*` and `?` wildcards).
fn glob_match(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0usize, 0usize);
    let (mut star, mut mark) = (None::<usize>, 0usize);

    while t < txt.len() {
        if p < pat.len() && (pat[p] == '?' || pat[p] == txt[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some(p);
            mark = t;
            p += 1;
        } else if let Some(sp) = star {
            p = sp + 1;
            mark += 1;
            t = mark;
        } else {
            return false;
        }
    }
    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::Text(s) => Ok(Some(s.clone())),
                _ => Err(wrong_type()),
            },
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: Some(Instant::now() + effective_ttl(ttl)),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.purge_if_expired(key);
        Ok(self.entries.remove(key).is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        self.purge_if_expired(key);
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at = Some(Instant::now() + effective_ttl(ttl));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_push(&self, key: &str, value: &str) -> StoreResult<u64> {
        self.purge_if_expired(key);
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::List(Vec::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::List(items) => {
                items.insert(0, value.to_string());
                Ok(items.len() as u64)
            }
            _ => Err(wrong_type()),
        }
    }

    async fn list_trim(&self, key: &str, start: isize, stop: isize) -> StoreResult<()> {
        self.purge_if_expired(key);
        let mut remove = false;
        if let Some(mut entry) = self.entries.get_mut(key) {
            match &mut entry.value {
                Value::List(items) => match normalize_range(items.len(), start, stop) {
                    Some((from, to)) => {
                        items.truncate(to + 1);
                        items.drain(..from);
                    }
                    None => remove = true,
                },
                _ => return Err(wrong_type()),
            }
        }
        if remove {
            self.entries.remove(key);
        }
        Ok(())
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::List(items) => Ok(normalize_range(items.len(), start, stop)
                    .map(|(from, to)| items[from..=to].to_vec())
                    .unwrap_or_default()),
                _ => Err(wrong_type()),
            },
            None => Ok(Vec::new()),
        }
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.purge_if_expired(key);
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Set(HashSet::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Set(members) => Ok(members.insert(member.to_string())),
            _ => Err(wrong_type()),
        }
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::Set(members) => Ok(members.iter().cloned().collect()),
                _ => Err(wrong_type()),
            },
            None => Ok(Vec::new()),
        }
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.purge_if_expired(key);
        let mut removed = false;
        let mut empty = false;
        if let Some(mut entry) = self.entries.get_mut(key) {
            match &mut entry.value {
                Value::Set(members) => {
                    removed = members.remove(member);
                    empty = members.is_empty();
                }
                _ => return Err(wrong_type()),
            }
        }
        // Redis drops a set key once its last member is removed.
        if empty {
            self.entries.remove(key);
        }
        Ok(removed)
    }

    async fn scan_keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        self.entries.retain(|_, entry| !entry.is_expired());
        Ok(self
            .entries
            .iter()
            .filter(|kv| glob_match(pattern, kv.key()))
            .map(|kv| kv.key().clone())
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn info(&self) -> StoreResult<StoreInfo> {
        self.entries.retain(|_, entry| !entry.is_expired());
        let mut bytes = 0u64;
        let mut count = 0u64;
        for kv in self.entries.iter() {
            bytes += kv.key().len() as u64 + kv.value().value.approx_bytes();
            count += 1;
        }
        Ok(StoreInfo {
            used_memory_bytes: Some(bytes),
            key_count: Some(count),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let store = MemoryStore::new();
        store.set_ex("k", "v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let store = MemoryStore::new();
        store.set_ex("k", "v", Duration::from_millis(10)).await.unwrap();
        // Sub-second TTLs round up to one second.
        assert!(store.get("k").await.unwrap().is_some());
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.set_ex("k", "v", Duration::from_secs(60)).await.unwrap();
        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_push_is_most_recent_first() {
        let store = MemoryStore::new();
        store.list_push("l", "a").await.unwrap();
        store.list_push("l", "b").await.unwrap();
        let items = store.list_range("l", 0, -1).await.unwrap();
        assert_eq!(items, vec!["b".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn test_list_trim_caps_length() {
        let store = MemoryStore::new();
        for i in 0..10 {
            store.list_push("l", &i.to_string()).await.unwrap();
        }
        store.list_trim("l", 0, 4).await.unwrap();
        let items = store.list_range("l", 0, -1).await.unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0], "9");
    }

    #[tokio::test]
    async fn test_set_operations() {
        let store = MemoryStore::new();
        assert!(store.set_add("s", "a").await.unwrap());
        assert!(!store.set_add("s", "a").await.unwrap());
        store.set_add("s", "b").await.unwrap();

        let mut members = store.set_members("s").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["a".to_string(), "b".to_string()]);

        assert!(store.set_remove("s", "a").await.unwrap());
        assert!(!store.set_remove("s", "a").await.unwrap());

        // Removing the last member drops the key.
        store.set_remove("s", "b").await.unwrap();
        assert!(store.scan_keys("s").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expire_on_list_key() {
        let store = MemoryStore::new();
        store.list_push("l", "x").await.unwrap();
        assert!(store.expire("l", Duration::from_secs(1)).await.unwrap());
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(store.list_range("l", 0, -1).await.unwrap().is_empty());
        assert!(!store.expire("l", Duration::from_secs(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_scan_keys_glob() {
        let store = MemoryStore::new();
        store.set_ex("cache:t1:menus", "x", Duration::from_secs(60)).await.unwrap();
        store.set_ex("cache:t2:menus", "x", Duration::from_secs(60)).await.unwrap();
        store.set_ex("tag:t1:menus", "x", Duration::from_secs(60)).await.unwrap();

        let mut keys = store.scan_keys("cache:t1:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["cache:t1:menus".to_string()]);
        assert_eq!(store.scan_keys("cache:*").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_wrong_type_is_an_error() {
        let store = MemoryStore::new();
        store.set_ex("k", "v", Duration::from_secs(60)).await.unwrap();
        assert!(store.list_push("k", "x").await.is_err());
        assert!(store.set_add("k", "x").await.is_err());
    }

    #[test]
    fn test_normalize_range() {
        assert_eq!(normalize_range(5, 0, -1), Some((0, 4)));
        assert_eq!(normalize_range(5, 0, 2), Some((0, 2)));
        assert_eq!(normalize_range(5, -2, -1), Some((3, 4)));
        assert_eq!(normalize_range(5, 3, 1), None);
        assert_eq!(normalize_range(0, 0, -1), None);
        assert_eq!(normalize_range(5, 7, 9), None);
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("session:*", "session:abc123"));
        assert!(glob_match("cache:t1:*", "cache:t1:menus"));
        assert!(!glob_match("cache:t1:*", "cache:t2:menus"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("a?c", "abc"));
        assert!(!glob_match("a?c", "abbc"));
        assert!(glob_match("*:activity", "session:xyz:activity"));
    }
}
