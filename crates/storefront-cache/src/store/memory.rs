//! In-process store with lazy expiry.

use super::CacheStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use shaku::Component;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use storefront_core::{StorefrontError, StorefrontResult};
use tokio::time::Instant;
use tracing::debug;

/// Every this many writes, expired entries are swept from the map.
pub const SWEEP_EVERY: usize = 256;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// A [`CacheStore`] kept in a map inside the process.
///
/// Used when Redis is disabled and in tests. Expiry follows the tokio clock,
/// so paused-time tests can advance past a TTL without sleeping. Reads hide
/// expired entries; writes sweep them every [`SWEEP_EVERY`] calls.
#[derive(Component, Default)]
#[shaku(interface = CacheStore)]
pub struct InMemoryCacheStore {
    #[shaku(default)]
    entries: RwLock<HashMap<String, Entry>>,
    #[shaku(default)]
    writes: AtomicUsize,
}

impl InMemoryCacheStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of unexpired entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().values().filter(|e| e.is_live(now)).count()
    }

    /// Returns true if no unexpired entry remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the unexpired keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|(_, e)| e.is_live(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for InMemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCacheStore")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get_raw(&self, key: &str) -> StorefrontResult<Option<String>> {
        let now = Instant::now();
        let entries = self.entries.read();
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> StorefrontResult<()> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| StorefrontError::Configuration(format!("TTL {:?} for '{}' is out of range", ttl, key)))?;

        let mut entries = self.entries.write();
        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0 {
            let before = entries.len();
            entries.retain(|_, e| e.is_live(now));
            debug!("Swept {} expired entries", before - entries.len());
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> StorefrontResult<u64> {
        let mut entries = self.entries.write();

        if !super::is_glob(pattern) {
            return Ok(u64::from(entries.remove(pattern).is_some()));
        }

        let matcher = glob::Pattern::new(pattern).map_err(|e| {
            StorefrontError::Configuration(format!("Invalid key pattern '{}': {}", pattern, e))
        })?;

        let before = entries.len();
        entries.retain(|key, _| !matcher.matches(key));
        let deleted = (before - entries.len()) as u64;

        debug!("Deleted {} keys matching pattern '{}'", deleted, pattern);
        Ok(deleted)
    }

    async fn ping(&self) -> StorefrontResult<()> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}
