//! In-process expiring key/value store.
//!
//! Backs the linking session store with TTL-bounded entries. Keys are opaque
//! strings and payloads are `serde_json::Value`, so domains serialize their
//! own types. Single-key operations are atomic under one lock; there is no
//! multi-key transaction, callers pairing two keys accept a TTL-bounded
//! window of half-written state.
//!
//! The trait seam ([`BaseExpiringStore`]) keeps the door open for an external
//! store (Redis et al.) without touching domain code.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::kernel::traits::BaseExpiringStore;

struct StoredEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe, cloneable in-memory store with per-entry expiry.
///
/// Expired entries behave as absent everywhere; they are physically dropped
/// by a sweep that runs on each write.
#[derive(Clone, Default)]
pub struct MemoryExpiringStore {
    entries: Arc<RwLock<HashMap<String, StoredEntry>>>,
}

impl MemoryExpiringStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries (housekeeping/tests).
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BaseExpiringStore for MemoryExpiringStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Duration,
    ) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        // Sweep dead entries while we hold the write lock anyway
        entries.retain(|_, entry| !entry.is_expired(now));

        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            StoredEntry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn take(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        Ok(entries
            .remove(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}
