//! In-memory backend using dashmap.
//!
//! Expiry is evaluated against the injected [`Clock`] on every access, so a
//! record written with a TTL disappears the moment a (possibly fake) clock
//! passes its expiry instant. Expired entries are dropped lazily and by
//! [`MemoryBackend::purge_expired`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use bastion_core::result::AppResult;
use bastion_core::traits::{Backend, Clock};
use bastion_core::types::Ttl;

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredValue {
    fn new(value: &str, ttl: Ttl, now: DateTime<Utc>) -> Self {
        Self {
            value: value.to_string(),
            expires_at: ttl.expires_at(now),
        }
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires| now < expires)
    }
}

/// In-memory backend provider.
///
/// Clones share the same data. Suitable for single-node deployments and tests.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    entries: Arc<DashMap<String, StoredValue>>,
    clock: Arc<dyn Clock>,
}

impl MemoryBackend {
    /// Create an empty backend whose expiry follows `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            clock,
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!(purged, "Purged expired backend entries");
        }
        purged
    }

    /// Spawn a task that purges expired entries every `interval`.
    pub fn spawn_purge_task(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let backend = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                backend.purge_expired();
            }
        })
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = self.clock.now();
        let (value, expired) = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => (Some(entry.value.clone()), false),
            Some(_) => (None, true),
            None => (None, false),
        };
        if expired {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl: Ttl) -> AppResult<()> {
        let now = self.clock.now();
        self.entries
            .insert(key.to_string(), StoredValue::new(value, ttl, now));
        Ok(())
    }

    async fn create(&self, key: &str, value: &str, ttl: Ttl) -> AppResult<bool> {
        self.compare_and_swap(key, None, value, ttl).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
        ttl: Ttl,
    ) -> AppResult<bool> {
        let now = self.clock.now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let matches = {
                    let current = occupied.get();
                    let current = current.is_live(now).then_some(current.value.as_str());
                    current == expected
                };
                if !matches {
                    return Ok(false);
                }
                occupied.insert(StoredValue::new(value, ttl, now));
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                if expected.is_some() {
                    return Ok(false);
                }
                vacant.insert(StoredValue::new(value, ttl, now));
                Ok(true)
            }
        }
    }

    async fn take(&self, key: &str) -> AppResult<Option<String>> {
        let now = self.clock.now();
        Ok(self
            .entries
            .remove(key)
            .and_then(|(_, entry)| entry.is_live(now).then_some(entry.value)))
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        Ok(self.take(key).await?.is_some())
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<(String, String)>> {
        let now = self.clock.now();
        let mut items: Vec<(String, String)> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix) && entry.value().is_live(now))
            .map(|entry| (entry.key().clone(), entry.value().value.clone()))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(items)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
