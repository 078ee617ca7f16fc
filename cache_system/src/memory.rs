//! In-process cache backend
//!
//! Bounded key/value map with per-entry expiry. When full, expired entries
//! are purged first; if none expired, the entry closest to expiry goes.

use crate::errors::CacheError;
use crate::store::RowCache;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Entries plus an index ordered by expiry, kept in step
#[derive(Debug, Default)]
struct Slots {
    entries: HashMap<String, Entry>,
    by_expiry: BTreeSet<(Instant, String)>,
}

impl Slots {
    fn insert(&mut self, key: &str, value: &str, expires_at: Instant) {
        let entry = Entry {
            value: value.to_string(),
            expires_at,
        };
        if let Some(old) = self.entries.insert(key.to_string(), entry) {
            self.by_expiry.remove(&(old.expires_at, key.to_string()));
        }
        self.by_expiry.insert((expires_at, key.to_string()));
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(old) => {
                self.by_expiry.remove(&(old.expires_at, key.to_string()));
                true
            }
            None => false,
        }
    }

    /// Drop the entry closest to expiry
    fn pop_soonest(&mut self) -> Option<Instant> {
        let (expires_at, key) = self.by_expiry.pop_first()?;
        self.entries.remove(&key);
        Some(expires_at)
    }

    /// Purge expired entries, then evict by soonest expiry until there is
    /// room for one more
    fn make_room(&mut self, max_entries: usize, now: Instant) {
        while self
            .by_expiry
            .first()
            .is_some_and(|(expires_at, _)| *expires_at <= now)
        {
            self.pop_soonest();
        }
        while self.entries.len() >= max_entries && self.pop_soonest().is_some() {}
    }
}

/// Memory-backed cache
#[derive(Debug)]
pub struct MemoryCache {
    max_entries: usize,
    slots: RwLock<Slots>,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            slots: RwLock::new(Slots::default()),
        }
    }

    /// Number of stored entries, expired ones included until purged
    pub async fn len(&self) -> usize {
        self.slots.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.entries.is_empty()
    }

    pub async fn clear(&self) {
        *self.slots.write().await = Slots::default();
    }
}

#[async_trait]
impl RowCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let slots = self.slots.read().await;
            match slots.entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it so it stops counting against the bound
        let mut slots = self.slots.write().await;
        if slots.entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            slots.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: u64) -> Result<(), CacheError> {
        if ttl == 0 {
            return Err(CacheError::InvalidTtl(ttl));
        }

        let now = Instant::now();
        let mut slots = self.slots.write().await;
        if !slots.entries.contains_key(key) {
            slots.make_room(self.max_entries, now);
        }
        slots.insert(key, value, now + Duration::from_secs(ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.slots.write().await.remove(key))
    }
}
