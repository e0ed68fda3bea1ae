//! In-memory cache for the taxonomy catalog.
//!
//! The catalog only changes on import, so listings are kept for a TTL and
//! dropped on demand through [`CatalogCache::invalidate`].

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::models::LeafNode;

/// Default TTL for cached listings (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Most depth listings held at once.
pub const MAX_LISTINGS: usize = 32;

/// A cached value with expiration time.
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T: Clone> CacheEntry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn get(&self) -> Option<T> {
        if self.is_expired() {
            None
        } else {
            Some(self.value.clone())
        }
    }
}

/// Cache for leaf node listings and the maximum depth.
pub struct CatalogCache {
    /// Listings keyed by depth filter (`None` = all depths)
    listings: RwLock<HashMap<Option<i32>, CacheEntry<Vec<LeafNode>>>>,
    max_depth: RwLock<Option<CacheEntry<i32>>>,
    ttl: Duration,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
            max_depth: RwLock::new(None),
            ttl,
        }
    }

    /// Get a cached listing, or None if expired/missing.
    pub fn get_leaf_nodes(&self, depth: Option<i32>) -> Option<Vec<LeafNode>> {
        self.listings
            .read()
            .ok()
            .and_then(|guard| guard.get(&depth).and_then(|e| e.get()))
    }

    pub fn set_leaf_nodes(&self, depth: Option<i32>, nodes: Vec<LeafNode>) {
        if let Ok(mut guard) = self.listings.write() {
            if !guard.contains_key(&depth) && guard.len() >= MAX_LISTINGS {
                guard.retain(|_, entry| !entry.is_expired());
                if guard.len() >= MAX_LISTINGS {
                    let oldest = guard
                        .iter()
                        .min_by_key(|(_, entry)| entry.expires_at)
                        .map(|(key, _)| *key);
                    if let Some(key) = oldest {
                        guard.remove(&key);
                    }
                }
            }
            guard.insert(depth, CacheEntry::new(nodes, self.ttl));
        }
    }

    pub fn get_max_depth(&self) -> Option<i32> {
        self.max_depth
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().and_then(|e| e.get()))
    }

    pub fn set_max_depth(&self, depth: i32) {
        if let Ok(mut guard) = self.max_depth.write() {
            *guard = Some(CacheEntry::new(depth, self.ttl));
        }
    }

    /// Drop everything (call after the catalog changes).
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.listings.write() {
            guard.clear();
        }
        if let Ok(mut guard) = self.max_depth.write() {
            *guard = None;
        }
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}
