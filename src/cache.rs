//! Time-bounded profile cache.
//!
//! Entries are immutable snapshots with a fetch timestamp. A stale entry is
//! treated as a miss on lookup but stays in place until the next `put`
//! overwrites it; there is no eviction beyond TTL masking because the
//! identifier space per session is small.

use crate::domain::UserProfile;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    profile: UserProfile,
    fetched_at: Instant,
}

pub struct ProfileCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ProfileCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Return a clone of the cached profile if the entry is still fresh.
    /// Stale entries are ignored in place, not deleted.
    pub fn get(&self, id: &str) -> Option<UserProfile> {
        let entry = self.entries.get(id)?;
        if entry.fetched_at.elapsed() < self.ttl {
            debug!(user = %id, "profile cache HIT");
            Some(entry.profile.clone())
        } else {
            debug!(user = %id, "profile cache MISS (stale)");
            None
        }
    }

    /// Store a fresh snapshot, replacing any prior entry wholesale.
    pub fn put(&self, profile: UserProfile) {
        self.entries.insert(
            profile.id.clone(),
            CacheEntry {
                profile,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop a single entry, e.g. after a mutation touched its relationship
    /// arrays.
    pub fn invalidate(&self, id: &str) {
        self.entries.remove(id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Document;
    use serde_json::Map;

    fn profile(id: &str) -> UserProfile {
        UserProfile::from_document(&Document::new(id, Map::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_hits_until_ttl() {
        let cache = ProfileCache::new(Duration::from_secs(300));
        cache.put(profile("u1"));

        tokio::time::advance(Duration::from_secs(300) - Duration::from_millis(1)).await;
        assert!(cache.get("u1").is_some());

        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(cache.get("u1").is_none());
        // stale entry is masked, not removed
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_stale_entry() {
        let cache = ProfileCache::new(Duration::from_secs(1));
        cache.put(profile("u1"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("u1").is_none());

        cache.put(profile("u1"));
        assert!(cache.get("u1").is_some());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = ProfileCache::new(Duration::from_secs(300));
        cache.put(profile("u1"));
        cache.put(profile("u2"));

        cache.invalidate("u1");
        assert!(cache.get("u1").is_none());
        assert!(cache.get("u2").is_some());

        cache.clear();
        assert!(cache.is_empty());
    }
}
