//! Facade over the coordination layer.
//!
//! Explicitly constructed and owned by the application (no ambient global
//! state): build one instance at startup, pass it by dependency injection,
//! call [`SocialGraphService::clear_cache`] at session boundaries.

use crate::cache::ProfileCache;
use crate::config::SocialGraphConfig;
use crate::domain::{profile::string_array, CacheStats, SocialStats, UserProfile, USERS_COLLECTION};
use crate::error::ServiceResult;
use crate::repository::{DocumentStore, Notifier};
use crate::services::{BatchFetcher, FollowCheckCoalescer, MutationDebouncer};
use std::sync::Arc;

pub struct SocialGraphService {
    store: Arc<dyn DocumentStore>,
    cache: Arc<ProfileCache>,
    fetcher: BatchFetcher,
    coalescer: Arc<FollowCheckCoalescer>,
    debouncer: Arc<MutationDebouncer>,
}

impl SocialGraphService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        config: SocialGraphConfig,
    ) -> Self {
        let cache = Arc::new(ProfileCache::new(config.profile_ttl));
        let fetcher = BatchFetcher::new(Arc::clone(&store), Arc::clone(&cache));
        let coalescer = Arc::new(FollowCheckCoalescer::new(
            Arc::clone(&store),
            config.coalesce_window,
        ));
        let debouncer = Arc::new(MutationDebouncer::new(
            Arc::clone(&store),
            notifier,
            Arc::clone(&cache),
            config.debounce_window,
        ));
        Self {
            store,
            cache,
            fetcher,
            coalescer,
            debouncer,
        }
    }

    /// Coalesced check of `target ∈ actor.following`.
    pub async fn is_following(&self, actor_id: &str, target_id: &str) -> ServiceResult<bool> {
        self.coalescer.is_following(actor_id, target_id).await
    }

    /// Direct (uncoalesced) check of `target ∈ actor.blocked`.
    pub async fn is_blocked(&self, actor_id: &str, target_id: &str) -> ServiceResult<bool> {
        let doc = self.store.get_document(USERS_COLLECTION, actor_id).await?;
        Ok(doc
            .map(|d| string_array(&d.fields, "blocked").iter().any(|b| b == target_id))
            .unwrap_or(false))
    }

    /// Debounced follow; eventually consistent.
    pub async fn follow_user(&self, actor_id: &str, target_id: &str) -> ServiceResult<()> {
        self.debouncer.follow(actor_id, target_id).await
    }

    /// Debounced unfollow; eventually consistent.
    pub async fn unfollow_user(&self, actor_id: &str, target_id: &str) -> ServiceResult<()> {
        self.debouncer.unfollow(actor_id, target_id).await
    }

    /// Immediate removal of `follower_id` from `owner_id`'s followers.
    pub async fn remove_follower(&self, owner_id: &str, follower_id: &str) -> ServiceResult<()> {
        self.debouncer.remove_follower(owner_id, follower_id).await
    }

    /// Immediate block, clearing any follow relationship in both directions.
    pub async fn block_user(&self, owner_id: &str, target_id: &str) -> ServiceResult<()> {
        self.debouncer.block_user(owner_id, target_id).await
    }

    /// Hydrated follower profiles for `owner_id`.
    pub async fn get_user_followers(&self, owner_id: &str) -> ServiceResult<Vec<UserProfile>> {
        self.hydrate_edge_list(owner_id, "followers").await
    }

    /// Hydrated profiles of everyone `owner_id` follows.
    pub async fn get_user_following(&self, owner_id: &str) -> ServiceResult<Vec<UserProfile>> {
        self.hydrate_edge_list(owner_id, "following").await
    }

    /// Bulk profile hydration with caching and chunking.
    pub async fn get_batch_user_profiles(&self, ids: &[String]) -> ServiceResult<Vec<UserProfile>> {
        self.fetcher.fetch_many(ids).await
    }

    /// Follower/following counts only, no hydration.
    pub async fn get_user_social_stats(&self, owner_id: &str) -> ServiceResult<SocialStats> {
        let doc = self.store.get_document(USERS_COLLECTION, owner_id).await?;
        Ok(doc
            .map(|d| SocialStats {
                followers_count: string_array(&d.fields, "followers").len(),
                following_count: string_array(&d.fields, "following").len(),
            })
            .unwrap_or_default())
    }

    /// Session boundary: drop cached profiles, cancel pending debounce
    /// timers, and drop pending coalescer batches so no cross-session state
    /// leaks.
    pub async fn clear_cache(&self) {
        self.cache.clear();
        self.debouncer.clear().await;
        self.coalescer.clear().await;
    }

    /// Diagnostic introspection; observability only, never correctness.
    pub async fn cache_stats(&self) -> CacheStats {
        CacheStats {
            profile_cache_size: self.cache.len(),
            pending_operations: self.debouncer.pending_count().await,
            pending_follow_checks: self.coalescer.pending_batches().await,
        }
    }

    /// The owner's own edge list is authoritative and cheap to re-read, so it
    /// is never served from the cache; only the hydration step is cached.
    async fn hydrate_edge_list(
        &self,
        owner_id: &str,
        field: &str,
    ) -> ServiceResult<Vec<UserProfile>> {
        let doc = self.store.get_document(USERS_COLLECTION, owner_id).await?;
        let ids = doc
            .map(|d| string_array(&d.fields, field))
            .unwrap_or_default();
        self.fetcher.fetch_many(&ids).await
    }
}
