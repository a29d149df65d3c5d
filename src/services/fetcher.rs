//! Chunked, cache-aware bulk profile reads.

use crate::cache::ProfileCache;
use crate::domain::{UserProfile, USERS_COLLECTION};
use crate::error::ServiceResult;
use crate::repository::{DocumentStore, MAX_IDS_PER_QUERY};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Fetches batches of profiles, serving from the cache where possible and
/// splitting the remainder into concurrent id-membership queries no larger
/// than the store's limit.
pub struct BatchFetcher {
    store: Arc<dyn DocumentStore>,
    cache: Arc<ProfileCache>,
}

impl BatchFetcher {
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<ProfileCache>) -> Self {
        Self { store, cache }
    }

    /// Resolve `ids` into profiles. Duplicates are collapsed, result order is
    /// unspecified, and ids the store does not know are silently dropped
    /// (a vanished user is a filtered result, not an error).
    pub async fn fetch_many(&self, ids: &[String]) -> ServiceResult<Vec<UserProfile>> {
        let mut seen = HashSet::new();
        let mut profiles = Vec::new();
        let mut uncached = Vec::new();

        for id in ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            match self.cache.get(id) {
                Some(profile) => profiles.push(profile),
                None => uncached.push(id.clone()),
            }
        }

        if uncached.is_empty() {
            return Ok(profiles);
        }

        // One query per chunk, all chunks in flight at once.
        let queries = uncached
            .chunks(MAX_IDS_PER_QUERY)
            .map(|chunk| self.store.query_by_id_membership(USERS_COLLECTION, chunk));
        let results = futures::future::try_join_all(queries).await?;

        let mut fetched = 0usize;
        for doc in results.into_iter().flatten() {
            let profile = UserProfile::from_document(&doc);
            self.cache.put(profile.clone());
            profiles.push(profile);
            fetched += 1;
        }

        debug!(
            requested = ids.len(),
            cached = profiles.len() - fetched,
            fetched,
            "hydrated profile batch"
        );
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::store::MockDocumentStore;
    use crate::repository::Document;
    use serde_json::Map;
    use std::time::Duration;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("u{i}")).collect()
    }

    fn echo_documents(queried: &[String]) -> Vec<Document> {
        queried
            .iter()
            .map(|id| Document::new(id.clone(), Map::new()))
            .collect()
    }

    #[tokio::test]
    async fn test_misses_are_chunked_at_store_limit() {
        let mut store = MockDocumentStore::new();
        store
            .expect_query_by_id_membership()
            .withf(|collection, chunk| {
                collection == USERS_COLLECTION && chunk.len() <= MAX_IDS_PER_QUERY
            })
            .times(3)
            .returning(|_, chunk| Ok(echo_documents(chunk)));

        let cache = Arc::new(ProfileCache::new(Duration::from_secs(300)));
        let fetcher = BatchFetcher::new(Arc::new(store), cache.clone());

        let profiles = fetcher.fetch_many(&ids(23)).await.unwrap();
        assert_eq!(profiles.len(), 23);
        // every fetched profile landed in the cache
        assert_eq!(cache.len(), 23);
    }

    #[tokio::test]
    async fn test_cached_ids_are_not_queried_again() {
        let mut store = MockDocumentStore::new();
        store
            .expect_query_by_id_membership()
            .withf(|_, chunk| chunk.len() == 1 && chunk[0] == "u1")
            .times(1)
            .returning(|_, chunk| Ok(echo_documents(chunk)));

        let cache = Arc::new(ProfileCache::new(Duration::from_secs(300)));
        cache.put(UserProfile::from_document(&Document::new("u0", Map::new())));
        let fetcher = BatchFetcher::new(Arc::new(store), cache);

        let profiles = fetcher
            .fetch_many(&["u0".to_string(), "u1".to_string()])
            .await
            .unwrap();
        assert_eq!(profiles.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicates_collapse_and_missing_ids_filter() {
        let mut store = MockDocumentStore::new();
        store
            .expect_query_by_id_membership()
            .times(1)
            .returning(|_, _| Ok(vec![Document::new("u0", Map::new())]));

        let cache = Arc::new(ProfileCache::new(Duration::from_secs(300)));
        let fetcher = BatchFetcher::new(Arc::new(store), cache);

        let profiles = fetcher
            .fetch_many(&[
                "u0".to_string(),
                "u0".to_string(),
                "ghost".to_string(),
            ])
            .await
            .unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].id, "u0");
    }
}
