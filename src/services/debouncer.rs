//! Debounced follow/unfollow mutations and immediate destructive mutations.
//!
//! Follow buttons are prone to rapid double-invocation, so follow/unfollow
//! intents wait out a quiet period before touching the store; the last intent
//! for an edge wins and superseded timers never fire. Removing a follower and
//! blocking are destructive, infrequent actions and are applied immediately.
//!
//! Every mutation writes both sides of the mirrored edge in one atomic batch,
//! so the follower/following arrays can never diverge.

use crate::cache::ProfileCache;
use crate::domain::{UserProfile, USERS_COLLECTION};
use crate::error::ServiceResult;
use crate::repository::{DocumentStore, DocumentWrite, FieldUpdate, Notifier};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MutationKind {
    Follow,
    Unfollow,
}

/// Pending edges are keyed by (actor, target) only: a later intent for the
/// same edge supersedes the earlier one even when the kind differs, so a
/// follow chased by an unfollow inside the window never reaches the store.
type EdgeKey = (String, String);

struct PendingMutation {
    timer: JoinHandle<()>,
}

pub struct MutationDebouncer {
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
    cache: Arc<ProfileCache>,
    window: Duration,
    pending: Mutex<HashMap<EdgeKey, PendingMutation>>,
}

impl MutationDebouncer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        cache: Arc<ProfileCache>,
        window: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            cache,
            window,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Schedule a follow of `target_id` by `actor_id`. Settles when the
    /// debounced write commits, or with `Ok(())` if a later intent for the
    /// same edge superseded this one.
    pub async fn follow(self: &Arc<Self>, actor_id: &str, target_id: &str) -> ServiceResult<()> {
        self.schedule(MutationKind::Follow, actor_id, target_id)
            .await
    }

    /// Schedule an unfollow. Removing a non-existent edge is an idempotent
    /// no-op at the store.
    pub async fn unfollow(self: &Arc<Self>, actor_id: &str, target_id: &str) -> ServiceResult<()> {
        self.schedule(MutationKind::Unfollow, actor_id, target_id)
            .await
    }

    async fn schedule(
        self: &Arc<Self>,
        kind: MutationKind,
        actor_id: &str,
        target_id: &str,
    ) -> ServiceResult<()> {
        let key: EdgeKey = (actor_id.to_string(), target_id.to_string());
        let (tx, rx) = oneshot::channel::<ServiceResult<()>>();
        {
            let mut pending = self.pending.lock().await;
            if let Some(prev) = pending.remove(&key) {
                prev.timer.abort();
                debug!(actor = %key.0, target = %key.1, "superseded pending mutation");
            }

            let this = Arc::clone(self);
            let task_key = key.clone();
            let timer = tokio::spawn(async move {
                tokio::time::sleep(this.window).await;
                // Deregister under the lock before touching the store, so a
                // superseding call can only abort a timer that has not
                // started executing.
                if this.pending.lock().await.remove(&task_key).is_none() {
                    return;
                }
                let outcome = this.execute(kind, &task_key.0, &task_key.1).await;
                let _ = tx.send(outcome);
            });
            pending.insert(key, PendingMutation { timer });
        }

        match rx.await {
            Ok(result) => result,
            // Superseded (or cleared at a session boundary): the later intent
            // owns the outcome, this caller's intent simply never ran.
            Err(_) => Ok(()),
        }
    }

    async fn execute(
        &self,
        kind: MutationKind,
        actor_id: &str,
        target_id: &str,
    ) -> ServiceResult<()> {
        let writes = match kind {
            MutationKind::Follow => vec![
                DocumentWrite::new(USERS_COLLECTION, actor_id)
                    .update("following", FieldUpdate::ArrayUnion(vec![id(target_id)])),
                DocumentWrite::new(USERS_COLLECTION, target_id)
                    .update("followers", FieldUpdate::ArrayUnion(vec![id(actor_id)])),
            ],
            MutationKind::Unfollow => vec![
                DocumentWrite::new(USERS_COLLECTION, actor_id)
                    .update("following", FieldUpdate::ArrayRemove(vec![id(target_id)])),
                DocumentWrite::new(USERS_COLLECTION, target_id)
                    .update("followers", FieldUpdate::ArrayRemove(vec![id(actor_id)])),
            ],
        };
        self.store.atomic_batch(writes).await?;
        self.cache.invalidate(actor_id);
        self.cache.invalidate(target_id);

        if kind == MutationKind::Follow {
            self.spawn_follow_notification(actor_id, target_id);
        }
        Ok(())
    }

    /// Fire-and-forget notification dispatch. Never awaited by the mutating
    /// caller; failures are logged and swallowed.
    fn spawn_follow_notification(&self, actor_id: &str, target_id: &str) {
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let actor = actor_id.to_string();
        let target = target_id.to_string();
        tokio::spawn(async move {
            let display_name = match store.get_document(USERS_COLLECTION, &actor).await {
                Ok(Some(doc)) => UserProfile::from_document(&doc).display_name,
                Ok(None) => String::new(),
                Err(e) => {
                    warn!(actor = %actor, error = %e, "skipping follow notification: actor read failed");
                    return;
                }
            };
            if let Err(e) = notifier.notify_followed(&target, &actor, &display_name).await {
                warn!(actor = %actor, target = %target, error = %e, "follow notification dispatch failed");
            }
        });
    }

    /// Remove `follower_id` from `owner_id`'s followers. Destructive, so not
    /// debounced; both sides of the edge go in one batch.
    pub async fn remove_follower(&self, owner_id: &str, follower_id: &str) -> ServiceResult<()> {
        self.store
            .atomic_batch(vec![
                DocumentWrite::new(USERS_COLLECTION, owner_id)
                    .update("followers", FieldUpdate::ArrayRemove(vec![id(follower_id)])),
                DocumentWrite::new(USERS_COLLECTION, follower_id)
                    .update("following", FieldUpdate::ArrayRemove(vec![id(owner_id)])),
            ])
            .await?;
        self.cache.invalidate(owner_id);
        self.cache.invalidate(follower_id);
        Ok(())
    }

    /// Block `target_id`. The block marker and the removal of any follow
    /// edges in both directions commit in the same atomic batch; a pending
    /// debounced mutation on either orientation of the edge is cancelled so
    /// it cannot resurrect the relationship after the block.
    pub async fn block_user(&self, owner_id: &str, target_id: &str) -> ServiceResult<()> {
        {
            let mut pending = self.pending.lock().await;
            for key in [
                (owner_id.to_string(), target_id.to_string()),
                (target_id.to_string(), owner_id.to_string()),
            ] {
                if let Some(prev) = pending.remove(&key) {
                    prev.timer.abort();
                }
            }
        }

        self.store
            .atomic_batch(vec![
                DocumentWrite::new(USERS_COLLECTION, owner_id)
                    .update("blocked", FieldUpdate::ArrayUnion(vec![id(target_id)]))
                    .update("following", FieldUpdate::ArrayRemove(vec![id(target_id)]))
                    .update("followers", FieldUpdate::ArrayRemove(vec![id(target_id)])),
                DocumentWrite::new(USERS_COLLECTION, target_id)
                    .update("following", FieldUpdate::ArrayRemove(vec![id(owner_id)]))
                    .update("followers", FieldUpdate::ArrayRemove(vec![id(owner_id)])),
            ])
            .await?;
        self.cache.invalidate(owner_id);
        self.cache.invalidate(target_id);
        Ok(())
    }

    /// Number of debounced mutations waiting for their quiet period.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Cancel every pending timer outright; none of them will fire.
    pub async fn clear(&self) {
        let mut pending = self.pending.lock().await;
        for (_, mutation) in pending.drain() {
            mutation.timer.abort();
        }
    }
}

fn id(value: &str) -> Value {
    Value::String(value.to_string())
}
