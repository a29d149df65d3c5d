//! Follow-check coalescing.
//!
//! Burst loads (e.g. a list of user cards each asking "do I follow this
//! person?") would otherwise issue one profile read per card. Checks arriving
//! inside the coalescing window are grouped per actor and answered from a
//! single read of that actor's document.

use crate::domain::{profile::string_array, USERS_COLLECTION};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::DocumentStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

struct PendingCheck {
    target_id: String,
    tx: oneshot::Sender<ServiceResult<bool>>,
}

#[derive(Default)]
struct CoalescerState {
    /// Pending checks grouped by actor id.
    pending: HashMap<String, Vec<PendingCheck>>,
    /// One flush timer covers the whole coalescer, not one per actor.
    flush_scheduled: bool,
}

pub struct FollowCheckCoalescer {
    store: Arc<dyn DocumentStore>,
    window: Duration,
    state: Mutex<CoalescerState>,
}

impl FollowCheckCoalescer {
    pub fn new(store: Arc<dyn DocumentStore>, window: Duration) -> Self {
        Self {
            store,
            window,
            state: Mutex::new(CoalescerState::default()),
        }
    }

    /// Answer `target ∈ actor.following`, sharing one store read with every
    /// other check for the same actor queued in the current window.
    pub async fn is_following(
        self: &Arc<Self>,
        actor_id: &str,
        target_id: &str,
    ) -> ServiceResult<bool> {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state.lock().await;
            state
                .pending
                .entry(actor_id.to_string())
                .or_default()
                .push(PendingCheck {
                    target_id: target_id.to_string(),
                    tx,
                });
            if !state.flush_scheduled {
                state.flush_scheduled = true;
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    tokio::time::sleep(this.window).await;
                    this.flush().await;
                });
            }
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::Cancelled(
                "follow check dropped before flush".to_string(),
            )),
        }
    }

    /// Snapshot-and-clear all pending groups, then answer each group from one
    /// read of its actor's document. Checks arriving after the snapshot start
    /// a fresh window; none are ever silently dropped.
    async fn flush(&self) {
        let groups = {
            let mut state = self.state.lock().await;
            state.flush_scheduled = false;
            std::mem::take(&mut state.pending)
        };
        if groups.is_empty() {
            return;
        }
        debug!(actors = groups.len(), "flushing coalesced follow checks");

        let reads = groups.into_iter().map(|(actor_id, waiters)| async move {
            match self.store.get_document(USERS_COLLECTION, &actor_id).await {
                Ok(doc) => {
                    // Every waiter in the group sees this one snapshot.
                    let following: HashSet<String> = doc
                        .map(|d| string_array(&d.fields, "following"))
                        .unwrap_or_default()
                        .into_iter()
                        .collect();
                    for waiter in waiters {
                        let _ = waiter.tx.send(Ok(following.contains(&waiter.target_id)));
                    }
                }
                Err(e) => {
                    warn!(actor = %actor_id, error = %e, "coalesced follow-check read failed");
                    for waiter in waiters {
                        let _ = waiter.tx.send(Err(ServiceError::Store(e.clone())));
                    }
                }
            }
        });
        // One failing actor group never affects another.
        futures::future::join_all(reads).await;
    }

    /// Drop every pending check; their callers observe cancellation.
    pub async fn clear(&self) {
        self.state.lock().await.pending.clear();
    }

    /// Number of actor groups waiting for the next flush.
    pub async fn pending_batches(&self) -> usize {
        self.state.lock().await.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::store::MockDocumentStore;
    use crate::repository::Document;
    use serde_json::json;

    fn actor_doc(id: &str, following: &[&str]) -> Document {
        let mut fields = serde_json::Map::new();
        fields.insert("following".to_string(), json!(following));
        Document::new(id, fields)
    }

    #[tokio::test(start_paused = true)]
    async fn test_checks_in_one_window_share_one_read() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get_document()
            .withf(|_, id| id == "alice")
            .times(1)
            .returning(|_, id| Ok(Some(actor_doc(id, &["bob"]))));

        let coalescer = Arc::new(FollowCheckCoalescer::new(
            Arc::new(store),
            Duration::from_millis(100),
        ));

        let (a, b, c) = tokio::join!(
            coalescer.is_following("alice", "bob"),
            coalescer.is_following("alice", "carol"),
            coalescer.is_following("alice", "bob"),
        );
        assert!(a.unwrap());
        assert!(!b.unwrap());
        assert!(c.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_actor_document_means_not_following() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get_document()
            .times(1)
            .returning(|_, _| Ok(None));

        let coalescer = Arc::new(FollowCheckCoalescer::new(
            Arc::new(store),
            Duration::from_millis(100),
        ));
        assert!(!coalescer.is_following("ghost", "bob").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleared_checks_observe_cancellation() {
        let store = MockDocumentStore::new();
        let coalescer = Arc::new(FollowCheckCoalescer::new(
            Arc::new(store),
            Duration::from_secs(3600),
        ));

        let pending = {
            let coalescer = Arc::clone(&coalescer);
            tokio::spawn(async move { coalescer.is_following("alice", "bob").await })
        };
        tokio::task::yield_now().await;
        assert_eq!(coalescer.pending_batches().await, 1);

        coalescer.clear().await;
        let result = pending.await.unwrap();
        assert!(matches!(result, Err(ServiceError::Cancelled(_))));
    }
}
