//! Collaborator traits at the store and notification boundaries.
//!
//! The coordination layer never talks to a concrete backend. Everything it
//! needs from the document store is expressed here as an object-safe trait
//! with array set-semantics on field updates, so the rest of the crate can be
//! exercised against an in-memory double.

use crate::error::StoreError;
use serde_json::{Map, Value};

/// Hard limit of the store's id-membership ("contains any") query.
///
/// This is an external constraint of the backing store, not a tuning knob.
/// [`crate::services::BatchFetcher`] chunks proactively so the limit is never
/// hit at the store boundary.
pub const MAX_IDS_PER_QUERY: usize = 10;

/// A document as returned by the store: its id plus a possibly-partial field
/// map. Hydration into a [`crate::domain::UserProfile`] fills in defaults.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// A single field mutation with array set-semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Replace the field wholesale.
    Set(Value),
    /// Add elements to an array field, skipping elements already present.
    ArrayUnion(Vec<Value>),
    /// Remove elements from an array field; removing a non-member is a no-op.
    ArrayRemove(Vec<Value>),
}

/// One document's worth of field updates inside an atomic batch.
#[derive(Debug, Clone)]
pub struct DocumentWrite {
    pub collection: String,
    pub id: String,
    pub updates: Vec<(String, FieldUpdate)>,
}

impl DocumentWrite {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            updates: Vec::new(),
        }
    }

    pub fn update(mut self, field: impl Into<String>, update: FieldUpdate) -> Self {
        self.updates.push((field.into(), update));
        self
    }
}

/// Abstract contract of the backing document store.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a single document, `None` when it does not exist.
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Apply field updates to one document.
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        updates: Vec<(String, FieldUpdate)>,
    ) -> Result<(), StoreError>;

    /// All-or-nothing multi-document write.
    async fn atomic_batch(&self, writes: Vec<DocumentWrite>) -> Result<(), StoreError>;

    /// Fetch every document whose id is in `ids`. Ids absent from the store
    /// are simply missing from the result. Must not be called with more than
    /// [`MAX_IDS_PER_QUERY`] ids.
    async fn query_by_id_membership(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Document>, StoreError>;
}

/// Notification-dispatch collaborator. Called fire-and-forget after a
/// successful follow; failures are logged and swallowed by the caller.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_followed(
        &self,
        target_id: &str,
        actor_id: &str,
        actor_display_name: &str,
    ) -> anyhow::Result<()>;
}
