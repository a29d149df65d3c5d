//! Social-graph relationship coordination layer.
//!
//! Answers "does A follow B?", mutates follow/block relationships, and
//! hydrates batches of user profiles efficiently against a slow, rate-limited
//! document store:
//!
//! - concurrent identical follow checks are coalesced into one read per actor
//! - rapid repeated follow/unfollow intents for the same edge are debounced,
//!   last intent wins
//! - profile snapshots are cached with a TTL
//! - bulk reads are chunked to the store's items-per-query limit and issued
//!   concurrently
//!
//! The store and the notification dispatcher are abstract collaborators; this
//! crate makes no authentication or authorization decisions and trusts
//! caller-supplied user identifiers.

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod services;

pub use cache::ProfileCache;
pub use config::SocialGraphConfig;
pub use domain::{CacheStats, SocialStats, UserProfile, USERS_COLLECTION};
pub use error::{ServiceError, ServiceResult, StoreError};
pub use repository::{
    Document, DocumentStore, DocumentWrite, FieldUpdate, Notifier, MAX_IDS_PER_QUERY,
};
pub use services::{BatchFetcher, FollowCheckCoalescer, MutationDebouncer, SocialGraphService};
