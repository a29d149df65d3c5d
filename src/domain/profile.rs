//! User profile snapshots and their hydration from store documents.

use crate::repository::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection holding user documents.
pub const USERS_COLLECTION: &str = "users";

/// Denormalized snapshot of a user document.
///
/// Immutable once fetched: the cache only ever replaces a snapshot wholesale,
/// never patches one in place. Every field has an explicit default so a
/// partial store document always hydrates into a fully-populated profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub bio: String,
    pub location: String,
    pub verified: bool,
    pub rating: f64,
    pub rating_count: i64,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub blocked: Vec<String>,
    pub is_private: bool,
    pub notify_on_follow: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Hydrate a profile from a possibly-partial store document.
    ///
    /// Pure function: missing fields get defaults (empty arrays, `false`
    /// flags, zero counts) regardless of store heterogeneity.
    pub fn from_document(doc: &Document) -> Self {
        let fields = &doc.fields;
        Self {
            id: doc.id.clone(),
            display_name: str_field(fields, "display_name"),
            photo_url: fields
                .get("photo_url")
                .and_then(Value::as_str)
                .map(str::to_string),
            bio: str_field(fields, "bio"),
            location: str_field(fields, "location"),
            verified: bool_field(fields, "verified"),
            rating: fields
                .get("rating")
                .and_then(Value::as_f64)
                .unwrap_or_default(),
            rating_count: fields
                .get("rating_count")
                .and_then(Value::as_i64)
                .unwrap_or_default(),
            followers: string_array(fields, "followers"),
            following: string_array(fields, "following"),
            blocked: string_array(fields, "blocked"),
            is_private: bool_field(fields, "is_private"),
            notify_on_follow: bool_field(fields, "notify_on_follow"),
            created_at: fields
                .get("created_at")
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc)),
        }
    }
}

/// Follower/following counts for a user, no profile hydration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialStats {
    pub followers_count: usize,
    pub following_count: usize,
}

/// Diagnostic snapshot of the coordination layer's in-flight state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently held by the profile cache (fresh or stale).
    pub profile_cache_size: usize,
    /// Debounced mutations waiting for their quiet period.
    pub pending_operations: usize,
    /// Actor groups with follow checks waiting for the next flush.
    pub pending_follow_checks: usize,
}

fn str_field(fields: &Map<String, Value>, name: &str) -> String {
    fields
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn bool_field(fields: &Map<String, Value>, name: &str) -> bool {
    fields.get(name).and_then(Value::as_bool).unwrap_or(false)
}

/// Read an array-of-ids field, skipping any non-string elements.
pub(crate) fn string_array(fields: &Map<String, Value>, name: &str) -> Vec<String> {
    fields
        .get(name)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
