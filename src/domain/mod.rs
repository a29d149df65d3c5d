pub mod profile;

pub use profile::{CacheStats, SocialStats, UserProfile, USERS_COLLECTION};
