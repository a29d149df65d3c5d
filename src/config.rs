use std::env;
use std::time::Duration;

/// Tunable windows for the coordination layer.
///
/// The batch-read chunk size is deliberately not here: it is a hard limit of
/// the store's id-membership query, not a tuning knob (see
/// [`crate::repository::MAX_IDS_PER_QUERY`]).
#[derive(Debug, Clone)]
pub struct SocialGraphConfig {
    /// How long a cached profile snapshot stays fresh.
    pub profile_ttl: Duration,
    /// How long concurrent follow checks are held before a single flush.
    pub coalesce_window: Duration,
    /// Quiet period required before a follow/unfollow intent executes.
    pub debounce_window: Duration,
}

impl Default for SocialGraphConfig {
    fn default() -> Self {
        Self {
            profile_ttl: Duration::from_secs(300),
            coalesce_window: Duration::from_millis(100),
            debounce_window: Duration::from_millis(300),
        }
    }
}

impl SocialGraphConfig {
    /// Build a config from `SOCIAL_GRAPH_*` env vars, falling back to the
    /// defaults above for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let profile_ttl = env::var("SOCIAL_GRAPH_PROFILE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.profile_ttl);

        let coalesce_window = env::var("SOCIAL_GRAPH_COALESCE_WINDOW_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.coalesce_window);

        let debounce_window = env::var("SOCIAL_GRAPH_DEBOUNCE_WINDOW_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.debounce_window);

        Self {
            profile_ttl,
            coalesce_window,
            debounce_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows() {
        let config = SocialGraphConfig::default();
        assert_eq!(config.profile_ttl, Duration::from_secs(300));
        assert_eq!(config.coalesce_window, Duration::from_millis(100));
        assert_eq!(config.debounce_window, Duration::from_millis(300));
    }
}
