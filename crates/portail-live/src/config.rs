//! Feed configuration.

use serde::{Deserialize, Serialize};

/// What to do with a snapshot entry that does not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Drop the entry, report it, and apply the rest of the snapshot.
    #[default]
    Skip,
    /// Report the entry and leave the projection as it was for this snapshot.
    Reject,
}

/// Tunables for a [`SubscriptionManager`](crate::SubscriptionManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub decode_policy: DecodePolicy,

    /// Capacity of the feed event channel. Slow subscribers that fall more
    /// than this many events behind skip ahead.
    pub event_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            decode_policy: DecodePolicy::Skip,
            event_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let config: FeedConfig = serde_json::from_str(r#"{ "decode_policy": "reject" }"#).unwrap();
        assert_eq!(config.decode_policy, DecodePolicy::Reject);
        assert_eq!(config.event_capacity, 64);

        let config: FeedConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, FeedConfig::default());
    }
}
