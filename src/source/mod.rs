// Channel source: the injected collaborator that resolves channels and
// fetches their recent history.
//
// Analysis never talks to the network directly. It goes through a
// `Session`, which owns one `ChannelSource` implementation. Two adapters are
// provided: a JSON export file (offline analysis, tests) and an HTTP relay.

pub mod file;
pub mod http;
pub mod rate_limit;
pub mod session;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::session::Session;

/// What kind of peer a handle resolved to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// One-to-many broadcast channel.
    Broadcast,
    /// Large public group.
    Megagroup,
    /// A person or bot account.
    User,
    #[default]
    #[serde(other)]
    Other,
}

impl ChannelKind {
    /// Broadcast channels and megagroups are both channel-type peers.
    pub fn is_channel(&self) -> bool {
        matches!(self, ChannelKind::Broadcast | ChannelKind::Megagroup)
    }
}

/// Resolved channel metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subscriber_count: Option<u64>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub photo_present: bool,
    #[serde(default)]
    pub kind: ChannelKind,
}

/// Failures a channel source can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("channel not found: {0}")]
    NotFound(String),

    #[error("channel is private")]
    Private,

    /// Upstream asked us to back off. `retry_after` is the upstream's own
    /// hint, passed through untouched.
    #[error("rate limited by upstream")]
    RateLimited { retry_after: Option<Duration> },

    #[error("fetch exceeded {}s deadline", .0.as_secs())]
    Timeout(Duration),

    #[error("channel source unavailable: {0}")]
    Unavailable(String),

    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

/// Trait for channel sources. Implementations must be async because the
/// production source is remote.
#[async_trait]
pub trait ChannelSource: Send + Sync {
    /// Cheap liveness probe run before every use of the source.
    async fn health_check(&self) -> Result<(), FetchError>;

    /// Resolve a bare handle to channel metadata.
    async fn resolve(&self, handle: &str) -> Result<ChannelInfo, FetchError>;

    /// Up to `limit` most recent raw message records, newest first.
    async fn fetch_history(
        &self,
        channel: &ChannelInfo,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_info_defaults_missing_fields() {
        let info: ChannelInfo = serde_json::from_str(r#"{"id": 42, "kind": "megagroup"}"#).unwrap();
        assert_eq!(info.id, 42);
        assert_eq!(info.kind, ChannelKind::Megagroup);
        assert!(info.kind.is_channel());
        assert_eq!(info.subscriber_count, None);

        let info: ChannelInfo = serde_json::from_str(r#"{"id": 1, "kind": "supergroup_v2"}"#).unwrap();
        assert_eq!(info.kind, ChannelKind::Other);
        assert!(!info.kind.is_channel());
    }
}
