// JSON export source: serves one channel from a file on disk.
//
// The file holds `{"channel": ChannelInfo, "messages": [RawMessage, ...]}`,
// the same shape the HTTP relay speaks. Useful for offline analysis of a
// saved export and for deterministic tests.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{ChannelInfo, ChannelSource, FetchError};

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelExport {
    pub channel: ChannelInfo,
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
}

pub struct JsonExportSource {
    export: ChannelExport,
}

impl JsonExportSource {
    pub fn new(export: ChannelExport) -> Self {
        Self { export }
    }

    /// Load an export file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read channel export {}", path.display()))?;
        let export: ChannelExport = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse channel export {}", path.display()))?;
        info!(
            path = %path.display(),
            channel_id = export.channel.id,
            messages = export.messages.len(),
            "Loaded channel export"
        );
        Ok(Self::new(export))
    }

    fn matches(&self, handle: &str) -> bool {
        match &self.export.channel.username {
            Some(username) => username.eq_ignore_ascii_case(handle),
            // Exports of channels without a public username answer to any
            // handle; the file itself is the selection.
            None => true,
        }
    }
}

#[async_trait]
impl ChannelSource for JsonExportSource {
    async fn health_check(&self) -> Result<(), FetchError> {
        Ok(())
    }

    async fn resolve(&self, handle: &str) -> Result<ChannelInfo, FetchError> {
        if self.matches(handle) {
            Ok(self.export.channel.clone())
        } else {
            Err(FetchError::NotFound(handle.to_string()))
        }
    }

    async fn fetch_history(
        &self,
        _channel: &ChannelInfo,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, FetchError> {
        Ok(self
            .export
            .messages
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn export() -> ChannelExport {
        serde_json::from_value(json!({
            "channel": {"id": 7, "username": "SomeChannel", "kind": "broadcast"},
            "messages": [
                {"id": 3, "date": "2024-03-01T10:00:00Z", "message": "c"},
                {"id": 2, "date": "2024-03-01T09:00:00Z", "message": "b"},
                {"id": 1, "date": "2024-03-01T08:00:00Z", "message": "a"}
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn resolves_case_insensitively() {
        let source = JsonExportSource::new(export());
        assert_eq!(source.resolve("somechannel").await.unwrap().id, 7);
        assert_eq!(
            source.resolve("otherchannel").await.unwrap_err(),
            FetchError::NotFound("otherchannel".into())
        );
    }

    #[tokio::test]
    async fn history_respects_limit() {
        let source = JsonExportSource::new(export());
        let info = source.resolve("SomeChannel").await.unwrap();
        assert_eq!(source.fetch_history(&info, 2).await.unwrap().len(), 2);
        assert_eq!(source.fetch_history(&info, 200).await.unwrap().len(), 3);
    }
}
