// The session guard around a channel source.
//
// One `Session` is built at startup and shared. It serializes access to the
// underlying source (one fetch in flight at a time), health-checks the source
// before every use, and bounds lock wait + resolve + fetch with a single
// deadline. When the deadline passes the whole fetch future is dropped.

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{ChannelInfo, ChannelSource, FetchError};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// A resolved channel plus its recent raw history.
#[derive(Debug, Clone)]
pub struct FetchedChannel {
    pub info: ChannelInfo,
    pub raw_messages: Vec<serde_json::Value>,
}

pub struct Session<S> {
    source: Mutex<S>,
    timeout: Duration,
}

impl<S: ChannelSource> Session<S> {
    pub fn new(source: S) -> Self {
        Self::with_timeout(source, DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(source: S, timeout: Duration) -> Self {
        Self {
            source: Mutex::new(source),
            timeout,
        }
    }

    /// Resolve `handle` and fetch up to `limit` messages under the session
    /// deadline.
    ///
    /// `accept` runs on the resolved metadata before any history is fetched;
    /// returning an error from it skips the history fetch entirely.
    pub async fn fetch<F, E>(&self, handle: &str, limit: u32, accept: F) -> Result<FetchedChannel, E>
    where
        F: FnOnce(&ChannelInfo) -> Result<(), E>,
        E: From<FetchError>,
    {
        let work = async {
            let source = self.source.lock().await;
            source.health_check().await.map_err(E::from)?;

            let info = source.resolve(handle).await.map_err(E::from)?;
            debug!(handle, channel_id = info.id, kind = ?info.kind, "Resolved channel");
            accept(&info)?;

            let raw_messages = source
                .fetch_history(&info, limit)
                .await
                .map_err(E::from)?;
            Ok::<_, E>(FetchedChannel { info, raw_messages })
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                warn!(handle, timeout_secs = self.timeout.as_secs(), "Channel fetch timed out");
                Err(FetchError::Timeout(self.timeout).into())
            }
        }
    }

    /// Run only the source health check, under the same lock and deadline.
    pub async fn health_check(&self) -> Result<(), FetchError> {
        let work = async { self.source.lock().await.health_check().await };
        tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }
}
