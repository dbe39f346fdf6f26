// Analysis entry points.
//
// `Analyzer` owns the shared session and the language detector and exposes
// the two request handlers. Both follow the same order: cheap input checks
// first (no network), then one serialized fetch, then pure analysis over the
// fetched items. Every outcome, success or failure, is an `AnalysisResult`.

pub mod activity;
pub mod scrape;

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::classify::language::LanguageDetector;
use crate::error::IntelError;
use crate::message::{ingest, ContentItem};
use crate::report::AnalysisResult;
use crate::source::session::FetchedChannel;
use crate::source::{ChannelInfo, ChannelSource, Session};
use crate::target::{is_private_target, TargetHandle};

/// Upper bound on messages fetched per request.
pub const MAX_MESSAGES: u32 = 200;
pub const DEFAULT_INTEL_LIMIT: u32 = 200;
pub const DEFAULT_SCRAPE_LIMIT: u32 = 25;

/// Resolve the requested message count: absent or zero means `default`,
/// anything above `MAX_MESSAGES` is clamped.
pub fn clamp_limit(requested: Option<u32>, default: u32) -> u32 {
    match requested {
        None | Some(0) => default.min(MAX_MESSAGES),
        Some(n) => n.min(MAX_MESSAGES),
    }
}

/// Reject invite links, then normalize. Never touches the network.
pub fn validate_target(raw: &str, private_message: &str) -> Result<TargetHandle, IntelError> {
    if is_private_target(raw) {
        return Err(IntelError::PrivateChannel(private_message.to_string()));
    }
    TargetHandle::parse(raw)
}

/// Items ingested from one fetch, capped at `limit`.
pub(crate) struct FetchedItems {
    pub info: ChannelInfo,
    pub items: Vec<ContentItem>,
    pub skipped: usize,
}

impl FetchedItems {
    fn from_fetch(fetched: FetchedChannel, limit: u32) -> Self {
        let mut raw = fetched.raw_messages;
        // A source that ignores the limit is truncated here.
        raw.truncate(limit as usize);
        let ingested = ingest(&raw);
        Self {
            info: fetched.info,
            items: ingested.items,
            skipped: ingested.skipped,
        }
    }

    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.items.iter().map(|i| i.timestamp).max()
    }
}

pub(crate) fn rfc3339(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The `channel_metadata` artifact.
pub(crate) fn channel_metadata(
    info: &ChannelInfo,
    handle: &TargetHandle,
    last_message_ts: Option<DateTime<Utc>>,
    language_guess: Option<String>,
) -> Value {
    json!({
        "title": info.title.clone().unwrap_or_default(),
        "username": info.username.clone().unwrap_or_else(|| handle.to_string()),
        "description": info.description.clone().unwrap_or_default(),
        "photo_present": info.photo_present,
        "subscriber_count": info.subscriber_count,
        "verified": info.verified,
        "last_message_ts": last_message_ts.as_ref().map(rfc3339),
        "language_guess": language_guess,
    })
}

/// Request handlers over a shared session.
pub struct Analyzer<S> {
    session: Arc<Session<S>>,
    detector: Arc<dyn LanguageDetector>,
}

impl<S> Clone for Analyzer<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            detector: Arc::clone(&self.detector),
        }
    }
}

impl<S: ChannelSource> Analyzer<S> {
    pub fn new(session: Arc<Session<S>>, detector: Arc<dyn LanguageDetector>) -> Self {
        Self { session, detector }
    }

    pub(crate) fn detector(&self) -> &dyn LanguageDetector {
        self.detector.as_ref()
    }

    /// Serialized resolve + fetch, then ingestion.
    pub(crate) async fn fetch_items<F>(
        &self,
        handle: &TargetHandle,
        limit: u32,
        accept: F,
    ) -> Result<FetchedItems, IntelError>
    where
        F: FnOnce(&ChannelInfo) -> Result<(), IntelError>,
    {
        let fetched = self.session.fetch(handle.as_str(), limit, accept).await?;
        let items = FetchedItems::from_fetch(fetched, limit);
        if items.skipped > 0 {
            warn!(
                handle = %handle,
                skipped = items.skipped,
                "Skipped malformed message records"
            );
        }
        info!(
            handle = %handle,
            channel_id = items.info.id,
            messages = items.items.len(),
            "Fetched channel history"
        );
        Ok(items)
    }
}

/// Turn a handler outcome into the envelope, logging failures.
pub(crate) fn finish(operation: &str, outcome: Result<AnalysisResult, IntelError>) -> AnalysisResult {
    if let Err(e) = &outcome {
        warn!(operation, code = %e.code(), error = %e, "Analysis request failed");
    }
    outcome.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn limits_default_and_clamp() {
        assert_eq!(clamp_limit(None, DEFAULT_INTEL_LIMIT), 200);
        assert_eq!(clamp_limit(Some(0), DEFAULT_SCRAPE_LIMIT), 25);
        assert_eq!(clamp_limit(Some(50), DEFAULT_SCRAPE_LIMIT), 50);
        assert_eq!(clamp_limit(Some(5000), DEFAULT_INTEL_LIMIT), MAX_MESSAGES);
    }

    #[test]
    fn invite_links_fail_before_normalization() {
        let err = validate_target("https://t.me/+AbCdEf", "private").unwrap_err();
        assert_eq!(err.code(), ErrorCode::PrivateChannelUnsupported);
        assert_eq!(err.to_string(), "private");

        let err = validate_target("@ab", "private").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTarget);
        assert_eq!(err.status_hint(), 400);

        assert_eq!(validate_target("t.me/durov", "private").unwrap().as_str(), "durov");
    }
}
