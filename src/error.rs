// Error taxonomy for analysis requests.
//
// Every failure that crosses the pipeline boundary is one of these variants.
// Each maps to a stable string code and a suggested transport status so the
// calling service can forward it without inspecting the message text.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::FetchError;

/// Stable error codes exposed in `AnalysisResult.error.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PrivateChannelUnsupported,
    InvalidTarget,
    TierInsufficient,
    RateLimited,
    LookupFailed,
    UpstreamTimeout,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::PrivateChannelUnsupported => "PRIVATE_CHANNEL_UNSUPPORTED",
            ErrorCode::InvalidTarget => "INVALID_TARGET",
            ErrorCode::TierInsufficient => "TIER_INSUFFICIENT",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::LookupFailed => "LOOKUP_FAILED",
            ErrorCode::UpstreamTimeout => "UPSTREAM_TIMEOUT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request-level failure. Input errors are raised before any fetch;
/// upstream errors come from the channel source.
#[derive(Debug, Error)]
pub enum IntelError {
    #[error("{0}")]
    PrivateChannel(String),

    /// Target could not be normalized into a handle (400).
    #[error("Could not normalize target: {0}")]
    InvalidTarget(String),

    /// Target resolved to something that isn't a channel (a user, say).
    #[error("Target '{0}' is not a channel/supergroup.")]
    NotAChannel(String),

    /// Target normalized fine but the upstream has no such channel (404).
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    TierInsufficient(String),

    #[error("Rate limited by upstream source")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Lookup failed: {0}")]
    LookupFailed(String),

    #[error("Upstream fetch exceeded {}s deadline", .0.as_secs())]
    Timeout(Duration),
}

impl IntelError {
    pub fn code(&self) -> ErrorCode {
        match self {
            IntelError::PrivateChannel(_) => ErrorCode::PrivateChannelUnsupported,
            IntelError::InvalidTarget(_) | IntelError::NotAChannel(_) | IntelError::NotFound(_) => {
                ErrorCode::InvalidTarget
            }
            IntelError::TierInsufficient(_) => ErrorCode::TierInsufficient,
            IntelError::RateLimited { .. } => ErrorCode::RateLimited,
            IntelError::LookupFailed(_) => ErrorCode::LookupFailed,
            IntelError::Timeout(_) => ErrorCode::UpstreamTimeout,
        }
    }

    /// Suggested HTTP status for the transport layer.
    pub fn status_hint(&self) -> u16 {
        match self {
            IntelError::PrivateChannel(_) | IntelError::TierInsufficient(_) => 403,
            IntelError::InvalidTarget(_) | IntelError::NotAChannel(_) => 400,
            IntelError::NotFound(_) => 404,
            IntelError::RateLimited { .. } => 429,
            IntelError::LookupFailed(_) => 500,
            IntelError::Timeout(_) => 504,
        }
    }

    /// The upstream-provided retry delay, if any. Never synthesized.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            IntelError::RateLimited { retry_after } => retry_after.map(|d| d.as_secs()),
            _ => None,
        }
    }
}

impl From<FetchError> for IntelError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound(handle) => {
                IntelError::NotFound(format!("Channel not found: {handle}"))
            }
            FetchError::Private => {
                IntelError::PrivateChannel("This appears to be a private channel.".to_string())
            }
            FetchError::RateLimited { retry_after } => IntelError::RateLimited { retry_after },
            FetchError::Timeout(deadline) => IntelError::Timeout(deadline),
            other => IntelError::LookupFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::PrivateChannelUnsupported).unwrap();
        assert_eq!(json, "\"PRIVATE_CHANNEL_UNSUPPORTED\"");
        assert_eq!(ErrorCode::UpstreamTimeout.to_string(), "UPSTREAM_TIMEOUT");
    }

    #[test]
    fn invalid_and_not_found_share_code_but_not_status() {
        let invalid = IntelError::InvalidTarget("x".into());
        let missing = IntelError::NotFound("Channel not found: abcd".into());
        assert_eq!(invalid.code(), missing.code());
        assert_eq!(invalid.status_hint(), 400);
        assert_eq!(missing.status_hint(), 404);
    }

    #[test]
    fn rate_limit_delay_passes_through() {
        let err: IntelError = FetchError::RateLimited {
            retry_after: Some(Duration::from_secs(37)),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::RateLimited);
        assert_eq!(err.status_hint(), 429);
        assert_eq!(err.retry_after_secs(), Some(37));

        let no_hint: IntelError = FetchError::RateLimited { retry_after: None }.into();
        assert_eq!(no_hint.retry_after_secs(), None);
    }
}
