use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::source::session::DEFAULT_FETCH_TIMEOUT;

/// Default pacing for the HTTP relay.
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 1.0;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy. Nothing here is required
/// for offline analysis of an export file; the relay URL is checked with
/// `require_source` before any network use.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the channel relay (CINDER_SOURCE_URL).
    pub source_url: Option<String>,
    /// Bearer token sent to the relay, if it wants one.
    pub source_token: Option<String>,
    /// Deadline for one resolve + fetch cycle.
    pub fetch_timeout: Duration,
    pub requests_per_second: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: None,
            source_token: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let fetch_timeout = match non_empty("CINDER_FETCH_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("CINDER_FETCH_TIMEOUT_SECS is not a number: {raw}"))?;
                if secs == 0 {
                    anyhow::bail!("CINDER_FETCH_TIMEOUT_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_FETCH_TIMEOUT,
        };

        let requests_per_second = match non_empty("CINDER_REQUESTS_PER_SECOND") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("CINDER_REQUESTS_PER_SECOND is not a number: {raw}"))?,
            None => DEFAULT_REQUESTS_PER_SECOND,
        };

        Ok(Self {
            source_url: non_empty("CINDER_SOURCE_URL"),
            source_token: non_empty("CINDER_SOURCE_TOKEN"),
            fetch_timeout,
            requests_per_second,
        })
    }

    /// Check that the channel relay is configured and return its URL.
    /// Call this before building an HTTP source.
    pub fn require_source(&self) -> Result<&str> {
        match self.source_url.as_deref() {
            Some(url) => Ok(url),
            None => anyhow::bail!(
                "CINDER_SOURCE_URL not set. Add it to your .env file,\n\
                 or pass --input FILE to analyze a saved channel export."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_source() {
        let config = Config::default();
        assert!(config.require_source().is_err());
        assert_eq!(config.fetch_timeout, Duration::from_secs(120));
    }

    #[test]
    fn require_source_returns_url() {
        let config = Config {
            source_url: Some("http://relay.local:8080".into()),
            ..Config::default()
        };
        assert_eq!(config.require_source().unwrap(), "http://relay.local:8080");
    }
}
