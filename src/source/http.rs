// HTTP relay source.
//
// Talks to a relay service that holds the actual upstream session:
//   GET {base}/health
//   GET {base}/channels/{handle}
//   GET {base}/channels/{handle}/messages?limit=N
// Calls are paced locally. A 429 is surfaced immediately with the relay's
// Retry-After (seconds form only) and the pacer holds later calls until that
// delay has passed; nothing here retries.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::rate_limit::RequestPacer;
use super::{ChannelInfo, ChannelSource, FetchError};

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<serde_json::Value>,
}

pub struct HttpSource {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    pacer: RequestPacer,
}

impl HttpSource {
    pub fn new(base_url: &str, token: Option<String>, requests_per_second: f64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cinder/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        // A trailing slash makes `join` append instead of replacing the last
        // path segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .with_context(|| format!("Invalid channel source URL: {base_url}"))?;

        Ok(Self {
            client,
            base_url,
            token,
            pacer: RequestPacer::new(requests_per_second),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::Unavailable(format!("bad endpoint {path}: {e}")))
    }

    async fn get(&self, url: Url, handle: &str) -> Result<Response, FetchError> {
        self.pacer.acquire().await;
        debug!(url = %url, "Channel source request");

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        let checked = check_status(response, handle);
        if let Err(FetchError::RateLimited {
            retry_after: Some(pause),
        }) = &checked
        {
            debug!(pause_secs = pause.as_secs(), "Relay rate limited; pausing requests");
            self.pacer.back_off(*pause).await;
        }
        checked
    }
}

/// Parse a Retry-After header given in seconds. HTTP-date values are not
/// interpreted.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn check_status(response: Response, handle: &str) -> Result<Response, FetchError> {
    let status = response.status();
    match status {
        s if s.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(FetchError::NotFound(handle.to_string())),
        StatusCode::FORBIDDEN => Err(FetchError::Private),
        StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited {
            retry_after: retry_after(&response),
        }),
        other => Err(FetchError::Unavailable(format!(
            "channel source returned {other}"
        ))),
    }
}

#[async_trait]
impl ChannelSource for HttpSource {
    async fn health_check(&self) -> Result<(), FetchError> {
        let url = self.endpoint("health")?;
        match self.get(url, "").await {
            Ok(_) => Ok(()),
            Err(e @ FetchError::RateLimited { .. }) => Err(e),
            Err(e) => Err(FetchError::Unavailable(format!("health check failed: {e}"))),
        }
    }

    async fn resolve(&self, handle: &str) -> Result<ChannelInfo, FetchError> {
        let url = self.endpoint(&format!("channels/{handle}"))?;
        self.get(url, handle)
            .await?
            .json::<ChannelInfo>()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))
    }

    async fn fetch_history(
        &self,
        channel: &ChannelInfo,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, FetchError> {
        let handle = channel
            .username
            .clone()
            .unwrap_or_else(|| channel.id.to_string());
        let mut url = self.endpoint(&format!("channels/{handle}/messages"))?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let body = self
            .get(url, &handle)
            .await?
            .json::<HistoryResponse>()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;
        Ok(body.messages)
    }
}
