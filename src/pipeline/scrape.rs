// Channel scrape: public profile, recent messages and linked channels.
// Available on every tier.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::classify::language::{top_language, LanguageDetector};
use crate::classify::links::{count_domains, DomainCount};
use crate::error::IntelError;
use crate::message::ContentItem;
use crate::report::{AnalysisRequest, AnalysisResult, Finding, Severity};
use crate::source::{ChannelInfo, ChannelKind, ChannelSource};
use crate::target::{extract_linked_handles, TargetHandle};

use super::{
    channel_metadata, clamp_limit, finish, rfc3339, validate_target, Analyzer,
    DEFAULT_SCRAPE_LIMIT,
};

pub const FINDING_KIND: &str = "channel_profile";

const TOP_DOMAINS: usize = 10;
const FINDING_DOMAINS: usize = 5;

/// A channel linked from the target's messages or description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedChannel {
    pub username: String,
    pub url: String,
    pub source: String,
}

impl LinkedChannel {
    fn from_message_link(handle: &str) -> Self {
        Self {
            username: handle.to_string(),
            url: format!("https://t.me/{handle}"),
            source: "message_link".to_string(),
        }
    }
}

/// Linked handles across message text, link entities and the description,
/// minus the channel itself. Sorted.
pub fn linked_channels(
    items: &[ContentItem],
    description: &str,
    handle: &TargetHandle,
    username: Option<&str>,
) -> Vec<LinkedChannel> {
    let mut handles: BTreeSet<String> = extract_linked_handles(description);
    for item in items {
        handles.extend(extract_linked_handles(&item.text));
        for link in &item.link_entities {
            handles.extend(extract_linked_handles(link));
        }
    }

    handles.remove(&handle.key());
    if let Some(username) = username {
        handles.remove(&username.to_lowercase());
    }

    handles
        .iter()
        .map(|h| LinkedChannel::from_message_link(h))
        .collect()
}

fn language_guess(items: &[ContentItem], detector: &dyn LanguageDetector) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let corpus = items
        .iter()
        .map(|i| i.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    detector
        .detect(&corpus)
        .ok()
        .and_then(|dist| top_language(&dist))
}

/// Broadcast channels and megagroups only.
fn accept_scrape_target(channel: &ChannelInfo, handle: &str) -> Result<(), IntelError> {
    if channel.kind.is_channel() {
        return Ok(());
    }
    match channel.kind {
        ChannelKind::User => Err(IntelError::NotAChannel(handle.to_string())),
        _ => Err(IntelError::PrivateChannel(
            "Target is not a public channel or supergroup.".to_string(),
        )),
    }
}

impl<S: ChannelSource> Analyzer<S> {
    /// Profile scrape of a public channel.
    pub async fn channel_scrape(&self, request: &AnalysisRequest) -> AnalysisResult {
        finish(FINDING_KIND, self.run_channel_scrape(request).await)
    }

    async fn run_channel_scrape(&self, request: &AnalysisRequest) -> Result<AnalysisResult, IntelError> {
        let handle = validate_target(
            &request.target,
            "Private channels and invite links are not supported. Public channels only.",
        )?;
        let limit = clamp_limit(request.message_limit, DEFAULT_SCRAPE_LIMIT);
        info!(handle = %handle, limit, "Running channel scrape");

        let target = handle.to_string();
        let fetched = self
            .fetch_items(&handle, limit, move |channel| {
                accept_scrape_target(channel, &target)
            })
            .await?;

        let description = fetched.info.description.clone().unwrap_or_default();
        let linked = linked_channels(
            &fetched.items,
            &description,
            &handle,
            fetched.info.username.as_deref(),
        );
        let domains: Vec<DomainCount> = count_domains(
            fetched
                .items
                .iter()
                .flat_map(|i| i.link_entities.iter().map(String::as_str)),
        )
        .into_iter()
        .take(TOP_DOMAINS)
        .collect();
        let language = language_guess(&fetched.items, self.detector());
        let last_post = fetched.latest_timestamp();

        let metadata = channel_metadata(&fetched.info, &handle, last_post, language.clone());
        let records: Vec<_> = fetched.items.iter().map(ContentItem::to_record).collect();

        let evidence = json!({
            "title": metadata["title"],
            "username": metadata["username"],
            "subscribers": fetched.info.subscriber_count,
            "message_count": records.len(),
            "last_post_ts": last_post.as_ref().map(rfc3339),
            "linked_channel_count": linked.len(),
            "top_domains": domains.iter().take(FINDING_DOMAINS).collect::<Vec<_>>(),
            "language_guess": language,
            "skipped_items": fetched.skipped,
        });
        let evidence = match evidence {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        info!(
            handle = %handle,
            messages = records.len(),
            linked_channels = linked.len(),
            "Channel scrape complete"
        );

        let mut artifacts = Map::new();
        artifacts.insert("channel_metadata".into(), metadata);
        artifacts.insert("channel_messages".into(), json!(records));
        artifacts.insert("linked_channels".into(), json!(linked));

        Ok(AnalysisResult::success(
            vec![Finding::new(FINDING_KIND, Severity::Info, evidence)],
            artifacts,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn linked_channels_exclude_self_and_dedupe() {
        let handle = TargetHandle::parse("@MyChannel").unwrap();
        let now = Utc::now();
        let items = vec![
            ContentItem::new(1, now, "t.me/partner_one and https://t.me/MyChannel/12"),
            ContentItem::new(2, now, "again t.me/Partner_One").with_links(["https://t.me/from_entity"]),
        ];
        let linked = linked_channels(&items, "mirror: t.me/backup_chan", &handle, Some("mychannel"));
        let names: Vec<&str> = linked.iter().map(|l| l.username.as_str()).collect();
        assert_eq!(names, vec!["backup_chan", "from_entity", "partner_one"]);
        assert_eq!(linked[0].url, "https://t.me/backup_chan");
        assert_eq!(linked[0].source, "message_link");
    }

    #[test]
    fn only_public_channel_kinds_are_scraped() {
        let mut info = ChannelInfo {
            kind: ChannelKind::Megagroup,
            ..Default::default()
        };
        assert!(accept_scrape_target(&info, "somegroup").is_ok());

        info.kind = ChannelKind::User;
        let err = accept_scrape_target(&info, "someuser").unwrap_err();
        assert_eq!(err.to_string(), "Target 'someuser' is not a channel/supergroup.");

        info.kind = ChannelKind::Other;
        assert_eq!(
            accept_scrape_target(&info, "somechat").unwrap_err().status_hint(),
            403
        );
    }
}
