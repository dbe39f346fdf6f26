// Message ingestion: raw upstream records -> typed content items.
//
// Upstream records are loosely shaped JSON. Each one is decoded on its own so
// a single malformed record is skipped and counted instead of failing the
// run. Entity annotations are resolved here, once, into a closed enum.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::output::truncate_chars;

/// Max characters of message text kept in per-message records.
pub const SNIPPET_CHARS: usize = 500;

/// A raw message record as delivered by a channel source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawMessage {
    pub id: Option<i64>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: Option<String>,
    /// Entities that fail to decode become `RawEntity::Other`; they never
    /// sink the message.
    #[serde(default, deserialize_with = "lenient_entities")]
    pub entities: Option<Vec<RawEntity>>,
    #[serde(default)]
    pub fwd_from: Option<RawForward>,
    #[serde(default)]
    pub media: Option<RawMedia>,
    #[serde(default)]
    pub views: Option<u64>,
}

/// Formatting entity attached to a message. Offsets are UTF-16 code units.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawEntity {
    Url {
        offset: usize,
        length: usize,
    },
    TextUrl {
        offset: usize,
        length: usize,
        url: String,
    },
    Mention {
        offset: usize,
        length: usize,
    },
    MentionName {
        offset: usize,
        length: usize,
        #[serde(default)]
        user_id: Option<i64>,
    },
    #[serde(other)]
    Other,
}

fn lenient_entities<'de, D>(deserializer: D) -> Result<Option<Vec<RawEntity>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(values.map(|values| {
        values
            .into_iter()
            .map(|value| {
                serde_json::from_value(value).unwrap_or_else(|e| {
                    debug!(error = %e, "Ignoring malformed message entity");
                    RawEntity::Other
                })
            })
            .collect()
    }))
}

/// Forward header. Only channel-origin forwards carry a source id.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawForward {
    #[serde(default)]
    pub channel_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawMedia {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// What an entity means for analysis, decided at ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityAnnotation {
    Link(String),
    Mention(String),
    Other,
}

impl EntityAnnotation {
    fn resolve(entity: &RawEntity, utf16: &[u16]) -> Self {
        match entity {
            RawEntity::Url { offset, length } => slice_utf16(utf16, *offset, *length)
                .map(EntityAnnotation::Link)
                .unwrap_or(EntityAnnotation::Other),
            RawEntity::TextUrl { url, .. } if !url.is_empty() => {
                EntityAnnotation::Link(url.clone())
            }
            RawEntity::Mention { offset, length } | RawEntity::MentionName { offset, length, .. } => {
                slice_utf16(utf16, *offset, *length)
                    .map(EntityAnnotation::Mention)
                    .unwrap_or(EntityAnnotation::Other)
            }
            _ => EntityAnnotation::Other,
        }
    }
}

/// Slice text by UTF-16 offsets. `None` for empty, out-of-range, or
/// surrogate-splitting ranges.
fn slice_utf16(units: &[u16], offset: usize, length: usize) -> Option<String> {
    let end = offset.checked_add(length)?;
    if length == 0 || end > units.len() {
        return None;
    }
    String::from_utf16(&units[offset..end]).ok()
}

/// One analyzable message.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub link_entities: Vec<String>,
    pub mentions: Vec<String>,
    pub is_forwarded: bool,
    pub forward_source_id: Option<String>,
    pub has_media: bool,
    pub media_type: Option<String>,
    pub view_count: Option<u64>,
}

impl ContentItem {
    /// A plain text item with no entities, forward header, or media.
    pub fn new(id: i64, timestamp: DateTime<Utc>, text: impl Into<String>) -> Self {
        Self {
            id,
            timestamp,
            text: text.into(),
            link_entities: Vec::new(),
            mentions: Vec::new(),
            is_forwarded: false,
            forward_source_id: None,
            has_media: false,
            media_type: None,
            view_count: None,
        }
    }

    /// Mark as forwarded, optionally from a known source channel.
    pub fn forwarded_from(mut self, source: Option<&str>) -> Self {
        self.is_forwarded = true;
        self.forward_source_id = source.map(str::to_string);
        self
    }

    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.link_entities.extend(links.into_iter().map(Into::into));
        self
    }

    pub fn with_mentions<I, S>(mut self, mentions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mentions.extend(mentions.into_iter().map(Into::into));
        self
    }

    /// Build from a decoded raw record. `None` when id or date is missing.
    pub fn from_raw(raw: RawMessage) -> Option<Self> {
        let id = raw.id?;
        let timestamp = raw.date?;
        let text = raw.message.unwrap_or_default();

        let utf16: Vec<u16> = text.encode_utf16().collect();
        let mut link_entities = Vec::new();
        let mut mentions = Vec::new();
        for entity in raw.entities.iter().flatten() {
            match EntityAnnotation::resolve(entity, &utf16) {
                EntityAnnotation::Link(url) => link_entities.push(url),
                EntityAnnotation::Mention(handle) => mentions.push(handle),
                EntityAnnotation::Other => {}
            }
        }

        let forward_source_id = raw
            .fwd_from
            .as_ref()
            .and_then(|f| f.channel_id)
            .map(|id| id.to_string());

        Some(Self {
            id,
            timestamp,
            text,
            link_entities,
            mentions,
            is_forwarded: raw.fwd_from.is_some(),
            forward_source_id,
            has_media: raw.media.is_some(),
            media_type: raw
                .media
                .and_then(|m| m.kind)
                .map(|k| k.to_lowercase()),
            view_count: raw.views,
        })
    }

    /// Per-message record for the `channel_messages` artifact.
    pub fn to_record(&self) -> MessageRecord {
        MessageRecord {
            message_id: self.id,
            timestamp: self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            text_snippet: truncate_chars(&self.text, SNIPPET_CHARS),
            link_entities: self.link_entities.clone(),
            has_media: self.has_media,
            media_type: self.media_type.clone(),
            is_forwarded: self.is_forwarded,
            forward_source: self.forward_source_id.clone(),
            mentions: self.mentions.clone(),
            views: self.view_count,
        }
    }
}

/// Serialized form of a content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub message_id: i64,
    pub timestamp: String,
    pub text_snippet: String,
    pub link_entities: Vec<String>,
    pub has_media: bool,
    pub media_type: Option<String>,
    pub is_forwarded: bool,
    pub forward_source: Option<String>,
    pub mentions: Vec<String>,
    pub views: Option<u64>,
}

/// Result of ingesting a raw batch.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub items: Vec<ContentItem>,
    /// Records that failed to decode or lacked an id/date.
    pub skipped: usize,
}

/// Decode a batch of raw JSON records, skipping (and counting) bad ones.
pub fn ingest(raw: &[serde_json::Value]) -> Ingested {
    let mut out = Ingested::default();
    for (index, value) in raw.iter().enumerate() {
        let item = serde_json::from_value::<RawMessage>(value.clone())
            .map_err(|e| e.to_string())
            .and_then(|r| ContentItem::from_raw(r).ok_or_else(|| "missing id or date".into()));
        match item {
            Ok(item) => out.items.push(item),
            Err(reason) => {
                debug!(index, reason = %reason, "Skipping malformed message record");
                out.skipped += 1;
            }
        }
    }
    out
}
