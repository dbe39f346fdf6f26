// Content classification: keyword and hashtag frequencies, mentions, risk
// vocabulary, link domains and language distribution.

pub mod keywords;
pub mod language;
pub mod links;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::message::ContentItem;

use self::keywords::{KeywordHit, WordCount, TOP_TERMS};
use self::language::{LanguageDetector, LanguageDistribution};
use self::links::DomainCount;

/// Items fed to the language detector, to bound its cost.
pub const LANGUAGE_SAMPLE_ITEMS: usize = 100;

/// A hashtag or mention surfaced for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub count: usize,
}

/// Classifier output for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub top_keywords: Vec<WordCount>,
    pub top_hashtags: Vec<WordCount>,
    /// Distinct mention tokens, sorted.
    pub mentions: Vec<String>,
    /// Empty when detection is unavailable.
    pub language_distribution: LanguageDistribution,
    /// Every risk keyword found, most frequent first.
    pub risk_keyword_hits: Vec<KeywordHit>,
    /// Every outbound link host, most frequent first.
    pub domains: Vec<DomainCount>,
}

impl Classification {
    pub fn total_links(&self) -> usize {
        self.domains.iter().map(|d| d.count).sum()
    }

    pub fn distinct_risk_keywords(&self) -> usize {
        self.risk_keyword_hits.len()
    }

    /// Hashtags (with counts) followed by mentions (count 1 each).
    pub fn named_entities(&self) -> Vec<NamedEntity> {
        let hashtags = self.top_hashtags.iter().map(|h| NamedEntity {
            text: h.word.clone(),
            kind: "HASHTAG".to_string(),
            count: h.count,
        });
        let mentions = self.mentions.iter().map(|m| NamedEntity {
            text: m.clone(),
            kind: "MENTION".to_string(),
            count: 1,
        });
        hashtags.chain(mentions).collect()
    }

    /// JSON shape of the `content_classification` artifact.
    pub fn content_json(&self) -> serde_json::Value {
        serde_json::json!({
            "top_keywords": self.top_keywords,
            "language_distribution": self.language_distribution,
            "named_entities": self.named_entities(),
        })
    }
}

/// Classify a batch of items.
///
/// Language detection runs over the first `LANGUAGE_SAMPLE_ITEMS` texts;
/// a detector error just leaves the distribution empty.
pub fn classify(items: &[ContentItem], detector: &dyn LanguageDetector) -> Classification {
    let texts = || items.iter().map(|i| i.text.as_str());

    let mentions: BTreeSet<String> = items
        .iter()
        .flat_map(|i| i.mentions.iter().cloned())
        .collect();

    let language_distribution = if items.is_empty() {
        LanguageDistribution::new()
    } else {
        let sample = texts()
            .take(LANGUAGE_SAMPLE_ITEMS)
            .collect::<Vec<_>>()
            .join(" ");
        detector.detect(&sample).unwrap_or_else(|reason| {
            debug!(reason = %reason, "Language detection unavailable");
            LanguageDistribution::new()
        })
    };

    Classification {
        top_keywords: keywords::top_keywords(texts(), TOP_TERMS),
        top_hashtags: keywords::top_hashtags(texts(), TOP_TERMS),
        mentions: mentions.into_iter().collect(),
        language_distribution,
        risk_keyword_hits: keywords::risk_keyword_hits(texts()),
        domains: links::count_domains(
            items
                .iter()
                .flat_map(|i| i.link_entities.iter().map(String::as_str)),
        ),
    }
}
