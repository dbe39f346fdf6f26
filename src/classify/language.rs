// Language identification: optional, best-effort capability.
//
// The classifier only sees the `LanguageDetector` trait. When no detector is
// configured, or detection fails, the language distribution is simply empty;
// the rest of the output keeps its shape.

use std::collections::{BTreeMap, HashSet};

use stop_words::{get, LANGUAGE};
use thiserror::Error;

/// Language code -> confidence in [0, 1].
pub type LanguageDistribution = BTreeMap<String, f64>;

/// Why no distribution could be produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LanguageUnavailable {
    #[error("no language detector configured")]
    NotConfigured,
    #[error("not enough text to identify a language")]
    InsufficientText,
}

/// Trait for language identification over a text sample.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Result<LanguageDistribution, LanguageUnavailable>;
}

/// Detector used when language identification is switched off.
pub struct NoopDetector;

impl LanguageDetector for NoopDetector {
    fn detect(&self, _text: &str) -> Result<LanguageDistribution, LanguageUnavailable> {
        Err(LanguageUnavailable::NotConfigured)
    }
}

/// Stop-word frequency identifier.
///
/// Every language's stop-word list is matched against the sample's tokens;
/// each language's share of all matches becomes its confidence. Crude, but
/// local and dependency-light, which is all the channel overview needs.
pub struct StopWordDetector {
    languages: Vec<(&'static str, HashSet<String>)>,
    /// Samples with fewer tokens than this are rejected.
    pub min_tokens: usize,
    /// Languages below this share are dropped before renormalizing.
    pub min_share: f64,
}

impl Default for StopWordDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl StopWordDetector {
    pub fn new() -> Self {
        let catalog = [
            ("en", LANGUAGE::English),
            ("ru", LANGUAGE::Russian),
            ("uk", LANGUAGE::Ukrainian),
            ("es", LANGUAGE::Spanish),
            ("pt", LANGUAGE::Portuguese),
            ("de", LANGUAGE::German),
            ("fr", LANGUAGE::French),
            ("it", LANGUAGE::Italian),
            ("tr", LANGUAGE::Turkish),
            ("ar", LANGUAGE::Arabic),
            ("fa", LANGUAGE::Persian),
        ];
        let languages = catalog
            .into_iter()
            .map(|(code, lang)| {
                let words: Vec<String> = get(lang);
                (code, words.into_iter().collect::<HashSet<String>>())
            })
            .collect();

        Self {
            languages,
            min_tokens: 3,
            min_share: 0.05,
        }
    }
}

impl LanguageDetector for StopWordDetector {
    fn detect(&self, text: &str) -> Result<LanguageDistribution, LanguageUnavailable> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphabetic())
            .filter(|t| t.chars().count() >= 2)
            .collect();
        if tokens.len() < self.min_tokens {
            return Err(LanguageUnavailable::InsufficientText);
        }

        let hits: Vec<(&str, usize)> = self
            .languages
            .iter()
            .map(|(code, words)| (*code, tokens.iter().filter(|t| words.contains(**t)).count()))
            .filter(|(_, n)| *n > 0)
            .collect();
        let total: usize = hits.iter().map(|(_, n)| n).sum();
        if total == 0 {
            return Err(LanguageUnavailable::InsufficientText);
        }

        let kept: Vec<(&str, f64)> = hits
            .into_iter()
            .map(|(code, n)| (code, n as f64 / total as f64))
            .filter(|(_, share)| *share >= self.min_share)
            .collect();
        let kept_total: f64 = kept.iter().map(|(_, s)| s).sum();

        Ok(kept
            .into_iter()
            .map(|(code, share)| {
                let confidence = ((share / kept_total) * 1000.0).round() / 1000.0;
                (code.to_string(), confidence)
            })
            .collect())
    }
}

/// The highest-confidence language, if any.
pub fn top_language(dist: &LanguageDistribution) -> Option<String> {
    dist.iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(code, _)| code.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_is_unavailable() {
        assert_eq!(
            NoopDetector.detect("anything at all"),
            Err(LanguageUnavailable::NotConfigured)
        );
    }

    #[test]
    fn english_sample_ranks_english_first() {
        let detector = StopWordDetector::new();
        let dist = detector
            .detect("We were there when they said that it would be over before the end of the week")
            .unwrap();
        assert_eq!(top_language(&dist).as_deref(), Some("en"));
        let sum: f64 = dist.values().sum();
        assert!((sum - 1.0).abs() < 0.01, "confidences sum to {sum}");
    }

    #[test]
    fn russian_sample_ranks_russian_first() {
        let detector = StopWordDetector::new();
        let dist = detector
            .detect("Это был самый лучший день, и мы были там все вместе, когда он сказал что")
            .unwrap();
        assert_eq!(top_language(&dist).as_deref(), Some("ru"));
    }

    #[test]
    fn tiny_or_symbolic_samples_are_rejected() {
        let detector = StopWordDetector::new();
        assert_eq!(detector.detect("ok"), Err(LanguageUnavailable::InsufficientText));
        assert_eq!(
            detector.detect("12345 !!! ??? 🚀🚀🚀"),
            Err(LanguageUnavailable::InsufficientText)
        );
    }
}
