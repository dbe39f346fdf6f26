// Frequency extraction: keywords, hashtags and risk-term hits.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// How many keywords / hashtags to report.
pub const TOP_TERMS: usize = 20;

/// How many risk keywords to report in the indicators artifact.
pub const TOP_RISK_HITS: usize = 10;

/// Words excluded from keyword ranking. Deliberately small and fixed:
/// keyword output is compared across runs, so it must not drift with a
/// third-party list.
pub const STOP_WORDS: &[&str] = &[
    "this", "that", "with", "from", "your", "have", "been", "they", "will", "would", "could",
    "should", "about", "which", "their", "there", "what", "when", "where", "more", "some",
    "than", "them", "very", "just", "also", "into", "only", "other", "then", "these", "http",
    "https", "t.me", "www",
];

/// Vocabulary associated with intrusion, fraud and malware trade.
pub const HIGH_RISK_KEYWORDS: &[&str] = &[
    "hack",
    "exploit",
    "ddos",
    "ransomware",
    "malware",
    "phishing",
    "carding",
    "fullz",
    "dump",
    "leak",
    "breach",
    "0day",
    "zero-day",
    "botnet",
    "rat",
    "trojan",
    "keylogger",
    "stealer",
    "crypter",
];

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z]{4,}").expect("word regex"));
static HASHTAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\w+").expect("hashtag regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordHit {
    pub keyword: String,
    pub count: usize,
}

/// Rank a counter by count descending, then term ascending.
fn ranked(counter: HashMap<String, usize>, limit: usize) -> Vec<WordCount> {
    let mut entries: Vec<(String, usize)> = counter.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
        .into_iter()
        .take(limit)
        .map(|(word, count)| WordCount { word, count })
        .collect()
}

/// Most frequent words of 4+ ASCII letters, case-folded, minus stop words.
pub fn top_keywords<'a>(texts: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<WordCount> {
    let mut counter: HashMap<String, usize> = HashMap::new();
    for text in texts {
        let lower = text.to_lowercase();
        for m in WORD_RE.find_iter(&lower) {
            let word = m.as_str();
            if STOP_WORDS.contains(&word) {
                continue;
            }
            *counter.entry(word.to_string()).or_insert(0) += 1;
        }
    }
    ranked(counter, limit)
}

/// Most frequent `#hashtags`, case preserved.
pub fn top_hashtags<'a>(texts: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<WordCount> {
    let mut counter: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for m in HASHTAG_RE.find_iter(text) {
            *counter.entry(m.as_str().to_string()).or_insert(0) += 1;
        }
    }
    ranked(counter, limit)
}

/// For each risk keyword, the number of texts that contain it.
///
/// Matching is a plain substring test on the lowercased text, so "rate"
/// counts as `rat` and "lifehack" as `hack`. A text counts once per keyword
/// however often the term repeats. Sorted by count descending, then keyword.
/// Keywords with no hits are omitted, so `len()` is the number of distinct
/// keywords found.
pub fn risk_keyword_hits<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<KeywordHit> {
    let mut counter: HashMap<&'static str, usize> = HashMap::new();
    for text in texts {
        let lower = text.to_lowercase();
        for term in HIGH_RISK_KEYWORDS.iter().filter(|t| lower.contains(**t)) {
            *counter.entry(*term).or_insert(0) += 1;
        }
    }

    let mut hits: Vec<KeywordHit> = counter
        .into_iter()
        .map(|(keyword, count)| KeywordHit {
            keyword: keyword.to_string(),
            count,
        })
        .collect();
    hits.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_skip_short_and_stop_words() {
        let texts = ["This channel posts Crypto crypto news", "crypto with news and a cat"];
        let top = top_keywords(texts, TOP_TERMS);
        assert_eq!(top[0], WordCount { word: "crypto".into(), count: 3 });
        assert_eq!(top[1], WordCount { word: "news".into(), count: 2 });
        assert!(top.iter().all(|w| w.word != "this" && w.word != "with" && w.word != "cat"));
    }

    #[test]
    fn keyword_ties_break_alphabetically() {
        let top = top_keywords(["zeta beta alpha"], 2);
        assert_eq!(top[0].word, "alpha");
        assert_eq!(top[1].word, "beta");
    }

    #[test]
    fn hashtags_keep_case_and_unicode() {
        let top = top_hashtags(["#News #news #Новости", "#News"], TOP_TERMS);
        assert_eq!(top[0], WordCount { word: "#News".into(), count: 2 });
        assert!(top.iter().any(|w| w.word == "#Новости"));
    }

    #[test]
    fn risk_hits_count_texts_not_occurrences() {
        let texts = ["malware malware malware", "new MALWARE builds", "nothing here"];
        let hits = risk_keyword_hits(texts);
        assert_eq!(hits, vec![KeywordHit { keyword: "malware".into(), count: 2 }]);
    }

    #[test]
    fn terms_match_inside_longer_words() {
        let hits = risk_keyword_hits([
            "great exchange rate today, separate lifehack thread",
            "datadump posted",
        ]);
        let found: Vec<(&str, usize)> = hits.iter().map(|h| (h.keyword.as_str(), h.count)).collect();
        assert_eq!(found, vec![("dump", 1), ("hack", 1), ("rat", 1)]);
    }

    #[test]
    fn hyphenated_and_numeric_terms_match() {
        let hits = risk_keyword_hits(["fresh ZERO-DAY for sale", "0day leaks"]);
        let found: Vec<&str> = hits.iter().map(|h| h.keyword.as_str()).collect();
        assert_eq!(found, vec!["0day", "leak", "zero-day"]);
    }
}
