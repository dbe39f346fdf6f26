// Composite channel risk score.
//
// Additive bands over four signals (forward ratio, distinct risk keywords,
// outbound links, burst count), clamped to 100. Flags use their own cut-offs
// and are emitted independently of the score bands; the two threshold sets
// are kept separate on purpose and must not be unified.

use serde::{Deserialize, Serialize};

use crate::classify::keywords::KeywordHit;
use crate::timeline::round_to;

pub const MAX_SCORE: u32 = 100;

/// Flag cut-offs (separate from the score bands).
const FLAG_FORWARD_RATIO_PCT: f64 = 50.0;
const FLAG_LINK_COUNT: usize = 30;
const FLAG_KEYWORDS_SHOWN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    HighForwardRatio,
    HighRiskKeywords,
    HighLinkDensity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFlag {
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    pub severity: FlagSeverity,
    pub detail: String,
}

/// Raw counts the scorer works from.
#[derive(Debug, Clone, Default)]
pub struct RiskInputs {
    pub total_messages: usize,
    pub forwarded: usize,
    pub total_links: usize,
    pub burst_count: usize,
    /// Keyword hits, most frequent first (as produced by the classifier).
    pub keyword_hits: Vec<KeywordHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u32,
    pub forward_ratio_pct: f64,
    pub flags: Vec<RiskFlag>,
}

/// Percentage of forwarded items, one decimal place.
pub fn forward_ratio_pct(forwarded: usize, total: usize) -> f64 {
    round_to(forwarded as f64 / total.max(1) as f64 * 100.0, 1)
}

/// The banded score, clamped to `MAX_SCORE`.
pub fn compute_risk_score(
    forward_ratio_pct: f64,
    distinct_keywords: usize,
    total_links: usize,
    burst_count: usize,
) -> u32 {
    let mut score = 0;

    if forward_ratio_pct > 70.0 {
        score += 20;
    } else if forward_ratio_pct > 40.0 {
        score += 10;
    }

    score += match distinct_keywords {
        0 => 0,
        1..=2 => 5,
        3..=5 => 15,
        _ => 30,
    };

    if total_links > 50 {
        score += 15;
    } else if total_links > 20 {
        score += 8;
    }

    if burst_count > 3 {
        score += 10;
    }

    score.min(MAX_SCORE)
}

/// Human-readable flags. Thresholds differ from the score bands.
pub fn risk_flags(
    forward_ratio_pct: f64,
    keyword_hits: &[KeywordHit],
    total_links: usize,
    total_messages: usize,
) -> Vec<RiskFlag> {
    let mut flags = Vec::new();

    if forward_ratio_pct > FLAG_FORWARD_RATIO_PCT {
        flags.push(RiskFlag {
            flag_type: FlagType::HighForwardRatio,
            severity: FlagSeverity::Low,
            detail: format!("{forward_ratio_pct:.1}% forwarded content"),
        });
    }

    if !keyword_hits.is_empty() {
        let top: Vec<&str> = keyword_hits
            .iter()
            .take(FLAG_KEYWORDS_SHOWN)
            .map(|h| h.keyword.as_str())
            .collect();
        flags.push(RiskFlag {
            flag_type: FlagType::HighRiskKeywords,
            severity: FlagSeverity::Medium,
            detail: format!("Found: {}", top.join(", ")),
        });
    }

    if total_links > FLAG_LINK_COUNT {
        flags.push(RiskFlag {
            flag_type: FlagType::HighLinkDensity,
            severity: FlagSeverity::Low,
            detail: format!("{total_links} links in {total_messages} messages"),
        });
    }

    flags
}

/// Score and flag a channel.
pub fn assess(inputs: &RiskInputs) -> RiskAssessment {
    let ratio = forward_ratio_pct(inputs.forwarded, inputs.total_messages);
    RiskAssessment {
        score: compute_risk_score(
            ratio,
            inputs.keyword_hits.len(),
            inputs.total_links,
            inputs.burst_count,
        ),
        forward_ratio_pct: ratio,
        flags: risk_flags(
            ratio,
            &inputs.keyword_hits,
            inputs.total_links,
            inputs.total_messages,
        ),
    }
}
