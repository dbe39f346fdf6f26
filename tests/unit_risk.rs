// Unit tests for the risk scorer.
//
// Score bounds, monotonicity in each input, flag thresholds, and the
// keyword classifier feeding the scorer.

use cinder::classify::keywords::{risk_keyword_hits, KeywordHit};
use cinder::scoring::risk::{
    assess, compute_risk_score, forward_ratio_pct, FlagSeverity, FlagType, RiskInputs, MAX_SCORE,
};

// ============================================================
// Bounds and monotonicity
// ============================================================

#[test]
fn score_never_exceeds_ceiling() {
    for ratio in [0.0, 41.0, 71.0, 100.0] {
        for keywords in [0, 1, 3, 6, 19] {
            for links in [0, 21, 51, 10_000] {
                for bursts in [0, 4, 100] {
                    let score = compute_risk_score(ratio, keywords, links, bursts);
                    assert!(score <= MAX_SCORE);
                }
            }
        }
    }
}

#[test]
fn score_is_monotone_in_each_input() {
    let ratios = [0.0, 10.0, 40.0, 40.1, 55.0, 70.0, 70.1, 99.9];
    for pair in ratios.windows(2) {
        assert!(compute_risk_score(pair[0], 2, 10, 1) <= compute_risk_score(pair[1], 2, 10, 1));
    }
    for k in 0..20 {
        assert!(compute_risk_score(50.0, k, 10, 1) <= compute_risk_score(50.0, k + 1, 10, 1));
    }
    for links in 0..80 {
        assert!(compute_risk_score(50.0, 2, links, 1) <= compute_risk_score(50.0, 2, links + 1, 1));
    }
    for bursts in 0..8 {
        assert!(compute_risk_score(50.0, 2, 10, bursts) <= compute_risk_score(50.0, 2, 10, bursts + 1));
    }
}

#[test]
fn maximal_channel_scores_seventy_five() {
    assert_eq!(compute_risk_score(100.0, 19, 1000, 50), 75);
}

// ============================================================
// Forward ratio
// ============================================================

#[test]
fn forward_ratio_rounds_to_one_decimal() {
    assert_eq!(forward_ratio_pct(2, 3), 66.7);
    assert_eq!(forward_ratio_pct(80, 100), 80.0);
    assert_eq!(forward_ratio_pct(0, 0), 0.0);
}

// ============================================================
// assess: score + flags together
// ============================================================

#[test]
fn forwarded_malware_channel() {
    let assessment = assess(&RiskInputs {
        total_messages: 100,
        forwarded: 80,
        total_links: 0,
        burst_count: 0,
        keyword_hits: vec![KeywordHit {
            keyword: "malware".into(),
            count: 3,
        }],
    });
    assert_eq!(assessment.forward_ratio_pct, 80.0);
    assert_eq!(assessment.score, 25);

    let forward_flag = assessment
        .flags
        .iter()
        .find(|f| f.flag_type == FlagType::HighForwardRatio)
        .unwrap();
    assert_eq!(forward_flag.severity, FlagSeverity::Low);
    assert_eq!(forward_flag.detail, "80.0% forwarded content");

    let keyword_flag = assessment
        .flags
        .iter()
        .find(|f| f.flag_type == FlagType::HighRiskKeywords)
        .unwrap();
    assert_eq!(keyword_flag.detail, "Found: malware");
}

#[test]
fn quiet_channel_has_no_flags() {
    let assessment = assess(&RiskInputs {
        total_messages: 40,
        forwarded: 4,
        total_links: 12,
        burst_count: 1,
        keyword_hits: Vec::new(),
    });
    assert_eq!(assessment.score, 0);
    assert!(assessment.flags.is_empty());
}

#[test]
fn flags_serialize_with_type_key() {
    let assessment = assess(&RiskInputs {
        total_messages: 10,
        forwarded: 0,
        total_links: 31,
        burst_count: 0,
        keyword_hits: Vec::new(),
    });
    let json = serde_json::to_value(&assessment.flags).unwrap();
    assert_eq!(json[0]["type"], "high_link_density");
    assert_eq!(json[0]["severity"], "low");
    assert_eq!(json[0]["detail"], "31 links in 10 messages");
}

// ============================================================
// Keyword hits feeding the scorer
// ============================================================

#[test]
fn distinct_keywords_drive_the_keyword_band() {
    let texts = [
        "fresh fullz and carding tutorials",
        "new stealer logs, botnet rental",
        "ransomware affiliate program",
        "ddos for hire",
    ];
    let hits = risk_keyword_hits(texts);
    assert_eq!(hits.len(), 6);
    assert_eq!(compute_risk_score(0.0, hits.len(), 0, 0), 30);
}

#[test]
fn embedded_terms_reach_the_middle_keyword_band() {
    let hits = risk_keyword_hits([
        "great exchange rate today, separate lifehack thread",
        "datadump posted",
    ]);
    let found: Vec<&str> = hits.iter().map(|h| h.keyword.as_str()).collect();
    assert_eq!(found, vec!["dump", "hack", "rat"]);
    assert_eq!(compute_risk_score(0.0, hits.len(), 0, 0), 15);

    let assessment = assess(&RiskInputs {
        total_messages: 2,
        forwarded: 0,
        total_links: 0,
        burst_count: 0,
        keyword_hits: hits,
    });
    assert_eq!(assessment.flags.len(), 1);
    assert_eq!(assessment.flags[0].flag_type, FlagType::HighRiskKeywords);
    assert_eq!(assessment.flags[0].detail, "Found: dump, hack, rat");
}
