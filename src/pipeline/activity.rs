// Activity intelligence: cadence, content, risk and relationships for one
// channel. Paid tiers only.

use serde_json::{json, Map, Value};
use tracing::info;

use crate::classify::keywords::TOP_RISK_HITS;
use crate::classify::language::{top_language, LanguageDetector};
use crate::classify::{classify, Classification};
use crate::error::IntelError;
use crate::graph::{build_graph, GraphAnchor, RelationInputs, RelationshipGraph};
use crate::message::ContentItem;
use crate::report::{AnalysisRequest, AnalysisResult, Finding, Severity};
use crate::scoring::risk::{self, RiskAssessment, RiskInputs};
use crate::source::{ChannelKind, ChannelSource};
use crate::timeline::{self, Timeline};

use super::{channel_metadata, clamp_limit, finish, validate_target, Analyzer, DEFAULT_INTEL_LIMIT};

pub const FINDING_KIND: &str = "activity_intel";
pub const NO_MESSAGES: &str = "No messages found for analysis";

/// Link domains reported in `risk_indicators.domain_frequency`.
const TOP_DOMAINS: usize = 20;
/// Keywords echoed as `top_topics` in the finding.
const TOP_TOPICS: usize = 5;

/// Everything computed from one batch of items.
#[derive(Debug, Clone)]
pub struct ActivityReport {
    pub timeline: Timeline,
    pub classification: Classification,
    pub risk: RiskAssessment,
    pub graph: RelationshipGraph,
    pub total_forwarded: usize,
}

/// Pure analysis over already-fetched items.
///
/// Timeline and classification run independently over the same items; risk
/// combines both with raw counts; the graph only needs extracted relations.
pub fn analyze_activity(
    items: &[ContentItem],
    anchor: &GraphAnchor,
    description: &str,
    detector: &dyn LanguageDetector,
) -> ActivityReport {
    let timeline = timeline::analyze(items);
    let classification = classify(items, detector);
    let total_forwarded = items.iter().filter(|i| i.is_forwarded).count();

    let risk = risk::assess(&RiskInputs {
        total_messages: timeline.total_messages,
        forwarded: total_forwarded,
        total_links: classification.total_links(),
        burst_count: timeline.burst_periods.len(),
        keyword_hits: classification.risk_keyword_hits.clone(),
    });

    let relations = RelationInputs::collect(items, description);
    let graph = build_graph(anchor, &relations);

    ActivityReport {
        timeline,
        classification,
        risk,
        graph,
        total_forwarded,
    }
}

impl ActivityReport {
    /// The `activity_analysis` artifact.
    pub fn activity_json(&self) -> Value {
        json!({
            "posting_cadence": self.timeline.cadence_json(),
            "last_seen_active": self.timeline.last_seen_active.as_ref().map(super::rfc3339),
            "total_messages_analyzed": self.timeline.total_messages,
            "content_classification": self.classification.content_json(),
        })
    }

    /// The `risk_indicators` artifact.
    pub fn risk_json(&self) -> Value {
        let domains: Vec<_> = self.classification.domains.iter().take(TOP_DOMAINS).collect();
        let hits: Vec<_> = self
            .classification
            .risk_keyword_hits
            .iter()
            .take(TOP_RISK_HITS)
            .collect();
        json!({
            "overall_risk_score": self.risk.score,
            "forward_ratio_pct": self.risk.forward_ratio_pct,
            "total_forwarded": self.total_forwarded,
            "total_links": self.classification.total_links(),
            "domain_frequency": domains,
            "high_risk_keyword_hits": hits,
            "flags": self.risk.flags,
        })
    }

    pub fn finding(&self, skipped_items: usize) -> Finding {
        let top_topics: Vec<&str> = self
            .classification
            .top_keywords
            .iter()
            .take(TOP_TOPICS)
            .map(|k| k.word.as_str())
            .collect();
        let evidence = json!({
            "avg_posts_per_day": self.timeline.avg_posts_per_day,
            "risk_score": self.risk.score,
            "top_topics": top_topics,
            "entity_count": self.classification.named_entities().len(),
            "total_messages_analyzed": self.timeline.total_messages,
            "forward_ratio_pct": self.risk.forward_ratio_pct,
            "burst_count": self.timeline.burst_periods.len(),
            "node_count": self.graph.node_count(),
            "edge_count": self.graph.edge_count(),
            "skipped_items": skipped_items,
        });
        Finding::new(FINDING_KIND, Severity::Info, into_map(evidence))
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// The result for a channel with nothing to analyze.
pub fn no_messages_result() -> AnalysisResult {
    let mut evidence = Map::new();
    evidence.insert("message".into(), Value::from(NO_MESSAGES));
    AnalysisResult::success(
        vec![Finding::new(FINDING_KIND, Severity::Info, evidence)],
        Map::new(),
    )
}

impl<S: ChannelSource> Analyzer<S> {
    /// Full activity analysis of a public channel.
    pub async fn activity_intel(&self, request: &AnalysisRequest) -> AnalysisResult {
        finish(FINDING_KIND, self.run_activity_intel(request).await)
    }

    async fn run_activity_intel(&self, request: &AnalysisRequest) -> Result<AnalysisResult, IntelError> {
        if !request.effective_tier().is_paid() {
            return Err(IntelError::TierInsufficient(
                "activity_intel requires Pro tier or above.".to_string(),
            ));
        }

        let handle = validate_target(
            &request.target,
            "Private channels and invite links are not supported.",
        )?;
        let limit = clamp_limit(request.message_limit, DEFAULT_INTEL_LIMIT);
        info!(handle = %handle, limit, tier = request.effective_tier().as_str(), "Running activity intel");

        let not_channel = handle.to_string();
        let fetched = self
            .fetch_items(&handle, limit, move |channel| match channel.kind {
                ChannelKind::User => Err(IntelError::NotAChannel(not_channel)),
                _ => Ok(()),
            })
            .await?;

        if fetched.items.is_empty() {
            info!(handle = %handle, skipped = fetched.skipped, "No messages to analyze");
            return Ok(no_messages_result());
        }

        let anchor = GraphAnchor {
            handle: handle.to_string(),
            username: fetched.info.username.clone(),
            title: fetched.info.title.clone(),
            channel_id: Some(fetched.info.id),
        };
        let description = fetched.info.description.clone().unwrap_or_default();
        let report = analyze_activity(&fetched.items, &anchor, &description, self.detector());

        info!(
            handle = %handle,
            messages = report.timeline.total_messages,
            risk_score = report.risk.score,
            bursts = report.timeline.burst_periods.len(),
            "Activity intel complete"
        );

        let language_guess = top_language(&report.classification.language_distribution);
        let records: Vec<_> = fetched.items.iter().map(ContentItem::to_record).collect();

        let mut artifacts = Map::new();
        artifacts.insert(
            "channel_metadata".into(),
            channel_metadata(
                &fetched.info,
                &handle,
                fetched.latest_timestamp(),
                language_guess,
            ),
        );
        artifacts.insert("channel_messages".into(), json!(records));
        artifacts.insert("activity_analysis".into(), report.activity_json());
        artifacts.insert("risk_indicators".into(), report.risk_json());
        artifacts.insert("relationship_graph".into(), json!(report.graph));

        Ok(AnalysisResult::success(
            vec![report.finding(fetched.skipped)],
            artifacts,
        ))
    }
}
