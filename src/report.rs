// Request and result envelope shared by every analysis entry point.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorCode, IntelError};

/// Provider tag stamped on every finding.
pub const PROVIDER: &str = "telegram";

/// Subscription tier of the caller. Absent means `Free`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Business,
    Enterprise,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Business => "business",
            Tier::Enterprise => "enterprise",
        }
    }

    pub fn is_paid(&self) -> bool {
        *self != Tier::Free
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub target: String,
    #[serde(default)]
    pub message_limit: Option<u32>,
    #[serde(default)]
    pub tier: Option<Tier>,
}

impl AnalysisRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            message_limit: None,
            tier: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.message_limit = Some(limit);
        self
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn effective_tier(&self) -> Tier {
        self.tier.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: String,
    pub provider: String,
    pub severity: Severity,
    pub evidence: Map<String, Value>,
}

impl Finding {
    pub fn new(kind: &str, severity: Severity, evidence: Map<String, Value>) -> Self {
        Self {
            kind: kind.to_string(),
            provider: PROVIDER.to_string(),
            severity,
            evidence,
        }
    }
}

/// Wire form of a request-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    pub http_status_hint: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl From<&IntelError> for ErrorBody {
    fn from(err: &IntelError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            http_status_hint: err.status_hint(),
            retry_after_secs: err.retry_after_secs(),
        }
    }
}

/// The uniform result of an analysis call.
///
/// `ok == false` always carries an `error` and no findings or artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ok: bool,
    pub findings: Vec<Finding>,
    pub artifacts: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl AnalysisResult {
    pub fn success(findings: Vec<Finding>, artifacts: Map<String, Value>) -> Self {
        Self {
            ok: true,
            findings,
            artifacts,
            error: None,
        }
    }

    pub fn failure(err: &IntelError) -> Self {
        Self {
            ok: false,
            findings: Vec::new(),
            artifacts: Map::new(),
            error: Some(err.into()),
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }

    pub fn artifact(&self, name: &str) -> Option<&Value> {
        self.artifacts.get(name)
    }

    pub fn finding(&self, kind: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.kind == kind)
    }
}

impl From<Result<AnalysisResult, IntelError>> for AnalysisResult {
    fn from(outcome: Result<AnalysisResult, IntelError>) -> Self {
        outcome.unwrap_or_else(|err| AnalysisResult::failure(&err))
    }
}
