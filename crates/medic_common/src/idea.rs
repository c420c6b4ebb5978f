//! Diagnostic ideas and their judgements.

use crate::command::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Confidence assigned when nothing better is known
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// A structured diagnostic hypothesis with checks, fixes and a risk rating.
///
/// Immutable after construction except for `evidence`, which probing fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    #[serde(default = "new_idea_id")]
    pub id: String,
    pub hypothesis: String,
    pub category: String,
    pub why: String,
    /// Read-only diagnostic commands, in the order they should run
    #[serde(default)]
    pub checks: Vec<String>,
    #[serde(default)]
    pub fixes: Vec<String>,
    #[serde(default)]
    pub risk: RiskLevel,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Probe results keyed by the check string that produced them
    #[serde(default)]
    pub evidence: BTreeMap<String, ProbeEvidence>,
}

/// Opaque short id for an idea
pub fn new_idea_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

impl Idea {
    /// Build an idea with the programmatic defaults: low risk, confidence 0.5,
    /// no checks, fixes, or evidence.
    pub fn new(
        hypothesis: impl Into<String>,
        category: impl Into<String>,
        why: impl Into<String>,
    ) -> Self {
        Self {
            id: new_idea_id(),
            hypothesis: hypothesis.into(),
            category: category.into(),
            why: why.into(),
            checks: Vec::new(),
            fixes: Vec::new(),
            risk: RiskLevel::default(),
            confidence: DEFAULT_CONFIDENCE,
            evidence: BTreeMap::new(),
        }
    }

    pub fn with_checks<I, S>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checks = checks.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fixes<I, S>(mut self, fixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fixes = fixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = risk;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Attach a probe result for one of this idea's checks
    pub fn attach_evidence(&mut self, check: impl Into<String>, evidence: ProbeEvidence) {
        self.evidence.insert(check.into(), evidence);
    }
}

/// Result of probing a single check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeEvidence {
    Output {
        stdout: String,
        stderr: String,
        returncode: i32,
    },
    Error {
        error: String,
    },
}

impl ProbeEvidence {
    pub fn is_error(&self) -> bool {
        matches!(self, ProbeEvidence::Error { .. })
    }
}

/// Per-criterion scores, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdeaScores {
    pub safety: f64,
    pub success_likelihood: f64,
    pub cost: f64,
    pub determinism: f64,
}

/// One entry of the judge's ranked output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgedIdea {
    pub idea: Idea,
    pub scores: IdeaScores,
    pub total_score: f64,
    pub rationale: String,
}
