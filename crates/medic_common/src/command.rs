//! Command risk and execution result types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How safe a command (or an idea's fixes) is to run unattended.
///
/// Ordered so that `Low < Medium < High`; escalation only moves upward.
/// Deserialization is lenient: labels are matched case-insensitively and
/// anything unrecognized is treated as an unstated risk, which is `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Parse a risk label, returning `None` for anything outside the taxonomy
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl From<String> for RiskLevel {
    fn from(label: String) -> Self {
        RiskLevel::from_label(&label).unwrap_or(RiskLevel::Medium)
    }
}

impl From<RiskLevel> for &'static str {
    fn from(risk: RiskLevel) -> Self {
        risk.as_str()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static risk analysis of a shell command string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAnalysis {
    pub command: String,
    pub risk_level: RiskLevel,
    /// One entry per matched concern, in detection order
    pub warnings: Vec<String>,
    pub requires_elevation: bool,
}

/// Outcome of a gated execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Process ran to completion (any exit code)
    Completed,
    /// Refused by safe mode, no process was spawned
    Blocked,
    /// Wall-clock timeout expired
    TimedOut,
    /// Spawn or OS-level failure
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Blocked => "blocked",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }
}

/// Result of `execute_safely`. Failures are data, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub executed: bool,
    pub status: ExecutionStatus,
    /// stdout, or stderr when stdout is empty; otherwise a status message
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i32>,
    pub analysis: CommandAnalysis,
}

impl ExecutionResult {
    pub fn blocked(analysis: CommandAnalysis) -> Self {
        Self {
            executed: false,
            status: ExecutionStatus::Blocked,
            output: "Command blocked in safe mode".to_string(),
            return_code: None,
            analysis,
        }
    }
}
