//! Shared types for medic components.
//!
//! Everything that crosses a component boundary (ideas, judgements,
//! classifications, command analyses, system facts) lives here so the
//! pipeline and its callers agree on one serialized shape.

pub mod command;
pub mod error;
pub mod idea;
pub mod snippet;
pub mod system;
pub mod taxonomy;

pub use command::{CommandAnalysis, ExecutionResult, ExecutionStatus, RiskLevel};
pub use error::{MedicError, Result};
pub use idea::{Idea, IdeaScores, JudgedIdea, ProbeEvidence};
pub use snippet::Snippet;
pub use system::{Connectivity, DnsStatus, GatewayStatus, SystemInfo};
pub use taxonomy::{Category, CategoryPrediction, InputKind, InputType};
