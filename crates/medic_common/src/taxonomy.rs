//! Input type buckets and the fixed problem-category taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse shape of raw user input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Empty,
    Shell,
    Log,
    Error,
    FreeText,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Shell => "shell",
            Self::Log => "log",
            Self::Error => "error",
            Self::FreeText => "free_text",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputType {
    pub label: InputKind,
    pub confidence: f64,
}

/// Problem categories. The set is closed: heuristic patterns and embedding
/// labels are both derived from `Category::ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Battery, charger, won't turn on
    Power,
    /// BIOS, bootloader, OS startup
    Boot,
    /// RAM, storage, motherboard
    Hardware,
    /// Dropped, liquid damage, environment
    Physical,
    /// Drivers, applications, crashes
    Software,
    /// Wrong expectations, user error
    User,
    /// WiFi, ethernet, DNS, connectivity
    Network,
    /// Slow, overheating, resource pressure
    Performance,
    /// General system configuration
    System,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Power,
        Category::Boot,
        Category::Hardware,
        Category::Physical,
        Category::Software,
        Category::User,
        Category::Network,
        Category::Performance,
        Category::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Boot => "boot",
            Self::Hardware => "hardware",
            Self::Physical => "physical",
            Self::Software => "software",
            Self::User => "user",
            Self::Network => "network",
            Self::Performance => "performance",
            Self::System => "system",
        }
    }

    /// Parse from string (CLI flags, template names)
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s.trim().to_lowercase())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPrediction {
    pub label: Category,
    pub confidence: f64,
    /// Ranked (label, score) pairs, best first
    pub candidates: Vec<(Category, f64)>,
}
