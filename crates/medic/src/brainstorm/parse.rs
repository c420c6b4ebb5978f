//! Tolerant parsing of LLM replies into ideas.
//!
//! Strategies run in a fixed order and the first one that yields at least
//! one idea wins. Each strategy is a pure `&str -> Vec<Idea>` function.
//! Field defaults are filled in one place, `RawIdea::into_idea`.

use medic_common::idea::DEFAULT_CONFIDENCE;
use medic_common::{Idea, RiskLevel};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::debug;

pub const DEFAULT_HYPOTHESIS: &str = "Unknown hypothesis";
pub const DEFAULT_CATEGORY: &str = "general";
pub const DEFAULT_WHY: &str = "No reasoning provided";

/// Risk assumed when the model does not state one
pub const UNSTATED_RISK: RiskLevel = RiskLevel::Medium;

pub const FALLBACK_HYPOTHESIS: &str = "Generic troubleshooting approach";

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```(?:json)?[ \t]*\r?\n(.*?)```").expect("fenced block pattern")
});

/// `<digits>. {` at the start of a line or after whitespace
static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|\s)\d+\.\s*\{").expect("numbered item pattern"));

/// Which step of the cascade produced the ideas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    WholeJson,
    FencedBlock,
    NumberedList,
    BalancedBraces,
    Fallback,
}

impl ParseStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WholeJson => "whole_json",
            Self::FencedBlock => "fenced_block",
            Self::NumberedList => "numbered_list",
            Self::BalancedBraces => "balanced_braces",
            Self::Fallback => "fallback",
        }
    }
}

type Strategy = fn(&str) -> Vec<Idea>;

const CASCADE: [(ParseStrategy, Strategy); 4] = [
    (ParseStrategy::WholeJson, parse_whole_json as Strategy),
    (ParseStrategy::FencedBlock, parse_fenced_blocks as Strategy),
    (ParseStrategy::NumberedList, parse_numbered_list as Strategy),
    (ParseStrategy::BalancedBraces, parse_balanced_braces as Strategy),
];

/// Parse a reply into at least one idea, reporting which strategy worked
pub fn parse_ideas(text: &str) -> (Vec<Idea>, ParseStrategy) {
    for (strategy, parse) in CASCADE {
        let ideas = parse(text);
        if !ideas.is_empty() {
            debug!("Parsed {} ideas via {}", ideas.len(), strategy.as_str());
            return (ideas, strategy);
        }
    }
    debug!("No structured ideas in reply ({} chars), using fallback", text.len());
    (vec![fallback_idea()], ParseStrategy::Fallback)
}

/// The single idea returned when nothing could be parsed
pub fn fallback_idea() -> Idea {
    Idea::new(
        FALLBACK_HYPOTHESIS,
        DEFAULT_CATEGORY,
        "LLM response could not be parsed into structured ideas",
    )
    .with_checks(["echo 'Manual analysis required'"])
    .with_fixes(["Analyze the issue manually"])
    .with_risk(RiskLevel::Low)
}

/// Idea fields as the model sent them. Wrong-typed values count as absent.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RawIdea {
    pub hypothesis: Option<String>,
    pub category: Option<String>,
    pub why: Option<String>,
    pub checks: Option<Vec<String>>,
    pub fixes: Option<Vec<String>>,
    pub risk: Option<String>,
    pub confidence: Option<f64>,
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}

/// A list of strings; a bare string becomes a one-element list
fn list_field(obj: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    match obj.get(key)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
        ),
        Value::String(s) => Some(vec![s.clone()]),
        _ => None,
    }
}

fn number_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

impl RawIdea {
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            hypothesis: string_field(obj, "hypothesis"),
            category: string_field(obj, "category"),
            why: string_field(obj, "why"),
            checks: list_field(obj, "checks"),
            fixes: list_field(obj, "fixes"),
            risk: string_field(obj, "risk"),
            confidence: number_field(obj, "confidence"),
        }
    }

    pub fn into_idea(self) -> Idea {
        let risk = self
            .risk
            .as_deref()
            .and_then(RiskLevel::from_label)
            .unwrap_or(UNSTATED_RISK);

        Idea::new(
            self.hypothesis.unwrap_or_else(|| DEFAULT_HYPOTHESIS.to_string()),
            self.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            self.why.unwrap_or_else(|| DEFAULT_WHY.to_string()),
        )
        .with_checks(self.checks.unwrap_or_default())
        .with_fixes(self.fixes.unwrap_or_default())
        .with_risk(risk)
        .with_confidence(self.confidence.unwrap_or(DEFAULT_CONFIDENCE))
    }
}

fn idea_from_object(obj: &Map<String, Value>) -> Idea {
    RawIdea::from_object(obj).into_idea()
}

/// Accepts an array of objects, `{"ideas": [...]}`, or a single object
pub fn ideas_from_value(value: &Value) -> Vec<Idea> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .map(idea_from_object)
            .collect(),
        Value::Object(obj) => match obj.get("ideas") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_object)
                .map(idea_from_object)
                .collect(),
            _ => vec![idea_from_object(obj)],
        },
        _ => Vec::new(),
    }
}

fn ideas_from_json(text: &str) -> Vec<Idea> {
    serde_json::from_str::<Value>(text.trim())
        .map(|value| ideas_from_value(&value))
        .unwrap_or_default()
}

/// The whole reply is JSON
pub fn parse_whole_json(text: &str) -> Vec<Idea> {
    ideas_from_json(text)
}

/// Every ```json fenced block, parsed independently and concatenated
pub fn parse_fenced_blocks(text: &str) -> Vec<Idea> {
    FENCED_BLOCK
        .captures_iter(text)
        .flat_map(|caps| ideas_from_json(&caps[1]))
        .collect()
}

/// Items like `1. {...}`, in order; each object is brace-balanced
pub fn parse_numbered_list(text: &str) -> Vec<Idea> {
    let mut ideas = Vec::new();
    let mut consumed = 0;
    for m in NUMBERED_ITEM.find_iter(text) {
        if m.start() < consumed {
            continue;
        }
        let open = m.end() - 1;
        let Some(close) = balanced_end(text, open) else {
            continue;
        };
        consumed = close;
        if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&text[open..close]) {
            ideas.push(idea_from_object(&obj));
        }
    }
    ideas
}

/// Every top-level `{...}` span in the text; malformed or unclosed spans
/// are skipped and scanning goes on
pub fn parse_balanced_braces(text: &str) -> Vec<Idea> {
    let mut ideas = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('{') {
        let open = pos + offset;
        let Some(close) = balanced_end(text, open) else {
            // Unclosed span: resume right after its opening brace
            pos = open + 1;
            continue;
        };
        if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&text[open..close]) {
            ideas.push(idea_from_object(&obj));
        }
        pos = close;
    }
    ideas
}

/// Byte index just past the `}` that closes the `{` at `open`. Braces inside
/// JSON string literals are not counted.
fn balanced_end(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[open..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
