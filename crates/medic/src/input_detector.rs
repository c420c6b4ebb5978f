//! Input type detection.
//!
//! Buckets raw pasted text into shell transcript, log, error/traceback, or
//! free-form prose by counting per-line signals over the first 50 lines.

use medic_common::{InputKind, InputType};
use regex::Regex;
use std::sync::LazyLock;

/// Lines beyond this are not inspected
pub const MAX_SCANNED_LINES: usize = 50;

static SHELL_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.-]+@[a-zA-Z0-9_.-]+:~?\$").expect("shell prompt pattern")
});

static LOG_LEVEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(ERROR|WARN|INFO|TRACE|DEBUG)[ :]").expect("log level pattern")
});

static TRACEBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Exception|Traceback|stack trace)").expect("traceback pattern")
});

/// Paths, drive letters, comparisons and scope operators mark a line as non-prose
static NON_PROSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/\\]|:\\|==|::").expect("non-prose pattern"));

/// Signal buckets in tie-break order
const BUCKETS: [InputKind; 4] = [
    InputKind::Shell,
    InputKind::Log,
    InputKind::Error,
    InputKind::FreeText,
];

/// Classify raw text into an input bucket with a crude confidence
pub fn detect(text: &str) -> InputType {
    if text.trim().is_empty() {
        return InputType {
            label: InputKind::Empty,
            confidence: 1.0,
        };
    }

    let mut signals = [0.0_f64; 4];
    for line in text.lines().take(MAX_SCANNED_LINES) {
        let line = line.trim();
        if SHELL_PROMPT.is_match(line) {
            signals[0] += 2.0;
        }
        if LOG_LEVEL.is_match(line) {
            signals[1] += 1.0;
        }
        if TRACEBACK.is_match(line) {
            signals[2] += 2.0;
        }
        if line.split_whitespace().count() > 4 && !NON_PROSE.is_match(line) {
            signals[3] += 0.5;
        }
    }

    // First maximum wins ties
    let mut best = 0;
    for (i, value) in signals.iter().enumerate().skip(1) {
        if *value > signals[best] {
            best = i;
        }
    }

    let total: f64 = signals.iter().sum();
    let total = if total > 0.0 { total } else { 1.0 };

    InputType {
        label: BUCKETS[best],
        confidence: (signals[best] / total).min(1.0),
    }
}
