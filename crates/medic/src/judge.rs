//! Deterministic idea scoring and ranking. No LLM involved.

use medic_common::{Idea, IdeaScores, JudgedIdea, RiskLevel, SystemInfo};
use tracing::debug;

/// Weights of safety, success likelihood, cost and determinism in the total
pub const WEIGHTS: IdeaScores = IdeaScores {
    safety: 0.3,
    success_likelihood: 0.4,
    cost: 0.2,
    determinism: 0.1,
};

/// Issue keywords that make an idea of a given category relevant
const CATEGORY_KEYWORDS: [(&str, &[&str]); 3] = [
    ("wifi", &["wifi", "wireless"]),
    ("dns", &["dns", "resolution"]),
    ("network", &["network", "interface"]),
];

fn safety(risk: RiskLevel) -> f64 {
    match risk {
        RiskLevel::Low => 0.9,
        RiskLevel::Medium => 0.6,
        RiskLevel::High => 0.2,
    }
}

fn any_contains(items: &[String], needle: &str) -> bool {
    items.iter().any(|item| item.to_lowercase().contains(needle))
}

fn category_matches_issue(category: &str, issue_lower: &str) -> bool {
    CATEGORY_KEYWORDS.iter().any(|(cat, words)| {
        category.eq_ignore_ascii_case(cat) && words.iter().any(|w| issue_lower.contains(w))
    })
}

/// Boosts are added independently and clamped once at the end
fn success_likelihood(idea: &Idea, issue_lower: &str, system: &SystemInfo) -> f64 {
    let mut likelihood = 0.5;
    if system.is_ubuntu_like() && any_contains(&idea.checks, "nmcli") {
        likelihood += 0.3;
    }
    if any_contains(&idea.checks, "systemctl") {
        likelihood += 0.2;
    }
    if category_matches_issue(&idea.category, issue_lower) {
        likelihood += 0.2;
    }
    f64::min(likelihood, 1.0)
}

/// Higher is cheaper. A reinstall outranks a reboot.
fn cost(idea: &Idea) -> f64 {
    let mut cost = 0.8;
    if any_contains(&idea.fixes, "reboot") {
        cost = 0.3;
    }
    if any_contains(&idea.fixes, "reinstall") {
        cost = 0.1;
    }
    cost
}

fn determinism(idea: &Idea) -> f64 {
    let mut determinism = 0.7;
    if !idea.checks.is_empty() {
        determinism += 0.2;
    }
    if idea.fixes.len() > 1 {
        determinism -= 0.1;
    }
    f64::min(determinism, 1.0)
}

pub fn score_idea(idea: &Idea, issue: &str, system: &SystemInfo) -> IdeaScores {
    let issue_lower = issue.to_lowercase();
    IdeaScores {
        safety: safety(idea.risk),
        success_likelihood: success_likelihood(idea, &issue_lower, system),
        cost: cost(idea),
        determinism: determinism(idea),
    }
}

pub fn total_score(scores: &IdeaScores) -> f64 {
    scores.safety * WEIGHTS.safety
        + scores.success_likelihood * WEIGHTS.success_likelihood
        + scores.cost * WEIGHTS.cost
        + scores.determinism * WEIGHTS.determinism
}

/// Short explanation of the safety, success and cost tiers
pub fn rationale(scores: &IdeaScores, total: f64) -> String {
    let mut parts = vec![format!("Scored {:.2}/1.0.", total)];

    if scores.safety < 0.5 {
        parts.push("High risk approach.".to_string());
    } else if scores.safety > 0.8 {
        parts.push("Safe approach.".to_string());
    }

    if scores.success_likelihood > 0.7 {
        parts.push("Strong success indicators.".to_string());
    } else if scores.success_likelihood < 0.4 {
        parts.push("Low success probability.".to_string());
    }

    if scores.cost < 0.5 {
        parts.push("High cost/time investment.".to_string());
    }

    parts.join(" ")
}

/// Score every idea and rank by total, best first. Equal totals keep their
/// input order.
pub fn judge_ideas(ideas: Vec<Idea>, issue: &str, system: &SystemInfo) -> Vec<JudgedIdea> {
    let mut judged: Vec<JudgedIdea> = ideas
        .into_iter()
        .map(|idea| {
            let scores = score_idea(&idea, issue, system);
            let total = total_score(&scores);
            JudgedIdea {
                rationale: rationale(&scores, total),
                idea,
                scores,
                total_score: total,
            }
        })
        .collect();

    judged.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
    debug!("Judged {} ideas", judged.len());
    judged
}
