//! Prompt templates: file lookup with category-specific variants, and a small
//! mustache-like renderer (`{{#KEY}}...{{/KEY}}` blocks, `{{KEY}}` values).

use crate::config::PromptConfig;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Used when no template file is found in any search directory
pub const FALLBACK_TEMPLATE: &str = "Issue: {{ISSUE}}\nSystem: {{SYSTEM}}\nChecks and fixes please.";

/// Render variables. A key is truthy when present and non-empty.
pub type TemplateContext = BTreeMap<String, String>;

static BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{#([A-Za-z0-9_]+)\}\}").expect("block start pattern"));

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder pattern"));

static SAFE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("template name pattern"));

/// Template lookup over an ordered list of directories
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    search_dirs: Vec<PathBuf>,
}

impl PromptTemplates {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Override directory first, then the bundled defaults
    pub fn from_config(config: &PromptConfig) -> Self {
        let mut dirs = Vec::new();
        if let Some(dir) = &config.override_dir {
            dirs.push(dir.clone());
        }
        dirs.push(config.default_dir.clone());
        Self::new(dirs)
    }

    /// Load `kind.<hint>.txt` or `kind.base.txt`, checking every name in a
    /// directory before moving to the next directory.
    pub fn load(&self, kind: &str, category_hint: Option<&str>) -> String {
        let mut names = Vec::with_capacity(2);
        if let Some(hint) = category_hint {
            let hint = hint.trim().to_lowercase();
            if SAFE_NAME.is_match(&hint) {
                names.push(format!("{}.{}.txt", kind, hint));
            } else if !hint.is_empty() {
                debug!("Ignoring unsafe template hint {:?}", hint);
            }
        }
        names.push(format!("{}.base.txt", kind));

        for dir in &self.search_dirs {
            for name in &names {
                let path = dir.join(name);
                if !path.is_file() {
                    continue;
                }
                match fs::read_to_string(&path) {
                    Ok(text) => {
                        debug!("Using prompt template {}", path.display());
                        return text;
                    }
                    Err(e) => warn!("Unreadable template {}: {}", path.display(), e),
                }
            }
        }

        warn!("No {} template found, using built-in fallback", kind);
        FALLBACK_TEMPLATE.to_string()
    }
}

fn is_truthy(context: &TemplateContext, key: &str) -> bool {
    context.get(key).is_some_and(|v| !v.is_empty())
}

/// Resolve every `{{#KEY}}...{{/KEY}}` span for one key, left to right.
/// Stops at the first start marker without a matching end marker.
fn toggle_block(mut text: String, key: &str, keep: bool) -> String {
    let start = format!("{{{{#{}}}}}", key);
    let end = format!("{{{{/{}}}}}", key);
    while let Some(i) = text.find(&start) {
        let inner_from = i + start.len();
        let Some(offset) = text[inner_from..].find(&end) else {
            break;
        };
        let j = inner_from + offset;
        let replacement = if keep { text[inner_from..j].to_string() } else { String::new() };
        text.replace_range(i..j + end.len(), &replacement);
    }
    text
}

/// Render a template: conditional blocks first, then placeholders. Missing
/// or empty values render as empty strings.
pub fn render(template: &str, context: &TemplateContext) -> String {
    let mut keys: Vec<String> = Vec::new();
    for caps in BLOCK_START.captures_iter(template) {
        let key = caps[1].to_string();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    let mut out = template.to_string();
    for key in &keys {
        out = toggle_block(out, key, is_truthy(context, key));
    }

    PLACEHOLDER
        .replace_all(&out, |caps: &Captures| {
            context.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}
