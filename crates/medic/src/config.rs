//! Configuration management for medic.
//!
//! Loads settings from `$MEDIC_CONFIG`, /etc/medic/config.toml, or the user
//! config dir, falling back to defaults. The loaded value is never mutated;
//! per-call choices travel with the request.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// System-wide config file path
pub const CONFIG_PATH: &str = "/etc/medic/config.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "MEDIC_CONFIG";

/// Environment variable naming a prompt override directory
pub const PROMPT_DIR_ENV: &str = "MEDIC_PROMPT_DIR";

/// How the LLM transport picks its endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    /// Chat endpoint for models that require it, generate otherwise
    #[default]
    Auto,
    Force,
    Never,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Whole-request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Context window passed to the model
    #[serde(default = "default_num_ctx")]
    pub num_ctx: u32,

    #[serde(default)]
    pub chat_mode: ChatMode,
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_num_ctx() -> u32 {
    2048
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_llm_timeout(),
            num_ctx: default_num_ctx(),
            chat_mode: ChatMode::default(),
        }
    }
}

/// Command execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Block high-risk commands unless a request explicitly forces them
    #[serde(default = "default_safe_mode")]
    pub safe_mode: bool,

    #[serde(default = "default_execute_timeout")]
    pub execute_timeout_secs: u64,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

fn default_safe_mode() -> bool {
    true
}

fn default_execute_timeout() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    5
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            safe_mode: default_safe_mode(),
            execute_timeout_secs: default_execute_timeout(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

/// Grounding corpus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Directories scanned once at startup for .md/.txt files
    #[serde(default)]
    pub corpus_dirs: Vec<PathBuf>,

    #[serde(default = "default_max_files")]
    pub max_files: usize,

    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_max_files() -> usize {
    40
}

fn default_top_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            corpus_dirs: Vec::new(),
            max_files: default_max_files(),
            top_k: default_top_k(),
        }
    }
}

/// Prompt template locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Searched before `default_dir`
    #[serde(default)]
    pub override_dir: Option<PathBuf>,

    #[serde(default = "default_prompt_dir")]
    pub default_dir: PathBuf,
}

/// Templates bundled with the crate
pub fn default_prompt_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts"))
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            override_dir: None,
            default_dir: default_prompt_dir(),
        }
    }
}

/// Brainstorm defaults used when a request does not specify them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainstormConfig {
    #[serde(default = "default_ideas")]
    pub ideas: usize,

    /// 0-3, mapped to temperature
    #[serde(default = "default_creativity")]
    pub creativity: u8,

    /// How many ranked ideas get probed when probing is requested
    #[serde(default = "default_probe_top")]
    pub probe_top: usize,
}

fn default_ideas() -> usize {
    5
}

fn default_creativity() -> u8 {
    1
}

fn default_probe_top() -> usize {
    3
}

impl Default for BrainstormConfig {
    fn default() -> Self {
        Self {
            ideas: default_ideas(),
            creativity: default_creativity(),
            probe_top: default_probe_top(),
        }
    }
}

/// Full medic configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub prompts: PromptConfig,

    #[serde(default)]
    pub brainstorm: BrainstormConfig,
}

impl Config {
    /// Load config from the first readable location, or return defaults.
    /// `$MEDIC_PROMPT_DIR` always wins for the prompt override directory.
    pub fn load() -> Self {
        let mut config = Self::candidate_paths()
            .into_iter()
            .find_map(|path| match Self::load_from_path(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    if path.exists() {
                        warn!("Ignoring config {}: {:#}", path.display(), e);
                    }
                    None
                }
            })
            .unwrap_or_else(|| {
                warn!("Config not found, using defaults");
                Config::default()
            });
        config.apply_env();
        config
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load an explicitly named config file; unlike `load`, errors are fatal
    pub fn load_explicit(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_path(path)?;
        config.apply_env();
        Ok(config)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from(CONFIG_PATH));
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("medic").join("config.toml"));
        }
        paths
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var(PROMPT_DIR_ENV) {
            if !dir.trim().is_empty() {
                self.prompts.override_dir = Some(PathBuf::from(dir));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.model, "llama3.2");
        assert_eq!(config.llm.chat_mode, ChatMode::Auto);
        assert!(config.executor.safe_mode);
        assert_eq!(config.executor.execute_timeout_secs, 30);
        assert_eq!(config.executor.probe_timeout_secs, 5);
        assert_eq!(config.retrieval.max_files, 40);
        assert_eq!(config.brainstorm.ideas, 5);
        assert!(config.prompts.default_dir.ends_with("prompts"));
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[llm]
model = "gpt-oss:20b"
chat_mode = "force"

[executor]
safe_mode = false

[retrieval]
corpus_dirs = ["/srv/kb"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.model, "gpt-oss:20b");
        assert_eq!(config.llm.chat_mode, ChatMode::Force);
        assert!(!config.executor.safe_mode);
        assert_eq!(config.retrieval.corpus_dirs, vec![PathBuf::from("/srv/kb")]);
        // Defaults for missing fields
        assert_eq!(config.llm.base_url, "http://127.0.0.1:11434");
        assert_eq!(config.executor.probe_timeout_secs, 5);
        assert_eq!(config.retrieval.top_k, 3);
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[brainstorm]\nideas = 7\ncreativity = 3\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.brainstorm.ideas, 7);
        assert_eq!(config.brainstorm.creativity, 3);
        assert_eq!(config.brainstorm.probe_top, 3);
    }

    #[test]
    fn test_load_from_invalid_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[llm\nmodel = ").unwrap();
        assert!(Config::load_from_path(&path).is_err());
        assert!(Config::load_from_path(&dir.path().join("missing.toml")).is_err());
    }
}
