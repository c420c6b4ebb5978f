//! Fakes for the LLM, shell and embedding collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use medic::embeddings::EmbeddingProvider;
use medic::executor::{ShellOutcome, ShellOutput, ShellRunner};
use medic::llm::LlmClient;
use medic::templates::PromptTemplates;
use medic_common::{MedicError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded LLM call
#[derive(Debug, Clone)]
pub struct LlmCall {
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Returns a canned reply (or error) and records every call
pub struct FakeLlm {
    reply: std::result::Result<String, String>,
    calls: Mutex<Vec<LlmCall>>,
}

impl FakeLlm {
    pub fn replying(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<LlmCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for FakeLlm {
    async fn invoke(&self, prompt: &str, temperature: f64, max_tokens: u32) -> Result<String> {
        self.calls.lock().unwrap().push(LlmCall {
            prompt: prompt.to_string(),
            temperature,
            max_tokens,
        });
        self.reply.clone().map_err(MedicError::Llm)
    }
}

/// Answers every command with `out:<command>` and counts spawns
#[derive(Default)]
pub struct FakeShell {
    calls: AtomicUsize,
    commands: Mutex<Vec<String>>,
}

impl FakeShell {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShellRunner for FakeShell {
    async fn run(&self, command: &str, _timeout: Duration) -> ShellOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.commands.lock().unwrap().push(command.to_string());
        ShellOutcome::Completed(ShellOutput {
            stdout: format!("out:{}", command),
            stderr: String::new(),
            exit_code: 0,
        })
    }
}

/// Bag-of-keywords vectors over a fixed vocabulary
pub struct KeywordEmbeddings {
    pub vocabulary: Vec<&'static str>,
}

impl EmbeddingProvider for KeywordEmbeddings {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(self
            .vocabulary
            .iter()
            .map(|word| if lower.contains(word) { 1.0 } else { 0.0 })
            .collect())
    }
}

/// Provider that is installed but broken
pub struct BrokenEmbeddings;

impl EmbeddingProvider for BrokenEmbeddings {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(MedicError::Embedding("model file missing".to_string()))
    }
}

/// Templates bundled with the crate
pub fn bundled_templates() -> PromptTemplates {
    PromptTemplates::new(vec![PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts"))])
}

pub const TWO_IDEAS: &str = r#"[
  {"hypothesis":"DNS misconfiguration","category":"dns","why":"resolv.conf points to wrong server",
   "checks":["cat /etc/resolv.conf","dig example.com"],"fixes":["sudo systemctl restart systemd-resolved"],"risk":"low"},
  {"hypothesis":"NetworkManager glitch","category":"network","why":"service stuck",
   "checks":["nmcli dev status"],"fixes":["sudo systemctl restart NetworkManager"],"risk":"medium"}
]"#;

/// `count` well-formed ideas as a JSON array
pub fn ideas_json(count: usize) -> String {
    let items: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"hypothesis":"Idea {}","category":"network","why":"w","checks":["ip addr"],"fixes":[],"risk":"low"}}"#,
                i
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}
