//! LLM transport.
//!
//! The pipeline only sees `LlmClient::invoke`; `OllamaClient` is the HTTP
//! implementation against an Ollama server.

use crate::config::{ChatMode, LlmConfig};
use async_trait::async_trait;
use medic_common::{MedicError, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// System message sent in chat mode
pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful diagnostic assistant.";

/// Text generation collaborator. The returned string is opaque: it may be
/// empty, prose, truncated JSON, or JSON.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(&self, prompt: &str, temperature: f64, max_tokens: u32) -> Result<String>;
}

pub type SharedLlm = Arc<dyn LlmClient>;

/// Ollama HTTP client (`/api/generate` or `/api/chat`)
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    num_ctx: u32,
    chat_mode: ChatMode,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaReply {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    message: Option<ChatMessage>,
}

impl OllamaClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MedicError::Llm(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            num_ctx: config.num_ctx,
            chat_mode: config.chat_mode,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Chat endpoint when forced, or automatically for gpt-oss models
    pub fn uses_chat(&self) -> bool {
        match self.chat_mode {
            ChatMode::Force => true,
            ChatMode::Never => false,
            ChatMode::Auto => self.model.starts_with("gpt-oss"),
        }
    }

    /// Endpoint path and JSON body for one request
    fn request(&self, prompt: &str, temperature: f64, max_tokens: u32) -> (String, Value) {
        let options = json!({
            "temperature": temperature,
            "num_predict": max_tokens,
            "num_ctx": self.num_ctx,
        });

        if self.uses_chat() {
            let body = json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": CHAT_SYSTEM_PROMPT},
                    {"role": "user", "content": prompt},
                ],
                "stream": false,
                "options": options,
            });
            (format!("{}/api/chat", self.base_url), body)
        } else {
            let body = json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "options": options,
            });
            (format!("{}/api/generate", self.base_url), body)
        }
    }
}

/// Chat replies carry `message.content`; generate replies carry `response`
fn reply_text(reply: OllamaReply) -> String {
    reply
        .message
        .and_then(|m| m.content)
        .or(reply.response)
        .unwrap_or_default()
}

/// Decode a non-streaming reply body
fn parse_reply(body: &str) -> Result<String> {
    let reply: OllamaReply = serde_json::from_str(body)?;
    Ok(reply_text(reply))
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn invoke(&self, prompt: &str, temperature: f64, max_tokens: u32) -> Result<String> {
        let (url, body) = self.request(prompt, temperature, max_tokens);
        info!(
            "LLM request: model={} temperature={} num_predict={} prompt_chars={}",
            self.model,
            temperature,
            max_tokens,
            prompt.len()
        );

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| MedicError::Llm(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(MedicError::Llm(format!(
                "Ollama request failed: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MedicError::Llm(format!("reading Ollama reply: {}", e)))?;
        let text = parse_reply(&body)?;
        debug!("LLM reply: {} chars", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(model: &str, chat_mode: ChatMode) -> OllamaClient {
        OllamaClient::from_config(&LlmConfig {
            model: model.to_string(),
            chat_mode,
            base_url: "http://localhost:11434/".to_string(),
            ..LlmConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_chat_mode_selection() {
        assert!(!client("llama3.2", ChatMode::Auto).uses_chat());
        assert!(client("gpt-oss:20b", ChatMode::Auto).uses_chat());
        assert!(client("llama3.2", ChatMode::Force).uses_chat());
        assert!(!client("gpt-oss:20b", ChatMode::Never).uses_chat());
    }

    #[test]
    fn test_generate_request() {
        let (url, body) = client("llama3.2", ChatMode::Auto).request("why no wifi", 0.3, 600);
        assert_eq!(url, "http://localhost:11434/api/generate");
        assert_eq!(body["prompt"], "why no wifi");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.3);
        assert_eq!(body["options"]["num_predict"], 600);
        assert_eq!(body["options"]["num_ctx"], 2048);
    }

    #[test]
    fn test_chat_request() {
        let (url, body) = client("gpt-oss:20b", ChatMode::Auto).request("why no wifi", 1.0, 512);
        assert_eq!(url, "http://localhost:11434/api/chat");
        assert_eq!(body["messages"][0]["content"], CHAT_SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "why no wifi");
    }

    #[test]
    fn test_parse_reply_body() {
        assert_eq!(parse_reply(r#"{"response":"[]","done":true}"#).unwrap(), "[]");

        let err = parse_reply("<html>502 Bad Gateway</html>").unwrap_err();
        assert_eq!(err.kind(), "json");
    }

    #[test]
    fn test_reply_text() {
        let chat: OllamaReply =
            serde_json::from_str(r#"{"message":{"role":"assistant","content":"[]"}}"#).unwrap();
        assert_eq!(reply_text(chat), "[]");

        let generate: OllamaReply = serde_json::from_str(r#"{"response":"hello"}"#).unwrap();
        assert_eq!(reply_text(generate), "hello");

        let empty: OllamaReply = serde_json::from_str("{}").unwrap();
        assert_eq!(reply_text(empty), "");
    }
}
