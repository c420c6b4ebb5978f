//! LLM-backed idea generation.
//!
//! One call: pick temperature and token budget, render the brainstorm
//! template, invoke the LLM once, parse the reply tolerantly, truncate to n.
//! The result always holds between 1 and n ideas.

pub mod parse;

pub use parse::{parse_ideas, ParseStrategy};

use crate::llm::SharedLlm;
use crate::templates::{render, PromptTemplates, TemplateContext};
use medic_common::{Connectivity, Idea, SystemInfo};
use serde::Serialize;
use tracing::{info, warn};

/// Template kind used for brainstorming
pub const TEMPLATE_KIND: &str = "brainstorm";

/// Token budget floor, and the per-idea increment above it
pub const MIN_MAX_TOKENS: u32 = 512;
pub const TOKENS_PER_IDEA: u32 = 120;

/// Creativity 0..=3 maps onto a fixed temperature ladder; anything else is 0.3
pub fn temperature_for(creativity: u8) -> f64 {
    match creativity {
        0 => 0.0,
        1 => 0.3,
        2 => 0.7,
        3 => 1.0,
        _ => 0.3,
    }
}

/// Enough generation length for `n` JSON objects
pub fn token_budget(n: usize) -> u32 {
    let scaled = u32::try_from(n).unwrap_or(u32::MAX).saturating_mul(TOKENS_PER_IDEA);
    scaled.max(MIN_MAX_TOKENS)
}

/// Inputs for one brainstorm call
#[derive(Debug, Clone)]
pub struct BrainstormRequest {
    pub issue: String,
    /// Upper bound on returned ideas; 0 is treated as 1
    pub n: usize,
    pub creativity: u8,
    pub category_hint: Option<String>,
    pub retrieval_text: String,
    pub connectivity: Option<Connectivity>,
}

impl BrainstormRequest {
    pub fn new(issue: impl Into<String>) -> Self {
        Self {
            issue: issue.into(),
            n: 5,
            creativity: 1,
            category_hint: None,
            retrieval_text: String::new(),
            connectivity: None,
        }
    }
}

/// Ideas plus how they were produced
#[derive(Debug, Clone, Serialize)]
pub struct BrainstormReport {
    pub ideas: Vec<Idea>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub strategy: ParseStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_error: Option<String>,
}

pub struct BrainstormEngine {
    llm: SharedLlm,
    templates: PromptTemplates,
    system: SystemInfo,
}

impl BrainstormEngine {
    pub fn new(llm: SharedLlm, templates: PromptTemplates) -> Self {
        Self {
            llm,
            templates,
            system: SystemInfo::default(),
        }
    }

    /// Host facts rendered into every prompt
    pub fn with_system(mut self, system: SystemInfo) -> Self {
        self.system = system;
        self
    }

    pub fn system(&self) -> &SystemInfo {
        &self.system
    }

    fn context(&self, request: &BrainstormRequest, n: usize) -> TemplateContext {
        let system = serde_json::to_string(&self.system).unwrap_or_default();
        let connectivity = request
            .connectivity
            .as_ref()
            .and_then(|c| serde_json::to_string(c).ok())
            .unwrap_or_default();

        let mut ctx = TemplateContext::new();
        ctx.insert("SYSTEM".to_string(), system);
        ctx.insert("CONNECTIVITY".to_string(), connectivity);
        ctx.insert("ISSUE".to_string(), request.issue.clone());
        ctx.insert(
            "CATEGORY_HINT".to_string(),
            request.category_hint.clone().unwrap_or_default(),
        );
        ctx.insert("N".to_string(), n.to_string());
        ctx.insert("RETRIEVAL".to_string(), request.retrieval_text.clone());
        ctx
    }

    /// Render the prompt a request would send
    pub fn prompt_for(&self, request: &BrainstormRequest) -> String {
        let n = request.n.max(1);
        let template = self
            .templates
            .load(TEMPLATE_KIND, request.category_hint.as_deref());
        render(&template, &self.context(request, n))
    }

    /// Run one brainstorm. LLM failures are reported in the result and
    /// otherwise handled like an unparsable reply.
    pub async fn brainstorm(&self, request: &BrainstormRequest) -> BrainstormReport {
        let n = request.n.max(1);
        let temperature = temperature_for(request.creativity);
        let max_tokens = token_budget(n);
        let prompt = self.prompt_for(request);

        let (reply, llm_error) = match self.llm.invoke(&prompt, temperature, max_tokens).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!("Brainstorm LLM call failed [{}]: {}", e.kind(), e);
                (String::new(), Some(e.to_string()))
            }
        };

        let (mut ideas, strategy) = parse_ideas(&reply);
        ideas.truncate(n);
        info!(
            "Brainstorm: {} ideas (requested {}) via {}",
            ideas.len(),
            n,
            strategy.as_str()
        );

        BrainstormReport {
            ideas,
            temperature,
            max_tokens,
            strategy,
            llm_error,
        }
    }

    /// Between 1 and `n` ideas for an issue
    pub async fn generate_ideas(
        &self,
        issue: &str,
        n: usize,
        creativity: u8,
        category_hint: Option<&str>,
        retrieval_text: &str,
    ) -> Vec<Idea> {
        let request = BrainstormRequest {
            issue: issue.to_string(),
            n,
            creativity,
            category_hint: category_hint.map(String::from),
            retrieval_text: retrieval_text.to_string(),
            connectivity: None,
        };
        self.brainstorm(&request).await.ideas
    }
}
