//! End-to-end diagnosis: detect, classify, retrieve, brainstorm, judge, and
//! optionally probe.
//!
//! Everything held by `DiagnosticPipeline` is read-only after construction;
//! per-call choices travel in `DiagnoseRequest` and `ExecutionPolicy`.

use crate::brainstorm::{BrainstormEngine, BrainstormRequest, ParseStrategy};
use crate::classifier::CategoryClassifier;
use crate::config::Config;
use crate::embeddings::SharedEmbeddings;
use crate::executor::{CommandExecutor, ExecutionPolicy, SharedShell};
use crate::input_detector;
use crate::judge;
use crate::llm::SharedLlm;
use crate::probe;
use crate::retrieval::HybridRetriever;
use crate::system_info;
use crate::templates::PromptTemplates;
use medic_common::snippet::format_snippets;
use medic_common::{
    Category, CategoryPrediction, Connectivity, ExecutionResult, Idea, InputType, JudgedIdea,
    Snippet, SystemInfo,
};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// One diagnosis request. Unset fields fall back to the loaded config.
#[derive(Debug, Clone)]
pub struct DiagnoseRequest {
    pub issue: String,
    pub ideas: Option<usize>,
    pub creativity: Option<u8>,
    /// Skip classification and use this category
    pub category: Option<Category>,
    /// Probe the top-ranked ideas' checks
    pub probe: bool,
    /// Take a connectivity snapshot for the prompt
    pub connectivity: bool,
}

impl DiagnoseRequest {
    pub fn new(issue: impl Into<String>) -> Self {
        Self {
            issue: issue.into(),
            ideas: None,
            creativity: None,
            category: None,
            probe: false,
            connectivity: true,
        }
    }
}

/// How the brainstorm step went
#[derive(Debug, Clone, Serialize)]
pub struct BrainstormSummary {
    pub temperature: f64,
    pub max_tokens: u32,
    pub strategy: ParseStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisReport {
    pub issue: String,
    pub input_type: InputType,
    pub category: CategoryPrediction,
    pub snippets: Vec<Snippet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<Connectivity>,
    pub brainstorm: BrainstormSummary,
    /// Best first
    pub ideas: Vec<JudgedIdea>,
    /// Number of checks probed across the ranked ideas
    pub probed_checks: usize,
}

pub struct DiagnosticPipeline {
    config: Config,
    classifier: CategoryClassifier,
    retriever: HybridRetriever,
    brainstorm: BrainstormEngine,
    executor: CommandExecutor,
}

impl DiagnosticPipeline {
    /// Build from config: loads the corpus and collects host facts once
    pub fn new(config: Config, llm: SharedLlm, shell: SharedShell) -> Self {
        let retriever = HybridRetriever::from_config(&config.retrieval);
        let templates = PromptTemplates::from_config(&config.prompts);
        let brainstorm = BrainstormEngine::new(llm, templates).with_system(system_info::collect());

        Self {
            config,
            classifier: CategoryClassifier::new(),
            retriever,
            brainstorm,
            executor: CommandExecutor::new(shell),
        }
    }

    /// Use an embedding provider for classification and retrieval
    pub fn with_embeddings(mut self, provider: SharedEmbeddings) -> Self {
        self.classifier = CategoryClassifier::with_embeddings(provider.clone());
        self.retriever = self.retriever.with_embeddings(provider);
        self
    }

    pub fn with_retriever(mut self, retriever: HybridRetriever) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_system(mut self, system: SystemInfo) -> Self {
        self.brainstorm = self.brainstorm.with_system(system);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn classifier(&self) -> &CategoryClassifier {
        &self.classifier
    }

    pub fn retriever(&self) -> &HybridRetriever {
        &self.retriever
    }

    pub fn brainstorm_engine(&self) -> &BrainstormEngine {
        &self.brainstorm
    }

    pub fn system(&self) -> &SystemInfo {
        self.brainstorm.system()
    }

    /// Execution policy from config
    pub fn default_policy(&self) -> ExecutionPolicy {
        ExecutionPolicy::from_config(&self.config.executor)
    }

    fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.config.executor.probe_timeout_secs)
    }

    pub async fn diagnose(&self, request: &DiagnoseRequest) -> DiagnosisReport {
        let input_type = input_detector::detect(&request.issue);

        let category = match request.category {
            Some(label) => CategoryPrediction {
                label,
                confidence: 1.0,
                candidates: vec![(label, 1.0)],
            },
            None => self.classifier.classify(&request.issue),
        };
        info!(
            "Diagnose: input={} category={} ({:.2})",
            input_type.label, category.label, category.confidence
        );

        let snippets = self.retriever.search(
            &request.issue,
            Some(category.label.as_str()),
            self.config.retrieval.top_k,
        );

        let connectivity = if request.connectivity {
            Some(system_info::check_connectivity(self.executor.shell().as_ref()).await)
        } else {
            None
        };

        let brainstorm_request = BrainstormRequest {
            issue: request.issue.clone(),
            n: request.ideas.unwrap_or(self.config.brainstorm.ideas),
            creativity: request.creativity.unwrap_or(self.config.brainstorm.creativity),
            category_hint: Some(category.label.as_str().to_string()),
            retrieval_text: format_snippets(&snippets),
            connectivity,
        };
        let report = self.brainstorm.brainstorm(&brainstorm_request).await;

        let mut ideas = judge::judge_ideas(report.ideas, &request.issue, self.system());

        let mut probed_checks = 0;
        if request.probe {
            let timeout = self.probe_timeout();
            let shell = self.executor.shell().as_ref();
            for judged in ideas.iter_mut().take(self.config.brainstorm.probe_top) {
                probed_checks += probe::probe_idea(shell, &mut judged.idea, timeout).await;
            }
        }

        DiagnosisReport {
            issue: request.issue.clone(),
            input_type,
            category,
            snippets,
            connectivity,
            brainstorm: BrainstormSummary {
                temperature: report.temperature,
                max_tokens: report.max_tokens,
                strategy: report.strategy,
                llm_error: report.llm_error,
            },
            ideas,
            probed_checks,
        }
    }

    /// Probe mode over caller-supplied ideas
    pub async fn probe_ideas(&self, ideas: &mut [Idea]) -> usize {
        probe::probe_ideas(self.executor.shell().as_ref(), ideas, self.probe_timeout()).await
    }

    /// Direct, safe-mode gated execution
    pub async fn execute(&self, command: &str, policy: &ExecutionPolicy) -> ExecutionResult {
        self.executor.execute_safely(command, policy).await
    }
}
