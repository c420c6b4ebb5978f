//! Medic - diagnostic idea pipeline.
//!
//! Turns a free-text description of a computer problem into ranked,
//! checkable hypotheses: input detection, category classification, corpus
//! retrieval, LLM brainstorming with tolerant parsing, deterministic
//! judging, and safe-mode gated command execution and probing.

pub mod brainstorm;
pub mod classifier;
pub mod config;
pub mod embeddings;
pub mod executor;
pub mod input_detector;
pub mod judge;
pub mod llm;
pub mod pipeline;
pub mod probe;
pub mod retrieval;
pub mod system_info;
pub mod templates;

pub use brainstorm::{BrainstormEngine, BrainstormReport, BrainstormRequest, ParseStrategy};
pub use classifier::CategoryClassifier;
pub use config::Config;
pub use embeddings::{EmbeddingProvider, NoEmbeddings};
pub use executor::{analyze_command, CommandExecutor, ExecutionPolicy, ShellRunner, SystemShell};
pub use llm::{LlmClient, OllamaClient};
pub use pipeline::{DiagnoseRequest, DiagnosisReport, DiagnosticPipeline};
pub use retrieval::HybridRetriever;
pub use templates::PromptTemplates;
