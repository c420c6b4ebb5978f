//! medic - command line front end for the diagnostic idea pipeline.
//!
//! Every subcommand prints JSON on stdout; logs go to stderr, filtered by
//! `MEDIC_LOG` (default `info`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use medic::config::Config;
use medic::executor::ExecutionPolicy;
use medic::{
    analyze_command, input_detector, judge, system_info, CategoryClassifier, DiagnoseRequest,
    DiagnosticPipeline, HybridRetriever, OllamaClient, SystemShell,
};
use medic_common::{Category, Idea};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "MEDIC_LOG";

#[derive(Parser)]
#[command(name = "medic")]
#[command(about = "Diagnose computer problems with ranked, checkable hypotheses", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: $MEDIC_CONFIG, /etc/medic/config.toml, user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the shape of pasted input (shell, log, error, free text)
    Detect {
        /// Text to inspect; read from stdin when omitted
        text: Vec<String>,
    },

    /// Predict the problem category
    Classify {
        text: Vec<String>,
    },

    /// Search the grounding corpus
    Search {
        query: Vec<String>,

        /// Category hint added to the query
        #[arg(long)]
        category: Option<String>,

        /// Number of snippets
        #[arg(short, default_value_t = 3)]
        k: usize,
    },

    /// Brainstorm, rank and optionally probe ideas for an issue
    Ideas {
        issue: Vec<String>,

        /// Maximum number of ideas
        #[arg(short)]
        n: Option<usize>,

        /// 0 (focused) to 3 (wild)
        #[arg(long)]
        creativity: Option<u8>,

        /// Skip classification and use this category
        #[arg(long)]
        category: Option<String>,

        /// Run whitelisted read-only checks of the top ideas
        #[arg(long)]
        probe: bool,
    },

    /// Score and rank ideas from a JSON file
    Judge {
        /// Issue text the ideas address
        #[arg(long)]
        issue: String,

        /// JSON array of ideas ("-" for stdin)
        file: PathBuf,
    },

    /// Show the risk analysis of a command without running it
    Analyze {
        command: Vec<String>,
    },

    /// Run a command through the safe-mode gate
    Exec {
        command: Vec<String>,

        /// Run even if the command is high risk
        #[arg(long)]
        force: bool,
    },

    /// Probe whitelisted checks of ideas from a JSON file
    Probe {
        /// JSON array of ideas ("-" for stdin)
        file: PathBuf,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_explicit(path),
        None => Ok(Config::load()),
    }
}

/// Joined words, or stdin when no words were given
fn read_text(words: &[String]) -> Result<String> {
    if !words.is_empty() {
        return Ok(words.join(" "));
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("reading stdin")?;
    Ok(text)
}

fn read_ideas(path: &Path) -> Result<Vec<Idea>> {
    let content = if path == Path::new("-") {
        read_text(&[])?
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&content).with_context(|| format!("parsing ideas from {}", path.display()))
}

fn parse_category(label: Option<&str>) -> Result<Option<Category>> {
    match label {
        None => Ok(None),
        Some(label) => match Category::from_str(label) {
            Some(category) => Ok(Some(category)),
            None => bail!(
                "unknown category '{}' (expected one of: {})",
                label,
                Category::ALL.map(|c| c.as_str()).join(", ")
            ),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_pipeline(config: Config) -> Result<DiagnosticPipeline> {
    let llm = OllamaClient::from_config(&config.llm)?;
    debug!("Using model {}", llm.model());
    Ok(DiagnosticPipeline::new(config, Arc::new(llm), Arc::new(SystemShell)))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Detect { text } => print_json(&input_detector::detect(&read_text(&text)?)),

        Commands::Classify { text } => {
            print_json(&CategoryClassifier::new().classify(&read_text(&text)?))
        }

        Commands::Search { query, category, k } => {
            let retriever = HybridRetriever::from_config(&config.retrieval);
            let hint = parse_category(category.as_deref())?;
            let query = read_text(&query)?;
            print_json(&retriever.search(&query, hint.map(|c| c.as_str()), k))
        }

        Commands::Ideas {
            issue,
            n,
            creativity,
            category,
            probe,
        } => {
            let request = DiagnoseRequest {
                issue: read_text(&issue)?,
                ideas: n,
                creativity,
                category: parse_category(category.as_deref())?,
                probe,
                connectivity: true,
            };
            let pipeline = build_pipeline(config)?;
            print_json(&pipeline.diagnose(&request).await)
        }

        Commands::Judge { issue, file } => {
            let ideas = read_ideas(&file)?;
            print_json(&judge::judge_ideas(ideas, &issue, &system_info::collect()))
        }

        Commands::Analyze { command } => print_json(&analyze_command(&read_text(&command)?)),

        Commands::Exec { command, force } => {
            let command = read_text(&command)?;
            let pipeline = build_pipeline(config)?;
            let mut policy: ExecutionPolicy = pipeline.default_policy();
            if force {
                policy = policy.with_safe_mode(false);
            }
            print_json(&pipeline.execute(command.trim(), &policy).await)
        }

        Commands::Probe { file } => {
            let mut ideas = read_ideas(&file)?;
            let pipeline = build_pipeline(config)?;
            pipeline.probe_ideas(&mut ideas).await;
            print_json(&ideas)
        }
    }
}
