//! Command risk analysis and gated execution.
//!
//! `analyze_command` is a pure string classifier. `CommandExecutor` applies
//! an explicit `ExecutionPolicy` on top of it and runs commands through a
//! `ShellRunner`, so tests can count spawns without touching the host.

use crate::config::ExecutorConfig;
use async_trait::async_trait;
use medic_common::{CommandAnalysis, ExecutionResult, ExecutionStatus, RiskLevel};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Substrings that make a command high risk, matched case-insensitively
pub const DANGEROUS_PATTERNS: [&str; 5] = ["rm -rf", "dd if=", "mkfs", "> /dev/", "format"];

/// Default wall-clock limit for direct execution
pub const EXECUTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Classify a command's risk. Escalation is one-way: dangerous patterns set
/// high, and `sudo` moves low to medium and anything else to high.
pub fn analyze_command(command: &str) -> CommandAnalysis {
    let lower = command.to_lowercase();
    let mut risk_level = RiskLevel::Low;
    let mut warnings = Vec::new();

    for pattern in DANGEROUS_PATTERNS {
        if lower.contains(pattern) {
            risk_level = RiskLevel::High;
            warnings.push(format!("Contains dangerous pattern: {}", pattern));
        }
    }

    let requires_elevation = lower.contains("sudo");
    if requires_elevation {
        risk_level = if risk_level == RiskLevel::Low {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        };
        warnings.push("Requires elevated privileges".to_string());
    }

    CommandAnalysis {
        command: command.to_string(),
        risk_level,
        warnings,
        requires_elevation,
    }
}

/// Per-call execution settings. Callers that want to bypass safe mode build
/// a new policy instead of toggling shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionPolicy {
    pub safe_mode: bool,
    pub timeout: Duration,
}

impl ExecutionPolicy {
    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self {
            safe_mode: config.safe_mode,
            timeout: Duration::from_secs(config.execute_timeout_secs),
        }
    }

    pub fn with_safe_mode(self, safe_mode: bool) -> Self {
        Self { safe_mode, ..self }
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            safe_mode: true,
            timeout: EXECUTE_TIMEOUT,
        }
    }
}

/// Captured output of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    /// -1 when the process was terminated by a signal
    pub exit_code: i32,
}

/// What happened to a shell invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellOutcome {
    Completed(ShellOutput),
    TimedOut,
    Failed(String),
}

/// Runs a command line through a shell with a wall-clock limit
#[async_trait]
pub trait ShellRunner: Send + Sync {
    async fn run(&self, command: &str, timeout: Duration) -> ShellOutcome;
}

/// `sh -c` on the local host; the child is killed if the timeout fires
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

#[async_trait]
impl ShellRunner for SystemShell {
    async fn run(&self, command: &str, timeout: Duration) -> ShellOutcome {
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(timeout, child).await {
            Ok(Ok(output)) => ShellOutcome::Completed(ShellOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code().unwrap_or(-1),
            }),
            Ok(Err(e)) => ShellOutcome::Failed(e.to_string()),
            Err(_) => ShellOutcome::TimedOut,
        }
    }
}

/// Shared shell handle
pub type SharedShell = Arc<dyn ShellRunner>;

/// Safe-mode gate in front of a shell
#[derive(Clone)]
pub struct CommandExecutor {
    shell: SharedShell,
}

impl CommandExecutor {
    pub fn new(shell: SharedShell) -> Self {
        Self { shell }
    }

    /// Executor backed by the local `sh`
    pub fn system() -> Self {
        Self::new(Arc::new(SystemShell))
    }

    pub fn shell(&self) -> &SharedShell {
        &self.shell
    }

    /// Analyze, then run unless safe mode blocks a high-risk command.
    /// Never fails: timeouts and spawn errors come back as result fields.
    pub async fn execute_safely(&self, command: &str, policy: &ExecutionPolicy) -> ExecutionResult {
        let analysis = analyze_command(command);

        if analysis.risk_level == RiskLevel::High && policy.safe_mode {
            warn!("Blocked high-risk command in safe mode: {}", command);
            return ExecutionResult::blocked(analysis);
        }

        info!(
            "Executing command (risk={}, timeout={}s)",
            analysis.risk_level,
            policy.timeout.as_secs()
        );
        match self.shell.run(command, policy.timeout).await {
            ShellOutcome::Completed(out) => {
                debug!("Command exited with {}", out.exit_code);
                let output = if out.stdout.is_empty() { out.stderr } else { out.stdout };
                ExecutionResult {
                    executed: true,
                    status: ExecutionStatus::Completed,
                    output,
                    return_code: Some(out.exit_code),
                    analysis,
                }
            }
            ShellOutcome::TimedOut => {
                warn!("Command timed out after {}s: {}", policy.timeout.as_secs(), command);
                ExecutionResult {
                    executed: false,
                    status: ExecutionStatus::TimedOut,
                    output: "Command timed out".to_string(),
                    return_code: None,
                    analysis,
                }
            }
            ShellOutcome::Failed(message) => {
                warn!("Command failed to run: {}", message);
                ExecutionResult {
                    executed: false,
                    status: ExecutionStatus::Failed,
                    output: message,
                    return_code: None,
                    analysis,
                }
            }
        }
    }
}
