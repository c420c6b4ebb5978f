//! Read-only probing of idea checks.
//!
//! A check is probed only when it names a whitelisted diagnostic tool and
//! its own risk analysis is low. Results are attached to the idea as
//! evidence keyed by the check string.

use crate::executor::{analyze_command, ShellOutcome, ShellRunner};
use medic_common::{Idea, ProbeEvidence, RiskLevel};
use std::time::Duration;
use tracing::{debug, info};

/// Tools a probe may invoke, matched as substrings of the check
pub const PROBE_WHITELIST: [&str; 8] = [
    "nmcli",
    "ip addr",
    "ip route",
    "rfkill list",
    "systemctl status",
    "journalctl",
    "dig",
    "nslookup",
];

/// Only this many leading checks of an idea are considered
pub const MAX_CHECKS_PER_IDEA: usize = 3;

pub const MAX_STDOUT_CHARS: usize = 500;
pub const MAX_STDERR_CHARS: usize = 200;

/// Default probe wall-clock limit
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Whitelisted and low risk
pub fn is_probe_allowed(check: &str) -> bool {
    PROBE_WHITELIST.iter().any(|tool| check.contains(tool))
        && analyze_command(check).risk_level == RiskLevel::Low
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Probe one check and describe the outcome as evidence
pub async fn probe_check(shell: &dyn ShellRunner, check: &str, timeout: Duration) -> ProbeEvidence {
    match shell.run(check, timeout).await {
        ShellOutcome::Completed(out) => ProbeEvidence::Output {
            stdout: truncate_chars(&out.stdout, MAX_STDOUT_CHARS),
            stderr: truncate_chars(&out.stderr, MAX_STDERR_CHARS),
            returncode: out.exit_code,
        },
        ShellOutcome::TimedOut => ProbeEvidence::Error {
            error: "Probe timed out".to_string(),
        },
        ShellOutcome::Failed(message) => ProbeEvidence::Error { error: message },
    }
}

/// Probe the allowed checks among an idea's first three, in order.
/// Returns how many checks were probed.
pub async fn probe_idea(shell: &dyn ShellRunner, idea: &mut Idea, timeout: Duration) -> usize {
    let checks: Vec<String> = idea
        .checks
        .iter()
        .take(MAX_CHECKS_PER_IDEA)
        .filter(|check| {
            let allowed = is_probe_allowed(check);
            if !allowed {
                debug!("Probe skipped (not whitelisted or not low risk): {}", check);
            }
            allowed
        })
        .cloned()
        .collect();

    for check in &checks {
        let evidence = probe_check(shell, check, timeout).await;
        idea.attach_evidence(check.clone(), evidence);
    }
    checks.len()
}

/// Probe every idea sequentially
pub async fn probe_ideas(shell: &dyn ShellRunner, ideas: &mut [Idea], timeout: Duration) -> usize {
    let mut probed = 0;
    for idea in ideas.iter_mut() {
        probed += probe_idea(shell, idea, timeout).await;
    }
    info!("Probed {} checks across {} ideas", probed, ideas.len());
    probed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ShellOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the command back and records it
    #[derive(Default)]
    struct EchoShell {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ShellRunner for EchoShell {
        async fn run(&self, command: &str, _timeout: Duration) -> ShellOutcome {
            self.seen.lock().unwrap().push(command.to_string());
            if command.contains("journalctl") {
                return ShellOutcome::TimedOut;
            }
            ShellOutcome::Completed(ShellOutput {
                stdout: format!("out:{}", command).repeat(100),
                stderr: "e".repeat(1000),
                exit_code: 0,
            })
        }
    }

    #[test]
    fn test_allowed_checks() {
        assert!(is_probe_allowed("nmcli dev status"));
        assert!(is_probe_allowed("ip addr show wlan0"));
        assert!(is_probe_allowed("dig example.com"));
        assert!(!is_probe_allowed("cat /etc/shadow"));
        // Whitelisted but escalated by sudo
        assert!(!is_probe_allowed("sudo journalctl -b"));
        assert!(!is_probe_allowed("nmcli con delete home && rm -rf /tmp/x"));
    }

    #[tokio::test]
    async fn test_probe_whitelist_and_limits() {
        let shell = EchoShell::default();
        let mut idea = Idea::new("test", "dns", "x").with_checks([
            "nmcli dev status",
            "cat /etc/shadow",
            "ip addr",
            "ip route",
        ]);

        let probed = probe_idea(&shell, &mut idea, PROBE_TIMEOUT).await;
        assert_eq!(probed, 2);
        assert_eq!(
            *shell.seen.lock().unwrap(),
            vec!["nmcli dev status".to_string(), "ip addr".to_string()]
        );
        assert!(!idea.evidence.keys().any(|k| k.contains("/etc/shadow")));
        // Fourth check is beyond the window
        assert!(!idea.evidence.contains_key("ip route"));

        match &idea.evidence["ip addr"] {
            ProbeEvidence::Output {
                stdout,
                stderr,
                returncode,
            } => {
                assert_eq!(stdout.chars().count(), MAX_STDOUT_CHARS);
                assert_eq!(stderr.chars().count(), MAX_STDERR_CHARS);
                assert_eq!(*returncode, 0);
            }
            other => panic!("unexpected evidence: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_timeout_is_error_evidence() {
        let shell = EchoShell::default();
        let mut ideas = vec![Idea::new("h", "boot", "w").with_checks(["journalctl -b -p err"])];
        assert_eq!(probe_ideas(&shell, &mut ideas, PROBE_TIMEOUT).await, 1);
        assert_eq!(
            ideas[0].evidence["journalctl -b -p err"],
            ProbeEvidence::Error {
                error: "Probe timed out".to_string()
            }
        );
    }
}
