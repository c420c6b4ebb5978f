//! Host facts and a connectivity snapshot for prompts and scoring.

use crate::executor::{ShellOutcome, ShellRunner};
use medic_common::{Connectivity, DnsStatus, GatewayStatus, SystemInfo};
use std::fs;
use std::time::Duration;
use sysinfo::System;
use tracing::debug;

const OS_RELEASE: &str = "/etc/os-release";

/// Host resolved to decide whether DNS works
pub const DNS_PROBE_HOST: &str = "google.com";

/// Per-command limit for connectivity checks
pub const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(3);

fn platform_name() -> String {
    match std::env::consts::OS {
        "linux" => "Linux".to_string(),
        "macos" => "Darwin".to_string(),
        "windows" => "Windows".to_string(),
        other => other.to_string(),
    }
}

/// PRETTY_NAME, ID and ID_LIKE from os-release content
pub fn parse_os_release(content: &str) -> (Option<String>, Option<String>, Option<String>) {
    let mut pretty = None;
    let mut id = None;
    let mut id_like = None;

    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
        match key.trim() {
            "PRETTY_NAME" => pretty = Some(value),
            "ID" => id = Some(value),
            "ID_LIKE" => id_like = Some(value),
            _ => {}
        }
    }
    (pretty, id, id_like)
}

/// Collect static facts about this machine
pub fn collect() -> SystemInfo {
    let platform = platform_name();
    let mut info = SystemInfo {
        hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
        kernel: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
        arch: std::env::consts::ARCH.to_string(),
        platform,
        ..Default::default()
    };

    if info.platform == "Linux" {
        match fs::read_to_string(OS_RELEASE) {
            Ok(content) => {
                let (pretty, id, id_like) = parse_os_release(&content);
                info.distro = pretty.or_else(System::name);
                info.distro_id = id;
                info.distro_like = id_like;
            }
            Err(e) => {
                debug!("Cannot read {}: {}", OS_RELEASE, e);
                info.distro = Some("Unknown Linux".to_string());
            }
        }
    }
    info
}

/// DNS, default gateway and up interfaces, all via the given shell
pub async fn check_connectivity(shell: &dyn ShellRunner) -> Connectivity {
    let dns = match shell
        .run(&format!("getent hosts {}", DNS_PROBE_HOST), CONNECTIVITY_TIMEOUT)
        .await
    {
        ShellOutcome::Completed(out) if out.exit_code == 0 && !out.stdout.trim().is_empty() => {
            DnsStatus::Working
        }
        _ => DnsStatus::Failed,
    };

    let gateway = match shell.run("ip route", CONNECTIVITY_TIMEOUT).await {
        ShellOutcome::Completed(out) if out.exit_code == 0 => {
            if out.stdout.contains("default") {
                GatewayStatus::Configured
            } else {
                GatewayStatus::Missing
            }
        }
        _ => GatewayStatus::Unknown,
    };

    let interfaces = match shell.run("ip link", CONNECTIVITY_TIMEOUT).await {
        ShellOutcome::Completed(out) => out.stdout.matches("state UP").count(),
        _ => 0,
    };

    let snapshot = Connectivity {
        dns,
        gateway,
        interfaces,
    };
    debug!("Connectivity: {:?}", snapshot);
    snapshot
}
