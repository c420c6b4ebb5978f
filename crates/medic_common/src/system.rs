//! Host facts fed into prompts and scoring.

use serde::{Deserialize, Serialize};

/// Static facts about the machine being diagnosed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub platform: String,
    pub hostname: String,
    pub kernel: String,
    pub arch: String,
    /// os-release PRETTY_NAME, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro: Option<String>,
    /// os-release ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro_id: Option<String>,
    /// os-release ID_LIKE, space separated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro_like: Option<String>,
}

impl SystemInfo {
    /// Ubuntu or a derivative (Mint, Pop!_OS, ...)
    pub fn is_ubuntu_like(&self) -> bool {
        [&self.distro, &self.distro_id, &self.distro_like]
            .iter()
            .filter_map(|field| field.as_deref())
            .any(|value| value.to_lowercase().contains("ubuntu"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnsStatus {
    Working,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    Configured,
    Missing,
    Unknown,
}

/// Point-in-time connectivity snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connectivity {
    pub dns: DnsStatus,
    pub gateway: GatewayStatus,
    /// Interfaces reporting `state UP`
    pub interfaces: usize,
}
