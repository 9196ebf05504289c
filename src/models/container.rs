// Container list-time summary

use super::null_default;
use serde::Deserialize;
use std::collections::HashMap;

/// One entry of the engine's container list (`GET /containers/json`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerSnapshot {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub names: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub image: String,
    #[serde(rename = "ImageID", deserialize_with = "null_default")]
    pub image_id: String,
    #[serde(deserialize_with = "null_default")]
    pub command: String,
    /// Creation time, epoch seconds.
    pub created: i64,
    #[serde(deserialize_with = "null_default")]
    pub state: String,
    #[serde(deserialize_with = "null_default")]
    pub status: String,
    #[serde(deserialize_with = "null_default")]
    pub labels: HashMap<String, String>,
    pub size_rw: Option<i64>,
    pub size_root_fs: Option<i64>,
    pub host_config: Option<SummaryHostConfig>,
    pub network_settings: Option<SummaryNetworkSettings>,
    #[serde(deserialize_with = "null_default")]
    pub ports: Vec<PortBinding>,
    #[serde(deserialize_with = "null_default")]
    pub mounts: Vec<MountPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SummaryHostConfig {
    #[serde(deserialize_with = "null_default")]
    pub network_mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SummaryNetworkSettings {
    #[serde(deserialize_with = "null_default")]
    pub networks: HashMap<String, NetworkEndpoint>,
}

/// Address info for one attached network.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NetworkEndpoint {
    #[serde(rename = "IPAddress", deserialize_with = "null_default")]
    pub ip_address: String,
    #[serde(rename = "Gateway", deserialize_with = "null_default")]
    pub gateway: String,
    #[serde(rename = "GlobalIPv6Address", deserialize_with = "null_default")]
    pub global_ipv6_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PortBinding {
    #[serde(rename = "IP")]
    pub ip: Option<String>,
    #[serde(rename = "PrivatePort")]
    pub private_port: u16,
    #[serde(rename = "PublicPort")]
    pub public_port: Option<u16>,
    #[serde(rename = "Type", deserialize_with = "null_default")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MountPoint {
    #[serde(deserialize_with = "null_default")]
    pub source: String,
    #[serde(deserialize_with = "null_default")]
    pub destination: String,
    #[serde(rename = "RW")]
    pub rw: bool,
}

impl ContainerSnapshot {
    /// First 12 characters of the ID, the form the engine CLI prints.
    pub fn short_id(&self) -> &str {
        self.id.get(..12).unwrap_or(&self.id)
    }

    /// Image reference without its `@digest` suffix.
    pub fn image_short(&self) -> &str {
        self.image.split('@').next().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.names
            .first()
            .map(|n| n.trim_start_matches('/'))
            .unwrap_or_else(|| self.short_id())
    }

    pub fn network_mode(&self) -> Option<&str> {
        self.host_config.as_ref().map(|h| h.network_mode.as_str())
    }

    /// e.g. `0.0.0.0:8080->80/tcp, 443/tcp`
    pub fn ports_display(&self) -> String {
        self.ports
            .iter()
            .map(|p| match (p.ip.as_deref(), p.public_port) {
                (Some(ip), Some(public)) => {
                    format!("{}:{}->{}/{}", ip, public, p.private_port, p.kind)
                }
                (None, Some(public)) => format!("{}->{}/{}", public, p.private_port, p.kind),
                _ => format!("{}/{}", p.private_port, p.kind),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// e.g. `/srv/data:/data:rw`
    pub fn mounts_display(&self) -> String {
        self.mounts
            .iter()
            .map(|m| {
                format!(
                    "{}:{}:{}",
                    m.source,
                    m.destination,
                    if m.rw { "rw" } else { "ro" }
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
