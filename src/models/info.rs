// Engine-wide host info (`GET /info` + `GET /version`)

use super::null_default;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostInfo {
    pub engine: EngineInfo,
    /// `None` when the version call failed.
    pub server: Option<ServerVersion>,
    /// API version the client speaks, e.g. `1.47`.
    pub client_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EngineInfo {
    #[serde(rename = "ID", deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    pub containers: i64,
    pub containers_running: i64,
    pub containers_paused: i64,
    pub containers_stopped: i64,
    pub images: i64,
    #[serde(deserialize_with = "null_default")]
    pub kernel_version: String,
    #[serde(rename = "OSType", deserialize_with = "null_default")]
    pub os_type: String,
    #[serde(deserialize_with = "null_default")]
    pub architecture: String,
    pub n_goroutines: i64,
    #[serde(rename = "NCPU")]
    pub ncpu: i64,
    pub mem_total: i64,
    pub n_events_listener: i64,
    pub swap_limit: bool,
    pub memory_limit: bool,
    /// Daemon labels in `key=value` form.
    #[serde(deserialize_with = "null_default")]
    pub labels: Vec<String>,
    pub swarm: SwarmSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SwarmSummary {
    #[serde(rename = "NodeID", deserialize_with = "null_default")]
    pub node_id: String,
    #[serde(deserialize_with = "null_default")]
    pub node_addr: String,
    #[serde(deserialize_with = "null_default")]
    pub local_node_state: String,
    pub control_available: bool,
    #[serde(deserialize_with = "null_default")]
    pub error: String,
    pub nodes: Option<i64>,
    pub managers: Option<i64>,
    pub cluster: Option<ClusterSummary>,
}

impl SwarmSummary {
    pub fn is_active(&self) -> bool {
        self.local_node_state == "active"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ClusterSummary {
    #[serde(rename = "ID", deserialize_with = "null_default")]
    pub id: String,
    pub version: super::swarm::ObjectVersion,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServerVersion {
    #[serde(deserialize_with = "null_default")]
    pub version: String,
    #[serde(deserialize_with = "null_default")]
    pub go_version: String,
    #[serde(deserialize_with = "null_default")]
    pub api_version: String,
    #[serde(deserialize_with = "null_default")]
    pub git_commit: String,
    #[serde(deserialize_with = "null_default")]
    pub build_time: String,
}
