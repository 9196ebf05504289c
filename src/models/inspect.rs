// Container inspection data (`GET /containers/{id}/json`)

use super::null_default;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InspectSnapshot {
    pub restart_count: i64,
    #[serde(deserialize_with = "null_default")]
    pub platform: String,
    #[serde(deserialize_with = "null_default")]
    pub driver: String,
    pub host_config: InspectHostConfig,
    pub state: InspectState,
    /// Present when the container was scheduled onto a swarm node.
    pub node: Option<NodeAffinity>,
}

/// Resource limits and cgroup knobs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InspectHostConfig {
    pub cpu_shares: i64,
    pub nano_cpus: i64,
    pub cpu_period: i64,
    pub cpu_quota: i64,
    pub cpu_realtime_period: i64,
    pub cpu_realtime_runtime: i64,
    pub blkio_weight: u16,
    pub kernel_memory: i64,
    pub memory_reservation: i64,
    pub memory_swap: i64,
    pub memory_swappiness: Option<i64>,
    #[serde(deserialize_with = "null_default")]
    pub cgroup_parent: String,
    pub cpu_count: i64,
    #[serde(rename = "IOMaximumIOps")]
    pub io_maximum_iops: u64,
    #[serde(rename = "IOMaximumBandwidth")]
    pub io_maximum_bandwidth: u64,
    #[serde(deserialize_with = "null_default")]
    pub isolation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InspectState {
    pub pid: i64,
    #[serde(deserialize_with = "null_default")]
    pub finished_at: String,
    pub health: Option<HealthState>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HealthState {
    pub failing_streak: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodeAffinity {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub addr: String,
    pub memory: i64,
    #[serde(deserialize_with = "null_default")]
    pub labels: HashMap<String, String>,
}
