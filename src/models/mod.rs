// Domain models: engine snapshots decoded from API payloads, and metric records

mod container;
mod info;
mod inspect;
mod metric;
mod stats;
mod swarm;

pub use container::{
    ContainerSnapshot, MountPoint, NetworkEndpoint, PortBinding, SummaryHostConfig,
    SummaryNetworkSettings,
};
pub use info::{ClusterSummary, EngineInfo, HostInfo, ServerVersion, SwarmSummary};
pub use inspect::{HealthState, InspectHostConfig, InspectSnapshot, InspectState, NodeAffinity};
pub use metric::{MetricKind, MetricRecord, MetricValue};
pub use stats::{
    BlkioEntry, BlkioStats, CpuStats, CpuUsage, InterfaceStats, MemoryStats, PidsStats, Platform,
    StatsSnapshot, StorageStats, ThrottlingData,
};
pub use swarm::{
    EndpointSpec, HealthcheckSpec, ManagerStatus, NodeDescription, NodeEngine, NodePlatform,
    NodeSpec, NodeStatus, ObjectVersion, ReplicatedSpec, STACK_NAMESPACE_LABEL, ServiceEndpoint,
    ServiceMode, ServiceModeSpec, ServiceSpec, SwarmNode, SwarmService, SwarmTask,
    TaskContainerSpec, TaskContainerStatus, TaskSpec, TaskStatus, UpdateStatus,
};

use serde::{Deserialize, Deserializer};

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Epoch seconds of an RFC 3339 timestamp.
pub fn epoch_seconds(ts: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|t| t.timestamp())
}
