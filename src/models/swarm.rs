// Swarm nodes, services and tasks

use super::null_default;
use serde::Deserialize;
use std::collections::HashMap;

/// Label carrying the stack a service was deployed with.
pub const STACK_NAMESPACE_LABEL: &str = "com.docker.stack.namespace";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ObjectVersion {
    pub index: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SwarmNode {
    #[serde(rename = "ID")]
    pub id: String,
    pub version: ObjectVersion,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub spec: NodeSpec,
    pub description: NodeDescription,
    pub status: NodeStatus,
    pub manager_status: Option<ManagerStatus>,
}

impl SwarmNode {
    pub fn is_down(&self) -> bool {
        self.status.state == "down"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodeSpec {
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub labels: HashMap<String, String>,
    #[serde(deserialize_with = "null_default")]
    pub role: String,
    #[serde(deserialize_with = "null_default")]
    pub availability: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodeDescription {
    #[serde(deserialize_with = "null_default")]
    pub hostname: String,
    pub platform: NodePlatform,
    pub engine: NodeEngine,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodePlatform {
    #[serde(deserialize_with = "null_default")]
    pub architecture: String,
    #[serde(rename = "OS", deserialize_with = "null_default")]
    pub os: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodeEngine {
    #[serde(deserialize_with = "null_default")]
    pub engine_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodeStatus {
    #[serde(deserialize_with = "null_default")]
    pub state: String,
    #[serde(deserialize_with = "null_default")]
    pub message: String,
    #[serde(deserialize_with = "null_default")]
    pub addr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ManagerStatus {
    pub leader: bool,
    #[serde(deserialize_with = "null_default")]
    pub reachability: String,
    #[serde(deserialize_with = "null_default")]
    pub addr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SwarmTask {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "ServiceID", deserialize_with = "null_default")]
    pub service_id: String,
    #[serde(rename = "NodeID", deserialize_with = "null_default")]
    pub node_id: String,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub desired_state: String,
    pub status: TaskStatus,
    pub spec: TaskSpec,
    #[serde(deserialize_with = "null_default")]
    pub labels: HashMap<String, String>,
    pub version: ObjectVersion,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskStatus {
    #[serde(deserialize_with = "null_default")]
    pub state: String,
    #[serde(deserialize_with = "null_default")]
    pub message: String,
    #[serde(deserialize_with = "null_default")]
    pub err: String,
    pub timestamp: Option<String>,
    pub container_status: Option<TaskContainerStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskContainerStatus {
    #[serde(rename = "ContainerID", deserialize_with = "null_default")]
    pub container_id: String,
    #[serde(rename = "PID")]
    pub pid: i64,
    #[serde(rename = "ExitCode")]
    pub exit_code: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskSpec {
    pub container_spec: Option<TaskContainerSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskContainerSpec {
    #[serde(deserialize_with = "null_default")]
    pub image: String,
    #[serde(deserialize_with = "null_default")]
    pub labels: HashMap<String, String>,
    pub healthcheck: Option<HealthcheckSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HealthcheckSpec {
    pub retries: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SwarmService {
    #[serde(rename = "ID")]
    pub id: String,
    pub version: ObjectVersion,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub spec: ServiceSpec,
    pub endpoint: ServiceEndpoint,
    pub update_status: Option<UpdateStatus>,
}

/// Scheduling mode of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    /// Fixed target replica count.
    Replicated(u64),
    /// One task per eligible node; no fixed target.
    Global,
}

impl ServiceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMode::Replicated(_) => "replicated",
            ServiceMode::Global => "global",
        }
    }
}

impl SwarmService {
    /// `None` for job modes and specs without a replica target.
    pub fn mode(&self) -> Option<ServiceMode> {
        let mode = &self.spec.mode;
        if let Some(replicas) = mode.replicated.as_ref().and_then(|r| r.replicas) {
            Some(ServiceMode::Replicated(replicas))
        } else if mode.global.is_some() {
            Some(ServiceMode::Global)
        } else {
            None
        }
    }

    pub fn stack(&self) -> Option<&str> {
        self.spec.labels.get(STACK_NAMESPACE_LABEL).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceSpec {
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub labels: HashMap<String, String>,
    pub mode: ServiceModeSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceModeSpec {
    pub replicated: Option<ReplicatedSpec>,
    /// Empty object in the payload; only its presence matters.
    pub global: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ReplicatedSpec {
    pub replicas: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceEndpoint {
    pub spec: EndpointSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EndpointSpec {
    #[serde(deserialize_with = "null_default")]
    pub mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UpdateStatus {
    #[serde(deserialize_with = "null_default")]
    pub state: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub message: String,
}
