// Runtime client gateway: the engine operations a sampling pass consumes

mod docker;

pub use docker::{DockerGateway, parse_api_version};

use crate::models::{
    ContainerSnapshot, HostInfo, InspectSnapshot, StatsSnapshot, SwarmNode, SwarmService,
    SwarmTask,
};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("docker engine: {0}")]
    Engine(#[from] bollard::errors::Error),
    #[error("malformed {what} payload: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("stats for container {0} ended without a sample")]
    NoSample(String),
    #[error("{0}")]
    Unavailable(String),
}

/// Request/response access to the container engine. Each call returns within
/// the gateway's request timeout.
#[async_trait]
pub trait RuntimeGateway: Send + Sync {
    async fn list_containers(
        &self,
        include_all: bool,
        since: Option<&str>,
    ) -> Result<Vec<ContainerSnapshot>, GatewayError>;

    /// One-shot stats; the payload embeds the previous sample.
    async fn container_stats(&self, id: &str) -> Result<StatsSnapshot, GatewayError>;

    async fn container_inspect(&self, id: &str) -> Result<InspectSnapshot, GatewayError>;

    async fn list_nodes(&self) -> Result<Vec<SwarmNode>, GatewayError>;

    async fn list_services(&self) -> Result<Vec<SwarmService>, GatewayError>;

    /// Tasks of the given services; an empty slice lists every task.
    async fn list_tasks(&self, service_ids: &[String]) -> Result<Vec<SwarmTask>, GatewayError>;

    async fn host_info(&self) -> Result<HostInfo, GatewayError>;
}
