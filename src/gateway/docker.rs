// Docker engine access via bollard

use super::{GatewayError, RuntimeGateway};
use crate::config::RuntimeConfig;
use crate::models::{
    ContainerSnapshot, EngineInfo, HostInfo, InspectSnapshot, ServerVersion, StatsSnapshot,
    SwarmNode, SwarmService, SwarmTask,
};
use async_trait::async_trait;
use bollard::query_parameters::{
    InspectContainerOptions, ListContainersOptions, ListNodesOptions, ListServicesOptions,
    ListTasksOptions, StatsOptions,
};
use bollard::{ClientVersion, Docker};
use futures_util::StreamExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::instrument;

pub struct DockerGateway {
    docker: Docker,
}

impl DockerGateway {
    /// Connects over the unix socket. Without an API version override the
    /// client negotiates the highest version both sides support.
    pub async fn connect(config: &RuntimeConfig) -> anyhow::Result<Self> {
        let docker = match config.api_version.as_deref() {
            Some(v) => Docker::connect_with_unix(
                &config.socket_path,
                config.timeout_secs,
                &parse_api_version(v)?,
            )?,
            None => Docker::connect_with_unix(
                &config.socket_path,
                config.timeout_secs,
                bollard::API_DEFAULT_VERSION,
            )?
            .negotiate_version()
            .await?,
        };
        let v = docker.client_version();
        tracing::debug!(
            api_version = %format!("{}.{}", v.major_version, v.minor_version),
            socket = %config.socket_path,
            "docker client ready"
        );
        Ok(Self { docker })
    }

    fn client_version(&self) -> String {
        let v = self.docker.client_version();
        format!("{}.{}", v.major_version, v.minor_version)
    }
}

/// Parses a forced API version such as `1.41`.
pub fn parse_api_version(s: &str) -> anyhow::Result<ClientVersion> {
    let (major, minor) = s
        .trim()
        .trim_start_matches('v')
        .split_once('.')
        .ok_or_else(|| anyhow::anyhow!("api version must look like MAJOR.MINOR, got {:?}", s))?;
    Ok(ClientVersion {
        major_version: major.parse()?,
        minor_version: minor.parse()?,
    })
}

/// Re-reads an engine payload through its wire form into our snapshot types.
fn decode<S, T>(what: &'static str, payload: &S) -> Result<T, GatewayError>
where
    S: Serialize,
    T: DeserializeOwned,
{
    serde_json::to_value(payload)
        .and_then(serde_json::from_value)
        .map_err(|source| GatewayError::Decode { what, source })
}

#[async_trait]
impl RuntimeGateway for DockerGateway {
    #[instrument(skip(self), fields(repo = "docker", operation = "list_containers"))]
    async fn list_containers(
        &self,
        include_all: bool,
        since: Option<&str>,
    ) -> Result<Vec<ContainerSnapshot>, GatewayError> {
        let mut filters = HashMap::new();
        if let Some(since) = since {
            filters.insert("since".to_string(), vec![since.to_string()]);
        }
        let options = ListContainersOptions {
            all: include_all,
            size: true,
            filters: Some(filters),
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(options)).await?;
        decode("container list", &containers)
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "container_stats"))]
    async fn container_stats(&self, id: &str) -> Result<StatsSnapshot, GatewayError> {
        let options = StatsOptions {
            stream: false,
            ..Default::default()
        };
        let mut stream = self.docker.stats(id, Some(options));
        match stream.next().await {
            Some(Ok(s)) => decode("stats", &s),
            Some(Err(e)) => Err(e.into()),
            None => Err(GatewayError::NoSample(id.to_string())),
        }
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "container_inspect"))]
    async fn container_inspect(&self, id: &str) -> Result<InspectSnapshot, GatewayError> {
        let inspect = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await?;
        decode("inspect", &inspect)
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "list_nodes"))]
    async fn list_nodes(&self) -> Result<Vec<SwarmNode>, GatewayError> {
        let nodes = self.docker.list_nodes(None::<ListNodesOptions>).await?;
        decode("node list", &nodes)
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "list_services"))]
    async fn list_services(&self) -> Result<Vec<SwarmService>, GatewayError> {
        let services = self.docker.list_services(None::<ListServicesOptions>).await?;
        decode("service list", &services)
    }

    #[instrument(skip(self, service_ids), fields(repo = "docker", operation = "list_tasks", services = service_ids.len()))]
    async fn list_tasks(&self, service_ids: &[String]) -> Result<Vec<SwarmTask>, GatewayError> {
        let mut filters = HashMap::new();
        if !service_ids.is_empty() {
            filters.insert("service".to_string(), service_ids.to_vec());
        }
        let options = ListTasksOptions {
            filters: Some(filters),
            ..Default::default()
        };
        let tasks = self.docker.list_tasks(Some(options)).await?;
        decode("task list", &tasks)
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "host_info"))]
    async fn host_info(&self) -> Result<HostInfo, GatewayError> {
        let info = self.docker.info().await?;
        let engine: EngineInfo = decode("info", &info)?;
        let server = match self.docker.version().await {
            Ok(v) => decode::<_, ServerVersion>("version", &v)
                .inspect_err(|e| tracing::debug!(error = %e, "server version unreadable"))
                .ok(),
            Err(e) => {
                tracing::debug!(error = %e, operation = "version", "server version unavailable");
                None
            }
        };
        Ok(HostInfo {
            engine,
            server,
            client_version: self.client_version(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_api_version_accepts_major_minor() {
        let v = parse_api_version("1.41").unwrap();
        assert_eq!((v.major_version, v.minor_version), (1, 41));
        let v = parse_api_version("v1.24").unwrap();
        assert_eq!((v.major_version, v.minor_version), (1, 24));
    }

    #[test]
    fn parse_api_version_rejects_garbage() {
        assert!(parse_api_version("latest").is_err());
        assert!(parse_api_version("1.x").is_err());
    }

    #[test]
    fn decode_container_summary() {
        let payload = json!([{
            "Id": "0123456789abcdef0123",
            "Names": ["/web"],
            "Image": "nginx@sha256:abcd",
            "ImageID": "sha256:ffff",
            "Command": "nginx -g daemon off;",
            "Created": 1_700_000_000,
            "State": "running",
            "Status": "Up 2 hours",
            "Labels": {"com.example.team": "web"},
            "SizeRw": 12,
            "HostConfig": {"NetworkMode": "bridge"},
            "NetworkSettings": {"Networks": {"bridge": {
                "IPAddress": "172.17.0.2", "Gateway": "172.17.0.1", "GlobalIPv6Address": ""
            }}},
            "Ports": [{"IP": "0.0.0.0", "PrivatePort": 80, "PublicPort": 8080, "Type": "tcp"}],
            "Mounts": null
        }]);
        let list: Vec<ContainerSnapshot> = decode("container list", &payload).unwrap();
        let c = &list[0];
        assert_eq!(c.short_id(), "0123456789ab");
        assert_eq!(c.image_short(), "nginx");
        assert_eq!(c.name(), "web");
        assert_eq!(c.network_mode(), Some("bridge"));
        assert_eq!(c.size_rw, Some(12));
        assert_eq!(c.size_root_fs, None);
        assert!(c.mounts.is_empty());
        assert_eq!(c.ports_display(), "0.0.0.0:8080->80/tcp");
        assert_eq!(
            c.network_settings.as_ref().unwrap().networks["bridge"].ip_address,
            "172.17.0.2"
        );
    }

    #[test]
    fn decode_stats_payload() {
        let payload = json!({
            "read": "2024-01-01T00:00:01Z",
            "preread": "2024-01-01T00:00:00Z",
            "cpu_stats": {
                "cpu_usage": {"total_usage": 200, "percpu_usage": [100, 100]},
                "system_cpu_usage": 1000,
                "online_cpus": 2,
                "throttling_data": {"periods": 5, "throttled_periods": 1, "throttled_time": 9}
            },
            "precpu_stats": {"cpu_usage": {"total_usage": 100}, "system_cpu_usage": 500},
            "memory_stats": {"usage": 1000, "limit": 4000, "stats": {"cache": 200}},
            "networks": {"eth0": {"rx_bytes": 1, "tx_bytes": 2}},
            "blkio_stats": {"io_service_bytes_recursive": null},
            "pids_stats": {"current": 3}
        });
        let s: StatsSnapshot = decode("stats", &payload).unwrap();
        assert_eq!(s.cpu_stats.cpu_usage.percpu_usage.len(), 2);
        assert_eq!(s.cpu_stats.throttling_data.throttled_time, 9);
        assert_eq!(s.memory_stats.stats.get("cache"), Some(&200));
        assert!(s.blkio_stats.io_service_bytes_recursive.is_empty());
        assert_eq!(s.platform(), crate::models::Platform::Unix);
    }

    #[test]
    fn decode_rejects_malformed_payload() {
        let payload = json!({"cpu_stats": {"system_cpu_usage": "lots"}});
        let err = decode::<_, StatsSnapshot>("stats", &payload).unwrap_err();
        assert!(matches!(err, GatewayError::Decode { what: "stats", .. }));
    }

    #[test]
    fn decode_service_modes() {
        let payload = json!([
            {"ID": "s1", "Spec": {"Name": "api", "Mode": {"Replicated": {"Replicas": 3}},
                "Labels": {"com.docker.stack.namespace": "payments"}}},
            {"ID": "s2", "Spec": {"Name": "agent", "Mode": {"Global": {}}}}
        ]);
        let services: Vec<SwarmService> = decode("service list", &payload).unwrap();
        assert_eq!(
            services[0].mode(),
            Some(crate::models::ServiceMode::Replicated(3))
        );
        assert_eq!(services[0].stack(), Some("payments"));
        assert_eq!(services[1].mode(), Some(crate::models::ServiceMode::Global));
    }
}
