// Shared test helpers: an in-memory gateway and snapshot builders

#![allow(dead_code)]

use async_trait::async_trait;
use dockmetrics::gateway::{GatewayError, RuntimeGateway};
use dockmetrics::models::*;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Canned engine responses. Every call is answered from memory.
#[derive(Default)]
pub struct FakeGateway {
    pub containers: Vec<ContainerSnapshot>,
    pub stats: HashMap<String, StatsSnapshot>,
    pub inspects: HashMap<String, InspectSnapshot>,
    pub failing_stats: HashSet<String>,
    pub failing_inspects: HashSet<String>,
    pub fail_container_list: bool,
    pub host: Option<HostInfo>,
    pub nodes: Vec<SwarmNode>,
    pub services: Vec<SwarmService>,
    pub tasks: Vec<SwarmTask>,
    pub fail_nodes: bool,
    pub fail_services: bool,
    pub fail_tasks: bool,
    /// Delay inside each stats call so overlapping units are observable.
    pub stats_delay: Duration,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub inspect_calls: AtomicUsize,
    pub task_filters: Mutex<Vec<Vec<String>>>,
}

impl FakeGateway {
    /// Registers a container with unix stats and a blank inspect.
    pub fn with_container(mut self, c: ContainerSnapshot) -> Self {
        self.stats.insert(c.id.clone(), unix_stats());
        self.inspects.insert(c.id.clone(), InspectSnapshot::default());
        self.containers.push(c);
        self
    }

    pub fn with_swarm(mut self) -> Self {
        let mut host = self.host.take().unwrap_or_else(host_info);
        host.engine.swarm.local_node_state = "active".into();
        self.host = Some(host);
        self
    }

    fn unavailable(what: &str) -> GatewayError {
        GatewayError::Unavailable(format!("{} failed", what))
    }
}

#[async_trait]
impl RuntimeGateway for FakeGateway {
    async fn list_containers(
        &self,
        _include_all: bool,
        _since: Option<&str>,
    ) -> Result<Vec<ContainerSnapshot>, GatewayError> {
        if self.fail_container_list {
            return Err(Self::unavailable("container list"));
        }
        Ok(self.containers.clone())
    }

    async fn container_stats(&self, id: &str) -> Result<StatsSnapshot, GatewayError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.stats_delay.is_zero() {
            tokio::time::sleep(self.stats_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_stats.contains(id) {
            return Err(Self::unavailable("stats"));
        }
        self.stats
            .get(id)
            .cloned()
            .ok_or_else(|| GatewayError::NoSample(id.to_string()))
    }

    async fn container_inspect(&self, id: &str) -> Result<InspectSnapshot, GatewayError> {
        self.inspect_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_inspects.contains(id) {
            return Err(Self::unavailable("inspect"));
        }
        self.inspects
            .get(id)
            .cloned()
            .ok_or_else(|| Self::unavailable("inspect"))
    }

    async fn list_nodes(&self) -> Result<Vec<SwarmNode>, GatewayError> {
        if self.fail_nodes {
            return Err(Self::unavailable("node list"));
        }
        Ok(self.nodes.clone())
    }

    async fn list_services(&self) -> Result<Vec<SwarmService>, GatewayError> {
        if self.fail_services {
            return Err(Self::unavailable("service list"));
        }
        Ok(self.services.clone())
    }

    async fn list_tasks(&self, service_ids: &[String]) -> Result<Vec<SwarmTask>, GatewayError> {
        self.task_filters
            .lock()
            .unwrap()
            .push(service_ids.to_vec());
        if self.fail_tasks {
            return Err(Self::unavailable("task list"));
        }
        Ok(self
            .tasks
            .iter()
            .filter(|t| service_ids.is_empty() || service_ids.contains(&t.service_id))
            .cloned()
            .collect())
    }

    async fn host_info(&self) -> Result<HostInfo, GatewayError> {
        self.host
            .clone()
            .ok_or_else(|| Self::unavailable("host info"))
    }
}

pub fn container(id: &str, name: &str) -> ContainerSnapshot {
    ContainerSnapshot {
        id: id.to_string(),
        names: vec![format!("/{}", name)],
        image: "nginx:1.27@sha256:abcdef".into(),
        image_id: "sha256:0123".into(),
        command: "nginx -g 'daemon off;'".into(),
        created: 1_700_000_000,
        state: "running".into(),
        status: "Up 2 hours".into(),
        ..Default::default()
    }
}

/// Two consecutive unix samples: 200 of 1000 system ticks over 2 cores.
pub fn unix_stats() -> StatsSnapshot {
    StatsSnapshot {
        cpu_stats: CpuStats {
            cpu_usage: CpuUsage {
                total_usage: 300,
                percpu_usage: vec![150, 150],
                ..Default::default()
            },
            system_cpu_usage: 2000,
            online_cpus: 2,
            ..Default::default()
        },
        precpu_stats: CpuStats {
            cpu_usage: CpuUsage {
                total_usage: 100,
                ..Default::default()
            },
            system_cpu_usage: 1000,
            ..Default::default()
        },
        memory_stats: MemoryStats {
            usage: 600,
            limit: 1000,
            stats: HashMap::from([("cache".to_string(), 100)]),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn windows_stats() -> StatsSnapshot {
    StatsSnapshot {
        os_type: Some("windows".into()),
        read: Some("2024-01-01T00:00:01Z".into()),
        preread: Some("2024-01-01T00:00:00Z".into()),
        num_procs: 2,
        cpu_stats: CpuStats {
            cpu_usage: CpuUsage {
                total_usage: 15_000_000,
                ..Default::default()
            },
            ..Default::default()
        },
        precpu_stats: CpuStats {
            cpu_usage: CpuUsage {
                total_usage: 5_000_000,
                ..Default::default()
            },
            ..Default::default()
        },
        memory_stats: MemoryStats {
            privateworkingset: 4096,
            commitbytes: 8192,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn host_info() -> HostInfo {
    HostInfo {
        engine: EngineInfo {
            id: "ENGINE".into(),
            name: "docker-host-1".into(),
            containers: 3,
            containers_running: 2,
            containers_stopped: 1,
            ..Default::default()
        },
        server: None,
        client_version: "1.47".into(),
    }
}

pub fn node(id: &str, hostname: &str, state: &str) -> SwarmNode {
    SwarmNode {
        id: id.to_string(),
        description: NodeDescription {
            hostname: hostname.to_string(),
            ..Default::default()
        },
        status: NodeStatus {
            state: state.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn task(id: &str, service: &str, node: &str, state: &str, desired: &str) -> SwarmTask {
    SwarmTask {
        id: id.to_string(),
        service_id: service.to_string(),
        node_id: node.to_string(),
        desired_state: desired.to_string(),
        status: TaskStatus {
            state: state.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn service(id: &str, name: &str, stack: Option<&str>, mode: ServiceModeSpec) -> SwarmService {
    let mut labels = HashMap::new();
    if let Some(stack) = stack {
        labels.insert(STACK_NAMESPACE_LABEL.to_string(), stack.to_string());
    }
    SwarmService {
        id: id.to_string(),
        spec: ServiceSpec {
            name: name.to_string(),
            labels,
            mode,
        },
        ..Default::default()
    }
}

pub fn replicated_service(id: &str, name: &str, replicas: u64, stack: Option<&str>) -> SwarmService {
    service(
        id,
        name,
        stack,
        ServiceModeSpec {
            replicated: Some(ReplicatedSpec {
                replicas: Some(replicas),
            }),
            global: None,
        },
    )
}

pub fn global_service(id: &str, name: &str, stack: Option<&str>) -> SwarmService {
    service(
        id,
        name,
        stack,
        ServiceModeSpec {
            replicated: None,
            global: Some(serde_json::json!({})),
        },
    )
}
