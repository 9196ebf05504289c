// Swarm topology: replica counts per service and service counts per stack.
// Pure functions over already-fetched nodes, tasks and services.

use crate::models::{
    HostInfo, MetricRecord, ServiceMode, SwarmNode, SwarmService, SwarmTask, epoch_seconds,
};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Replica counts of one service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicaCounts {
    /// Tasks observed `running` on a node that is not down.
    pub running: u64,
    /// Target for replicated services; tasks not desired `shutdown` for global ones.
    /// `None` when the service has neither mode.
    pub expected: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwarmAggregate {
    pub replicas: HashMap<String, ReplicaCounts>,
    /// Stack name → number of distinct services in it.
    pub stacks: BTreeMap<String, u64>,
}

impl SwarmAggregate {
    pub fn replicas_of(&self, service_id: &str) -> ReplicaCounts {
        self.replicas.get(service_id).copied().unwrap_or_default()
    }
}

pub fn aggregate(
    nodes: &[SwarmNode],
    tasks: &[SwarmTask],
    services: &[SwarmService],
) -> SwarmAggregate {
    let active_nodes: HashSet<&str> = nodes
        .iter()
        .filter(|n| !n.is_down())
        .map(|n| n.id.as_str())
        .collect();

    let mut running: HashMap<&str, u64> = HashMap::new();
    let mut not_shutdown: HashMap<&str, u64> = HashMap::new();
    for task in tasks {
        let service = task.service_id.as_str();
        if task.desired_state != "shutdown" {
            *not_shutdown.entry(service).or_default() += 1;
        }
        // Nodes missing from the list count as inactive.
        if active_nodes.contains(task.node_id.as_str()) && task.status.state == "running" {
            *running.entry(service).or_default() += 1;
        }
    }

    let mut replicas = HashMap::with_capacity(services.len());
    let mut stacks: BTreeMap<String, HashSet<&str>> = BTreeMap::new();
    for service in services {
        let id = service.id.as_str();
        let expected = service.mode().map(|mode| match mode {
            ServiceMode::Replicated(target) => target,
            ServiceMode::Global => not_shutdown.get(id).copied().unwrap_or(0),
        });
        replicas.insert(
            service.id.clone(),
            ReplicaCounts {
                running: running.get(id).copied().unwrap_or(0),
                expected,
            },
        );
        if let Some(stack) = service.stack() {
            stacks.entry(stack.to_string()).or_default().insert(id);
        }
    }

    SwarmAggregate {
        replicas,
        stacks: stacks
            .into_iter()
            .map(|(name, ids)| (name, ids.len() as u64))
            .collect(),
    }
}

fn set_timestamps(r: &mut MetricRecord, created: Option<&str>, updated: Option<&str>, now_ms: i64) {
    if let Some(created) = created.and_then(epoch_seconds) {
        r.set("createdAt", created);
        r.set("duration", now_ms - created * 1000);
    }
    r.set_opt("updatedAt", updated.and_then(epoch_seconds));
}

pub fn node_record(node: &SwarmNode, now_ms: i64) -> MetricRecord {
    let mut r = MetricRecord::new();
    r.set("nodeID", node.id.as_str());
    r.set("message", node.status.message.as_str());
    r.set("state", node.status.state.as_str());
    r.set("descHostname", node.description.hostname.as_str());
    r.set("engineVersion", node.description.engine.engine_version.as_str());
    r.set("platformArch", node.description.platform.architecture.as_str());
    r.set("platformOS", node.description.platform.os.as_str());
    set_timestamps(
        &mut r,
        node.created_at.as_deref(),
        node.updated_at.as_deref(),
        now_ms,
    );
    if let Some(manager) = &node.manager_status {
        r.set("managerStatusLeader", manager.leader);
        r.set("managerStatusReachability", manager.reachability.as_str());
        r.set("managerStatusAddr", manager.addr.as_str());
    }
    r.set("availability", node.spec.availability.as_str());
    r.set("name", node.spec.name.as_str());
    r.set("role", node.spec.role.as_str());
    r.set("versionIndex", node.version.index);
    r.merge_labels(&node.spec.labels);
    r
}

pub fn task_record(task: &SwarmTask, now_ms: i64) -> MetricRecord {
    let mut r = MetricRecord::new();
    r.set("taskID", task.id.as_str());
    r.set("nodeID", task.node_id.as_str());
    r.set("serviceID", task.service_id.as_str());
    r.set("name", task.name.as_str());
    r.set("desiredState", task.desired_state.as_str());
    r.set("state", task.status.state.as_str());
    r.set("message", task.status.message.as_str());
    r.set("error", task.status.err.as_str());
    r.set_opt(
        "statusTimestamp",
        task.status.timestamp.as_deref().and_then(epoch_seconds),
    );
    set_timestamps(
        &mut r,
        task.created_at.as_deref(),
        task.updated_at.as_deref(),
        now_ms,
    );
    r.set("versionIndex", task.version.index);
    if let Some(cs) = &task.status.container_status {
        r.set("containerID", cs.container_id.as_str());
        r.set("containerExitCode", cs.exit_code);
        r.set("containerPID", cs.pid);
    }
    if let Some(spec) = &task.spec.container_spec {
        r.set("image", spec.image.as_str());
        r.set("imageShort", spec.image.split('@').next().unwrap_or_default());
        if let Some(hc) = &spec.healthcheck {
            r.set("healthcheckRetries", hc.retries);
        }
        r.merge_labels(&spec.labels);
    }
    // Task labels override container-spec labels.
    r.merge_labels(&task.labels);
    r
}

pub fn service_record(service: &SwarmService, counts: ReplicaCounts, now_ms: i64) -> MetricRecord {
    let mut r = MetricRecord::new();
    r.set("serviceID", service.id.as_str());
    r.set("name", service.spec.name.as_str());
    set_timestamps(
        &mut r,
        service.created_at.as_deref(),
        service.updated_at.as_deref(),
        now_ms,
    );
    r.set("endpointMode", service.endpoint.spec.mode.as_str());
    if let Some(update) = &service.update_status {
        r.set_opt(
            "updateStatusCompletedAt",
            update.completed_at.as_deref().and_then(epoch_seconds),
        );
        r.set_opt(
            "updateStatusStartedAt",
            update.started_at.as_deref().and_then(epoch_seconds),
        );
        r.set("updateStatusMessage", update.message.as_str());
        r.set("updateStatusState", update.state.as_str());
    }
    r.set("versionIndex", service.version.index);
    if let Some(mode) = service.mode() {
        r.set("mode", mode.as_str());
        r.set("replicasCurrent", counts.running);
        r.set_opt("replicasExpected", counts.expected);
    }
    r.merge_labels(&service.spec.labels);
    r
}

pub fn stack_record(name: &str, services: u64) -> MetricRecord {
    let mut r = MetricRecord::new();
    r.set("name", name);
    r.set("services", services);
    r
}

/// Engine-wide counts, versions and the swarm summary.
pub fn host_record(info: &HostInfo, now_ms: i64) -> MetricRecord {
    let e = &info.engine;
    let mut r = MetricRecord::new();
    r.set("containers", e.containers);
    r.set("containersRunning", e.containers_running);
    r.set("containersPaused", e.containers_paused);
    r.set("containersStopped", e.containers_stopped);
    r.set("images", e.images);
    r.set("clientVersion", info.client_version.as_str());
    r.set("kernelVersion", e.kernel_version.as_str());
    r.set("osType", e.os_type.as_str());
    r.set("arch", e.architecture.as_str());
    r.set("nodeName", e.name.as_str());
    r.set("host", e.name.as_str());
    r.set("name", e.name.as_str());
    r.set("ID", e.id.as_str());
    r.set("goroutines", e.n_goroutines);
    r.set("cpus", e.ncpu);
    r.set("memTotal", e.mem_total);
    r.set("eventsListeners", e.n_events_listener);
    r.set("swapLimit", e.swap_limit);
    r.set("memLimit", e.memory_limit);

    let daemon_labels: HashMap<String, String> = e
        .labels
        .iter()
        .filter_map(|l| l.split_once('='))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    r.merge_labels(&daemon_labels);

    if let Some(server) = &info.server {
        r.set("serverVersion", server.version.as_str());
        r.set("serverGoVersion", server.go_version.as_str());
        r.set("serverApiVersion", server.api_version.as_str());
        r.set("serverGitCommit", server.git_commit.as_str());
        r.set("serverBuildTime", server.build_time.as_str());
    }

    let swarm = &e.swarm;
    r.set("swarmState", swarm.local_node_state.as_str());
    r.set("swarmControlAvailable", swarm.control_available);
    r.set("swarmError", swarm.error.as_str());
    r.set("swarmNodeID", swarm.node_id.as_str());
    r.set_opt("swarmNodes", swarm.nodes);
    r.set_opt("swarmManagers", swarm.managers);
    r.set("swarmNodeAddr", swarm.node_addr.as_str());
    if let Some(cluster) = &swarm.cluster {
        if let Some(created) = cluster.created_at.as_deref().and_then(epoch_seconds) {
            r.set("swarmClusterCreatedAt", created);
            r.set("swarmClusterDuration", now_ms - created * 1000);
        }
        r.set_opt(
            "swarmClusterUpdatedAt",
            cluster.updated_at.as_deref().and_then(epoch_seconds),
        );
        r.set("swarmClusterID", cluster.id.as_str());
        r.set("swarmClusterVersionIndex", cluster.version.index);
    }
    r
}
