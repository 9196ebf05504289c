// One sampling pass: host info, containers, then swarm topology when the
// local node is part of an active swarm.

use crate::config::AppConfig;
use crate::gateway::RuntimeGateway;
use crate::sampler::{self, SampleContext};
use crate::sink::Emitter;
use crate::swarm;
use std::sync::Arc;
use tracing::instrument;

pub const HOST_EVENT: &str = "dockerInfoSample";
pub const CONTAINER_EVENT: &str = "dockerContainerSample";
pub const NODE_EVENT: &str = "dockerNodeSample";
pub const TASK_EVENT: &str = "dockerTaskSample";
pub const SERVICE_EVENT: &str = "dockerServiceSample";
pub const STACK_EVENT: &str = "dockerStackSample";

/// Per-process settings, built once from config and passed into every pass.
#[derive(Debug, Clone)]
pub struct CollectorContext {
    pub hostname: String,
    pub include_all: bool,
    pub since: Option<String>,
    pub max_concurrency: usize,
}

impl CollectorContext {
    pub fn from_config(config: &AppConfig, hostname: String) -> Self {
        Self {
            hostname,
            include_all: config.collection.include_all,
            since: config.runtime.since.clone(),
            max_concurrency: config.collection.max_concurrency,
        }
    }
}

/// Counts of what one pass emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub swarm_active: bool,
    pub containers: usize,
    pub nodes: usize,
    pub tasks: usize,
    pub services: usize,
    pub stacks: usize,
    pub errors: usize,
}

#[instrument(skip_all, fields(hostname = %ctx.hostname))]
pub async fn run_pass(
    gateway: Arc<dyn RuntimeGateway>,
    emitter: &Emitter,
    ctx: &CollectorContext,
) -> PassSummary {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let mut summary = PassSummary::default();

    match gateway.host_info().await {
        Ok(info) => {
            summary.swarm_active = info.engine.swarm.is_active();
            emitter.emit_record(HOST_EVENT, &swarm::host_record(&info, now_ms));
        }
        Err(e) => {
            tracing::warn!(error = %e, operation = "host_info", "host info failed");
            emitter.report_error(&e, &ctx.hostname);
            summary.errors += 1;
        }
    }

    collect_containers(gateway.clone(), emitter, ctx, now_ms, &mut summary).await;

    if summary.swarm_active {
        collect_swarm(gateway.as_ref(), emitter, ctx, now_ms, &mut summary).await;
    }

    tracing::info!(
        containers = summary.containers,
        nodes = summary.nodes,
        tasks = summary.tasks,
        services = summary.services,
        stacks = summary.stacks,
        errors = summary.errors,
        swarm_active = summary.swarm_active,
        "pass complete"
    );
    summary
}

async fn collect_containers(
    gateway: Arc<dyn RuntimeGateway>,
    emitter: &Emitter,
    ctx: &CollectorContext,
    now_ms: i64,
    summary: &mut PassSummary,
) {
    let containers = match gateway
        .list_containers(ctx.include_all, ctx.since.as_deref())
        .await
    {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, operation = "list_containers", "container listing failed");
            emitter.report_error(&e, &ctx.hostname);
            summary.errors += 1;
            return;
        }
    };

    let sample_ctx = SampleContext {
        hostname: ctx.hostname.clone(),
        now_ms,
        max_concurrency: ctx.max_concurrency,
    };
    let records = sampler::sample_containers(gateway, containers, &sample_ctx).await;
    for record in &records {
        emitter.emit_record(CONTAINER_EVENT, record);
    }
    summary.containers = records.len();
}

async fn collect_swarm(
    gateway: &dyn RuntimeGateway,
    emitter: &Emitter,
    ctx: &CollectorContext,
    now_ms: i64,
    summary: &mut PassSummary,
) {
    let mut report = |operation: &str, e: &dyn std::fmt::Display| {
        tracing::warn!(error = %e, operation, "swarm listing failed");
        emitter.report_error(e, &ctx.hostname);
        summary.errors += 1;
    };

    let mut services = gateway.list_services().await.unwrap_or_else(|e| {
        report("list_services", &e);
        Vec::new()
    });
    let mut nodes = gateway.list_nodes().await.unwrap_or_else(|e| {
        report("list_nodes", &e);
        Vec::new()
    });
    let service_ids: Vec<String> = services.iter().map(|s| s.id.clone()).collect();
    let tasks = if service_ids.is_empty() {
        Vec::new()
    } else {
        gateway.list_tasks(&service_ids).await.unwrap_or_else(|e| {
            report("list_tasks", &e);
            Vec::new()
        })
    };

    nodes.sort_by(|a, b| a.description.hostname.cmp(&b.description.hostname));
    for node in &nodes {
        emitter.emit_record(NODE_EVENT, &swarm::node_record(node, now_ms));
    }
    for task in &tasks {
        emitter.emit_record(TASK_EVENT, &swarm::task_record(task, now_ms));
    }

    let topology = swarm::aggregate(&nodes, &tasks, &services);
    services.sort_by(|a, b| a.spec.name.cmp(&b.spec.name));
    for service in &services {
        let counts = topology.replicas_of(&service.id);
        emitter.emit_record(
            SERVICE_EVENT,
            &swarm::service_record(service, counts, now_ms),
        );
    }
    for (stack, count) in &topology.stacks {
        emitter.emit_record(STACK_EVENT, &swarm::stack_record(stack, *count));
    }

    summary.nodes = nodes.len();
    summary.tasks = tasks.len();
    summary.services = services.len();
    summary.stacks = topology.stacks.len();
}
