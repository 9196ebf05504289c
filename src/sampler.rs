// Per-container sampling: list-time summary + one stats and one inspect call per
// container, fanned out concurrently and bounded by a semaphore.

use crate::gateway::RuntimeGateway;
use crate::models::{ContainerSnapshot, InspectSnapshot, MetricRecord, Platform, StatsSnapshot};
use crate::normalize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Values shared read-only by every unit of a pass.
#[derive(Debug, Clone)]
pub struct SampleContext {
    pub hostname: String,
    /// Pass start, epoch milliseconds.
    pub now_ms: i64,
    pub max_concurrency: usize,
}

/// Samples every container and waits for all units. Output order is unspecified.
///
/// A failed stats or inspect call only drops the fields that depend on it; a
/// unit that panics is logged and skipped without affecting its siblings.
pub async fn sample_containers(
    gateway: Arc<dyn RuntimeGateway>,
    containers: Vec<ContainerSnapshot>,
    ctx: &SampleContext,
) -> Vec<MetricRecord> {
    let permits = Arc::new(Semaphore::new(ctx.max_concurrency.max(1)));
    let mut units = JoinSet::new();
    for container in containers {
        let gateway = gateway.clone();
        let permits = permits.clone();
        let ctx = ctx.clone();
        units.spawn(async move {
            // The semaphore is never closed, so acquisition only waits.
            let _permit = permits.acquire_owned().await.ok();
            sample_container(gateway.as_ref(), &container, &ctx).await
        });
    }

    let mut records = Vec::with_capacity(units.len());
    while let Some(joined) = units.join_next().await {
        match joined {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(
                error = %e,
                operation = "sample_container",
                "container sampling task failed"
            ),
        }
    }
    records
}

/// Builds one container's record. At most one stats and one inspect round trip.
pub async fn sample_container(
    gateway: &dyn RuntimeGateway,
    container: &ContainerSnapshot,
    ctx: &SampleContext,
) -> MetricRecord {
    let mut record = summary_record(container, ctx);

    let stats = match gateway.container_stats(&container.id).await {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::debug!(
                container = container.short_id(),
                error = %e,
                operation = "container_stats",
                "stats unavailable"
            );
            None
        }
    };
    if let Some(s) = &stats {
        apply_stats(&mut record, s);
    }

    let inspect = match gateway.container_inspect(&container.id).await {
        Ok(i) => Some(i),
        Err(e) => {
            tracing::debug!(
                container = container.short_id(),
                error = %e,
                operation = "container_inspect",
                "inspect unavailable"
            );
            None
        }
    };
    if let Some(i) = &inspect {
        // The stats tag decides; the inspect platform only fills in when stats failed.
        let platform = stats
            .as_ref()
            .map(StatsSnapshot::platform)
            .unwrap_or_else(|| Platform::from_tag(Some(&i.platform)));
        apply_inspect(&mut record, i, platform);
    }

    // Swarm node labels override container labels of the same key.
    record.merge_labels(&container.labels);
    if let Some(node) = inspect.as_ref().and_then(|i| i.node.as_ref()) {
        record.merge_labels(&node.labels);
    }
    record
}

fn summary_record(c: &ContainerSnapshot, ctx: &SampleContext) -> MetricRecord {
    let mut r = MetricRecord::new();
    r.set("hostname", ctx.hostname.as_str());
    r.set("containerID", c.id.as_str());
    r.set("IDShort", c.short_id());
    r.set("containerName", c.name());
    r.set("image", c.image.as_str());
    r.set("imageShort", c.image_short());
    r.set("imageID", c.image_id.as_str());
    r.set("state", c.state.as_str());
    r.set("status", c.status.as_str());
    r.set("command", c.command.as_str());
    r.set("created", c.created);
    r.set("duration", ctx.now_ms - c.created * 1000);

    if let Some(settings) = &c.network_settings {
        for (name, net) in &settings.networks {
            r.set(format!("network.{}.ipv4", name), net.ip_address.as_str());
            r.set(format!("network.{}.gateway", name), net.gateway.as_str());
            r.set(format!("network.{}.ipv6", name), net.global_ipv6_address.as_str());
        }
    }
    r.set_opt("networkMode", c.network_mode());
    r.set_opt("sizeRw", c.size_rw);
    r.set_opt("sizeRootFs", c.size_root_fs);
    r.set("ports", c.ports_display());
    r.set("mounts", c.mounts_display());
    r
}

fn apply_stats(r: &mut MetricRecord, s: &StatsSnapshot) {
    let net = normalize::network_totals(&s.networks);
    r.set("netRx", net.rx_bytes);
    r.set("netTx", net.tx_bytes);
    r.set("netRxErrors", net.rx_errors);
    r.set("netTxErrors", net.tx_errors);
    r.set("netRxDropped", net.rx_dropped);
    r.set("netTxDropped", net.tx_dropped);
    r.set("netRxPackets", net.rx_packets);
    r.set("netTxPackets", net.tx_packets);

    match s.platform() {
        Platform::Windows => {
            r.set("cpuPercent", normalize::cpu_percent_windows(s));
            r.set("blkReadSizeBytes", s.storage_stats.read_size_bytes);
            r.set("blkWriteSizeBytes", s.storage_stats.write_size_bytes);
            r.set("mem", s.memory_stats.privateworkingset as f64);
            r.set("numProcs", s.num_procs);
            r.set("memCommitBytes", s.memory_stats.commitbytes);
            r.set("memCommitPeakBytes", s.memory_stats.commitpeakbytes);
            r.set("memPrivateWorkingSet", s.memory_stats.privateworkingset);
        }
        Platform::Unix => {
            let cpu = &s.cpu_stats;
            let precpu = &s.precpu_stats;
            r.set("previousCPU", precpu.cpu_usage.total_usage);
            r.set("onlineCPUs", cpu.online_cpus);
            r.set("systemUsage", cpu.system_cpu_usage);
            r.set(
                "cpuPercent",
                normalize::cpu_percent_unix(
                    precpu.cpu_usage.total_usage,
                    precpu.system_cpu_usage,
                    cpu,
                ),
            );

            let (blk_read, blk_write) =
                normalize::block_io(&s.blkio_stats.io_service_bytes_recursive);
            r.set("blkReadBytes", blk_read);
            r.set("blkWriteBytes", blk_write);

            let mem = normalize::memory_usage_excluding_cache(&s.memory_stats);
            let mem_limit = s.memory_stats.limit as f64;
            r.set("mem", mem);
            r.set("memLimit", mem_limit);
            r.set("memPercent", normalize::memory_percent(mem_limit, mem));
            r.set("memUsage", s.memory_stats.usage as f64);
            r.set("memMaxUsage", s.memory_stats.max_usage as f64);
            r.set("memFailCount", s.memory_stats.failcnt as f64);
            r.set("pidsStatsCurrent", s.pids_stats.current as f64);
            r.set("pidsStatsLimit", s.pids_stats.limit as f64);

            let throttling = &cpu.throttling_data;
            r.set("periods", throttling.periods as f64);
            r.set("throttledPeriods", throttling.throttled_periods as f64);
            r.set("throttledTime", throttling.throttled_time as f64);
        }
    }
}

fn apply_inspect(r: &mut MetricRecord, i: &InspectSnapshot, platform: Platform) {
    let hc = &i.host_config;
    r.set("restartCount", i.restart_count);
    r.set("platform", i.platform.as_str());
    r.set("driver", i.driver.as_str());
    r.set("nanoCPUs", hc.nano_cpus);
    r.set("cpuShares", hc.cpu_shares);

    if let Some(node) = &i.node {
        r.set("nodeID", node.id.as_str());
        r.set("nodeName", node.name.as_str());
        r.set("nodeAddr", node.addr.as_str());
        r.set("nodeMemory", node.memory);
    }

    r.set("pid", i.state.pid);
    if let Some(health) = &i.state.health {
        r.set("failingStreak", health.failing_streak);
        r.set("finishedAt", i.state.finished_at.as_str());
    }

    match platform {
        Platform::Windows => {
            r.set("cpuCount", hc.cpu_count);
            r.set("ioMaximumIOps", hc.io_maximum_iops);
            r.set("ioMaximumBandwidth", hc.io_maximum_bandwidth);
            r.set("isolation", hc.isolation.as_str());
        }
        Platform::Unix => {
            r.set("cgroupParent", hc.cgroup_parent.as_str());
            r.set("cpuPeriod", hc.cpu_period);
            r.set("cpuQuota", hc.cpu_quota);
            r.set("cpuRealtimePeriod", hc.cpu_realtime_period);
            r.set("cpuRealtimeRuntime", hc.cpu_realtime_runtime);
            r.set("blkioWeight", hc.blkio_weight);
            r.set("kernelMemory", hc.kernel_memory);
            r.set("memoryReservation", hc.memory_reservation);
            r.set("memorySwap", hc.memory_swap);
            r.set_opt("memorySwappiness", hc.memory_swappiness);
        }
    }
}
