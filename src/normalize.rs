// Derived container metrics from raw engine stats. Pure functions, no I/O.

use crate::models::{BlkioEntry, CpuStats, InterfaceStats, MemoryStats, StatsSnapshot};
use std::collections::HashMap;

/// CPU utilization on Linux hosts, scaled by core count (100% = one core busy).
///
/// Returns 0 unless both the container and system deltas are strictly positive.
pub fn cpu_percent_unix(previous_cpu: u64, previous_system: u64, current: &CpuStats) -> f64 {
    let cpu_delta = current.cpu_usage.total_usage as f64 - previous_cpu as f64;
    let system_delta = current.system_cpu_usage as f64 - previous_system as f64;
    if cpu_delta > 0.0 && system_delta > 0.0 {
        (cpu_delta / system_delta) * core_count(current) as f64 * 100.0
    } else {
        0.0
    }
}

/// Per-core counters are absent on cgroup v2 hosts; `online_cpus` stands in there.
fn core_count(cpu: &CpuStats) -> usize {
    match cpu.cpu_usage.percpu_usage.len() {
        0 => cpu.online_cpus as usize,
        n => n,
    }
}

/// CPU utilization on Windows hosts, from 100ns ticks used over ticks available
/// between the two embedded samples.
pub fn cpu_percent_windows(stats: &StatsSnapshot) -> f64 {
    let elapsed_ns = sample_interval_ns(stats.read.as_deref(), stats.preread.as_deref());
    let possible_ticks = (elapsed_ns / 100) * stats.num_procs as u64;
    let used_ticks = stats
        .cpu_stats
        .cpu_usage
        .total_usage
        .saturating_sub(stats.precpu_stats.cpu_usage.total_usage);
    if possible_ticks > 0 {
        used_ticks as f64 / possible_ticks as f64 * 100.0
    } else {
        0.0
    }
}

fn sample_interval_ns(read: Option<&str>, preread: Option<&str>) -> u64 {
    let parse = |s: &str| chrono::DateTime::parse_from_rfc3339(s).ok();
    match (read.and_then(parse), preread.and_then(parse)) {
        (Some(now), Some(before)) => (now - before)
            .num_nanoseconds()
            .filter(|ns| *ns > 0)
            .map_or(0, |ns| ns as u64),
        _ => 0,
    }
}

/// Memory usage without reclaimable page cache.
pub fn memory_usage_excluding_cache(memory: &MemoryStats) -> f64 {
    let cache = match memory.stats.get("cache") {
        Some(c) => *c,
        None => {
            tracing::debug!(
                operation = "memory_usage_excluding_cache",
                "memory stats carry no cache counter; counting cache as 0"
            );
            0
        }
    };
    memory.usage.saturating_sub(cache) as f64
}

/// A zero limit means the cgroup has not reported yet, not "unbounded".
pub fn memory_percent(limit: f64, used_excluding_cache: f64) -> f64 {
    if limit != 0.0 {
        used_excluding_cache / limit * 100.0
    } else {
        0.0
    }
}

/// Sums `(read, write)` bytes; other operations are ignored.
pub fn block_io(entries: &[BlkioEntry]) -> (u64, u64) {
    let mut read = 0u64;
    let mut write = 0u64;
    for e in entries {
        if e.op.eq_ignore_ascii_case("read") {
            read += e.value;
        } else if e.op.eq_ignore_ascii_case("write") {
            write += e.value;
        }
    }
    (read, write)
}

/// Network counters summed over every interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkTotals {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
    pub rx_dropped: u64,
    pub tx_dropped: u64,
}

pub fn network_totals(interfaces: &HashMap<String, InterfaceStats>) -> NetworkTotals {
    interfaces
        .values()
        .fold(NetworkTotals::default(), |mut t, v| {
            t.rx_bytes += v.rx_bytes;
            t.tx_bytes += v.tx_bytes;
            t.rx_packets += v.rx_packets;
            t.tx_packets += v.tx_packets;
            t.rx_errors += v.rx_errors;
            t.tx_errors += v.tx_errors;
            t.rx_dropped += v.rx_dropped;
            t.tx_dropped += v.tx_dropped;
            t
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CpuUsage;

    fn cpu(total_usage: u64, system_cpu_usage: u64, cores: usize) -> CpuStats {
        CpuStats {
            cpu_usage: CpuUsage {
                total_usage,
                percpu_usage: vec![0; cores],
                ..Default::default()
            },
            system_cpu_usage,
            ..Default::default()
        }
    }

    fn blkio(op: &str, value: u64) -> BlkioEntry {
        BlkioEntry {
            op: op.to_string(),
            value,
            ..Default::default()
        }
    }

    #[test]
    fn cpu_percent_unix_scales_by_core_count() {
        let current = cpu(100_000_000, 1_000_000_000, 2);
        let pct = cpu_percent_unix(50_000_000, 500_000_000, &current);
        assert!((pct - 20.0).abs() < 1e-9);
    }

    #[test]
    fn cpu_percent_unix_zero_when_system_delta_not_positive() {
        let current = cpu(100, 500, 4);
        assert_eq!(cpu_percent_unix(50, 500, &current), 0.0);
        assert_eq!(cpu_percent_unix(50, 900, &current), 0.0);
    }

    #[test]
    fn cpu_percent_unix_zero_when_cpu_delta_not_positive() {
        let current = cpu(100, 1_000, 4);
        assert_eq!(cpu_percent_unix(100, 500, &current), 0.0);
        assert_eq!(cpu_percent_unix(200, 500, &current), 0.0);
    }

    #[test]
    fn cpu_percent_unix_falls_back_to_online_cpus() {
        let mut current = cpu(200, 1_000, 0);
        current.online_cpus = 4;
        let pct = cpu_percent_unix(100, 500, &current);
        assert!((pct - 80.0).abs() < 1e-9);
    }

    #[test]
    fn cpu_percent_windows_uses_tick_budget() {
        let stats = StatsSnapshot {
            read: Some("2024-01-01T00:00:01Z".into()),
            preread: Some("2024-01-01T00:00:00Z".into()),
            num_procs: 2,
            cpu_stats: cpu(15_000_000, 0, 0),
            precpu_stats: cpu(5_000_000, 0, 0),
            ..Default::default()
        };
        // 1s = 10M ticks per processor, 20M available, 10M used
        assert!((cpu_percent_windows(&stats) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn cpu_percent_windows_zero_without_interval() {
        let stats = StatsSnapshot {
            num_procs: 2,
            cpu_stats: cpu(15_000_000, 0, 0),
            ..Default::default()
        };
        assert_eq!(cpu_percent_windows(&stats), 0.0);
    }

    #[test]
    fn memory_usage_excludes_cache() {
        let mut memory = MemoryStats {
            usage: 1_000,
            ..Default::default()
        };
        memory.stats.insert("cache".into(), 300);
        assert_eq!(memory_usage_excluding_cache(&memory), 700.0);
    }

    #[test]
    fn memory_usage_without_cache_counter_is_raw_usage() {
        let memory = MemoryStats {
            usage: 1_000,
            ..Default::default()
        };
        assert_eq!(memory_usage_excluding_cache(&memory), 1_000.0);
    }

    #[test]
    fn memory_percent_zero_limit_is_zero() {
        assert_eq!(memory_percent(0.0, 12_345.0), 0.0);
        assert_eq!(memory_percent(0.0, 0.0), 0.0);
        assert_eq!(memory_percent(1_000.0, 250.0), 25.0);
    }

    #[test]
    fn block_io_ignores_unknown_ops() {
        let entries = vec![blkio("Read", 10), blkio("write", 5), blkio("sync", 99)];
        assert_eq!(block_io(&entries), (10, 5));
    }

    #[test]
    fn network_totals_empty_is_zero() {
        assert_eq!(network_totals(&HashMap::new()), NetworkTotals::default());
    }

    #[test]
    fn network_totals_sums_interfaces() {
        let mut interfaces = HashMap::new();
        interfaces.insert(
            "eth0".to_string(),
            InterfaceStats {
                rx_bytes: 100,
                tx_bytes: 50,
                rx_packets: 10,
                tx_dropped: 1,
                ..Default::default()
            },
        );
        interfaces.insert(
            "eth1".to_string(),
            InterfaceStats {
                rx_bytes: 20,
                tx_bytes: 10,
                rx_packets: 2,
                rx_errors: 3,
                ..Default::default()
            },
        );
        let t = network_totals(&interfaces);
        assert_eq!(t.rx_bytes, 120);
        assert_eq!(t.tx_bytes, 60);
        assert_eq!(t.rx_packets, 12);
        assert_eq!(t.rx_errors, 3);
        assert_eq!(t.tx_dropped, 1);
        assert_eq!(t.tx_packets, 0);
    }

    #[test]
    fn normalizer_is_idempotent() {
        let stats = StatsSnapshot {
            cpu_stats: cpu(123_456_789, 987_654_321_000, 3),
            precpu_stats: cpu(23_456_789, 887_654_321_000, 3),
            ..Default::default()
        };
        let prev = &stats.precpu_stats;
        let a = cpu_percent_unix(
            prev.cpu_usage.total_usage,
            prev.system_cpu_usage,
            &stats.cpu_stats,
        );
        let b = cpu_percent_unix(
            prev.cpu_usage.total_usage,
            prev.system_cpu_usage,
            &stats.cpu_stats,
        );
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
