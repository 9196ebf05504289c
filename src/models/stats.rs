// Point-in-time container statistics (`GET /containers/{id}/stats?stream=false`)

use super::null_default;
use serde::Deserialize;
use std::collections::HashMap;

/// Host platform of a stats payload. Only the payload's own tag decides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(t) if t.eq_ignore_ascii_case("windows") => Platform::Windows,
            _ => Platform::Unix,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StatsSnapshot {
    /// RFC 3339 time of this sample.
    pub read: Option<String>,
    /// RFC 3339 time of the embedded previous sample.
    pub preread: Option<String>,
    pub os_type: Option<String>,
    pub num_procs: u32,
    pub cpu_stats: CpuStats,
    pub precpu_stats: CpuStats,
    pub memory_stats: MemoryStats,
    #[serde(deserialize_with = "null_default")]
    pub networks: HashMap<String, InterfaceStats>,
    pub blkio_stats: BlkioStats,
    pub pids_stats: PidsStats,
    pub storage_stats: StorageStats,
}

impl StatsSnapshot {
    pub fn platform(&self) -> Platform {
        Platform::from_tag(self.os_type.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CpuStats {
    pub cpu_usage: CpuUsage,
    pub system_cpu_usage: u64,
    pub online_cpus: u32,
    pub throttling_data: ThrottlingData,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CpuUsage {
    pub total_usage: u64,
    #[serde(deserialize_with = "null_default")]
    pub percpu_usage: Vec<u64>,
    pub usage_in_kernelmode: u64,
    pub usage_in_usermode: u64,
}

/// CFS throttling counters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThrottlingData {
    pub periods: u64,
    pub throttled_periods: u64,
    pub throttled_time: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MemoryStats {
    pub usage: u64,
    pub max_usage: u64,
    /// cgroup sub-counters such as `cache`.
    #[serde(deserialize_with = "null_default")]
    pub stats: HashMap<String, u64>,
    pub failcnt: u64,
    pub limit: u64,
    // Windows only
    pub commitbytes: u64,
    pub commitpeakbytes: u64,
    pub privateworkingset: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InterfaceStats {
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub rx_dropped: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub tx_dropped: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BlkioStats {
    #[serde(deserialize_with = "null_default")]
    pub io_service_bytes_recursive: Vec<BlkioEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BlkioEntry {
    pub major: u64,
    pub minor: u64,
    #[serde(deserialize_with = "null_default")]
    pub op: String,
    pub value: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PidsStats {
    pub current: u64,
    pub limit: u64,
}

/// Windows storage counters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageStats {
    pub read_count_normalized: u64,
    pub read_size_bytes: u64,
    pub write_count_normalized: u64,
    pub write_size_bytes: u64,
}
