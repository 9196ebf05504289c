use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
    /// Forced engine API version (`MAJOR.MINOR`); negotiated when absent.
    #[serde(default)]
    pub api_version: Option<String>,
    /// Per-request timeout enforced by the client.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Container-list `since` filter (container ID or name).
    #[serde(default)]
    pub since: Option<String>,
}

fn default_socket_path() -> String {
    "/var/run/docker.sock".into()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            api_version: None,
            timeout_secs: default_timeout_secs(),
            since: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    /// Merge metrics into the local host entity instead of a named one.
    #[serde(default = "default_true")]
    pub local: bool,
    /// Comma-separated substrings; matching metric keys are not emitted.
    #[serde(default)]
    pub exclude: String,
    /// Upper bound on containers sampled at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// List stopped containers too.
    #[serde(default = "default_true")]
    pub include_all: bool,
    /// Run a pass every N seconds; a single pass when absent.
    #[serde(default)]
    pub interval_secs: Option<u64>,
    /// How often to log pass counters in periodic mode.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_concurrency() -> usize {
    32
}

fn default_stats_log_interval_secs() -> u64 {
    300
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            local: true,
            exclude: String::new(),
            max_concurrency: default_max_concurrency(),
            include_all: true,
            interval_secs: None,
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Reads `CONFIG_FILE` (default `config.toml`). A missing default file
    /// yields the built-in defaults; a missing explicit file is an error.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => {
                let s = std::fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("config file {}: {}", path, e))?;
                Self::load_from_str(&s)
            }
            Err(_) => match std::fs::read_to_string(DEFAULT_CONFIG_PATH) {
                Ok(s) => Self::load_from_str(&s),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::info!("no {} found, using defaults", DEFAULT_CONFIG_PATH);
                    let config = Self::default();
                    config.validate()?;
                    Ok(config)
                }
                Err(e) => Err(e.into()),
            },
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.runtime.socket_path.is_empty(),
            "runtime.socket_path must be non-empty"
        );
        anyhow::ensure!(
            self.runtime.timeout_secs > 0,
            "runtime.timeout_secs must be > 0, got {}",
            self.runtime.timeout_secs
        );
        if let Some(v) = &self.runtime.api_version {
            crate::gateway::parse_api_version(v)
                .map_err(|e| anyhow::anyhow!("runtime.api_version is invalid: {}", e))?;
        }
        anyhow::ensure!(
            self.collection.max_concurrency > 0,
            "collection.max_concurrency must be > 0, got {}",
            self.collection.max_concurrency
        );
        if let Some(interval) = self.collection.interval_secs {
            anyhow::ensure!(
                interval > 0,
                "collection.interval_secs must be > 0, got {}",
                interval
            );
        }
        anyhow::ensure!(
            self.collection.stats_log_interval_secs > 0,
            "collection.stats_log_interval_secs must be > 0, got {}",
            self.collection.stats_log_interval_secs
        );
        Ok(())
    }
}
