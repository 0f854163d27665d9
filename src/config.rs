use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub targets: TargetsConfig,
    pub latency: LatencyConfig,
    pub route: RouteConfig,
    pub bandwidth: BandwidthConfig,
    pub cadence: CadenceConfig,
    pub dataset: DatasetConfig,
    pub snapshot: SnapshotConfig,
    pub phase: PhaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetsConfig {
    pub hosts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatencyConfig {
    pub ping_count: u32,
    /// Inter-reply interval passed to ping (-i), in milliseconds.
    pub interval_ms: u64,
    /// Per-reply wait passed to ping (-W), in seconds.
    pub reply_wait_secs: u64,
    /// Hard cap on the whole probe; must exceed ping_count * interval_ms.
    pub timeout_secs: u64,
    #[serde(default = "default_ping_cmd")]
    pub command: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub max_hops: u32,
    /// How many hop lines are kept in the dataset row.
    #[serde(default = "default_snip_lines")]
    pub snip_lines: usize,
    pub timeout_secs: u64,
    #[serde(default = "default_traceroute_cmd")]
    pub command: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BandwidthConfig {
    pub timeout_secs: u64,
    #[serde(default = "default_speedtest_cmd")]
    pub command: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CadenceConfig {
    pub route_every_min: u32,
    pub bandwidth_every_min: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub dir: String,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    pub path: String,
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhaseConfig {
    pub file: String,
}

fn default_ping_cmd() -> String {
    "ping".into()
}

fn default_traceroute_cmd() -> String {
    "traceroute".into()
}

fn default_speedtest_cmd() -> String {
    "speedtest".into()
}

fn default_snip_lines() -> usize {
    12
}

fn default_file_prefix() -> String {
    "pathwatch_".into()
}

fn default_window_hours() -> u32 {
    24
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.targets.hosts.is_empty(),
            "targets.hosts must list at least one host"
        );
        anyhow::ensure!(
            self.targets.hosts.iter().all(|h| !h.trim().is_empty()),
            "targets.hosts must not contain blank entries"
        );
        anyhow::ensure!(
            self.latency.ping_count > 0,
            "latency.ping_count must be > 0, got {}",
            self.latency.ping_count
        );
        anyhow::ensure!(
            self.latency.interval_ms > 0,
            "latency.interval_ms must be > 0, got {}",
            self.latency.interval_ms
        );
        anyhow::ensure!(
            self.latency.reply_wait_secs > 0,
            "latency.reply_wait_secs must be > 0, got {}",
            self.latency.reply_wait_secs
        );
        let floor_ms = self.latency.ping_count as u64 * self.latency.interval_ms;
        anyhow::ensure!(
            self.latency.timeout_secs * 1000 > floor_ms,
            "latency.timeout_secs ({}s) must exceed ping_count * interval_ms ({}ms)",
            self.latency.timeout_secs,
            floor_ms
        );
        anyhow::ensure!(
            self.route.max_hops > 0,
            "route.max_hops must be > 0, got {}",
            self.route.max_hops
        );
        anyhow::ensure!(
            self.route.snip_lines > 0,
            "route.snip_lines must be > 0, got {}",
            self.route.snip_lines
        );
        anyhow::ensure!(
            self.route.timeout_secs > 0,
            "route.timeout_secs must be > 0, got {}",
            self.route.timeout_secs
        );
        anyhow::ensure!(
            self.bandwidth.timeout_secs > 0,
            "bandwidth.timeout_secs must be > 0, got {}",
            self.bandwidth.timeout_secs
        );
        anyhow::ensure!(
            self.cadence.route_every_min > 0,
            "cadence.route_every_min must be > 0, got {}",
            self.cadence.route_every_min
        );
        anyhow::ensure!(
            self.cadence.bandwidth_every_min > 0,
            "cadence.bandwidth_every_min must be > 0, got {}",
            self.cadence.bandwidth_every_min
        );
        anyhow::ensure!(!self.dataset.dir.is_empty(), "dataset.dir must be non-empty");
        anyhow::ensure!(
            !self.dataset.file_prefix.is_empty(),
            "dataset.file_prefix must be non-empty"
        );
        anyhow::ensure!(
            !self.snapshot.path.is_empty(),
            "snapshot.path must be non-empty"
        );
        anyhow::ensure!(
            self.snapshot.window_hours > 0,
            "snapshot.window_hours must be > 0, got {}",
            self.snapshot.window_hours
        );
        anyhow::ensure!(!self.phase.file.is_empty(), "phase.file must be non-empty");
        Ok(())
    }
}

/// Sentinel phase label when neither the env override nor the phase file is set.
pub const PHASE_UNKNOWN: &str = "UNKNOWN";

/// Env var that overrides the phase file.
pub const PHASE_ENV: &str = "PHASE";

/// Resolves the phase label once per invocation from an ordered source list:
/// PHASE env var, then the first line of the phase file, then "UNKNOWN".
pub fn resolve_phase_label(phase_file: &Path) -> String {
    if let Ok(v) = std::env::var(PHASE_ENV) {
        let v = v.trim();
        if !v.is_empty() {
            return v.to_string();
        }
    }
    if let Ok(s) = std::fs::read_to_string(phase_file) {
        let line = s.lines().next().unwrap_or("").trim();
        if !line.is_empty() {
            return line.to_string();
        }
    }
    PHASE_UNKNOWN.to_string()
}
