// Speedtest JSON payload parsing

use crate::models::BandwidthReport;
use crate::stats::round_bandwidth;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SpeedtestPayload {
    download: Section,
    upload: Section,
    ping: Ping,
}

#[derive(Debug, Deserialize)]
struct Section {
    /// Ookla reports bandwidth in bytes/sec.
    bandwidth: f64,
}

#[derive(Debug, Deserialize)]
struct Ping {
    latency: f64,
}

/// bytes/sec -> megabits/sec.
fn to_mbps(bytes_per_sec: f64) -> f64 {
    bytes_per_sec * 8.0 / 1_000_000.0
}

/// Parses the speedtest JSON payload. None on any parse failure or missing
/// field: a report is all-or-nothing, never partially populated.
pub fn parse_speedtest_json(stdout: &str) -> Option<BandwidthReport> {
    let payload: SpeedtestPayload = serde_json::from_str(stdout).ok()?;
    Some(BandwidthReport {
        down_mbps: round_bandwidth(to_mbps(payload.download.bandwidth)),
        up_mbps: round_bandwidth(to_mbps(payload.upload.bandwidth)),
        ping_ms: round_bandwidth(payload.ping.latency),
        raw_json: stdout.trim().to_string(),
    })
}
