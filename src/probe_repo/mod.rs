// External probe adapters. Each spawns exactly one tool process under a hard
// wall-clock timeout and degrades to Unavailable/TimedOut instead of erroring,
// so one dead target or missing tool never aborts the batch.

mod bandwidth;
mod ping;
mod route;

pub use bandwidth::parse_speedtest_json;
pub use ping::parse_ping_times;
pub use route::snip_route;

use crate::config::{BandwidthConfig, LatencyConfig, RouteConfig};
use crate::models::{BandwidthReport, LatencyStats, ProbeOutcome};
use crate::stats;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

enum Run {
    Finished(std::process::Output),
    TimedOut,
    SpawnFailed(std::io::Error),
}

/// Runs a command to completion under a hard cap. The child is killed when the
/// cap fires (kill_on_drop), so a stuck probe cannot outlive its invocation.
async fn run_capped(mut cmd: Command, cap: Duration) -> Run {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(cap, cmd.output()).await {
        Ok(Ok(output)) => Run::Finished(output),
        Ok(Err(e)) => Run::SpawnFailed(e),
        Err(_) => Run::TimedOut,
    }
}

/// Check whether a probe tool is resolvable: direct check for explicit paths,
/// PATH lookup via `which` for bare names.
fn tool_available(name: &str) -> bool {
    if name.contains('/') {
        return std::path::Path::new(name).is_file();
    }
    std::process::Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub struct ProbeRepo {
    latency: LatencyConfig,
    route: RouteConfig,
    bandwidth: BandwidthConfig,
}

impl ProbeRepo {
    pub fn new(latency: LatencyConfig, route: RouteConfig, bandwidth: BandwidthConfig) -> Self {
        Self {
            latency,
            route,
            bandwidth,
        }
    }

    /// Fixed-count ping against one target. Reply lines carrying a
    /// `time=<ms>` token become samples; everything else (loss, DNS noise) is
    /// ignored. Nonzero exit still yields stats: ping exits nonzero on loss.
    #[instrument(skip(self), fields(repo = "probe", operation = "ping"))]
    pub async fn ping(&self, host: &str) -> ProbeOutcome<LatencyStats> {
        let count = self.latency.ping_count;
        let interval_secs = self.latency.interval_ms as f64 / 1000.0;
        let mut cmd = Command::new(&self.latency.command);
        cmd.args([
            "-n",
            "-c",
            &count.to_string(),
            "-i",
            &format!("{}", interval_secs),
            "-W",
            &self.latency.reply_wait_secs.to_string(),
            host,
        ]);

        match run_capped(cmd, Duration::from_secs(self.latency.timeout_secs)).await {
            Run::Finished(out) => {
                let stdout = String::from_utf8_lossy(&out.stdout);
                let samples = parse_ping_times(&stdout);
                debug!(host, received = samples.len(), "ping complete");
                ProbeOutcome::Ok(stats::summarize(&samples, count))
            }
            Run::TimedOut => {
                warn!(host, "ping timed out");
                ProbeOutcome::TimedOut
            }
            Run::SpawnFailed(e) => {
                warn!(host, error = %e, "ping unavailable");
                ProbeOutcome::Unavailable
            }
        }
    }

    /// Hop-limited traceroute, truncated to the configured number of lines and
    /// flattened to a single `" | "`-joined field.
    #[instrument(skip(self), fields(repo = "probe", operation = "traceroute"))]
    pub async fn traceroute(&self, host: &str) -> ProbeOutcome<String> {
        let mut cmd = Command::new(&self.route.command);
        cmd.args(["-n", "-m", &self.route.max_hops.to_string(), host]);

        match run_capped(cmd, Duration::from_secs(self.route.timeout_secs)).await {
            Run::Finished(out) => {
                let stdout = String::from_utf8_lossy(&out.stdout);
                let snip = snip_route(&stdout, self.route.snip_lines);
                debug!(host, snip_len = snip.len(), "traceroute complete");
                ProbeOutcome::Ok(snip)
            }
            Run::TimedOut => {
                warn!(host, "traceroute timed out");
                ProbeOutcome::TimedOut
            }
            Run::SpawnFailed(e) => {
                warn!(host, error = %e, "traceroute unavailable");
                ProbeOutcome::Unavailable
            }
        }
    }

    /// Bandwidth probe, once per invocation (the path is target-independent).
    /// All-or-nothing: nonzero exit or any missing payload field yields
    /// Unavailable rather than a partial report.
    #[instrument(skip(self), fields(repo = "probe", operation = "speedtest"))]
    pub async fn speedtest(&self) -> ProbeOutcome<BandwidthReport> {
        if !tool_available(&self.bandwidth.command) {
            debug!(command = %self.bandwidth.command, "speedtest tool not on PATH");
            return ProbeOutcome::Unavailable;
        }

        let mut cmd = Command::new(&self.bandwidth.command);
        cmd.args(["--accept-license", "--accept-gdpr", "-f", "json"]);

        match run_capped(cmd, Duration::from_secs(self.bandwidth.timeout_secs)).await {
            Run::Finished(out) => {
                if !out.status.success() {
                    warn!(status = %out.status, "speedtest exited nonzero");
                    return ProbeOutcome::Unavailable;
                }
                let stdout = String::from_utf8_lossy(&out.stdout);
                match parse_speedtest_json(&stdout) {
                    Some(report) => {
                        debug!(
                            down_mbps = report.down_mbps,
                            up_mbps = report.up_mbps,
                            "speedtest complete"
                        );
                        ProbeOutcome::Ok(report)
                    }
                    None => {
                        warn!("speedtest payload unparsable");
                        ProbeOutcome::Unavailable
                    }
                }
            }
            Run::TimedOut => {
                warn!("speedtest timed out");
                ProbeOutcome::TimedOut
            }
            Run::SpawnFailed(e) => {
                warn!(error = %e, "speedtest unavailable");
                ProbeOutcome::Unavailable
            }
        }
    }
}
