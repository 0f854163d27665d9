// One collection invocation: resolve phase, decide cadence, probe every
// target, append one row per target to the day file, exit. Periodicity is the
// external invoker's job; nothing here retries.

use crate::config::{self, AppConfig};
use crate::dataset::DatasetWriter;
use crate::models::{LatencyStats, ProbeOutcome, ProbeRecord};
use crate::probe_repo::ProbeRepo;
use crate::schedule;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// What one invocation did, for the binary's final log line.
#[derive(Debug)]
pub struct CollectSummary {
    pub rows_appended: usize,
    pub route_probed: bool,
    pub bandwidth_probed: bool,
    pub day_file: PathBuf,
}

/// Runs one full collection batch at the current wall-clock time.
pub async fn run(config: &AppConfig) -> anyhow::Result<CollectSummary> {
    run_at(config, Local::now()).await
}

/// Runs one full collection batch stamped at `now`. Probe failures degrade to
/// empty fields in the affected rows; only dataset I/O aborts the invocation.
#[instrument(skip(config, now), fields(operation = "collect"))]
pub async fn run_at(
    config: &AppConfig,
    now: chrono::DateTime<Local>,
) -> anyhow::Result<CollectSummary> {
    let phase_label = config::resolve_phase_label(Path::new(&config.phase.file));
    // One timestamp per batch: every row of this invocation shares it.
    let ts = now.fixed_offset();

    let plan = schedule::plan_for(schedule::minute_of_day(&now), &config.cadence);
    debug!(route = plan.route, bandwidth = plan.bandwidth, phase = %phase_label, "cadence plan");

    let repo = ProbeRepo::new(
        config.latency.clone(),
        config.route.clone(),
        config.bandwidth.clone(),
    );

    // Bandwidth is measured once per invocation (the path is target-independent)
    // and the result is shared identically across all targets in the batch.
    let bandwidth = if plan.bandwidth {
        repo.speedtest().await.into_option()
    } else {
        None
    };

    let mut records = Vec::with_capacity(config.targets.hosts.len());
    for host in &config.targets.hosts {
        let latency = match repo.ping(host).await {
            ProbeOutcome::Ok(stats) => stats,
            // Timed-out or unavailable probes count as all-lost for this target.
            ProbeOutcome::TimedOut | ProbeOutcome::Unavailable => {
                LatencyStats::lost(config.latency.ping_count)
            }
        };
        let traceroute_snip = if plan.route {
            repo.traceroute(host).await.into_option().unwrap_or_default()
        } else {
            String::new()
        };
        records.push(ProbeRecord {
            ts,
            phase_label: phase_label.clone(),
            host: host.clone(),
            latency,
            traceroute_snip,
            bandwidth: bandwidth.clone(),
        });
    }

    let writer = DatasetWriter::new(&config.dataset.dir, &config.dataset.file_prefix);
    let day_file = writer.day_file(now.date_naive());
    writer.ensure_header(&day_file)?;
    let rows_appended = writer.append(&day_file, &records)?;

    info!(
        rows = rows_appended,
        file = %day_file.display(),
        "batch appended"
    );
    Ok(CollectSummary {
        rows_appended,
        route_probed: plan.route,
        bandwidth_probed: plan.bandwidth,
        day_file,
    })
}
