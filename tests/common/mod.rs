// Shared test helpers

#![allow(dead_code)]

use chrono::{DateTime, FixedOffset};
use pathwatch::models::{BandwidthReport, LatencyStats, ProbeRecord};
use std::path::{Path, PathBuf};

pub fn stats(sent: u32, received: u32) -> LatencyStats {
    LatencyStats {
        sent,
        received,
        loss_pct: if sent == 0 {
            0.0
        } else {
            100.0 * (sent - received) as f64 / sent as f64
        },
        avg_ms: (received > 0).then_some(12.0),
        p50_ms: (received > 0).then_some(11.5),
        p95_ms: (received > 0).then_some(14.0),
        max_ms: (received > 0).then_some(15.0),
        jitter_ms: (received > 0).then_some(1.25),
    }
}

pub fn record(ts: DateTime<FixedOffset>, host: &str) -> ProbeRecord {
    ProbeRecord {
        ts,
        phase_label: "baseline".into(),
        host: host.into(),
        latency: stats(10, 10),
        traceroute_snip: String::new(),
        bandwidth: None,
    }
}

pub fn bandwidth_report() -> BandwidthReport {
    BandwidthReport {
        down_mbps: 842.11,
        up_mbps: 31.5,
        ping_ms: 9.42,
        raw_json: r#"{"ping":{"latency":9.42}}"#.into(),
    }
}

/// Writes an executable shell script into `dir` and returns its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}
