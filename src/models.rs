// Domain models shared by the collector and the transform

use chrono::{DateTime, FixedOffset};

/// Outcome of one external probe. Callers pattern-match; a failed probe is a
/// value, never an error that could abort the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<T> {
    Ok(T),
    /// Tool missing, nonzero exit, or unparsable output.
    Unavailable,
    /// Hit the hard wall-clock cap.
    TimedOut,
}

impl<T> ProbeOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            ProbeOutcome::Ok(v) => Some(v),
            ProbeOutcome::Unavailable | ProbeOutcome::TimedOut => None,
        }
    }
}

/// Latency metrics for one target, already rounded at the stats boundary.
/// All derived fields are None when no replies arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyStats {
    pub sent: u32,
    pub received: u32,
    pub loss_pct: f64,
    pub avg_ms: Option<f64>,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub jitter_ms: Option<f64>,
}

impl LatencyStats {
    /// All-lost probe: sent requests, zero replies.
    pub fn lost(sent: u32) -> Self {
        Self {
            sent,
            received: 0,
            loss_pct: if sent == 0 { 0.0 } else { 100.0 },
            avg_ms: None,
            p50_ms: None,
            p95_ms: None,
            max_ms: None,
            jitter_ms: None,
        }
    }
}

/// Bandwidth probe result. All-or-nothing: a report either has every field or
/// does not exist, so a record never carries partial bandwidth data.
#[derive(Debug, Clone, PartialEq)]
pub struct BandwidthReport {
    pub down_mbps: f64,
    pub up_mbps: f64,
    pub ping_ms: f64,
    /// Raw probe stdout, kept verbatim (trimmed) for audit.
    pub raw_json: String,
}

/// One dataset row: everything measured for one target in one invocation.
/// The bandwidth report is shared identically across all targets of a batch.
#[derive(Debug, Clone)]
pub struct ProbeRecord {
    pub ts: DateTime<FixedOffset>,
    pub phase_label: String,
    pub host: String,
    pub latency: LatencyStats,
    /// Truncated single-line traceroute; empty when not scheduled or unavailable.
    pub traceroute_snip: String,
    pub bandwidth: Option<BandwidthReport>,
}
