// Statistics engine: latency samples -> loss/avg/percentile/jitter metrics.
// Pure and deterministic; rounding happens here, once, never downstream.

use crate::models::LatencyStats;

const LATENCY_DECIMALS: i32 = 3;
const LOSS_DECIMALS: i32 = 2;

/// Rounds half-away-from-zero to `decimals` places.
fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round() / factor
}

/// Linear interpolation between order statistics. `q` in [0, 1].
/// Returns None for an empty sample set; degenerates to the single value for n = 1.
pub fn quantile(samples: &[f64], q: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut v = samples.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = (v.len() - 1) as f64 * q;
    let lo = idx.floor() as usize;
    let hi = (lo + 1).min(v.len() - 1);
    if hi == lo {
        return Some(v[lo]);
    }
    let frac = idx - lo as f64;
    Some(v[lo] * (1.0 - frac) + v[hi] * frac)
}

/// Population standard deviation (divide by n). 0 for a single sample,
/// None when there are no samples.
pub fn jitter(samples: &[f64]) -> Option<f64> {
    match samples.len() {
        0 => None,
        1 => Some(0.0),
        n => {
            let mean = samples.iter().sum::<f64>() / n as f64;
            let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;
            Some(var.sqrt())
        }
    }
}

/// Summarizes one latency probe: `samples` are the reply times that came back,
/// `sent` the originally requested probe count.
pub fn summarize(samples: &[f64], sent: u32) -> LatencyStats {
    // Duplicate replies cannot push received past sent.
    let received = (samples.len() as u32).min(sent);
    let loss_pct = if sent == 0 {
        0.0
    } else {
        100.0 * (sent - received) as f64 / sent as f64
    };

    let avg = if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    };
    let max = samples
        .iter()
        .copied()
        .fold(None, |m: Option<f64>, s| Some(m.map_or(s, |m| m.max(s))));

    LatencyStats {
        sent,
        received,
        loss_pct: round_to(loss_pct, LOSS_DECIMALS),
        avg_ms: avg.map(|v| round_to(v, LATENCY_DECIMALS)),
        p50_ms: quantile(samples, 0.50).map(|v| round_to(v, LATENCY_DECIMALS)),
        p95_ms: quantile(samples, 0.95).map(|v| round_to(v, LATENCY_DECIMALS)),
        max_ms: max.map(|v| round_to(v, LATENCY_DECIMALS)),
        jitter_ms: jitter(samples).map(|v| round_to(v, LATENCY_DECIMALS)),
    }
}

/// Rounds a megabit/millisecond figure for the bandwidth adapter (2 decimals).
pub fn round_bandwidth(v: f64) -> f64 {
    round_to(v, 2)
}
