// Ping stdout parsing

use regex::Regex;
use std::sync::LazyLock;

static PING_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"time=([0-9.]+)\s*ms").expect("ping time regex"));

/// Extracts one latency sample (ms) from every line carrying a `time=<ms>`
/// token. Lines without the token (lost packets, DNS or error chatter) are
/// skipped, not errors.
pub fn parse_ping_times(stdout: &str) -> Vec<f64> {
    stdout
        .lines()
        .filter_map(|line| {
            PING_TIME_RE
                .captures(line)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
        })
        .collect()
}
