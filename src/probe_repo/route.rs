// Traceroute stdout truncation

use crate::dataset::LINE_JOIN;

/// Keeps the first `max_lines` hop lines, joined single-line with the dataset
/// delimiter and trimmed.
pub fn snip_route(stdout: &str, max_lines: usize) -> String {
    stdout
        .lines()
        .take(max_lines)
        .collect::<Vec<_>>()
        .join(LINE_JOIN)
        .trim()
        .to_string()
}
