// Append-only per-day CSV dataset. Files are created once with the fixed
// 16-column header and only ever appended to, never rewritten.

use crate::models::ProbeRecord;
use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Fixed dataset schema. The snapshot transform preserves whatever subset of
/// these columns the source file carries, in source order.
pub const FIELD_NAMES: [&str; 16] = [
    "ts",
    "phase_label",
    "host",
    "sent",
    "received",
    "loss_pct",
    "avg_ms",
    "p50_ms",
    "p95_ms",
    "max_ms",
    "jitter_ms",
    "traceroute_snip",
    "speedtest_down_mbps",
    "speedtest_up_mbps",
    "speedtest_ping_ms",
    "speedtest_raw_json",
];

/// Replacement for line breaks inside a field; cannot itself break a
/// single-line-per-record table.
pub const LINE_JOIN: &str = " | ";

/// Timestamp layout for dataset rows: RFC 3339 at second precision with the
/// local UTC offset.
pub const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RowError {
    #[error("unterminated quoted field")]
    UnterminatedQuote,
    #[error("unexpected character after closing quote")]
    TrailingGarbage,
}

/// Flattens a field to one line: embedded line breaks collapse to the join
/// delimiter, tabs become spaces, and surrounding whitespace is trimmed.
pub fn sanitize_field(s: &str) -> String {
    let joined = if s.contains('\n') || s.contains('\r') {
        s.lines().collect::<Vec<_>>().join(LINE_JOIN)
    } else {
        s.to_string()
    };
    joined.replace('\t', " ").trim().to_string()
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Encodes one row with minimal quoting, without the trailing newline.
pub fn encode_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| escape(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Splits one CSV line into fields, honoring standard double-quote quoting
/// with `""` escapes. The line must not contain raw newlines (write-time
/// sanitization guarantees that).
pub fn parse_row(line: &str) -> Result<Vec<String>, RowError> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        let mut field = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        closed = true;
                        break;
                    }
                } else {
                    field.push(c);
                }
            }
            if !closed {
                return Err(RowError::UnterminatedQuote);
            }
            fields.push(field);
            match chars.next() {
                Some(',') => continue,
                None => break,
                Some(_) => return Err(RowError::TrailingGarbage),
            }
        } else {
            let mut saw_comma = false;
            for c in chars.by_ref() {
                if c == ',' {
                    saw_comma = true;
                    break;
                }
                field.push(c);
            }
            fields.push(field);
            if !saw_comma {
                break;
            }
        }
    }
    Ok(fields)
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

/// Flattens a record into the 16-column row. The two free-text fields pass
/// through the sanitizer so a row can never span multiple lines.
pub fn record_to_row(r: &ProbeRecord) -> Vec<String> {
    let (down, up, ping, raw) = match &r.bandwidth {
        Some(b) => (
            b.down_mbps.to_string(),
            b.up_mbps.to_string(),
            b.ping_ms.to_string(),
            sanitize_field(&b.raw_json),
        ),
        None => (String::new(), String::new(), String::new(), String::new()),
    };
    vec![
        r.ts.format(TS_FORMAT).to_string(),
        r.phase_label.clone(),
        r.host.clone(),
        r.latency.sent.to_string(),
        r.latency.received.to_string(),
        r.latency.loss_pct.to_string(),
        fmt_opt(r.latency.avg_ms),
        fmt_opt(r.latency.p50_ms),
        fmt_opt(r.latency.p95_ms),
        fmt_opt(r.latency.max_ms),
        fmt_opt(r.latency.jitter_ms),
        sanitize_field(&r.traceroute_snip),
        down,
        up,
        ping,
        raw,
    ]
}

pub struct DatasetWriter {
    dir: PathBuf,
    file_prefix: String,
}

impl DatasetWriter {
    pub fn new(dir: impl Into<PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_prefix: file_prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_prefix(&self) -> &str {
        &self.file_prefix
    }

    /// Day-keyed dataset path, e.g. `data/pathwatch_20260828.csv`.
    pub fn day_file(&self, day: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}{}.csv", self.file_prefix, day.format("%Y%m%d")))
    }

    /// Creates the file with the schema header if it does not exist yet.
    /// Idempotent: an already-initialized file is left untouched.
    #[instrument(skip(self), fields(repo = "dataset", operation = "ensure_header"))]
    pub fn ensure_header(&self, path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let header: Vec<String> = FIELD_NAMES.iter().map(|s| s.to_string()).collect();
        std::fs::write(path, format!("{}\n", encode_row(&header)))?;
        Ok(())
    }

    /// Appends one row per record, in the given order. Rows are fully encoded
    /// in memory before the file is opened, so an I/O failure never leaves a
    /// partial row behind. The handle is opened and closed per invocation.
    #[instrument(skip(self, records), fields(repo = "dataset", operation = "append", rows = records.len()))]
    pub fn append(&self, path: &Path, records: &[ProbeRecord]) -> anyhow::Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut buf = String::new();
        for r in records {
            buf.push_str(&encode_row(&record_to_row(r)));
            buf.push('\n');
        }
        let mut file = std::fs::OpenOptions::new().append(true).open(path)?;
        file.write_all(buf.as_bytes())?;
        Ok(records.len())
    }
}
