// Windowed snapshot transform: newest day file -> time-filtered, sanitized,
// atomically published copy for the visualization process. Read-only on the
// dataset, so it can run concurrently with the collector.

use crate::dataset::{encode_row, parse_row, sanitize_field};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Result of one transform run. Zero rows with no source is the "nothing to
/// do" terminal state, not an error.
#[derive(Debug)]
pub struct TransformOutcome {
    pub rows_written: usize,
    pub source: Option<PathBuf>,
}

pub struct SnapshotTransform {
    data_dir: PathBuf,
    file_prefix: String,
    out_path: PathBuf,
    window: chrono::Duration,
}

/// Parses a dataset timestamp. Offset-aware RFC 3339 first; a naive timestamp
/// is assumed to already be in UTC. None drops the single row, never the run.
pub fn parse_row_ts(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|t| t.and_utc())
}

impl SnapshotTransform {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        file_prefix: impl Into<String>,
        out_path: impl Into<PathBuf>,
        window_hours: u32,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            file_prefix: file_prefix.into(),
            out_path: out_path.into(),
            window: chrono::Duration::hours(window_hours as i64),
        }
    }

    /// Source selection policy: the most recently *modified* dataset file, not
    /// the newest by name. Filename ordering breaks if the naming scheme ever
    /// changes across month or year boundaries; mtime does not.
    pub fn newest_dataset(&self) -> anyhow::Result<Option<PathBuf>> {
        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(&self.file_prefix) || !name.ends_with(".csv") {
                continue;
            }
            let mtime = entry.metadata()?.modified()?;
            if newest.as_ref().is_none_or(|(t, _)| mtime > *t) {
                newest = Some((mtime, entry.path()));
            }
        }
        Ok(newest.map(|(_, p)| p))
    }

    /// Builds and atomically publishes the snapshot: rows within the trailing
    /// window ending at `now`, free-text fields sanitized, source column order
    /// preserved. Temp-file-then-rename keeps the previous snapshot intact if
    /// this run dies mid-write.
    #[instrument(skip(self), fields(operation = "transform"))]
    pub fn run(&self, now: DateTime<Utc>) -> anyhow::Result<TransformOutcome> {
        let Some(src) = self.newest_dataset()? else {
            debug!(dir = %self.data_dir.display(), "no dataset files found");
            return Ok(TransformOutcome {
                rows_written: 0,
                source: None,
            });
        };

        let cutoff = now - self.window;
        let content = std::fs::read_to_string(&src)?;
        let mut lines = logical_records(&content).into_iter();

        let Some(header_line) = lines.next() else {
            return Ok(TransformOutcome {
                rows_written: 0,
                source: Some(src),
            });
        };
        let header = parse_row(&header_line)
            .map_err(|e| anyhow::anyhow!("malformed header in {}: {}", src.display(), e))?;
        let ts_idx = header
            .iter()
            .position(|c| c == "ts")
            .ok_or_else(|| anyhow::anyhow!("no ts column in {}", src.display()))?;
        let sanitize_idx: Vec<usize> = header
            .iter()
            .enumerate()
            .filter(|(_, c)| *c == "traceroute_snip" || *c == "speedtest_raw_json")
            .map(|(i, _)| i)
            .collect();

        let mut out = String::new();
        out.push_str(&encode_row(&header));
        out.push('\n');
        let mut rows_written = 0usize;
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let mut fields = match parse_row(&line) {
                Ok(f) => f,
                Err(e) => {
                    warn!(error = %e, "dropping malformed row");
                    continue;
                }
            };
            let Some(ts) = fields.get(ts_idx).map(String::as_str).and_then(parse_row_ts) else {
                warn!("dropping row with unparsable timestamp");
                continue;
            };
            if ts < cutoff {
                continue;
            }
            for &i in &sanitize_idx {
                if let Some(f) = fields.get_mut(i) {
                    *f = sanitize_field(f);
                }
            }
            out.push_str(&encode_row(&fields));
            out.push('\n');
            rows_written += 1;
        }

        self.publish(&out)?;
        Ok(TransformOutcome {
            rows_written,
            source: Some(src),
        })
    }

    /// Writes the whole snapshot to a sibling temp file, then renames it over
    /// the published path. A concurrent reader sees the old file or the new
    /// one, never a partial write.
    fn publish(&self, content: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.out_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = tmp_path(&self.out_path);
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.out_path)?;
        Ok(())
    }
}

/// Groups physical lines into CSV records: a record is complete once its
/// accumulated quote count is even, so a quoted field carrying an embedded
/// newline (pre-sanitization data) stays one record.
fn logical_records(content: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut pending = String::new();
    for line in content.lines() {
        if pending.is_empty() {
            pending.push_str(line);
        } else {
            pending.push('\n');
            pending.push_str(line);
        }
        if pending.matches('"').count() % 2 == 0 {
            records.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        records.push(pending);
    }
    records
}

fn tmp_path(out: &Path) -> PathBuf {
    let name = out
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot.csv".into());
    out.with_file_name(format!("{name}.tmp"))
}
