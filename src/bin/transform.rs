use anyhow::Result;
use pathwatch::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let config = config::AppConfig::load()?;
    let transform = transform::SnapshotTransform::new(
        &config.dataset.dir,
        &config.dataset.file_prefix,
        &config.snapshot.path,
        config.snapshot.window_hours,
    );

    let outcome = transform.run(chrono::Utc::now())?;
    match outcome.source {
        Some(src) => tracing::info!(
            rows = outcome.rows_written,
            source = %src.display(),
            snapshot = %config.snapshot.path,
            "snapshot published"
        ),
        None => tracing::info!(dir = %config.dataset.dir, "no dataset files found; nothing to do"),
    }
    Ok(())
}
