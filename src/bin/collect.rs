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

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let config = config::AppConfig::load()?;
    tracing::info!(
        version = version::VERSION,
        targets = config.targets.hosts.len(),
        "starting collection invocation"
    );

    let summary = collector::run(&config).await?;
    tracing::info!(
        rows = summary.rows_appended,
        route = summary.route_probed,
        bandwidth = summary.bandwidth_probed,
        file = %summary.day_file.display(),
        "collection complete"
    );
    Ok(())
}
