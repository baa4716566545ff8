//! ptx-daemon entry point.
//!
//! Thin on purpose: load `.env.local`, set up tracing, resolve settings and
//! hand over to [`ptx_daemon::run_daemon`].

use anyhow::Context;
use ptx_config::Settings;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Dev convenience; silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let settings = Settings::from_env().context("loading configuration failed")?;
    info!(
        url = %settings.pretalx_url,
        minutes = settings.interval_minutes(),
        only_new = settings.only_new,
        "ptx-daemon starting"
    );

    ptx_daemon::run_daemon(settings).await
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
