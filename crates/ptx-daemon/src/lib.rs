//! ptx-daemon
//!
//! Wires the pretalx source, the reconcile engine and the Pushover sink into
//! a baseline load followed by a fixed-period check loop.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use ptx_config::Settings;
use ptx_notify::{MessagePolicy, PushoverSink};
use ptx_reconcile::{KnownSubmissions, ReportMode};
use ptx_source::PretalxSource;
use tracing::{error, info};

pub mod cycle;
pub mod schedule;

pub use cycle::{CycleError, CyclePhase, CycleReport, DispatchOutcome, ReconcileCycle};
pub use schedule::run_schedule;

/// Build the production cycle from resolved settings.
pub fn build_cycle(settings: &Settings) -> ReconcileCycle {
    let source = PretalxSource::new(
        settings.pretalx_url.clone(),
        settings.credentials.pretalx_token.clone(),
    );
    let sink = PushoverSink::new(
        settings.credentials.pushover_app_token.clone(),
        settings.credentials.pushover_user_key.clone(),
    )
    .with_device(settings.pushover_device.clone());

    ReconcileCycle::new(
        Arc::new(source),
        Arc::new(sink),
        ReportMode::from_only_new(settings.only_new),
        message_policy(settings),
    )
}

/// Formatting policy for the configured source; an unset sound keeps the default.
pub fn message_policy(settings: &Settings) -> MessagePolicy {
    let policy = MessagePolicy::for_source(&settings.pretalx_url)
        .with_max_body_chars(settings.message_max_chars);
    match &settings.pushover_sound {
        Some(sound) => policy.with_sound(Some(sound.clone())),
        None => policy,
    }
}

/// Baseline, then check every `settings.interval` until `shutdown` resolves.
///
/// A failed baseline is fatal. Failures after it are logged per cycle.
pub async fn run_with_shutdown<S>(
    cycle: &ReconcileCycle,
    settings: &Settings,
    shutdown: S,
) -> anyhow::Result<u64>
where
    S: Future<Output = ()>,
{
    let mut store = KnownSubmissions::new();
    cycle
        .baseline(&mut store)
        .await
        .context("initial submission download failed")?;

    info!(
        minutes = settings.interval_minutes(),
        mode = cycle.mode().as_str(),
        "checking for changes periodically"
    );
    let cycles = run_schedule(cycle, &mut store, settings.interval, shutdown).await;
    info!(cycles, known = store.len(), "scheduler stopped");
    Ok(cycles)
}

/// Production entry: build from settings and run until Ctrl-C.
pub async fn run_daemon(settings: Settings) -> anyhow::Result<()> {
    let cycle = build_cycle(&settings);
    run_with_shutdown(&cycle, &settings, ctrl_c()).await?;
    Ok(())
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}
