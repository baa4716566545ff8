//! Periodic driver around [`ReconcileCycle`].

use std::future::Future;
use std::time::Duration;

use ptx_reconcile::KnownSubmissions;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::cycle::ReconcileCycle;

/// Run `cycle` every `period` until `shutdown` resolves; returns the number of
/// cycles started.
///
/// The first cycle fires one full period after this call. A cycle that
/// overruns pushes the next tick back instead of bursting. Shutdown is only
/// observed between cycles, so an in-flight cycle always completes.
pub async fn run_schedule<S>(
    cycle: &ReconcileCycle,
    store: &mut KnownSubmissions,
    period: Duration,
    shutdown: S,
) -> u64
where
    S: Future<Output = ()>,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut cycles: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!(cycles, "shutdown requested, scheduler stopping");
                break;
            }
            _ = ticker.tick() => {
                cycles += 1;
                if let Err(err) = cycle.run(store).await {
                    warn!(cycle = cycles, error = %err, "cycle failed; retrying next period");
                }
            }
        }
    }
    cycles
}
