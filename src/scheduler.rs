//! Background snapshot loop.
//!
//! Ticks every `snapshot_interval`, runs one publish cycle per tick and
//! exits on cancellation. The task only holds a weak handle, so it also ends
//! once every `Registry` clone is gone.

use std::sync::Weak;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::registry::Shared;

pub(crate) fn spawn(
    rt: &Handle,
    shared: Weak<Shared>,
    period: Duration,
    exit: CancellationToken,
) -> JoinHandle<()> {
    rt.spawn(run(shared, period, exit))
}

async fn run(shared: Weak<Shared>, period: Duration, exit: CancellationToken) {
    let mut ticker = interval(period);
    // A slow output delays the next cycle instead of triggering a burst
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = IntervalStream::new(ticker);

    // The first tick completes immediately
    ticks.next().await;

    loop {
        tokio::select! {
            biased;

            _ = exit.cancelled() => break,

            tick = ticks.next() => {
                if tick.is_none() {
                    break;
                }
                let Some(shared) = shared.upgrade() else {
                    debug!("registry dropped, stopping scheduler");
                    break;
                };
                shared.publish().await;
            }
        }
    }
}
