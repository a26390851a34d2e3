//! Periodic refresh scheduler.
//!
//! A single ticking task drives alert refresh; cancellation goes through a
//! `CancellationToken` so shutdown never leaves a stray timer behind. The
//! state's refresh gate decides whether a tick runs or is dropped.

use crate::state::MonitorState;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub fn spawn_refresh_loop(
    state: MonitorState,
    interval: Duration,
) -> (CancellationToken, JoinHandle<()>) {
    let token = CancellationToken::new();
    let loop_token = token.clone();

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = loop_token.cancelled() => {
                    info!("refresh loop cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    state.run_refresh_cycle().await;
                }
            }
        }
    });

    (token, handle)
}
