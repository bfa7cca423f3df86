// ── Status poller ──
//
// Background task that queries `getStatus` on a fixed period and forwards
// each result over a channel. Stopping is cooperative through a
// `CancellationToken`; an in-flight query is abandoned, so nothing is sent
// once `stop` returns. Dropping the handle only cancels: one last update may
// still arrive on a multi-threaded runtime.

use std::sync::Arc;
use std::time::Duration;

use pcap2socks_api::{Backend, StatusResponse};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CoreError;
use crate::gateway::Gateway;

/// One polling result.
pub type StatusUpdate = Result<StatusResponse, CoreError>;

/// Handle to a running poll task. Dropping it cancels the task.
pub struct StatusPoller {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    /// Spawn the poll task. The first query fires one `period` after spawn.
    pub fn spawn<B: Backend>(
        gateway: Arc<Gateway<B>>,
        period: Duration,
        tx: mpsc::UnboundedSender<StatusUpdate>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_task(gateway, period, tx, cancel.clone()));
        debug!(period_ms = period.as_millis(), "status poller started");
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Cancel the task and wait for it to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        debug!("status poller stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_task<B: Backend>(
    gateway: Arc<Gateway<B>>,
    period: Duration,
    tx: mpsc::UnboundedSender<StatusUpdate>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let result = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    r = gateway.status() => r,
                };
                if tx.send(result).is_err() {
                    debug!("status receiver dropped, poller exiting");
                    break;
                }
            }
        }
    }
}
