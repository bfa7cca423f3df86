// ── Session ──
//
// Owns the wizard state, the backend gateway and the status poller. The
// poller handle lives here and nowhere else: `StartPolling` creates it,
// `StopPolling` (or dropping the session) cancels it.

use std::sync::Arc;
use std::time::Duration;

use pcap2socks_api::{
    Backend, InterfaceInfo, RunPayload, RunResponse, StatusResponse, TestPayload, TestResponse,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::CoreError;
use crate::gateway::Gateway;
use crate::poller::{StatusPoller, StatusUpdate};
use crate::wizard::{self, Effect, Event, Op, Wizard};

/// Default status polling period.
pub const STATUS_INTERVAL: Duration = Duration::from_secs(1);

pub struct Session<B: Backend> {
    gateway: Arc<Gateway<B>>,
    wizard: Wizard,
    poller: Option<StatusPoller>,
    period: Duration,
    status_tx: mpsc::UnboundedSender<StatusUpdate>,
}

impl<B: Backend> Session<B> {
    /// Create a session and the receiver status updates arrive on while
    /// running.
    pub fn new(backend: B, period: Duration) -> (Self, mpsc::UnboundedReceiver<StatusUpdate>) {
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let session = Self {
            gateway: Arc::new(Gateway::new(backend)),
            wizard: Wizard::default(),
            poller: None,
            period,
            status_tx,
        };
        (session, status_rx)
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    /// Shared gateway, for issuing commands from spawned tasks.
    pub fn gateway(&self) -> Arc<Gateway<B>> {
        Arc::clone(&self.gateway)
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_some()
    }

    /// Reduce `event` and carry out the resulting effects.
    pub fn dispatch(&mut self, event: Event) -> &Wizard {
        let (next, effects) = wizard::reduce(&self.wizard, event);
        self.wizard = next;
        for effect in effects {
            self.apply(effect);
        }
        &self.wizard
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::StartPolling => {
                if self.poller.is_some() {
                    debug!("status poller already running");
                    return;
                }
                self.poller = Some(StatusPoller::spawn(
                    self.gateway(),
                    self.period,
                    self.status_tx.clone(),
                ));
            }
            Effect::StopPolling => {
                if self.poller.take().is_some() {
                    debug!("status poller cancelled");
                }
            }
        }
    }

    /// Fold a report from this session's poller into the telemetry.
    pub fn receive_status(&mut self, status: StatusResponse) -> &Wizard {
        let period = self.period;
        self.dispatch(Event::StatusReceived { status, period })
    }

    /// Mark `op` as in flight, or fail with [`CoreError::Busy`].
    pub fn begin(&mut self, op: Op) -> Result<(), CoreError> {
        if self.wizard.is_busy() {
            return Err(CoreError::Busy);
        }
        self.dispatch(Event::Begin(op));
        Ok(())
    }

    // ── Awaited operations ──────────────────────────────────────────
    //
    // Each runs one command to completion and feeds its outcome back into
    // the wizard.

    pub async fn run(&mut self, payload: RunPayload) -> Result<RunResponse, CoreError> {
        self.begin(Op::Run)?;
        let result = self.gateway.run(payload).await;
        self.dispatch(if result.is_ok() {
            Event::RunSucceeded
        } else {
            Event::RunFailed
        });
        result
    }

    pub async fn stop(&mut self) -> Result<(), CoreError> {
        self.begin(Op::Stop)?;
        let result = self.gateway.stop().await;
        self.dispatch(if result.is_ok() {
            Event::StopSucceeded
        } else {
            Event::StopFailed
        });
        result
    }

    pub async fn test(&mut self, payload: TestPayload) -> Result<TestResponse, CoreError> {
        self.begin(Op::Test)?;
        let result = self.gateway.test(payload).await;
        self.dispatch(Event::TestFinished);
        result
    }

    pub async fn list_interfaces(&mut self) -> Result<Vec<InterfaceInfo>, CoreError> {
        self.begin(Op::ListInterfaces)?;
        let result = self.gateway.list_interfaces().await;
        self.dispatch(Event::InterfacesListed);
        result
    }
}
