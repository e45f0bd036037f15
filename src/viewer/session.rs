//! Gate state machine and fixed-rate polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::reflector::HeadersPayload;
use crate::viewer::challenge::{Challenge, ChallengeError};
use crate::viewer::fetch::{FetchError, Fetcher};

/// Polling period used by the browser page this client mirrors.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Whether the human-verification gate has been passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unverified,
    Verified,
}

/// What the panes render from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    /// Last successfully fetched payload.
    pub data: Option<HeadersPayload>,
    /// Description of the last fault, cleared by the next success.
    pub error: Option<String>,
}

impl ViewState {
    /// Nothing has resolved yet.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }

    fn apply(&mut self, result: Result<HeadersPayload, FetchError>) {
        match result {
            Ok(payload) => {
                self.data = Some(payload);
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Fetching headers failed");
                self.error = Some(e.to_string());
            }
        }
    }
}

/// Header viewer session.
///
/// Starts [`GateState::Unverified`] and issues no fetches until a challenge
/// passes. Dropping the viewer stops the polling timer; fetches already in
/// flight run to completion and their results are discarded.
pub struct HeaderViewer<F: Fetcher> {
    fetcher: Arc<F>,
    interval: Duration,
    gate: GateState,
    view: Arc<watch::Sender<ViewState>>,
    poller: Option<JoinHandle<()>>,
}

impl<F: Fetcher> HeaderViewer<F> {
    pub fn new(fetcher: F, interval: Duration) -> Self {
        let (view, _) = watch::channel(ViewState::default());
        Self {
            fetcher: Arc::new(fetcher),
            interval,
            gate: GateState::Unverified,
            view: Arc::new(view),
            poller: None,
        }
    }

    pub fn gate(&self) -> GateState {
        self.gate
    }

    /// Receive every view state update.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.subscribe()
    }

    /// Current view state.
    pub fn snapshot(&self) -> ViewState {
        self.view.borrow().clone()
    }

    /// Run a challenge. Passing it arms polling; failing it leaves the gate
    /// closed so the caller can try again.
    pub async fn verify<C: Challenge>(&mut self, challenge: &mut C) -> Result<(), ChallengeError> {
        if self.gate == GateState::Verified {
            return Ok(());
        }

        match challenge.verify().await {
            Ok(()) => {
                self.on_verified();
                Ok(())
            }
            Err(e) => {
                tracing::info!(error = %e, "Verification failed, gate stays closed");
                Err(e)
            }
        }
    }

    /// Open the gate and start polling. Idempotent.
    pub fn on_verified(&mut self) {
        if self.gate == GateState::Verified {
            return;
        }
        self.gate = GateState::Verified;

        tracing::info!(interval = ?self.interval, "Verified, polling started");
        self.poller = Some(tokio::spawn(poll(
            self.fetcher.clone(),
            self.interval,
            self.view.clone(),
        )));
    }
}

impl<F: Fetcher> Drop for HeaderViewer<F> {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

/// Fetch immediately, then once per `period`, each fetch in its own task.
async fn poll<F: Fetcher>(fetcher: Arc<F>, period: Duration, view: Arc<watch::Sender<ViewState>>) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let fetcher = fetcher.clone();
        let view = view.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch().await;
            view.send_modify(|state| state.apply(result));
        });
    }
}
