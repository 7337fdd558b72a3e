//! Observer-facing handle to the running clock.

use pomo_core::error::{PomoError, Result};
use pomo_core::indicator::Indicator;
use pomo_core::models::ClockSnapshot;
use pomo_core::protocol::{Action, Request};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::service::{Envelope, Message};

/// Cheap-to-clone handle for querying and commanding the clock service.
///
/// Every method fails with [`PomoError::ClockStopped`] once the service has
/// shut down.
#[derive(Clone)]
pub struct ClockHandle {
    tx: mpsc::Sender<Message>,
    snapshots: watch::Receiver<ClockSnapshot>,
}

impl ClockHandle {
    pub(crate) fn new(tx: mpsc::Sender<Message>, snapshots: watch::Receiver<ClockSnapshot>) -> Self {
        Self { tx, snapshots }
    }

    /// Send a request and wait for the snapshot taken after it was applied.
    pub async fn request(&self, request: Request) -> Result<ClockSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Request(Envelope { request, reply }))
            .await
            .map_err(|_| PomoError::ClockStopped)?;
        rx.await.map_err(|_| PomoError::ClockStopped)
    }

    /// Current state. Never changes the clock.
    pub async fn query(&self) -> Result<ClockSnapshot> {
        self.request(Request::GetState).await
    }

    pub async fn command(&self, action: Action) -> Result<ClockSnapshot> {
        self.request(action.into()).await
    }

    /// Receiver that sees every snapshot published after a mutation.
    pub fn subscribe(&self) -> watch::Receiver<ClockSnapshot> {
        self.snapshots.clone()
    }

    /// Most recently published snapshot, without a round trip.
    pub fn latest(&self) -> ClockSnapshot {
        self.snapshots.borrow().clone()
    }
}

/// Drive an ambient indicator from published snapshots.
///
/// `sink` is called with the initial indicator and again whenever the badge
/// text or colour changes. The task ends when the service shuts down.
pub fn spawn_indicator<F>(handle: &ClockHandle, mut sink: F) -> JoinHandle<()>
where
    F: FnMut(&Indicator) + Send + 'static,
{
    let mut rx = handle.subscribe();
    tokio::spawn(async move {
        let mut last: Option<Indicator> = None;
        loop {
            let indicator = Indicator::from_snapshot(&rx.borrow_and_update());
            if last.as_ref() != Some(&indicator) {
                sink(&indicator);
                last = Some(indicator);
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
        debug!("indicator feed stopped");
    })
}
