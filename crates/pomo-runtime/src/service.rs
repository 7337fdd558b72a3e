//! The canonical clock service.
//!
//! [`ClockService`] moves the one [`SessionClock`] into a dedicated tokio
//! task. Commands from observers and ticks from the [`Ticker`] are handled
//! in the same `select!` loop, so no two mutations ever overlap and the
//! clock needs no lock. After every mutation the task publishes a snapshot
//! on a `watch` channel; a second task persists the latest snapshot, so a
//! slow store never delays a tick.

use chrono::{DateTime, Utc};
use pomo_core::clock::{Reconciliation, SessionClock, TickOutcome};
use pomo_core::error::{PomoError, Result};
use pomo_core::models::{ClockConfig, ClockSnapshot};
use pomo_core::notifications::Announcer;
use pomo_core::protocol::{Action, Request};
use pomo_store::{PersistenceBridge, Storage};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::observer::ClockHandle;
use crate::ticker::Ticker;

/// Requests buffered before senders wait.
const COMMAND_BUFFER: usize = 32;

// ── Messages ──────────────────────────────────────────────────────────────────

/// A request paired with the channel its snapshot reply goes to.
pub(crate) struct Envelope {
    pub(crate) request: Request,
    pub(crate) reply: oneshot::Sender<ClockSnapshot>,
}

pub(crate) enum Message {
    Request(Envelope),
    Shutdown,
}

// ── ClockService ──────────────────────────────────────────────────────────────

/// Builder for the clock task.
///
/// # Example
///
/// ```no_run
/// # async fn run() -> pomo_core::Result<()> {
/// use pomo_core::models::ClockConfig;
/// use pomo_core::notifications::Announcer;
/// use pomo_core::protocol::Action;
/// use pomo_runtime::service::ClockService;
/// use pomo_store::{MemoryStore, PersistenceBridge};
///
/// let bridge = PersistenceBridge::new(MemoryStore::new());
/// let service = ClockService::restore(bridge, ClockConfig::default(), Announcer::silent()).await;
/// let (clock, service) = service.start();
/// clock.command(Action::Start).await?;
/// service.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct ClockService<S> {
    clock: SessionClock,
    bridge: PersistenceBridge<S>,
    announcer: Announcer,
}

impl<S: Storage> ClockService<S> {
    /// Wrap an already-built clock.
    pub fn new(clock: SessionClock, bridge: PersistenceBridge<S>, announcer: Announcer) -> Self {
        Self {
            clock,
            bridge,
            announcer,
        }
    }

    /// Restore the clock from storage as of now.
    pub async fn restore(
        bridge: PersistenceBridge<S>,
        config: ClockConfig,
        announcer: Announcer,
    ) -> Self {
        Self::restore_at(bridge, config, announcer, Utc::now()).await
    }

    /// Restore the clock from storage as of `now`.
    ///
    /// A phase that ran out while the process was down is announced here,
    /// exactly once.
    pub async fn restore_at(
        bridge: PersistenceBridge<S>,
        config: ClockConfig,
        announcer: Announcer,
        now: DateTime<Utc>,
    ) -> Self {
        let restored = bridge.restore(config, now).await;
        if let Reconciliation::FastForwarded(transition) = restored.reconciliation {
            announcer.announce(&transition);
        }
        Self::new(restored.clock, bridge, announcer)
    }

    /// Current state before the service is started.
    pub fn snapshot(&self) -> ClockSnapshot {
        self.clock.snapshot()
    }

    /// Spawn the clock and persister tasks.
    ///
    /// A clock that is already running (resumed from storage) starts
    /// ticking immediately. Returns the observer handle and the handle that
    /// owns the tasks.
    pub fn start(self) -> (ClockHandle, ServiceHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(self.clock.snapshot());

        let persist_task = tokio::spawn(persist_loop(self.bridge, snapshot_rx.clone()));

        let mut ticker = Ticker::default();
        if self.clock.is_running() {
            ticker.arm();
        }

        let task = ClockTask {
            clock: self.clock,
            announcer: self.announcer,
            ticker,
            snapshots: snapshot_tx,
        };
        let clock_task = tokio::spawn(task.run(rx));

        let handle = ClockHandle::new(tx.clone(), snapshot_rx);
        (
            handle,
            ServiceHandle {
                tx,
                clock_task,
                persist_task,
            },
        )
    }
}

// ── ServiceHandle ─────────────────────────────────────────────────────────────

/// Owner of the background tasks.
///
/// Call [`ServiceHandle::shutdown`] to stop ticking and flush the final
/// state to storage.
pub struct ServiceHandle {
    tx: mpsc::Sender<Message>,
    clock_task: JoinHandle<ClockSnapshot>,
    persist_task: JoinHandle<()>,
}

impl ServiceHandle {
    /// Stop the clock, wait for the last snapshot to be saved and return it.
    pub async fn shutdown(self) -> Result<ClockSnapshot> {
        if self.tx.send(Message::Shutdown).await.is_err() {
            debug!("clock task already gone");
        }
        drop(self.tx);

        let snapshot = self
            .clock_task
            .await
            .map_err(|e| PomoError::Other(e.into()))?;

        if let Err(e) = self.persist_task.await {
            warn!(error = %e, "persister task failed during shutdown");
        }

        info!(
            remaining = snapshot.remaining,
            completed = snapshot.completed_count,
            "clock service stopped"
        );
        Ok(snapshot)
    }

    /// Immediately abort both tasks without flushing.
    pub fn abort(&self) {
        self.clock_task.abort();
        self.persist_task.abort();
    }
}

// ── ClockTask ─────────────────────────────────────────────────────────────────

/// State owned by the clock task.
struct ClockTask {
    clock: SessionClock,
    announcer: Announcer,
    ticker: Ticker,
    snapshots: watch::Sender<ClockSnapshot>,
}

impl ClockTask {
    async fn run(mut self, mut rx: mpsc::Receiver<Message>) -> ClockSnapshot {
        debug!(running = self.clock.is_running(), "clock task started");

        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(Message::Request(envelope)) => {
                        let snapshot = self.handle(envelope.request);
                        if envelope.reply.send(snapshot).is_err() {
                            debug!("observer dropped before reply");
                        }
                    }
                    Some(Message::Shutdown) | None => break,
                },
                _ = self.ticker.tick() => self.on_tick(),
            }
        }

        self.ticker.disarm();
        self.clock.snapshot()
    }

    fn handle(&mut self, request: Request) -> ClockSnapshot {
        match request.action() {
            None => {}
            Some(Action::Start) => {
                if self.clock.start(Utc::now()) {
                    self.ticker.arm();
                    info!(phase = %self.clock.phase(), remaining = self.clock.remaining(), "clock started");
                    self.publish();
                }
            }
            Some(Action::Pause) => {
                if self.clock.pause() {
                    self.ticker.disarm();
                    info!(remaining = self.clock.remaining(), "clock paused");
                    self.publish();
                }
            }
            Some(Action::Reset) => {
                self.ticker.disarm();
                self.clock.reset();
                info!(phase = %self.clock.phase(), remaining = self.clock.remaining(), "clock reset");
                self.publish();
            }
        }
        self.clock.snapshot()
    }

    fn on_tick(&mut self) {
        match self.clock.tick() {
            TickOutcome::Ignored => self.ticker.disarm(),
            TickOutcome::Continue { remaining } => {
                debug!(remaining, "tick");
                self.publish();
            }
            TickOutcome::Completed(transition) => {
                self.ticker.disarm();
                info!(
                    from = %transition.from,
                    to = %transition.to,
                    completed = transition.completed_count,
                    cycle = transition.cycle_index,
                    "phase complete"
                );
                self.announcer.announce(&transition);
                self.publish();
            }
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.clock.snapshot());
    }
}

// ── Persister ─────────────────────────────────────────────────────────────────

/// Save the initial snapshot, then every published change until the clock
/// task drops its sender. A value published just before shutdown is still
/// observed and saved.
async fn persist_loop<S: Storage>(
    bridge: PersistenceBridge<S>,
    mut rx: watch::Receiver<ClockSnapshot>,
) {
    let initial = rx.borrow_and_update().clone();
    bridge.save(&initial).await;

    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        bridge.save(&snapshot).await;
    }

    debug!("persister stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
