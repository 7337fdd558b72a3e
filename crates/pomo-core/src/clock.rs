//! The canonical session clock.
//!
//! [`SessionClock`] is a pure state machine: it never sleeps, spawns or
//! performs I/O. Every operation takes the wall-clock `now` it needs and
//! reports what happened through a return value, so the runtime decides
//! when to arm the tick, what to persist and whom to notify.
//!
//! ## State transitions
//!
//! ```text
//! Work --(remaining hits 0)--> ShortBreak | LongBreak --(remaining hits 0)--> Work
//! ```
//!
//! A break is long when `cycle_index % long_break_every == 0`. The cycle
//! index advances when a break completes; the completed counter advances
//! when a work phase completes.

use chrono::{DateTime, Utc};

use crate::models::{ClockConfig, ClockSnapshot, Phase};

// ── Outcomes ──────────────────────────────────────────────────────────────────

/// A single phase change produced by [`SessionClock::complete_phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    pub completed_count: u32,
    pub cycle_index: u32,
}

/// Result of delivering one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The clock is paused; the tick was dropped.
    Ignored,
    /// One second was consumed and the phase continues.
    Continue { remaining: u32 },
    /// The phase ran out on this tick and the clock moved on.
    Completed(PhaseTransition),
}

/// Result of reconciling a restored clock against the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The restored clock was not running; nothing to do.
    Idle,
    /// Time was deducted and the phase is still in progress.
    Resumed { elapsed_secs: u64 },
    /// The phase ran out while the process was away.
    FastForwarded(PhaseTransition),
}

// ── SessionClock ──────────────────────────────────────────────────────────────

/// Owner of the authoritative timer state.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use pomo_core::clock::{SessionClock, TickOutcome};
/// use pomo_core::models::ClockConfig;
///
/// let mut clock = SessionClock::new(ClockConfig::default());
/// assert!(clock.start(Utc::now()));
/// assert_eq!(clock.tick(), TickOutcome::Continue { remaining: 1499 });
/// ```
#[derive(Debug, Clone)]
pub struct SessionClock {
    config: ClockConfig,
    remaining: u32,
    running: bool,
    is_work_phase: bool,
    cycle_index: u32,
    completed_count: u32,
    started_at: Option<DateTime<Utc>>,
}

impl SessionClock {
    /// Fresh clock at the start of the first work phase.
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            remaining: config.work_secs,
            running: false,
            is_work_phase: true,
            cycle_index: 1,
            completed_count: 0,
            started_at: None,
        }
    }

    /// Rebuild a clock from a stored snapshot.
    ///
    /// Durations always come from `config`; the stored counters and phase
    /// are kept but repaired so the invariants hold for any input.
    pub fn from_snapshot(config: ClockConfig, snapshot: &ClockSnapshot) -> Self {
        let mut clock = Self {
            config,
            remaining: snapshot.remaining,
            running: snapshot.running,
            is_work_phase: snapshot.is_work_phase,
            cycle_index: snapshot.cycle_index.max(1),
            completed_count: snapshot.completed_count,
            started_at: snapshot.started_at_epoch,
        };
        clock.remaining = clock.remaining.min(clock.phase_duration());
        if clock.running && clock.started_at.is_none() {
            tracing::debug!("stored clock was running without a start anchor; treating as paused");
            clock.running = false;
        }
        if !clock.running {
            clock.started_at = None;
        }
        clock
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_work_phase(&self) -> bool {
        self.is_work_phase
    }

    pub fn cycle_index(&self) -> u32 {
        self.cycle_index
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_count
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn phase(&self) -> Phase {
        if self.is_work_phase {
            Phase::Work
        } else if self.config.is_long_break_cycle(self.cycle_index) {
            Phase::LongBreak
        } else {
            Phase::ShortBreak
        }
    }

    /// Full length of the current phase in seconds.
    pub fn phase_duration(&self) -> u32 {
        if self.is_work_phase {
            self.config.work_secs
        } else {
            self.config.break_secs(self.cycle_index)
        }
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            work_duration: self.config.work_secs,
            short_break_duration: self.config.short_break_secs,
            long_break_duration: self.config.long_break_secs,
            remaining: self.remaining,
            running: self.running,
            is_work_phase: self.is_work_phase,
            cycle_index: self.cycle_index,
            completed_count: self.completed_count,
            started_at_epoch: self.started_at,
        }
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Begin counting down. Returns `false` when already running.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.started_at = Some(now);
        true
    }

    /// Stop counting down. Returns `false` when already paused.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.stop();
        true
    }

    /// Stop and refill the current phase. Phase and counters are untouched.
    pub fn reset(&mut self) {
        self.stop();
        self.remaining = self.phase_duration();
    }

    /// Consume one second of the running phase.
    ///
    /// Reaching zero completes the phase within the same tick.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Ignored;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            TickOutcome::Completed(self.complete_phase())
        } else {
            TickOutcome::Continue {
                remaining: self.remaining,
            }
        }
    }

    /// Finish the current phase and load the next one, stopped.
    pub fn complete_phase(&mut self) -> PhaseTransition {
        let from = self.phase();
        self.stop();

        if self.is_work_phase {
            self.completed_count = self.completed_count.saturating_add(1);
            self.is_work_phase = false;
            self.remaining = self.config.break_secs(self.cycle_index);
        } else {
            self.is_work_phase = true;
            self.cycle_index = self.cycle_index.saturating_add(1);
            self.remaining = self.config.work_secs;
        }

        PhaseTransition {
            from,
            to: self.phase(),
            completed_count: self.completed_count,
            cycle_index: self.cycle_index,
        }
    }

    /// Account for wall-clock time that passed while nobody was ticking.
    ///
    /// At most one phase transition is applied, however long the gap was.
    pub fn reconcile(&mut self, now: DateTime<Utc>) -> Reconciliation {
        let Some(started_at) = self.started_at.filter(|_| self.running) else {
            return Reconciliation::Idle;
        };

        let elapsed_secs = (now - started_at).num_seconds().max(0) as u64;
        let remaining = u64::from(self.remaining).saturating_sub(elapsed_secs);

        if remaining > 0 {
            self.remaining = remaining as u32;
            self.started_at = Some(now);
            Reconciliation::Resumed { elapsed_secs }
        } else {
            self.remaining = 0;
            Reconciliation::FastForwarded(self.complete_phase())
        }
    }

    fn stop(&mut self) {
        self.running = false;
        self.started_at = None;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
