use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage key under which the clock snapshot is persisted.
pub const STATE_KEY: &str = "pomodoroState";

/// Default work phase length (25 minutes).
pub const DEFAULT_WORK_SECS: u32 = 25 * 60;
/// Default short break length (5 minutes).
pub const DEFAULT_SHORT_BREAK_SECS: u32 = 5 * 60;
/// Default long break length (15 minutes).
pub const DEFAULT_LONG_BREAK_SECS: u32 = 15 * 60;
/// Default number of cycles per long break.
pub const DEFAULT_LONG_BREAK_EVERY: u32 = 4;

/// The phase the clock is currently counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_work(self) -> bool {
        self == Phase::Work
    }

    /// Human-readable label shown by views.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work Session",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed phase lengths for one clock instance, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    pub work_secs: u32,
    pub short_break_secs: u32,
    pub long_break_secs: u32,
    /// A break is long when `cycle_index % long_break_every == 0`.
    pub long_break_every: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            work_secs: DEFAULT_WORK_SECS,
            short_break_secs: DEFAULT_SHORT_BREAK_SECS,
            long_break_secs: DEFAULT_LONG_BREAK_SECS,
            long_break_every: DEFAULT_LONG_BREAK_EVERY,
        }
    }
}

impl ClockConfig {
    /// Build a config from minute values as entered on the command line.
    pub fn from_minutes(
        work: u32,
        short_break: u32,
        long_break: u32,
        long_break_every: u32,
    ) -> crate::error::Result<Self> {
        let secs = |minutes: u32, name: &str| {
            minutes.checked_mul(60).ok_or_else(|| {
                crate::error::PomoError::Config(format!("{name} of {minutes} minutes is too long"))
            })
        };
        Ok(Self {
            work_secs: secs(work, "work phase")?,
            short_break_secs: secs(short_break, "short break")?,
            long_break_secs: secs(long_break, "long break")?,
            long_break_every,
        })
    }

    /// Check that every length is positive.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.work_secs == 0 || self.short_break_secs == 0 || self.long_break_secs == 0 {
            return Err(crate::error::PomoError::Config(
                "phase lengths must be positive".to_string(),
            ));
        }
        if self.long_break_every == 0 {
            return Err(crate::error::PomoError::Config(
                "long break interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Break length selected for the given cycle.
    pub fn break_secs(&self, cycle_index: u32) -> u32 {
        if self.is_long_break_cycle(cycle_index) {
            self.long_break_secs
        } else {
            self.short_break_secs
        }
    }

    pub fn is_long_break_cycle(&self, cycle_index: u32) -> bool {
        cycle_index % self.long_break_every.max(1) == 0
    }
}

/// Full, serializable view of the clock state.
///
/// This is both the persisted form and the response body of every command
/// in the observer protocol. Missing keys fall back to [`Default`] so that a
/// partial stored object merges over the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClockSnapshot {
    pub work_duration: u32,
    pub short_break_duration: u32,
    pub long_break_duration: u32,
    /// Seconds left in the current phase.
    pub remaining: u32,
    pub running: bool,
    pub is_work_phase: bool,
    /// Starts at 1; advances after each completed break.
    pub cycle_index: u32,
    /// Lifetime count of completed work phases.
    pub completed_count: u32,
    /// Wall-clock anchor of the current running window (epoch milliseconds).
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub started_at_epoch: Option<DateTime<Utc>>,
}

impl Default for ClockSnapshot {
    fn default() -> Self {
        Self {
            work_duration: DEFAULT_WORK_SECS,
            short_break_duration: DEFAULT_SHORT_BREAK_SECS,
            long_break_duration: DEFAULT_LONG_BREAK_SECS,
            remaining: DEFAULT_WORK_SECS,
            running: false,
            is_work_phase: true,
            cycle_index: 1,
            completed_count: 0,
            started_at_epoch: None,
        }
    }
}

impl ClockSnapshot {
    /// Phase derived from the work flag and the cycle index.
    pub fn phase(&self, long_break_every: u32) -> Phase {
        if self.is_work_phase {
            Phase::Work
        } else if self.cycle_index % long_break_every.max(1) == 0 {
            Phase::LongBreak
        } else {
            Phase::ShortBreak
        }
    }

    /// Full length of the current phase in seconds.
    pub fn phase_duration(&self, long_break_every: u32) -> u32 {
        match self.phase(long_break_every) {
            Phase::Work => self.work_duration,
            Phase::ShortBreak => self.short_break_duration,
            Phase::LongBreak => self.long_break_duration,
        }
    }
}
