//! Ambient indicator derived from the clock snapshot.
//!
//! The indicator is the always-visible badge: whole minutes left while the
//! clock runs, nothing while it is paused, coloured by phase.

use serde::{Deserialize, Serialize};

use crate::models::ClockSnapshot;

/// Badge colour while a work phase is active.
pub const WORK_COLOR: &str = "#ff6b6b";
/// Badge colour while a break is active.
pub const BREAK_COLOR: &str = "#4ecdc4";

/// One of the two fixed badge colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorColor {
    Work,
    Break,
}

impl IndicatorColor {
    pub fn hex(self) -> &'static str {
        match self {
            IndicatorColor::Work => WORK_COLOR,
            IndicatorColor::Break => BREAK_COLOR,
        }
    }
}

/// Badge text and colour for the ambient indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub text: String,
    pub color: IndicatorColor,
}

impl Indicator {
    pub fn from_snapshot(snapshot: &ClockSnapshot) -> Self {
        let text = if snapshot.running {
            (snapshot.remaining / 60).to_string()
        } else {
            String::new()
        };
        let color = if snapshot.is_work_phase {
            IndicatorColor::Work
        } else {
            IndicatorColor::Break
        };
        Self { text, color }
    }
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:>2}]", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_work_shows_whole_minutes() {
        let snap = ClockSnapshot {
            running: true,
            remaining: 1499,
            ..ClockSnapshot::default()
        };
        let ind = Indicator::from_snapshot(&snap);
        assert_eq!(ind.text, "24");
        assert_eq!(ind.color, IndicatorColor::Work);
        assert_eq!(ind.color.hex(), "#ff6b6b");
    }

    #[test]
    fn test_last_minute_shows_zero() {
        let snap = ClockSnapshot {
            running: true,
            remaining: 59,
            ..ClockSnapshot::default()
        };
        assert_eq!(Indicator::from_snapshot(&snap).text, "0");
    }

    #[test]
    fn test_paused_shows_empty_text() {
        let snap = ClockSnapshot::default();
        let ind = Indicator::from_snapshot(&snap);
        assert!(ind.text.is_empty());
        assert_eq!(ind.to_string(), "[  ]");
    }

    #[test]
    fn test_break_uses_break_color() {
        let snap = ClockSnapshot {
            is_work_phase: false,
            remaining: 300,
            running: true,
            ..ClockSnapshot::default()
        };
        let ind = Indicator::from_snapshot(&snap);
        assert_eq!(ind.color, IndicatorColor::Break);
        assert_eq!(ind.color.hex(), "#4ecdc4");
        assert_eq!(ind.to_string(), "[ 5]");
    }
}
