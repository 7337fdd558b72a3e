//! Core types for pomo.
//!
//! Holds the session clock state machine, the snapshot and protocol types
//! shared with observers, settings, display helpers and the notification
//! collaborator traits. Nothing here spawns tasks or touches storage.

pub mod clock;
pub mod error;
pub mod formatting;
pub mod indicator;
pub mod models;
pub mod notifications;
pub mod protocol;
pub mod settings;
pub mod time_utils;

pub use clock::{PhaseTransition, Reconciliation, SessionClock, TickOutcome};
pub use error::{PomoError, Result};
pub use models::{ClockConfig, ClockSnapshot, Phase};
