//! Phase-complete notifications and alerts.
//!
//! Delivery mechanics live behind two narrow traits, [`Notifier`] and
//! [`AlertPlayer`]. [`Announcer`] combines them with the fallback policy:
//! the alert is tried first, the notification follows when notifications
//! are enabled, and a failed alert always falls back to a notification.
//! Failures are logged and swallowed; an announcement never interrupts a
//! phase transition.

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use crate::clock::PhaseTransition;
use crate::error::{PomoError, Result};

/// Title used for every phase-complete notification.
pub const NOTIFICATION_TITLE: &str = "Pomodoro Timer";

// ── Collaborator traits ───────────────────────────────────────────────────────

/// Delivers a user-visible notification. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str) -> Result<()>;
}

/// Plays an audible alert. Best-effort.
pub trait AlertPlayer: Send + Sync {
    fn play_alert(&self) -> Result<()>;
}

// ── Message composition ───────────────────────────────────────────────────────

/// Body text announcing the phase that was just entered.
pub fn completion_message(transition: &PhaseTransition) -> &'static str {
    if transition.from.is_work() {
        "Break time! Take a rest."
    } else {
        "Work time! Get back to it."
    }
}

// ── Announcer ─────────────────────────────────────────────────────────────────

/// Announces phase completions through the configured collaborators.
#[derive(Clone)]
pub struct Announcer {
    notifier: Arc<dyn Notifier>,
    alert: Option<Arc<dyn AlertPlayer>>,
    notify_enabled: bool,
}

impl Announcer {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            alert: None,
            notify_enabled: true,
        }
    }

    /// Attach an alert player that runs before the notification.
    pub fn with_alert(mut self, alert: Arc<dyn AlertPlayer>) -> Self {
        self.alert = Some(alert);
        self
    }

    /// Enable or disable the regular notification. A failed alert still
    /// falls back to a notification.
    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notify_enabled = enabled;
        self
    }

    /// An announcer that drops everything.
    pub fn silent() -> Self {
        Self::new(Arc::new(NullNotifier)).with_notifications(false)
    }

    pub fn announce(&self, transition: &PhaseTransition) {
        let message = completion_message(transition);

        let alert_failed = match &self.alert {
            Some(alert) => match alert.play_alert() {
                Ok(()) => false,
                Err(e) => {
                    tracing::debug!(error = %e, "alert failed; falling back to notification");
                    true
                }
            },
            None => false,
        };

        if self.notify_enabled || alert_failed {
            if let Err(e) = self.notifier.notify(NOTIFICATION_TITLE, message) {
                tracing::debug!(error = %e, "notification dropped");
            }
        }
    }
}

// ── Stock collaborators ───────────────────────────────────────────────────────

/// Discards notifications.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _message: &str) -> Result<()> {
        Ok(())
    }
}

/// Emits notifications as `tracing` events and, optionally, a line on stdout.
pub struct LogNotifier {
    echo: bool,
}

impl LogNotifier {
    pub fn new(echo: bool) -> Self {
        Self { echo }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<()> {
        tracing::info!(%title, %message, "notification");
        if self.echo {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{title}: {message}")
                .map_err(|e| PomoError::Notification(e.to_string()))?;
        }
        Ok(())
    }
}

/// Rings the terminal bell. Fails when stdout is not a terminal.
pub struct TerminalBell;

impl AlertPlayer for TerminalBell {
    fn play_alert(&self) -> Result<()> {
        let stdout = std::io::stdout();
        if !stdout.is_terminal() {
            return Err(PomoError::Alert("stdout is not a terminal".to_string()));
        }
        let mut out = stdout.lock();
        out.write_all(b"\x07")
            .and_then(|()| out.flush())
            .map_err(|e| PomoError::Alert(e.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
