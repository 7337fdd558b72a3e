use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use pomo_core::notifications::{Announcer, LogNotifier, TerminalBell};
use pomo_core::settings::Settings;
use pomo_store::default_state_path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Root of everything pomo writes: `~/.pomo/`.
pub fn pomo_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pomo")
}

/// Ensure the standard `~/.pomo/` directory hierarchy exists.
///
/// Creates the following directories if absent (including any missing parents):
/// - `~/.pomo/`
/// - `~/.pomo/logs/`
pub fn ensure_directories() -> anyhow::Result<()> {
    let dir = pomo_dir();
    std::fs::create_dir_all(&dir)?;
    std::fs::create_dir_all(dir.join("logs"))?;
    Ok(())
}

/// Where the clock state lives: `--state-file`, else `~/.pomo/state.json`.
pub fn state_path(settings: &Settings) -> PathBuf {
    settings
        .state_file
        .clone()
        .unwrap_or_else(default_state_path)
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name to an [`EnvFilter`] directive.
fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        other => other.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr, or to `log_file` (appended, no colours) when one is
/// given. Unknown levels fall back to `"info"`.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let (stderr_layer, file_layer) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr);
            (Some(layer), None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

// ── Collaborators ──────────────────────────────────────────────────────────────

/// Phase-complete announcer selected by `--no-notify` and `--sound`.
pub fn build_announcer(settings: &Settings) -> Announcer {
    let announcer =
        Announcer::new(Arc::new(LogNotifier::new(true))).with_notifications(!settings.no_notify);
    if settings.sound {
        announcer.with_alert(Arc::new(TerminalBell))
    } else {
        announcer
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
