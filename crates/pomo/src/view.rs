//! Terminal views over a running clock.
//!
//! `watch` redraws one status line every refresh period and takes commands
//! from stdin; `status` prints the current state once.

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use pomo_core::formatting::{focused_total, format_clock, progress_percent, session_label};
use pomo_core::indicator::Indicator;
use pomo_core::models::ClockSnapshot;
use pomo_core::protocol::Action;
use pomo_core::settings::Settings;
use pomo_core::time_utils::{format_display_time, phase_end_time, resolve_timezone};
use pomo_runtime::ClockHandle;
use tokio::sync::mpsc;
use tracing::{debug, info};

// ── Display options ────────────────────────────────────────────────────────────

/// Everything the status line needs besides the snapshot.
#[derive(Debug, Clone, Copy)]
pub struct DisplayOptions {
    pub long_break_every: u32,
    pub timezone: Tz,
    pub twelve_hour: bool,
}

impl DisplayOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            long_break_every: settings.long_break_every,
            timezone: resolve_timezone(&settings.timezone),
            twelve_hour: settings.time_format == "12h",
        }
    }
}

/// `[badge] MM:SS  progress%  Phase  Session N  done: C (focused)  ends HH:MM`
///
/// A paused clock shows `paused` in place of the end time.
pub fn status_line(snapshot: &ClockSnapshot, opts: &DisplayOptions, now: DateTime<Utc>) -> String {
    let tail = if snapshot.running {
        let end = phase_end_time(now, snapshot.remaining);
        format!(
            "ends {}",
            format_display_time(&end, opts.timezone, opts.twelve_hour)
        )
    } else {
        "paused".to_string()
    };

    format!(
        "{} {}  {:>5.1}%  {}  {}  done: {} ({})  {}",
        Indicator::from_snapshot(snapshot),
        format_clock(snapshot.remaining),
        progress_percent(snapshot, opts.long_break_every),
        snapshot.phase(opts.long_break_every),
        session_label(snapshot),
        snapshot.completed_count,
        focused_total(snapshot),
        tail
    )
}

// ── Input ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Clock(Action),
    Quit,
}

/// Parse one line typed into the watch view. Blank or unknown input is `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim().to_lowercase();
    match line.as_str() {
        "q" | "quit" | "exit" => Some(Command::Quit),
        other => other.parse::<Action>().ok().map(Command::Clock),
    }
}

// ── Views ──────────────────────────────────────────────────────────────────────

/// Print the current state once, as a status line and as JSON.
pub async fn run_status(clock: &ClockHandle, opts: &DisplayOptions) -> Result<()> {
    let snapshot = clock.query().await?;
    println!("{}", status_line(&snapshot, opts, Utc::now()));
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Redraw the status line every `refresh` until `q` or Ctrl+C.
pub async fn run_watch(clock: &ClockHandle, opts: &DisplayOptions, refresh: Duration) -> Result<()> {
    let mut lines = spawn_stdin_reader();
    let mut stdin_open = true;
    let mut redraw = tokio::time::interval(refresh);

    println!("commands: s(tart)  p(ause)  r(eset)  q(uit)");

    loop {
        tokio::select! {
            _ = redraw.tick() => {
                let snapshot = clock.query().await?;
                draw(&status_line(&snapshot, opts, Utc::now()))?;
            }
            line = lines.recv(), if stdin_open => match line {
                Some(line) => match parse_command(&line) {
                    Some(Command::Quit) => break,
                    Some(Command::Clock(action)) => {
                        let snapshot = clock.command(action).await?;
                        draw(&status_line(&snapshot, opts, Utc::now()))?;
                    }
                    None if line.trim().is_empty() => {}
                    None => println!("unknown command: {}", line.trim()),
                },
                None => {
                    debug!("stdin closed; watching until Ctrl+C");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received; stopping");
                break;
            }
        }
    }

    println!();
    Ok(())
}

/// Forward stdin lines from a detached thread, so a pending read never holds
/// up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Overwrite the current terminal line.
fn draw(line: &str) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    write!(out, "\r\x1b[2K{line}")?;
    out.flush()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
