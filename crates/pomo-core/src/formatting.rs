use crate::models::ClockSnapshot;

/// Format a number of seconds as a zero-padded `MM:SS` clock.
///
/// Minutes are not wrapped into hours, so a 90 minute phase reads `90:00`.
///
/// # Examples
///
/// ```
/// use pomo_core::formatting::format_clock;
///
/// assert_eq!(format_clock(1500), "25:00");
/// assert_eq!(format_clock(299),  "04:59");
/// assert_eq!(format_clock(0),    "00:00");
/// ```
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Format a duration in minutes as a human-readable string.
///
/// * `< 60` minutes → `"45m"`
/// * `≥ 60` minutes, no remainder → `"3h"`
/// * `≥ 60` minutes, with remainder → `"3h 45m"`
///
/// # Examples
///
/// ```
/// use pomo_core::formatting::format_time;
///
/// assert_eq!(format_time(45),  "45m");
/// assert_eq!(format_time(60),  "1h");
/// assert_eq!(format_time(225), "3h 45m");
/// ```
pub fn format_time(minutes: u64) -> String {
    if minutes < 60 {
        format!("{}m", minutes)
    } else {
        let hours = minutes / 60;
        let mins = minutes % 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

/// How much of the current phase has elapsed, in percent.
pub fn progress_percent(snapshot: &ClockSnapshot, long_break_every: u32) -> f64 {
    let total = snapshot.phase_duration(long_break_every);
    let elapsed = total.saturating_sub(snapshot.remaining);
    percentage(f64::from(elapsed), f64::from(total), 1)
}

/// `"Session N"` for the current cycle.
pub fn session_label(snapshot: &ClockSnapshot) -> String {
    format!("Session {}", snapshot.cycle_index)
}

/// Total focused time represented by the completed work phases.
pub fn focused_total(snapshot: &ClockSnapshot) -> String {
    let minutes = u64::from(snapshot.completed_count) * u64::from(snapshot.work_duration) / 60;
    format_time(minutes)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
