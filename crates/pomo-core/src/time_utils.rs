use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Parse an IANA timezone name, falling back to UTC with a warning.
pub fn resolve_timezone(tz_name: &str) -> Tz {
    tz_name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("unrecognised timezone \"{}\", falling back to UTC", tz_name);
        Tz::UTC
    })
}

/// Validate that `tz_name` is a recognised IANA timezone identifier.
pub fn validate_timezone(tz_name: &str) -> bool {
    tz_name.parse::<Tz>().is_ok()
}

// ── 12-hour / 24-hour format detection ───────────────────────────────────────

/// Timezone prefixes whose users conventionally read a 12-hour clock.
const TWELVE_HOUR_ZONES: &[&str] = &[
    "america/",
    "australia/",
    "pacific/auckland",
    "asia/manila",
    "asia/kolkata",
    "asia/calcutta",
    "asia/karachi",
    "asia/dhaka",
    "asia/riyadh",
    "asia/dubai",
    "africa/cairo",
];

/// Decide whether to use 12-hour clock display.
///
/// Priority:
/// 1. `explicit` `"12h"` → `true`, `"24h"` → `false`.
/// 2. The region of `timezone` (falls back to the system timezone).
pub fn detect_time_format(timezone: Option<&str>, explicit: Option<&str>) -> bool {
    if let Some(fmt) = explicit {
        match fmt.to_lowercase().as_str() {
            "12h" => return true,
            "24h" => return false,
            _ => {}
        }
    }

    let tz = timezone
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| get_system_timezone().to_lowercase());

    TWELVE_HOUR_ZONES.iter().any(|prefix| tz.starts_with(prefix))
}

// ── Phase end time ────────────────────────────────────────────────────────────

/// Wall-clock instant at which a phase with `remaining_secs` left will end.
pub fn phase_end_time(now: DateTime<Utc>, remaining_secs: u32) -> DateTime<Utc> {
    now + Duration::seconds(i64::from(remaining_secs))
}

/// Format `dt` in `tz` as `"14:30"` or `"02:30 PM"`.
pub fn format_display_time(dt: &DateTime<Utc>, tz: Tz, twelve_hour: bool) -> String {
    let local = dt.with_timezone(&tz);
    if twelve_hour {
        local.format("%I:%M %p").to_string()
    } else {
        local.format("%H:%M").to_string()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
