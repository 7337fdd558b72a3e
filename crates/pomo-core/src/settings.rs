use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use tracing::warn;

use crate::error::Result;
use crate::models::ClockConfig;
use crate::protocol::Action;

// Accepted ranges; keep in step with the `range(..)` attributes below.
const WORK_MINUTES: RangeInclusive<u32> = 1..=180;
const SHORT_BREAK_MINUTES: RangeInclusive<u32> = 1..=60;
const LONG_BREAK_MINUTES: RangeInclusive<u32> = 1..=120;
const LONG_BREAK_EVERY: RangeInclusive<u32> = 1..=12;
const REFRESH_RATE: RangeInclusive<u32> = 1..=60;
const TIME_FORMATS: [&str; 3] = ["12h", "24h", "auto"];

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Work/break interval timer for the terminal
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pomo",
    about = "Work/break interval timer for the terminal",
    version
)]
pub struct Settings {
    /// View mode
    #[arg(long, default_value = "watch", value_parser = ["watch", "status"])]
    pub view: String,

    /// Command to apply once the clock is loaded
    #[arg(long, value_parser = ["start", "pause", "reset"])]
    pub action: Option<String>,

    /// Work phase length in minutes (1-180)
    #[arg(long, default_value = "25", value_parser = clap::value_parser!(u32).range(1..=180))]
    pub work_minutes: u32,

    /// Short break length in minutes (1-60)
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=60))]
    pub short_break_minutes: u32,

    /// Long break length in minutes (1-120)
    #[arg(long, default_value = "15", value_parser = clap::value_parser!(u32).range(1..=120))]
    pub long_break_minutes: u32,

    /// Cycles per long break (1-12)
    #[arg(long, default_value = "4", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub long_break_every: u32,

    /// View refresh rate in seconds (1-60)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=60))]
    pub refresh_rate: u32,

    /// Timezone for end-time display (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Time format
    #[arg(long, default_value = "auto", value_parser = ["12h", "24h", "auto"])]
    pub time_format: String,

    /// Suppress phase-complete notifications
    #[arg(long)]
    pub no_notify: bool,

    /// Ring the terminal bell when a phase completes
    #[arg(long)]
    pub sound: bool,

    /// Clock state file
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.pomo/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_break_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break_every: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    /// Uses `~/.pomo/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".pomo").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation. Accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                warn!(error = %e, path = %config_path.display(), "failed to clear saved parameters");
            }
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins. `view`, `action` and the flags are never persisted.
        // NOTE: clap stores the arg id using the field name (underscores).
        // Saved values are re-checked against the same ranges as the flags.
        merge(
            &matches,
            "work_minutes",
            &mut settings.work_minutes,
            in_range("work_minutes", last.work_minutes, &WORK_MINUTES),
        );
        merge(
            &matches,
            "short_break_minutes",
            &mut settings.short_break_minutes,
            in_range("short_break_minutes", last.short_break_minutes, &SHORT_BREAK_MINUTES),
        );
        merge(
            &matches,
            "long_break_minutes",
            &mut settings.long_break_minutes,
            in_range("long_break_minutes", last.long_break_minutes, &LONG_BREAK_MINUTES),
        );
        merge(
            &matches,
            "long_break_every",
            &mut settings.long_break_every,
            in_range("long_break_every", last.long_break_every, &LONG_BREAK_EVERY),
        );
        merge(
            &matches,
            "refresh_rate",
            &mut settings.refresh_rate,
            in_range("refresh_rate", last.refresh_rate, &REFRESH_RATE),
        );
        merge(&matches, "timezone", &mut settings.timezone, last.timezone);
        merge(
            &matches,
            "time_format",
            &mut settings.time_format,
            last.time_format.filter(|f| TIME_FORMATS.contains(&f.as_str())),
        );

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            warn!(error = %e, path = %config_path.display(), "failed to save parameters");
        }

        settings
    }

    /// Phase lengths selected by these settings, validated.
    pub fn clock_config(&self) -> Result<ClockConfig> {
        let config = ClockConfig::from_minutes(
            self.work_minutes,
            self.short_break_minutes,
            self.long_break_minutes,
            self.long_break_every,
        )?;
        config.validate()?;
        Ok(config)
    }

    /// The launch action, if one was given.
    pub fn launch_action(&self) -> Option<Action> {
        self.action.as_deref().and_then(|a| a.parse().ok())
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone != "auto" && !crate::time_utils::validate_timezone(&settings.timezone)
        {
            warn!(timezone = %settings.timezone, "unknown timezone; using the system timezone");
            settings.timezone = "auto".to_string();
        }
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }

        if settings.time_format == "auto" {
            let is_12h = crate::time_utils::detect_time_format(Some(&settings.timezone), None);
            settings.time_format = if is_12h {
                "12h".to_string()
            } else {
                "24h".to_string()
            };
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            work_minutes: Some(s.work_minutes),
            short_break_minutes: Some(s.short_break_minutes),
            long_break_minutes: Some(s.long_break_minutes),
            long_break_every: Some(s.long_break_every),
            refresh_rate: Some(s.refresh_rate),
            timezone: Some(s.timezone.clone()),
            time_format: Some(s.time_format.clone()),
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────────

/// Keep a persisted value only when it lies in `range`.
fn in_range(name: &str, persisted: Option<u32>, range: &RangeInclusive<u32>) -> Option<u32> {
    persisted.filter(|v| {
        let ok = range.contains(v);
        if !ok {
            warn!(param = name, value = *v, "ignoring out-of-range saved value");
        }
        ok
    })
}

/// Overwrite `target` with the persisted value unless `name` was supplied
/// explicitly on the command line.
fn merge<T>(matches: &clap::ArgMatches, name: &str, target: &mut T, persisted: Option<T>) {
    if is_arg_explicitly_set(matches, name) {
        return;
    }
    if let Some(v) = persisted {
        *target = v;
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    fn args(list: &[&str]) -> Vec<std::ffi::OsString> {
        list.iter().map(|s| std::ffi::OsString::from(*s)).collect()
    }

    // ── LastUsedParams ────────────────────────────────────────────────────────

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            work_minutes: Some(50),
            short_break_minutes: Some(10),
            long_break_minutes: Some(30),
            long_break_every: Some(3),
            refresh_rate: Some(2),
            timezone: Some("Europe/Berlin".to_string()),
            time_format: Some("24h".to_string()),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.work_minutes, Some(50));
        assert_eq!(loaded.short_break_minutes, Some(10));
        assert_eq!(loaded.long_break_minutes, Some(30));
        assert_eq!(loaded.long_break_every, Some(3));
        assert_eq!(loaded.refresh_rate, Some(2));
        assert_eq!(loaded.timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(loaded.time_format.as_deref(), Some("24h"));
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams {
            work_minutes: Some(30),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert!(LastUsedParams::load_from(&path).work_minutes.is_none());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(LastUsedParams::load_from(&path).work_minutes.is_none());
    }

    // ── Settings parsing ──────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["pomo"]);

        assert_eq!(settings.view, "watch");
        assert!(settings.action.is_none());
        assert_eq!(settings.work_minutes, 25);
        assert_eq!(settings.short_break_minutes, 5);
        assert_eq!(settings.long_break_minutes, 15);
        assert_eq!(settings.long_break_every, 4);
        assert_eq!(settings.refresh_rate, 1);
        assert_eq!(settings.timezone, "auto");
        assert_eq!(settings.time_format, "auto");
        assert!(!settings.no_notify);
        assert!(!settings.sound);
        assert!(settings.state_file.is_none());
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_default_clock_config() {
        let settings = Settings::parse_from(["pomo"]);
        assert_eq!(settings.clock_config().unwrap(), ClockConfig::default());
    }

    #[test]
    fn test_settings_launch_action() {
        let settings = Settings::parse_from(["pomo", "--view", "status", "--action", "start"]);
        assert_eq!(settings.view, "status");
        assert_eq!(settings.launch_action(), Some(Action::Start));
        assert_eq!(Settings::parse_from(["pomo"]).launch_action(), None);
    }

    #[test]
    fn test_settings_rejects_out_of_range_minutes() {
        assert!(Settings::try_parse_from(["pomo", "--work-minutes", "0"]).is_err());
        assert!(Settings::try_parse_from(["pomo", "--long-break-every", "13"]).is_err());
    }

    #[test]
    fn test_settings_rejects_unknown_action() {
        assert!(Settings::try_parse_from(["pomo", "--action", "skip"]).is_err());
    }

    // ── load_with_last_used ───────────────────────────────────────────────────

    #[test]
    fn test_load_with_last_used_merges_persisted_lengths() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            work_minutes: Some(50),
            long_break_every: Some(2),
            timezone: Some("UTC".to_string()),
            time_format: Some("24h".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(args(&["pomo"]), &config_path);
        assert_eq!(settings.work_minutes, 50);
        assert_eq!(settings.long_break_every, 2);
        assert_eq!(settings.short_break_minutes, 5);
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            work_minutes: Some(50),
            timezone: Some("UTC".to_string()),
            time_format: Some("24h".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            args(&["pomo", "--work-minutes", "20"]),
            &config_path,
        );
        assert_eq!(settings.work_minutes, 20);
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            work_minutes: Some(45),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(args(&["pomo", "--clear"]), &config_path);

        assert!(!config_path.exists());
        assert_eq!(settings.work_minutes, 25);
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        let settings =
            Settings::load_with_last_used_impl(args(&["pomo", "--debug"]), &config_path);
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_resolves_auto_values() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        let settings = Settings::load_with_last_used_impl(
            args(&["pomo", "--timezone", "America/New_York"]),
            &config_path,
        );
        assert_eq!(settings.timezone, "America/New_York");
        assert_eq!(settings.time_format, "12h");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            args(&["pomo", "--short-break-minutes", "7", "--action", "start"]),
            &config_path,
        );

        assert!(config_path.exists());
        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.short_break_minutes, Some(7));
        assert_eq!(loaded.work_minutes, Some(25));
    }

    #[test]
    fn test_load_with_last_used_drops_zero_values() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(
            &config_path,
            r#"{"work_minutes":0,"long_break_every":0,"refresh_rate":0,"short_break_minutes":10}"#,
        )
        .unwrap();

        let settings = Settings::load_with_last_used_impl(args(&["pomo"]), &config_path);
        assert_eq!(settings.work_minutes, 25);
        assert_eq!(settings.long_break_every, 4);
        assert_eq!(settings.refresh_rate, 1);
        assert_eq!(settings.short_break_minutes, 10);
        assert!(settings.clock_config().is_ok());

        // The repaired values replace the bad ones on disk.
        let saved = LastUsedParams::load_from(&config_path);
        assert_eq!(saved.work_minutes, Some(25));
        assert_eq!(saved.long_break_every, Some(4));
    }

    #[test]
    fn test_load_with_last_used_drops_overflowing_minutes() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(&config_path, r#"{"work_minutes":100000000}"#).unwrap();

        let settings = Settings::load_with_last_used_impl(args(&["pomo"]), &config_path);
        assert_eq!(settings.work_minutes, 25);
        assert_eq!(settings.clock_config().unwrap().work_secs, 1500);
    }

    #[test]
    fn test_load_with_last_used_drops_bad_time_format() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            timezone: Some("UTC".to_string()),
            time_format: Some("36h".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(args(&["pomo"]), &config_path);
        assert_eq!(settings.time_format, "24h");
    }

    #[test]
    fn test_load_with_last_used_replaces_unknown_timezone() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        let settings = Settings::load_with_last_used_impl(
            args(&["pomo", "--timezone", "Mars/Olympus"]),
            &config_path,
        );
        assert_ne!(settings.timezone, "Mars/Olympus");
        assert_eq!(settings.timezone, crate::time_utils::get_system_timezone());
    }

    #[test]
    fn test_clock_config_rejects_overflow() {
        let mut settings = Settings::parse_from(["pomo"]);
        settings.work_minutes = u32::MAX;
        assert!(settings.clock_config().is_err());
    }
}
