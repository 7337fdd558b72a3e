mod bootstrap;
mod view;

use std::time::Duration;

use anyhow::Result;
use pomo_core::settings::Settings;
use pomo_runtime::{spawn_indicator, ClockHandle, ClockService};
use pomo_store::{JsonFileStore, PersistenceBridge};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("pomo v{} starting", env!("CARGO_PKG_VERSION"));

    let config = settings.clock_config()?;

    let state_path = bootstrap::state_path(&settings);
    tracing::info!(
        view = %settings.view,
        work_secs = config.work_secs,
        short_break_secs = config.short_break_secs,
        long_break_secs = config.long_break_secs,
        long_break_every = config.long_break_every,
        state = %state_path.display(),
        "configuration loaded"
    );

    let bridge = PersistenceBridge::new(JsonFileStore::new(state_path));
    let announcer = bootstrap::build_announcer(&settings);
    let (clock, service) = ClockService::restore(bridge, config, announcer)
        .await
        .start();

    let indicator = spawn_indicator(&clock, |badge| {
        tracing::debug!(text = %badge.text, color = badge.color.hex(), "indicator");
    });

    let outcome = run_view(&settings, &clock).await;

    // Flush the final state even when the view failed.
    service.shutdown().await?;
    if let Err(e) = indicator.await {
        tracing::debug!(error = %e, "indicator task ended abnormally");
    }

    outcome
}

/// Apply the launch action, then hand the clock to the selected view.
async fn run_view(settings: &Settings, clock: &ClockHandle) -> Result<()> {
    if let Some(action) = settings.launch_action() {
        tracing::info!(%action, "applying launch action");
        clock.command(action).await?;
    }

    let opts = view::DisplayOptions::from_settings(settings);
    match settings.view.as_str() {
        "status" => view::run_status(clock, &opts).await,
        _ => {
            let refresh = Duration::from_secs(u64::from(settings.refresh_rate.max(1)));
            view::run_watch(clock, &opts, refresh).await
        }
    }
}
