//! Cancellable one-second tick source.
//!
//! [`Ticker`] owns an optional [`Interval`]. Arming stores a fresh interval
//! whose first tick lands one period from now; disarming drops it. While
//! disarmed, [`Ticker::tick`] never resolves, so it can sit in a `select!`
//! next to the command channel.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Period between clock ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct Ticker {
    period: Duration,
    interval: Option<Interval>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Schedule ticks every period starting one period from now, replacing
    /// any previous schedule.
    pub fn arm(&mut self) {
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        // Late ticks are delivered back to back so every elapsed second counts.
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        self.interval = Some(interval);
    }

    /// Release the schedule. Idempotent.
    pub fn disarm(&mut self) {
        self.interval = None;
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick; pends forever while disarmed.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ticker_is_disarmed() {
        let ticker = Ticker::default();
        assert!(!ticker.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_armed_ticker_fires_after_one_period() {
        let mut ticker = Ticker::default();
        ticker.arm();
        let start = Instant::now();
        ticker.tick().await;
        assert_eq!(start.elapsed(), TICK_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_ticker_never_fires() {
        let mut ticker = Ticker::default();
        ticker.arm();
        ticker.disarm();
        ticker.disarm();
        assert!(!ticker.is_armed());

        let fired = time::timeout(Duration::from_secs(5), ticker.tick()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_the_period() {
        let mut ticker = Ticker::default();
        ticker.arm();
        time::sleep(Duration::from_millis(700)).await;
        ticker.arm();
        let start = Instant::now();
        ticker.tick().await;
        assert_eq!(start.elapsed(), TICK_PERIOD);
    }
}
