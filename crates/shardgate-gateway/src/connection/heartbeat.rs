//! Resettable heartbeat timer
//!
//! Fires every `period`, first after one full period. Hello replaces the period; a
//! reset discards the old schedule entirely, so a tick planned under the previous period
//! never fires afterwards.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Heartbeat schedule of one connection
#[derive(Debug)]
pub struct HeartbeatTimer {
    interval: Option<Interval>,
    period: Duration,
}

impl HeartbeatTimer {
    /// Start a timer whose first tick is one `period` from now
    ///
    /// `period` must be non-zero.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            interval: Some(Self::schedule(period)),
            period,
        }
    }

    fn schedule(period: Duration) -> Interval {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }

    /// Current period
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Replace the schedule; the next tick is one new `period` from now
    pub fn reset(&mut self, period: Duration) {
        if self.interval.is_some() {
            self.interval = Some(Self::schedule(period));
        }
        self.period = period;
    }

    /// Stop the timer; later ticks never complete. Idempotent.
    pub fn stop(&mut self) {
        self.interval = None;
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.interval.is_none()
    }

    /// Wait for the next tick
    pub async fn tick(&mut self) -> Instant {
        match self.interval.as_mut() {
            Some(interval) => interval.tick().await,
            None => std::future::pending().await,
        }
    }
}
