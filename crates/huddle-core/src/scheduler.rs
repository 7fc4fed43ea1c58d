//! Periodic room refresh.

use crate::fanout::Broadcast;
use crate::registry::Registry;
use huddle_protocol::Envelope;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::trace;

/// Default refresh period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Re-broadcasts every room's state on a fixed period.
#[derive(Debug)]
pub struct Scheduler {
    period: Duration,
    ticks: u64,
}

impl Scheduler {
    /// Create a scheduler. A zero period is clamped to one millisecond.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            ticks: 0,
        }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of ticks run so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Timer for the refresh loop. The first tick fires one period from now;
    /// late ticks are caught up rather than skipped.
    #[must_use]
    pub fn interval(&self) -> Interval {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        interval
    }

    /// Broadcast the current encoding of every room, empty ones included.
    ///
    /// Returns the number of rooms broadcast.
    pub fn tick<B: Broadcast>(&mut self, registry: &Registry, broadcaster: &B) -> usize {
        self.ticks += 1;

        let room_ids = registry.all_room_ids();
        for room_id in &room_ids {
            broadcaster.emit_to_room(room_id, Envelope::room(registry.encode_room(room_id)));
        }

        trace!(tick = self.ticks, rooms = room_ids.len(), "Refreshed rooms");
        room_ids.len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}
