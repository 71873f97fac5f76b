//! Fire-once deferred retractions scheduled by pulse clicks.

use std::time::Duration;

/// Pending retraction deadlines on the sun's clock. Timers are independent:
/// a second click schedules a second deadline rather than replacing the first.
#[derive(Clone, Debug, Default)]
pub struct PulseTimers {
    deadlines: Vec<Duration>,
}

impl PulseTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a deadline `delay` after `now`.
    pub fn schedule(&mut self, now: Duration, delay: Duration) {
        self.deadlines.push(now + delay);
    }

    /// Remove every deadline at or before `now`, returning how many fired.
    pub fn fire_due(&mut self, now: Duration) -> usize {
        let before = self.deadlines.len();
        self.deadlines.retain(|deadline| *deadline > now);
        before - self.deadlines.len()
    }

    pub fn pending(&self) -> usize {
        self.deadlines.len()
    }
}
