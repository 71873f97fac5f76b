//! Variable-rate frame clock.
//!
//! Each frame advances the animation by the measured wall time, clamped so a
//! stall (window drag, breakpoint) never produces a huge step. The clamped
//! steps accumulate into a continuous scene clock that drives oscillators
//! and pulse deadlines.

use std::time::{Duration, Instant};
use tracing::warn;

/// Longest step a single frame may take, in seconds.
pub const MAX_FRAME_TIME: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Seconds since the previous frame, clamped.
    pub dt: f32,
    /// Scene clock after this frame.
    pub elapsed: Duration,
}

pub struct FrameClock {
    previous: Instant,
    elapsed: Duration,
    frame_count: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            previous: Instant::now(),
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Measure the wall time since the last call and advance.
    pub fn tick(&mut self) -> FrameTick {
        let now = Instant::now();
        let frame_time = now.duration_since(self.previous);
        self.previous = now;
        self.advance(frame_time)
    }

    /// Advance by an explicit frame time.
    pub fn advance(&mut self, frame_time: Duration) -> FrameTick {
        let mut dt = frame_time.as_secs_f32();
        if dt > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                dt * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            dt = MAX_FRAME_TIME;
        }
        self.elapsed += Duration::from_secs_f32(dt);
        self.frame_count += 1;
        FrameTick {
            dt,
            elapsed: self.elapsed,
        }
    }

    /// Scene clock: the sum of all clamped steps.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_passes_through() {
        let mut clock = FrameClock::new();
        let tick = clock.advance(Duration::from_millis(16));
        assert!((tick.dt - 0.016).abs() < 1e-6);
        assert_eq!(tick.elapsed, clock.elapsed());
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut clock = FrameClock::new();
        let tick = clock.advance(Duration::from_secs(3));
        assert_eq!(tick.dt, MAX_FRAME_TIME);
        assert!((clock.elapsed().as_secs_f32() - MAX_FRAME_TIME).abs() < 1e-6);
    }

    #[test]
    fn test_elapsed_accumulates_clamped_steps() {
        let mut clock = FrameClock::new();
        for ms in [16, 17, 1000, 15] {
            clock.advance(Duration::from_millis(ms));
        }
        let expected = 0.016 + 0.017 + MAX_FRAME_TIME + 0.015;
        assert!((clock.elapsed().as_secs_f32() - expected).abs() < 1e-5);
        assert_eq!(clock.frame_count(), 4);
    }

    #[test]
    fn test_zero_frame_time() {
        let mut clock = FrameClock::default();
        let tick = clock.advance(Duration::ZERO);
        assert_eq!(tick.dt, 0.0);
        assert_eq!(tick.elapsed, Duration::ZERO);
    }

    #[test]
    fn test_wall_clock_tick_is_small_and_monotonic() {
        let mut clock = FrameClock::new();
        let a = clock.tick();
        let b = clock.tick();
        assert!(a.dt >= 0.0 && a.dt <= MAX_FRAME_TIME);
        assert!(b.elapsed >= a.elapsed);
    }
}
