// scanline-demo/src/pacing.rs
//! Fixed-rate frame pacing.
//!
//! Frame `n` is due at `base + n * interval`. When a frame finishes late the
//! schedule restarts from "now" rather than rushing to catch up.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    base: Instant,
    frames: u32,
}

impl FramePacer {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            base: now,
            frames: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Frames counted since the schedule last restarted.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Record a finished frame. Returns when the next one should start, or
    /// `None` if this one overran and the schedule was reset to `now`.
    pub fn frame_done(&mut self, now: Instant) -> Option<Instant> {
        self.frames += 1;
        let target = self.base + self.interval * self.frames;

        if now <= target {
            Some(target)
        } else {
            tracing::debug!(
                "frame {} overran by {:?}; resetting schedule",
                self.frames,
                now - target
            );
            self.frames = 0;
            self.base = now;
            None
        }
    }
}
