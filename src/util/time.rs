//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 60; // 60 simulation steps per second
pub const UPDATE_SEND_TPS: u32 = 20; // 20 outbound position updates per second
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Nominal delta time for one simulation step (in seconds)
pub fn tick_delta() -> f32 {
    1.0 / SIMULATION_TPS as f32
}

/// Longest step the simulation will integrate in one go; a stalled tick
/// resumes with a clamped delta instead of one huge jump.
pub const MAX_STEP_SECS: f32 = 0.25;

/// Measures real elapsed time between simulation steps
#[derive(Debug, Clone)]
pub struct TickClock {
    last: Instant,
}

impl TickClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Seconds since the previous call, clamped to [`MAX_STEP_SECS`]
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt.min(MAX_STEP_SECS)
    }

    pub fn reset(&mut self) {
        self.last = Instant::now();
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}
