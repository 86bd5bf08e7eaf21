//! Simulation clock
//!
//! The host supplies the raw inter-tick delta; the engine clamps it so a
//! delayed tick (a backgrounded view, a debugger pause) cannot produce a
//! large physics jump.

/// Largest delta ever integrated in one tick, in seconds
pub const MAX_DELTA: f32 = 0.05;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimClock {
    /// Simulated seconds integrated so far
    pub elapsed: f64,
    pub ticks: u64,
    /// Instantaneous rate from the last raw delta
    pub fps: f32,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw delta and return the clamped one to integrate
    pub fn advance(&mut self, raw_dt: f32) -> f32 {
        let dt = clamp_delta(raw_dt);
        self.fps = if raw_dt.is_finite() && raw_dt > 0.0 {
            1.0 / raw_dt
        } else {
            0.0
        };
        self.elapsed += dt as f64;
        self.ticks += 1;
        dt
    }
}

/// Non-finite or negative deltas integrate nothing; large ones are capped
pub fn clamp_delta(raw_dt: f32) -> f32 {
    if raw_dt.is_finite() && raw_dt > 0.0 {
        raw_dt.min(MAX_DELTA)
    } else {
        0.0
    }
}
