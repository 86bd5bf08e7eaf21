//! Outbound telemetry
//!
//! One frame per tick, fire-and-forget. A missing, closed or failing link
//! never affects the simulation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Debug readout sent once per tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub fps: u32,
    /// Player speed scaled by 10
    pub throttle: i32,
    /// Target lane minus current lane
    pub steer: i32,
    pub handbrake: bool,
}

/// A one-way channel for telemetry frames
pub trait TelemetryLink {
    fn is_connected(&self) -> bool;
    fn send(&mut self, frame: &TelemetryFrame) -> Result<()>;
}

/// Writes one JSON object per line to any writer
pub struct JsonLinesLink<W: Write> {
    writer: W,
    open: bool,
}

impl<W: Write> JsonLinesLink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, open: true }
    }
}

impl<W: Write> TelemetryLink for JsonLinesLink<W> {
    fn is_connected(&self) -> bool {
        self.open
    }

    fn send(&mut self, frame: &TelemetryFrame) -> Result<()> {
        let line = serde_json::to_string(frame).context("Failed to encode telemetry")?;
        let written = writeln!(self.writer, "{}", line);
        if written.is_err() {
            // A broken writer is treated as a closed channel
            self.open = false;
        }
        written.context("Telemetry write failed")
    }
}
