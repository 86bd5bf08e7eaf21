//! Simulation configuration
//!
//! Everything here is optional on disk. Missing or malformed input always
//! resolves to the built-in defaults so a bad file never stops a run.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::boost::BoostSettings;
use super::lane_grid::{LaneGrid, DEFAULT_LANE_COUNT};

/// Viewport dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Road block of the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    pub lanes: Option<usize>,
}

/// Physics placeholders carried through from the config file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub friction: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.3,
            friction: 0.85,
        }
    }
}

/// Distance thresholds and rates for traffic behavior and spawning.
///
/// These are fixed pixel constants, not derived from lane width or vehicle
/// size, but every one of them can be overridden from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tuning {
    /// Player closer than this from behind puts a vehicle into EVADE
    pub evade_distance: f32,
    /// Gap over which EVADE urgency ramps from 0 to 1
    pub evade_urgency_range: f32,
    /// Slower vehicle ahead within this distance may trigger OVERTAKE
    pub overtake_distance: f32,
    /// No other vehicle may be within this distance in a lane we move into
    pub lane_clearance: f32,
    /// Free road required ahead in the target lane before overtaking
    pub overtake_forward_clearance: f32,
    /// Vehicles ahead of the player within this distance damp their sway
    pub reaction_distance: f32,
    /// Spawn safety window ahead of the player
    pub safe_ahead: f32,
    /// Spawn safety window behind the player
    pub safe_behind: f32,
    /// Horizontal size of the spawn separation box
    pub spawn_separation_x: f32,
    /// Vertical size of the spawn separation box
    pub spawn_separation_y: f32,
    /// Lateral speed of traffic lane changes in pixels per reference frame
    pub traffic_lane_change_rate: f32,
    /// Seconds between item spawn draws
    pub item_interval: f32,
    /// Seconds before traffic starts spawning after a (re)start
    pub traffic_start_delay: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            evade_distance: 320.0,
            evade_urgency_range: 260.0,
            overtake_distance: 240.0,
            lane_clearance: 140.0,
            overtake_forward_clearance: 140.0,
            reaction_distance: 340.0,
            safe_ahead: 320.0,
            safe_behind: 60.0,
            spawn_separation_x: 80.0,
            spawn_separation_y: 150.0,
            traffic_lane_change_rate: 6.0,
            item_interval: 2.5,
            traffic_start_delay: 10.0,
        }
    }
}

/// Top-level configuration as read from a JSON file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub canvas: CanvasConfig,
    pub lanes: Option<usize>,
    pub road: RoadConfig,
    /// Environment id to select from the catalog
    pub env: Option<String>,
    pub physics: PhysicsConfig,
    pub tuning: Tuning,
    pub boost: BoostSettings,
}

impl SimConfig {
    /// Parse a config from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Malformed simulation config")
    }

    /// Read a config file
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Read a config file, falling back to defaults on any failure
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::read(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(err) => {
                warn!("{:#}; using default config", err);
                Self::default()
            }
        }
    }

    /// Lane count: `road.lanes` overrides `lanes`, which overrides the default
    pub fn lane_count(&self) -> usize {
        match self.road.lanes.or(self.lanes) {
            Some(lanes) if lanes > 0 => lanes,
            _ => DEFAULT_LANE_COUNT,
        }
    }

    pub fn lane_grid(&self) -> LaneGrid {
        LaneGrid::new(self.lane_count(), self.canvas.width)
    }
}
