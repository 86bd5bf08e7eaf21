//! Core types for the highway simulation
//!
//! These are standalone types shared by every part of the engine.

use serde::{Deserialize, Serialize};

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimId(pub usize);

/// A wrapper type for traffic vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrafficId(pub SimId);

impl TrafficId {
    /// Smallest possible id, used as a lower bound in ordered lane lookups
    pub const FIRST: TrafficId = TrafficId(SimId(0));
}

/// A wrapper type for item IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub SimId);

/// Continuous throttle intent from the input collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Throttle {
    Forward,
    Back,
    #[default]
    None,
}

impl Throttle {
    /// The -1 / 0 / 1 sign used by the motion model
    pub fn sign(self) -> i8 {
        match self {
            Throttle::Forward => 1,
            Throttle::Back => -1,
            Throttle::None => 0,
        }
    }
}

/// Direction of a discrete lane change request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneDirection {
    Left,
    Right,
}

impl LaneDirection {
    pub fn offset(self) -> isize {
        match self {
            LaneDirection::Left => -1,
            LaneDirection::Right => 1,
        }
    }
}

/// Reference frame rate the per-frame tuning constants were written for
pub const REFERENCE_FPS: f32 = 60.0;

/// Converts a clamped delta into "reference frames" elapsed
pub fn frames(dt: f32) -> f32 {
    dt * REFERENCE_FPS
}

/// Frame-rate independent form of a per-frame exponential blend factor
pub fn blend_factor(per_frame: f32, dt: f32) -> f32 {
    1.0 - (1.0 - per_frame).powf(frames(dt))
}

/// Fixed screen row offset of the player from the bottom of the viewport
pub const PLAYER_BOTTOM_OFFSET: f32 = 120.0;

/// Base scroll speed of the road when the player is stopped
pub const BASE_ROAD_SPEED: f32 = 8.0;

/// Share of the player's speed added to the road scroll speed
pub const ROAD_SPEED_PER_PLAYER_SPEED: f32 = 0.5;

/// Road scroll speed for a given player speed
pub fn road_speed(player_speed: f32) -> f32 {
    BASE_ROAD_SPEED + player_speed * ROAD_SPEED_PER_PLAYER_SPEED
}
