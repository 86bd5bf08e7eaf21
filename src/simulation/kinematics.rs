//! Motion model shared by the player and traffic
//!
//! An arcade approximation: longitudinal speed changes by fixed per-frame
//! amounts scaled with `dt * 60`, and lane changes ease toward the target
//! lane center at a fixed lateral rate.

use serde::Serialize;

use super::collision::{Aabb, Bounded};
use super::lane_grid::LaneGrid;
use super::types::{frames, Throttle};

/// Lateral lane state of a vehicle.
///
/// `x` is the left edge of the vehicle's box. While no change is in
/// progress it sits exactly on the current lane's center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaneMotion {
    pub current_lane: usize,
    pub target_lane: usize,
    pub is_changing_lane: bool,
    pub x: f32,
}

impl LaneMotion {
    /// Place a vehicle of `width` centered in `lane`
    pub fn new(lane: usize, grid: &LaneGrid, width: f32) -> Self {
        let lane = grid.clamp(lane);
        Self {
            current_lane: lane,
            target_lane: lane,
            is_changing_lane: false,
            x: grid.left_edge_for(lane, width),
        }
    }

    /// Request a change to `target`. Rejected while another change is in
    /// progress, for out-of-range lanes, and for the current lane.
    pub fn request_change(&mut self, target: usize, grid: &LaneGrid) -> bool {
        if self.is_changing_lane || !grid.contains(target) || target == self.current_lane {
            return false;
        }
        self.target_lane = target;
        self.is_changing_lane = true;
        true
    }

    /// Ease toward the target lane, snapping and committing the lane on arrival
    pub fn step(&mut self, grid: &LaneGrid, width: f32, rate: f32, dt: f32) {
        if !self.is_changing_lane {
            self.x = grid.left_edge_for(self.current_lane, width);
            return;
        }

        let target_x = grid.left_edge_for(self.target_lane, width);
        let diff = target_x - self.x;
        let step = (rate * frames(dt)).max(0.0);
        if diff.abs() <= step {
            self.x = target_x;
            self.current_lane = self.target_lane;
            self.is_changing_lane = false;
        } else {
            self.x += diff.signum() * step;
        }
    }

    /// Signed lane-change intent: target minus current
    pub fn steer(&self) -> i32 {
        self.target_lane as i32 - self.current_lane as i32
    }

    /// Lanes this vehicle occupies, counting the one it is moving into
    pub fn occupies(&self, lane: usize) -> bool {
        self.current_lane == lane || self.target_lane == lane
    }
}

/// Player tuning, in units per reference frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerSpec {
    pub width: f32,
    pub height: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub lane_change_rate: f32,
}

impl Default for PlayerSpec {
    fn default() -> Self {
        Self {
            width: 50.0,
            height: 80.0,
            max_speed: 16.0,
            acceleration: 0.45,
            deceleration: 0.3,
            lane_change_rate: 28.0,
        }
    }
}

/// The controllable vehicle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub spec: PlayerSpec,
    pub lane: LaneMotion,
    pub y: f32,
    pub speed: f32,
    /// Current top speed; differs from `spec.max_speed` while a nitro runs
    pub max_speed: f32,
    pub throttle: Throttle,
}

impl Player {
    pub fn new(spec: PlayerSpec, grid: &LaneGrid, viewport_height: f32, row_offset: f32) -> Self {
        Self {
            lane: LaneMotion::new(grid.middle_lane(), grid, spec.width),
            y: viewport_height - row_offset,
            speed: 0.0,
            max_speed: spec.max_speed,
            throttle: Throttle::None,
            spec,
        }
    }

    pub fn x(&self) -> f32 {
        self.lane.x
    }

    /// Speed normalized to the base top speed, in [0, 1]
    pub fn speed_norm(&self) -> f32 {
        (self.speed / self.spec.max_speed.max(1.0)).min(1.0)
    }

    /// Longitudinal update for one tick
    pub fn integrate_speed(&mut self, dt: f32, env_speed_multiplier: f32, boost_factor: f32) {
        let n = frames(dt);
        self.speed = match self.throttle {
            Throttle::Forward => {
                let cap = self.max_speed * boost_factor;
                (self.speed + self.spec.acceleration * n * env_speed_multiplier).min(cap)
            }
            Throttle::Back => (self.speed - 2.0 * self.spec.deceleration * n).max(0.0),
            Throttle::None => (self.speed - 0.5 * self.spec.deceleration * n).max(0.0),
        };
    }

    /// Lateral update for one tick
    pub fn integrate_lane(&mut self, grid: &LaneGrid, dt: f32) {
        self.lane
            .step(grid, self.spec.width, self.spec.lane_change_rate, dt);
    }
}

impl Bounded for Player {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.lane.x, self.y, self.spec.width, self.spec.height)
    }
}
