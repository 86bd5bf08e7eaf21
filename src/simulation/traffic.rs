//! Traffic vehicles
//!
//! Computer-controlled vehicles: their palette, the per-spawn parameter
//! draws, and their motion once the behavior engine has set an intent.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use std::f32::consts::TAU;

use super::behavior::BehaviorState;
use super::collision::{Aabb, Bounded};
use super::kinematics::LaneMotion;
use super::lane_grid::LaneGrid;
use super::types::{blend_factor, frames, TrafficId};

/// Per-frame speed blend while cruising or evading
pub const CRUISE_BLEND: f32 = 0.06;
/// Per-frame speed blend while overtaking
pub const OVERTAKE_BLEND: f32 = 0.12;
/// Peak lateral sway per frame
pub const SWAY_AMPLITUDE: f32 = 0.18;
/// Per-frame share of the sway shed while a lane change is in progress
pub const SWAY_SETTLE: f32 = 0.15;
/// Traffic this far below the viewport bottom has been passed
pub const DESPAWN_BELOW: f32 = 50.0;
/// Traffic that drove this far above the viewport is dropped without score
pub const DESPAWN_ABOVE: f32 = -1500.0;

/// A vehicle type from the fixed palette
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleKind {
    pub name: &'static str,
    pub color: &'static str,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub points: u32,
}

pub const VEHICLE_PALETTE: [VehicleKind; 5] = [
    VehicleKind { name: "compact", color: "#4444ff", width: 50.0, height: 80.0, speed: 3.2, points: 10 },
    VehicleKind { name: "sedan", color: "#44ff44", width: 55.0, height: 90.0, speed: 4.2, points: 15 },
    VehicleKind { name: "suv", color: "#ff44ff", width: 60.0, height: 100.0, speed: 2.4, points: 20 },
    VehicleKind { name: "sports", color: "#ffff44", width: 45.0, height: 70.0, speed: 5.4, points: 8 },
    VehicleKind { name: "truck", color: "#44ffff", width: 65.0, height: 120.0, speed: 2.8, points: 25 },
];

/// Per-spawn draws for a new vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficDraw {
    pub kind: VehicleKind,
    pub speed: f32,
    pub reaction_time: f32,
    pub aggression: f32,
    pub oscillation_phase: f32,
    pub oscillation_rate: f32,
}

impl TrafficDraw {
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        // The palette is a non-empty const
        let kind = *VEHICLE_PALETTE.choose(rng).unwrap_or(&VEHICLE_PALETTE[0]);
        Self {
            kind,
            speed: (kind.speed + rng.random_range(-1.2..1.2)).max(1.0),
            reaction_time: rng.random_range(0.2..=0.7),
            aggression: rng.random_range(0.2..=1.0),
            oscillation_phase: rng.random_range(0.0..TAU),
            oscillation_rate: rng.random_range(0.01..0.03),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficVehicle {
    pub id: TrafficId,
    pub kind: VehicleKind,
    pub lane: LaneMotion,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub base_speed: f32,
    pub desired_speed: f32,
    pub aggression: f32,
    pub reaction_time: f32,
    pub behavior: BehaviorState,
    pub oscillation_phase: f32,
    pub oscillation_rate: f32,
    /// Accumulated lateral sway added to the lane-held position
    pub sway: f32,
    /// Active slowdown from the last behavior update, damps the sway
    pub slowdown: f32,
    pub points: u32,
}

impl TrafficVehicle {
    pub fn new(id: TrafficId, draw: TrafficDraw, lane: usize, y: f32, grid: &LaneGrid) -> Self {
        let kind = draw.kind;
        Self {
            id,
            kind,
            lane: LaneMotion::new(lane, grid, kind.width),
            y,
            width: kind.width,
            height: kind.height,
            speed: draw.speed,
            base_speed: draw.speed,
            desired_speed: draw.speed,
            aggression: draw.aggression,
            reaction_time: draw.reaction_time,
            behavior: BehaviorState::Cruise,
            oscillation_phase: draw.oscillation_phase,
            oscillation_rate: draw.oscillation_rate,
            sway: 0.0,
            slowdown: 0.0,
            points: kind.points,
        }
    }

    /// Rendered left edge including sway
    pub fn x(&self) -> f32 {
        self.lane.x + self.sway
    }

    /// Blend speed toward the behavior engine's desired speed
    pub fn blend_speed(&mut self, dt: f32) {
        let per_frame = match self.behavior {
            BehaviorState::Overtake => OVERTAKE_BLEND,
            _ => CRUISE_BLEND,
        };
        self.speed += (self.desired_speed - self.speed) * blend_factor(per_frame, dt);
        self.speed = self.speed.max(0.0);
    }

    /// Move on screen, ease any lane change, and sway. `slowdown` in [0, 1]
    /// damps the sway; during a lane change the sway settles instead.
    pub fn integrate(
        &mut self,
        grid: &LaneGrid,
        lane_change_rate: f32,
        road_speed: f32,
        slowdown: f32,
        dt: f32,
    ) {
        let n = frames(dt);
        self.y += (road_speed - self.speed) * n;
        let changing = self.lane.is_changing_lane;
        self.lane.step(grid, self.width, lane_change_rate, dt);
        if changing {
            // Settle toward the lane-held position so x stays continuous
            self.sway -= self.sway * blend_factor(SWAY_SETTLE, dt);
        } else {
            self.oscillation_phase = (self.oscillation_phase + self.oscillation_rate * n) % TAU;
            self.sway += self.oscillation_phase.sin()
                * SWAY_AMPLITUDE
                * (1.0 - slowdown.clamp(0.0, 1.0))
                * n;
        }
        self.sway = self.sway.clamp(-grid.lane_width() * 0.25, grid.lane_width() * 0.25);
    }

    /// True once the vehicle is fully below the viewport
    pub fn passed(&self, viewport_height: f32) -> bool {
        self.y > viewport_height + DESPAWN_BELOW
    }

    /// True once the vehicle has driven far out of sight ahead
    pub fn lost_ahead(&self) -> bool {
        self.y < DESPAWN_ABOVE
    }
}

impl Bounded for TrafficVehicle {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.x(), self.y, self.width, self.height)
    }
}
