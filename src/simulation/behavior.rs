//! Traffic behavior engine
//!
//! Each tick every traffic vehicle is re-classified from what it senses;
//! the state is not sticky. Classification and action are separate so each
//! rule can be exercised on its own:
//!
//! 1. [`sense`] gathers the nearest vehicle ahead and whether the player is
//!    closing from behind in the same lane.
//! 2. [`classify`] picks EVADE, OVERTAKE or CRUISE (in that priority).
//! 3. [`act`] turns the state into a desired speed and an optional lane
//!    change request for the motion model.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::config::Tuning;
use super::lane_grid::LaneGrid;
use super::occupancy::LaneOccupancy;
use super::traffic::TrafficVehicle;
use super::types::{blend_factor, TrafficId};

/// Player must be at least this much faster to trigger EVADE
pub const EVADE_SPEED_MARGIN: f32 = 0.5;
/// Vehicle ahead must be at least this much slower to be worth overtaking
pub const OVERTAKE_SPEED_MARGIN: f32 = 0.2;
/// EVADE never slows a vehicle below this share of its base speed
pub const EVADE_MIN_SPEED_SHARE: f32 = 0.6;
/// Largest share of base speed shed at full EVADE urgency
pub const EVADE_MAX_SLOWDOWN: f32 = 0.45;
/// OVERTAKE speeds up by at most this factor...
pub const OVERTAKE_SPEEDUP: f32 = 1.28;
/// ...and at most this much in absolute terms
pub const OVERTAKE_MAX_GAIN: f32 = 3.0;
/// Unprompted lane change probability per reference frame at difficulty 0
pub const BASE_LANE_CHANGE_PROBABILITY: f32 = 0.004;
/// Sway damping applied as soon as the player is near
pub const PROXIMITY_BASE_SLOWDOWN: f32 = 0.18;
/// Additional sway damping at full proximity urgency
pub const PROXIMITY_SLOWDOWN_RANGE: f32 = 0.7;
/// Floor on reaction time used as a divisor
const MIN_REACTION_TIME: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BehaviorState {
    #[default]
    Cruise,
    Evade,
    Overtake,
}

/// What the behavior engine needs to know about the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    pub lane: usize,
    pub x: f32,
    pub y: f32,
    pub speed: f32,
}

/// The nearest vehicle ahead in the same lane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AheadVehicle {
    pub id: TrafficId,
    pub gap: f32,
    pub speed: f32,
}

/// Sensed conditions for one vehicle this tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sensing {
    pub ahead: Option<AheadVehicle>,
    /// Gap to the player when it is closing fast from behind in the same lane
    pub player_closing: Option<f32>,
}

/// Shared read-only context for acting on a classification
pub struct BehaviorContext<'a> {
    pub grid: &'a LaneGrid,
    pub occupancy: &'a LaneOccupancy,
    pub player: PlayerView,
    pub tuning: &'a Tuning,
    /// Difficulty in [0, 1], derived from the player's level
    pub difficulty: f32,
    pub dt: f32,
}

impl BehaviorContext<'_> {
    /// Lane exists and no other vehicle is close to `vehicle` in it
    pub fn can_change_to(&self, lane: Option<usize>, vehicle: &TrafficVehicle) -> bool {
        match lane {
            Some(lane) if self.grid.contains(lane) => !self.occupancy.any_near(
                lane,
                vehicle.y,
                self.tuning.lane_clearance,
                Some(vehicle.id),
            ),
            _ => false,
        }
    }

    /// `can_change_to` plus free road ahead in the target lane
    pub fn safe_to_overtake_into(&self, lane: Option<usize>, vehicle: &TrafficVehicle) -> bool {
        if !self.can_change_to(lane, vehicle) {
            return false;
        }
        let Some(lane) = lane else {
            return false;
        };
        match self.occupancy.nearest_ahead(lane, vehicle.y, Some(vehicle.id)) {
            Some((other_y, _)) => vehicle.y - other_y > self.tuning.overtake_forward_clearance,
            None => true,
        }
    }

    /// Player's forward gap in `lane`; invalid lanes rank lowest
    fn player_gap_in(&self, lane: Option<usize>) -> f32 {
        match lane {
            Some(lane) if self.grid.contains(lane) => {
                self.occupancy
                    .forward_gap(lane, self.player.y, self.tuning.safe_behind)
            }
            _ => f32::NEG_INFINITY,
        }
    }

    /// Per-tick probability of an unprompted lane change
    pub fn random_lane_change_probability(&self) -> f32 {
        let per_frame = BASE_LANE_CHANGE_PROBABILITY * (1.0 + self.difficulty.clamp(0.0, 1.0));
        blend_factor(per_frame, self.dt)
    }
}

/// Behavior output consumed by the motion model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intent {
    pub state: BehaviorState,
    pub desired_speed: f32,
    pub lane_request: Option<usize>,
    /// Active slowdown in [0, 1]; damps lateral sway
    pub slowdown: f32,
}

/// Gather sensed conditions for `vehicle`
pub fn sense(
    vehicle: &TrafficVehicle,
    traffic: &BTreeMap<TrafficId, TrafficVehicle>,
    occupancy: &LaneOccupancy,
    player: &PlayerView,
    tuning: &Tuning,
) -> Sensing {
    let lane = vehicle.lane.current_lane;
    let ahead = occupancy
        .nearest_ahead(lane, vehicle.y, Some(vehicle.id))
        .and_then(|(other_y, id)| {
            traffic.get(&id).map(|other| AheadVehicle {
                id,
                gap: vehicle.y - other_y,
                speed: other.speed,
            })
        });

    let gap = player.y - vehicle.y;
    let player_closing = (player.lane == lane
        && gap > 0.0
        && gap < tuning.evade_distance
        && player.speed > vehicle.speed + EVADE_SPEED_MARGIN)
        .then_some(gap);

    Sensing {
        ahead,
        player_closing,
    }
}

/// Classify the vehicle's tactical state. `overtake_roll` is a uniform draw
/// in [0, 1) compared against the vehicle's aggression.
pub fn classify(
    vehicle: &TrafficVehicle,
    sensing: &Sensing,
    tuning: &Tuning,
    overtake_roll: f32,
) -> BehaviorState {
    if sensing.player_closing.is_some() {
        return BehaviorState::Evade;
    }
    let overtake = sensing.ahead.is_some_and(|ahead| {
        ahead.gap < tuning.overtake_distance
            && ahead.speed < vehicle.speed - OVERTAKE_SPEED_MARGIN
            && overtake_roll < vehicle.aggression
    });
    if overtake {
        BehaviorState::Overtake
    } else {
        BehaviorState::Cruise
    }
}

/// Turn a classification into a desired speed and lane request
pub fn act<R: Rng + ?Sized>(
    state: BehaviorState,
    vehicle: &TrafficVehicle,
    sensing: &Sensing,
    ctx: &BehaviorContext<'_>,
    rng: &mut R,
) -> Intent {
    let lane = vehicle.lane.current_lane;
    let left = ctx.grid.neighbor(lane, -1);
    let right = ctx.grid.neighbor(lane, 1);
    let free_to_steer = !vehicle.lane.is_changing_lane;
    let proximity = proximity_slowdown(vehicle, ctx);

    match state {
        BehaviorState::Evade => {
            let gap = sensing.player_closing.unwrap_or(ctx.tuning.evade_distance);
            let range = ctx.tuning.evade_urgency_range.max(1.0);
            let urgency = ((range - gap) / range).max(0.0);
            let reaction = (urgency / vehicle.reaction_time.max(MIN_REACTION_TIME)).min(1.0);
            let slowdown = EVADE_MAX_SLOWDOWN * reaction;
            let desired_speed = (vehicle.base_speed * (1.0 - slowdown))
                .max(vehicle.base_speed * EVADE_MIN_SPEED_SHARE);

            let lane_request = if !free_to_steer {
                None
            } else if ctx.can_change_to(left, vehicle)
                && ctx.player_gap_in(left) >= ctx.player_gap_in(right)
            {
                left
            } else if ctx.can_change_to(right, vehicle) {
                right
            } else {
                None
            };

            Intent {
                state,
                desired_speed,
                lane_request,
                slowdown: slowdown.max(proximity),
            }
        }
        BehaviorState::Overtake => {
            let lane_request = if !free_to_steer {
                None
            } else if ctx.safe_to_overtake_into(left, vehicle) {
                left
            } else if ctx.safe_to_overtake_into(right, vehicle) {
                right
            } else {
                None
            };

            Intent {
                state,
                desired_speed: (vehicle.speed * OVERTAKE_SPEEDUP)
                    .min(vehicle.speed + OVERTAKE_MAX_GAIN),
                lane_request,
                slowdown: proximity,
            }
        }
        BehaviorState::Cruise => {
            let mut lane_request = None;
            if free_to_steer && rng.random::<f32>() < ctx.random_lane_change_probability() {
                let target = if rng.random_bool(0.5) { left } else { right };
                if ctx.can_change_to(target, vehicle) {
                    lane_request = target;
                }
            }

            Intent {
                state,
                desired_speed: vehicle.base_speed,
                lane_request,
                slowdown: proximity,
            }
        }
    }
}

/// Sway damping for a vehicle just ahead of the player and laterally close
pub fn proximity_slowdown(vehicle: &TrafficVehicle, ctx: &BehaviorContext<'_>) -> f32 {
    let reach = ctx.tuning.reaction_distance.max(1.0);
    let dist = ctx.player.y - vehicle.y;
    let lateral = (vehicle.lane.x - ctx.player.x).abs();
    if dist <= -80.0 || dist >= reach || lateral >= ctx.grid.lane_width() * 0.9 {
        return 0.0;
    }
    let urgency = ((reach - dist) / reach).max(0.0);
    let reaction = (urgency / vehicle.reaction_time.max(MIN_REACTION_TIME)).min(1.0);
    (PROXIMITY_BASE_SLOWDOWN + PROXIMITY_SLOWDOWN_RANGE * reaction).min(1.0)
}
