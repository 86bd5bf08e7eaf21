//! Procedural spawning of items and traffic
//!
//! Items are drawn on a fixed interval against the environment densities.
//! Traffic accumulates at a rate derived from the player's speed and every
//! spawn goes through the same safety discipline:
//!
//! - prefer lanes that are not blocked in the safety window around the player;
//! - never leave the player without an open bypass lane because of a spawn;
//! - never place a vehicle inside another one's separation box.

use log::debug;
use ordered_float::OrderedFloat;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::behavior::PlayerView;
use super::config::Tuning;
use super::environment::Environment;
use super::items::{ItemKind, ITEM_HEIGHT};
use super::lane_grid::LaneGrid;
use super::occupancy::LaneOccupancy;
use super::traffic::{TrafficDraw, TrafficVehicle};
use super::types::{frames, TrafficId};

/// Lowest traffic spawn rate, events per reference frame
pub const MIN_SPAWN_RATE: f32 = 0.006;
/// Highest traffic spawn rate, events per reference frame
pub const MAX_SPAWN_RATE: f32 = 0.12;
/// Player counts as slow below this share of its top speed
pub const SLOW_SPEED_SHARE: f32 = 0.25;
/// Chance of spawning in the player's own lane when the player is slow
pub const PLAYER_LANE_PROBABILITY_SLOW: f32 = 0.01;
/// Chance of spawning in the player's own lane otherwise
pub const PLAYER_LANE_PROBABILITY: f32 = 0.06;
/// Extra spawn distance when the player is slow
pub const SLOW_EXTRA_OFFSET: f32 = 200.0;
/// Random extra height above the viewport for items
pub const ITEM_MAX_OFFSET: f32 = 200.0;

/// Interval-driven item generator
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSpawner {
    timer: f32,
    interval: f32,
}

impl ItemSpawner {
    pub fn new(interval: f32) -> Self {
        Self {
            timer: 0.0,
            interval: if interval > 0.0 { interval } else { 2.5 },
        }
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
    }

    /// Advance the timer; on each interval boundary draw against the densities
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        env: &Environment,
        rng: &mut R,
    ) -> Option<ItemKind> {
        self.timer += dt;
        if self.timer < self.interval {
            return None;
        }
        self.timer -= self.interval;
        let roll: f32 = rng.random();
        pick_item(roll, env)
    }
}

/// Map a uniform roll onto hazard / pickup / bonus / nothing
pub fn pick_item(roll: f32, env: &Environment) -> Option<ItemKind> {
    let hazard = env.obstacle_density;
    let pickup = hazard + env.powerup_density;
    let bonus = pickup + env.coin_density;
    if roll < hazard {
        Some(ItemKind::Pothole)
    } else if roll < pickup {
        Some(ItemKind::Nitro)
    } else if roll < bonus {
        Some(ItemKind::Coin)
    } else {
        None
    }
}

/// Uniform lane and a start row above the visible area
pub fn item_placement<R: Rng + ?Sized>(grid: &LaneGrid, rng: &mut R) -> (usize, f32) {
    let lane = rng.random_range(0..grid.lane_count());
    let y = -ITEM_HEIGHT - rng.random_range(0.0..ITEM_MAX_OFFSET);
    (lane, y)
}

/// Traffic spawn rate in events per reference frame
pub fn traffic_spawn_rate(level: u32, speed_norm: f32) -> f32 {
    let base = (0.02 + 0.005 * level as f32).min(0.08);
    let norm = speed_norm.clamp(0.0, 1.0);
    let multiplier = 0.9 - 0.7 * norm * norm;
    (base * multiplier).clamp(MIN_SPAWN_RATE, MAX_SPAWN_RATE)
}

/// Time accumulator for traffic spawn attempts, with the start-of-run delay
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSpawner {
    accumulator: f32,
    warmup_elapsed: f32,
    start_delay: f32,
}

impl TrafficSpawner {
    pub fn new(start_delay: f32) -> Self {
        Self {
            accumulator: 0.0,
            warmup_elapsed: 0.0,
            start_delay: start_delay.max(0.0),
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.warmup_elapsed = 0.0;
    }

    pub fn started(&self) -> bool {
        self.warmup_elapsed >= self.start_delay
    }

    /// Seconds left before traffic starts
    pub fn warmup_remaining(&self) -> f32 {
        (self.start_delay - self.warmup_elapsed).max(0.0)
    }

    /// Accumulate; true when an attempt is due this tick
    pub fn update(&mut self, dt: f32, rate: f32) -> bool {
        if !self.started() {
            self.warmup_elapsed += dt;
            if self.started() {
                debug!("Traffic warm-up over");
            }
            return false;
        }
        self.accumulator += rate * frames(dt);
        if self.accumulator >= 1.0 {
            self.accumulator = 0.0;
            true
        } else {
            false
        }
    }
}

/// Read-only view of the road for a spawn decision
pub struct SpawnContext<'a> {
    pub grid: &'a LaneGrid,
    pub occupancy: &'a LaneOccupancy,
    pub traffic: &'a BTreeMap<TrafficId, TrafficVehicle>,
    pub player: PlayerView,
    /// The player's base top speed
    pub player_max_speed: f32,
    pub tuning: &'a Tuning,
}

impl SpawnContext<'_> {
    fn in_safety_window(&self, y: f32) -> bool {
        y > self.player.y - self.tuning.safe_ahead && y < self.player.y + self.tuning.safe_behind
    }

    /// Per lane: a vehicle sits inside the safety window around the player
    pub fn blocked_lanes(&self) -> Vec<bool> {
        (0..self.grid.lane_count())
            .map(|lane| {
                self.occupancy.any_in_window(
                    lane,
                    self.player.y - self.tuning.safe_ahead,
                    self.player.y + self.tuning.safe_behind,
                )
            })
            .collect()
    }

    pub fn player_is_slow(&self) -> bool {
        self.player.speed < (self.player_max_speed * SLOW_SPEED_SHARE).max(1.0)
    }

    /// Lane with the largest forward gap to the player; first lane wins ties
    pub fn largest_gap_lane(&self) -> usize {
        (0..self.grid.lane_count())
            .min_by_key(|&lane| {
                Reverse(OrderedFloat(self.occupancy.forward_gap(
                    lane,
                    self.player.y,
                    self.tuning.safe_behind,
                )))
            })
            .unwrap_or(0)
    }

    /// Whether some lane other than the player's stays unblocked if a
    /// vehicle appears at `spawn_y` in `lane`
    pub fn bypass_open_after(&self, blocked: &[bool], lane: usize, spawn_y: f32) -> bool {
        let spawn_blocks = self.in_safety_window(spawn_y);
        blocked.iter().enumerate().any(|(l, &is_blocked)| {
            l != self.player.lane && !is_blocked && !(l == lane && spawn_blocks)
        })
    }

    /// Initial lane preference before the deadlock guard
    pub fn preferred_lane<R: Rng + ?Sized>(&self, blocked: &[bool], rng: &mut R) -> usize {
        let player_lane = self.player.lane;
        let slow = self.player_is_slow();
        let player_lane_probability = if slow {
            PLAYER_LANE_PROBABILITY_SLOW
        } else {
            PLAYER_LANE_PROBABILITY
        };

        let player_lane_free = blocked.get(player_lane).is_some_and(|b| !b);
        if rng.random::<f32>() < player_lane_probability && player_lane_free {
            return player_lane;
        }

        let unblocked: Vec<usize> = (0..blocked.len()).filter(|&l| !blocked[l]).collect();
        if unblocked.is_empty() {
            return self.largest_gap_lane();
        }
        let bypass: Vec<usize> = unblocked
            .iter()
            .copied()
            .filter(|&l| !(slow && l == player_lane))
            .collect();
        let pool = if bypass.is_empty() { &unblocked } else { &bypass };
        pool.choose(rng).copied().unwrap_or_else(|| self.largest_gap_lane())
    }

    /// Full lane decision including the deadlock guard. `None` means the
    /// spawn must be skipped to keep a bypass lane open.
    pub fn choose_lane<R: Rng + ?Sized>(&self, spawn_y: f32, rng: &mut R) -> Option<usize> {
        let blocked = self.blocked_lanes();
        let lane = self.preferred_lane(&blocked, rng);
        if self.bypass_open_after(&blocked, lane, spawn_y) {
            return Some(lane);
        }

        let player_lane = self.player.lane;
        let candidates: Vec<usize> = (0..blocked.len())
            .filter(|&l| l != player_lane && !blocked[l])
            .filter(|&l| self.bypass_open_after(&blocked, l, spawn_y))
            .collect();
        let lane = match candidates.choose(rng) {
            Some(&lane) => lane,
            None => self.largest_gap_lane(),
        };

        let open_before = blocked
            .iter()
            .enumerate()
            .any(|(l, &is_blocked)| l != player_lane && !is_blocked);
        if open_before && !self.bypass_open_after(&blocked, lane, spawn_y) {
            debug!("Spawn skipped: lane {} would wall in the player", lane);
            return None;
        }
        Some(lane)
    }

    /// Whether a box at `(x, y)` keeps clear of every existing vehicle
    pub fn separation_clear(&self, x: f32, y: f32) -> bool {
        !self.traffic.values().any(|other| {
            (other.x() - x).abs() < self.tuning.spawn_separation_x
                && (other.y - y).abs() < self.tuning.spawn_separation_y
        })
    }
}

/// A vehicle ready to be inserted into the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPlan {
    pub lane: usize,
    pub y: f32,
    pub draw: TrafficDraw,
}

/// Decide a traffic spawn, or `None` when this attempt is rejected
pub fn plan_traffic_spawn<R: Rng + ?Sized>(ctx: &SpawnContext<'_>, rng: &mut R) -> Option<SpawnPlan> {
    let draw = TrafficDraw::roll(rng);
    let mut offset: f32 = rng.random_range(200.0..600.0);
    if ctx.player_is_slow() {
        offset += SLOW_EXTRA_OFFSET;
    }
    let y = -draw.kind.height - offset;

    let lane = ctx.choose_lane(y, rng)?;
    let x = ctx.grid.left_edge_for(lane, draw.kind.width);
    if !ctx.separation_clear(x, y) {
        debug!("Spawn rejected: lane {} too close to another vehicle", lane);
        return None;
    }
    Some(SpawnPlan { lane, y, draw })
}
