//! Hazards and pickups on the road

use serde::Serialize;

use super::collision::{Aabb, Bounded};
use super::lane_grid::LaneGrid;
use super::types::{frames, ItemId};

pub const ITEM_WIDTH: f32 = 40.0;
pub const ITEM_HEIGHT: f32 = 20.0;
/// Items drift down slightly faster than the road
pub const ITEM_DRIFT: f32 = 2.0;
/// Items this far below the viewport are dropped
pub const ITEM_DESPAWN_BELOW: f32 = 200.0;

/// Top speed multiplier of a nitro pickup
pub const NITRO_MULTIPLIER: f32 = 1.6;
/// Seconds a nitro lasts
pub const NITRO_DURATION: f32 = 2.0;
/// Share of current speed kept after a pothole
pub const POTHOLE_SPEED_KEEP: f32 = 0.6;
/// Score awarded by a coin
pub const COIN_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Pickup: temporary top speed raise
    Nitro,
    /// Hazard: cuts current speed
    Pothole,
    /// Bonus: fixed score
    Coin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub lane: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Item {
    pub fn new(id: ItemId, kind: ItemKind, lane: usize, y: f32, grid: &LaneGrid) -> Self {
        let lane = grid.clamp(lane);
        Self {
            id,
            kind,
            lane,
            x: grid.left_edge_for(lane, ITEM_WIDTH),
            y,
            width: ITEM_WIDTH,
            height: ITEM_HEIGHT,
        }
    }

    pub fn advance(&mut self, road_speed: f32, dt: f32) {
        self.y += (ITEM_DRIFT + road_speed) * frames(dt);
    }

    pub fn out_of_view(&self, viewport_height: f32) -> bool {
        self.y > viewport_height + ITEM_DESPAWN_BELOW
    }
}

impl Bounded for Item {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }
}

/// A running nitro: raised top speed until the timer runs out
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NitroEffect {
    pub remaining: f32,
}

impl NitroEffect {
    pub fn new() -> Self {
        Self {
            remaining: NITRO_DURATION,
        }
    }

    /// Count down; returns true once expired
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}

impl Default for NitroEffect {
    fn default() -> Self {
        Self::new()
    }
}
