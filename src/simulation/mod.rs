//! Standalone highway simulation module
//!
//! This module contains all the driving simulation logic. It has no
//! rendering or input dependencies, so it can be tested via console
//! without needing a window.

mod behavior;
mod boost;
mod clock;
mod collision;
mod config;
mod environment;
mod game_state;
mod items;
mod kinematics;
mod lane_grid;
mod occupancy;
mod spawner;
mod storage;
mod telemetry;
mod traffic;
mod types;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use behavior::{
    act, classify, proximity_slowdown, sense, AheadVehicle, BehaviorContext, BehaviorState,
    Intent, PlayerView, Sensing,
};
#[allow(unused_imports)]
pub use boost::{
    BoostRecord, BoostResource, BoostSettings, BoostState, BoostTransition, PersistedBoost,
};
#[allow(unused_imports)]
pub use clock::{clamp_delta, SimClock, MAX_DELTA};
#[allow(unused_imports)]
pub use collision::{all_hits, check_collision, first_hit, Aabb, Bounded};
#[allow(unused_imports)]
pub use config::{CanvasConfig, PhysicsConfig, RoadConfig, SimConfig, Tuning};
#[allow(unused_imports)]
pub use environment::{load_environment, parse_catalog, read_catalog, select, Environment, VisualHint};
#[allow(unused_imports)]
pub use game_state::{GameState, RunMode, DISTANCE_PER_LEVEL};
#[allow(unused_imports)]
pub use items::{
    Item, ItemKind, NitroEffect, COIN_SCORE, ITEM_HEIGHT, ITEM_WIDTH, NITRO_DURATION,
    NITRO_MULTIPLIER, POTHOLE_SPEED_KEEP,
};
#[allow(unused_imports)]
pub use kinematics::{LaneMotion, Player, PlayerSpec};
#[allow(unused_imports)]
pub use lane_grid::{LaneGrid, DEFAULT_LANE_COUNT};
#[allow(unused_imports)]
pub use occupancy::LaneOccupancy;
#[allow(unused_imports)]
pub use spawner::{
    item_placement, pick_item, plan_traffic_spawn, traffic_spawn_rate, ItemSpawner,
    SpawnContext, SpawnPlan, TrafficSpawner, MAX_SPAWN_RATE, MIN_SPAWN_RATE,
};
#[allow(unused_imports)]
pub use storage::{BoostStore, FileBoostStore, MemoryBoostStore, DEFAULT_BOOST_FILE};
#[allow(unused_imports)]
pub use telemetry::{JsonLinesLink, TelemetryFrame, TelemetryLink};
#[allow(unused_imports)]
pub use traffic::{TrafficDraw, TrafficVehicle, VehicleKind, SWAY_SETTLE, VEHICLE_PALETTE};
#[allow(unused_imports)]
pub use types::{
    blend_factor, frames, road_speed, ItemId, LaneDirection, SimId, Throttle, TrafficId,
    PLAYER_BOTTOM_OFFSET, REFERENCE_FPS,
};
pub use world::{BoostView, Command, SimSnapshot, SimWorld, TickReport};
