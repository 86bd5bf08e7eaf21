//! Main simulation world that ties everything together
//!
//! This is the entry point for running the highway simulation without any
//! rendering attached. The host feeds commands and raw frame deltas; the
//! world advances in a fixed order every tick:
//!
//! 1. player kinematics and run statistics
//! 2. traffic behavior (sense, classify, act)
//! 3. traffic and item motion, despawning
//! 4. spawning
//! 5. collisions and item effects
//! 6. boost resource and its persistence
//! 7. telemetry

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;

use super::behavior::{act, classify, sense, BehaviorContext, BehaviorState, PlayerView, Sensing};
use super::boost::{BoostState, BoostTransition, PersistedBoost};
use super::clock::SimClock;
use super::collision::{all_hits, first_hit, Aabb, Bounded};
use super::config::SimConfig;
use super::environment::Environment;
use super::game_state::{GameState, RunMode};
use super::items::{Item, ItemKind, NitroEffect, COIN_SCORE, NITRO_MULTIPLIER, POTHOLE_SPEED_KEEP};
use super::kinematics::{Player, PlayerSpec};
use super::lane_grid::LaneGrid;
use super::occupancy::LaneOccupancy;
use super::spawner::{
    item_placement, plan_traffic_spawn, traffic_spawn_rate, ItemSpawner, SpawnContext,
    TrafficSpawner,
};
use super::storage::{BoostStore, MemoryBoostStore};
use super::telemetry::{TelemetryFrame, TelemetryLink};
use super::traffic::{TrafficDraw, TrafficVehicle};
use super::types::{road_speed, ItemId, LaneDirection, SimId, Throttle, TrafficId, PLAYER_BOTTOM_OFFSET};

/// Input accepted from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ChangeLane(LaneDirection),
    Throttle(Throttle),
    Handbrake(bool),
    TogglePause,
    Restart,
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Clamped delta that was integrated
    pub dt: f32,
    pub crashed: bool,
    pub vehicles_passed: u32,
    pub vehicles_spawned: u32,
    pub items_collected: Vec<ItemKind>,
    pub level_up: Option<u32>,
    pub boost: Option<BoostTransition>,
}

/// Boost readout for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostView {
    pub remaining: f64,
    pub max: f64,
    pub state: BoostState,
    pub cooldown_elapsed: f64,
    pub speed_factor: f64,
}

/// Everything a renderer needs to draw one frame
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimSnapshot {
    pub mode: RunMode,
    pub score: u64,
    pub distance: f64,
    pub level: u32,
    pub lane_count: usize,
    pub lane_width: f32,
    pub road_speed: f32,
    pub player: Aabb,
    pub player_lane: usize,
    pub player_target_lane: usize,
    pub player_speed: f32,
    pub traffic: Vec<TrafficVehicle>,
    pub items: Vec<Item>,
    pub boost: BoostView,
    pub nitro_remaining: Option<f32>,
    pub environment: Environment,
    pub traffic_warmup_remaining: f32,
}

/// The main simulation world
pub struct SimWorld {
    config: SimConfig,
    pub grid: LaneGrid,
    pub environment: Environment,
    pub player: Player,

    /// Traffic keyed by id; iteration order is spawn order
    pub traffic: BTreeMap<TrafficId, TrafficVehicle>,
    pub items: BTreeMap<ItemId, Item>,

    pub game_state: GameState,
    pub clock: SimClock,
    pub handbrake: bool,

    boost: PersistedBoost,
    nitro: Option<NitroEffect>,
    item_spawner: ItemSpawner,
    traffic_spawner: TrafficSpawner,

    /// Next ID to assign
    next_id: usize,
    rng: StdRng,
    telemetry: Option<Box<dyn TelemetryLink>>,
}

impl SimWorld {
    fn new_internal(
        config: SimConfig,
        environment: Environment,
        store: Box<dyn BoostStore>,
        rng: StdRng,
    ) -> Self {
        let grid = config.lane_grid();
        let player = Player::new(
            PlayerSpec::default(),
            &grid,
            config.canvas.height,
            PLAYER_BOTTOM_OFFSET,
        );
        let boost = PersistedBoost::load(config.boost, store);
        let item_spawner = ItemSpawner::new(config.tuning.item_interval);
        let traffic_spawner = TrafficSpawner::new(config.tuning.traffic_start_delay);
        info!(
            "Highway ready: {} lanes of {:.0}px, environment '{}'",
            grid.lane_count(),
            grid.lane_width(),
            environment.id
        );

        Self {
            config,
            grid,
            environment,
            player,
            traffic: BTreeMap::new(),
            items: BTreeMap::new(),
            game_state: GameState::new(),
            clock: SimClock::new(),
            handbrake: false,
            boost,
            nitro: None,
            item_spawner,
            traffic_spawner,
            next_id: 0,
            rng,
            telemetry: None,
        }
    }

    pub fn new(config: SimConfig, environment: Environment, store: Box<dyn BoostStore>) -> Self {
        Self::new_internal(config, environment, store, StdRng::from_rng(&mut rand::rng()))
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(
        config: SimConfig,
        environment: Environment,
        store: Box<dyn BoostStore>,
        seed: u64,
    ) -> Self {
        Self::new_internal(config, environment, store, StdRng::seed_from_u64(seed))
    }

    /// Default road and environment, in-memory boost, traffic from the first tick
    pub fn create_test_world_with_seed(seed: u64) -> Self {
        let mut config = SimConfig::default();
        config.tuning.traffic_start_delay = 0.0;
        Self::new_with_seed(
            config,
            Environment::default(),
            Box::new(MemoryBoostStore::new()),
            seed,
        )
    }

    pub fn attach_telemetry(&mut self, link: Box<dyn TelemetryLink>) {
        self.telemetry = Some(link);
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn boost(&self) -> &PersistedBoost {
        &self.boost
    }

    pub fn nitro(&self) -> Option<&NitroEffect> {
        self.nitro.as_ref()
    }

    pub fn traffic_warmup_remaining(&self) -> f32 {
        self.traffic_spawner.warmup_remaining()
    }

    /// Current road scroll speed
    pub fn road_speed(&self) -> f32 {
        road_speed(self.player.speed)
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    fn player_view(&self) -> PlayerView {
        PlayerView {
            lane: self.player.lane.current_lane,
            x: self.player.x(),
            y: self.player.y,
            speed: self.player.speed,
        }
    }

    /// Place a vehicle directly, bypassing the spawner
    pub fn add_traffic(&mut self, lane: usize, y: f32, draw: TrafficDraw) -> TrafficId {
        let id = TrafficId(self.next_sim_id());
        let vehicle = TrafficVehicle::new(id, draw, lane, y, &self.grid);
        debug!(
            "Traffic {:?} ({}) enters lane {} at y={:.0}",
            id.0, vehicle.kind.name, vehicle.lane.current_lane, y
        );
        self.traffic.insert(id, vehicle);
        id
    }

    /// Place an item directly, bypassing the spawner
    pub fn add_item(&mut self, kind: ItemKind, lane: usize, y: f32) -> ItemId {
        let id = ItemId(self.next_sim_id());
        self.items.insert(id, Item::new(id, kind, lane, y, &self.grid));
        id
    }

    /// Apply one host command. Returns false when it had no effect.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::ChangeLane(direction) => {
                if !self.game_state.is_playing() {
                    return false;
                }
                match self
                    .grid
                    .neighbor(self.player.lane.current_lane, direction.offset())
                {
                    Some(target) => self.player.lane.request_change(target, &self.grid),
                    None => false,
                }
            }
            Command::Throttle(throttle) => {
                self.player.throttle = throttle;
                true
            }
            Command::Handbrake(engaged) => {
                self.handbrake = engaged;
                true
            }
            Command::TogglePause => {
                if self.game_state.is_crashed() {
                    return false;
                }
                self.game_state.toggle_pause();
                info!("Run {:?}", self.game_state.mode);
                true
            }
            Command::Restart => {
                self.restart();
                true
            }
        }
    }

    /// Start a new run; the boost record carries over
    pub fn restart(&mut self) {
        self.player = Player::new(
            PlayerSpec::default(),
            &self.grid,
            self.config.canvas.height,
            PLAYER_BOTTOM_OFFSET,
        );
        self.traffic.clear();
        self.items.clear();
        self.game_state = GameState::new();
        self.nitro = None;
        self.handbrake = false;
        self.item_spawner.reset();
        self.traffic_spawner.reset();
        info!("Run restarted");
    }

    /// Advance the simulation by one host frame
    pub fn tick(&mut self, raw_dt: f32) -> TickReport {
        let dt = self.clock.advance(raw_dt);
        let mut report = TickReport {
            dt,
            ..TickReport::default()
        };

        if self.game_state.is_playing() && dt > 0.0 {
            self.step(dt, &mut report);
        }

        self.publish_telemetry();
        report
    }

    fn step(&mut self, dt: f32, report: &mut TickReport) {
        self.update_player(dt, report);
        self.update_behavior(dt);

        let road_speed = self.road_speed();
        self.update_traffic(dt, road_speed, report);
        self.update_items(dt, road_speed);
        self.run_spawners(dt, report);

        if self.resolve_collisions(report) {
            return;
        }

        let forward = self.player.throttle == Throttle::Forward;
        let speed_norm = self.player.speed_norm() as f64;
        report.boost = self.boost.update(dt as f64, forward, speed_norm);
        if let Some(transition) = report.boost {
            info!("Boost {:?}", transition);
        }
    }

    fn update_player(&mut self, dt: f32, report: &mut TickReport) {
        let nitro_expired = self.nitro.as_mut().is_some_and(|nitro| nitro.tick(dt));
        if nitro_expired {
            self.player.max_speed = self.player.spec.max_speed;
            self.nitro = None;
            debug!("Nitro expired");
        }

        let boost_factor = self.boost.resource().speed_factor() as f32;
        self.player
            .integrate_speed(dt, self.environment.speed_multiplier, boost_factor);
        self.player.integrate_lane(&self.grid, dt);

        let road_speed = self.road_speed();
        report.level_up = self.game_state.update(dt, self.player.speed, road_speed);
        if let Some(level) = report.level_up {
            info!("Level {} reached", level);
        }
    }

    /// Sense, classify and act for every vehicle. Lane requests granted
    /// earlier in the pass are visible to later vehicles.
    fn update_behavior(&mut self, dt: f32) {
        let player = self.player_view();
        let tuning = self.config.tuning;
        let difficulty = self.game_state.difficulty();
        let mut occupancy = LaneOccupancy::from_map(self.grid.lane_count(), &self.traffic);

        let sensed: Vec<(TrafficId, Sensing)> = self
            .traffic
            .values()
            .map(|v| (v.id, sense(v, &self.traffic, &occupancy, &player, &tuning)))
            .collect();

        for (id, sensing) in sensed {
            let overtake_roll: f32 = self.rng.random();
            let Some(vehicle) = self.traffic.get_mut(&id) else {
                continue;
            };
            let state = classify(vehicle, &sensing, &tuning, overtake_roll);
            let ctx = BehaviorContext {
                grid: &self.grid,
                occupancy: &occupancy,
                player,
                tuning: &tuning,
                difficulty,
                dt,
            };
            let intent = act(state, vehicle, &sensing, &ctx, &mut self.rng);

            if intent.state != vehicle.behavior {
                debug!(
                    "Traffic {:?}: {:?} -> {:?}",
                    id.0, vehicle.behavior, intent.state
                );
            }
            vehicle.behavior = intent.state;
            vehicle.desired_speed = intent.desired_speed;
            vehicle.slowdown = intent.slowdown;
            if let Some(target) = intent.lane_request {
                if vehicle.lane.request_change(target, &self.grid) {
                    occupancy.insert(target, vehicle.y, id);
                }
            }
        }
    }

    fn update_traffic(&mut self, dt: f32, road_speed: f32, report: &mut TickReport) {
        let rate = self.config.tuning.traffic_lane_change_rate;
        let height = self.config.canvas.height;
        let mut gone: Vec<(TrafficId, Option<u32>)> = Vec::new();

        for (id, vehicle) in self.traffic.iter_mut() {
            vehicle.blend_speed(dt);
            let slowdown = vehicle.slowdown;
            vehicle.integrate(&self.grid, rate, road_speed, slowdown, dt);
            if vehicle.passed(height) {
                gone.push((*id, Some(vehicle.points)));
            } else if vehicle.lost_ahead() {
                gone.push((*id, None));
            }
        }

        for (id, points) in gone {
            self.traffic.remove(&id);
            if let Some(points) = points {
                self.game_state.vehicle_passed(points);
                report.vehicles_passed += 1;
            }
        }
    }

    fn update_items(&mut self, dt: f32, road_speed: f32) {
        let height = self.config.canvas.height;
        for item in self.items.values_mut() {
            item.advance(road_speed, dt);
        }
        self.items.retain(|_, item| !item.out_of_view(height));
    }

    fn run_spawners(&mut self, dt: f32, report: &mut TickReport) {
        if let Some(kind) = self
            .item_spawner
            .update(dt, &self.environment, &mut self.rng)
        {
            let (lane, y) = item_placement(&self.grid, &mut self.rng);
            let id = self.add_item(kind, lane, y);
            debug!("Item {:?} ({:?}) in lane {}", id.0, kind, lane);
        }

        let rate = traffic_spawn_rate(self.game_state.level, self.player.speed_norm());
        if !self.traffic_spawner.update(dt, rate) {
            return;
        }

        let occupancy = LaneOccupancy::from_map(self.grid.lane_count(), &self.traffic);
        let ctx = SpawnContext {
            grid: &self.grid,
            occupancy: &occupancy,
            traffic: &self.traffic,
            player: self.player_view(),
            player_max_speed: self.player.spec.max_speed,
            tuning: &self.config.tuning,
        };
        if let Some(plan) = plan_traffic_spawn(&ctx, &mut self.rng) {
            self.add_traffic(plan.lane, plan.y, plan.draw);
            report.vehicles_spawned += 1;
        }
    }

    /// Item pickups, then traffic. Returns true when the run just crashed.
    fn resolve_collisions(&mut self, report: &mut TickReport) -> bool {
        let picked = all_hits(&self.player, self.items.iter());
        for id in picked {
            if let Some(item) = self.items.remove(&id) {
                self.apply_item(item.kind);
                report.items_collected.push(item.kind);
            }
        }

        let Some(id) = first_hit(&self.player, self.traffic.iter()) else {
            return false;
        };
        self.game_state.crash();
        self.boost.flush();
        report.crashed = true;
        info!(
            "Crash with traffic {:?} at score {}",
            id.0,
            self.game_state.display_score()
        );
        true
    }

    fn apply_item(&mut self, kind: ItemKind) {
        self.game_state.items_collected += 1;
        match kind {
            ItemKind::Nitro => {
                self.player.max_speed = self.player.spec.max_speed * NITRO_MULTIPLIER;
                self.nitro = Some(NitroEffect::new());
            }
            ItemKind::Pothole => {
                self.player.speed *= POTHOLE_SPEED_KEEP;
            }
            ItemKind::Coin => {
                self.game_state.earn(COIN_SCORE);
            }
        }
        debug!("Picked up {:?}", kind);
    }

    fn publish_telemetry(&mut self) {
        let frame = TelemetryFrame {
            fps: self.clock.fps.max(0.0).floor() as u32,
            throttle: (self.player.speed * 10.0).floor() as i32,
            steer: self.player.lane.steer(),
            handbrake: self.handbrake,
        };
        let Some(link) = self.telemetry.as_mut() else {
            return;
        };
        if !link.is_connected() {
            return;
        }
        if let Err(err) = link.send(&frame) {
            debug!("Telemetry dropped: {:#}", err);
        }
    }

    /// Write the boost record now, e.g. before the host shuts down
    pub fn flush_boost(&mut self) {
        self.boost.flush();
    }

    pub fn snapshot(&self) -> SimSnapshot {
        let resource = self.boost.resource();
        SimSnapshot {
            mode: self.game_state.mode,
            score: self.game_state.display_score(),
            distance: self.game_state.distance,
            level: self.game_state.level,
            lane_count: self.grid.lane_count(),
            lane_width: self.grid.lane_width(),
            road_speed: self.road_speed(),
            player: self.player.bounds(),
            player_lane: self.player.lane.current_lane,
            player_target_lane: self.player.lane.target_lane,
            player_speed: self.player.speed,
            traffic: self.traffic.values().cloned().collect(),
            items: self.items.values().cloned().collect(),
            boost: BoostView {
                remaining: resource.remaining(),
                max: resource.max(),
                state: resource.state(),
                cooldown_elapsed: resource.cooldown_elapsed(),
                speed_factor: resource.speed_factor(),
            },
            nitro_remaining: self.nitro.map(|n| n.remaining),
            environment: self.environment.clone(),
            traffic_warmup_remaining: self.traffic_spawner.warmup_remaining(),
        }
    }

    /// Print a summary of the current run
    pub fn print_summary(&self) {
        let resource = self.boost.resource();
        println!("=== Highway Simulation Summary ===");
        println!("Time: {:.2}s ({} ticks)", self.clock.elapsed, self.clock.ticks);
        println!("{}", self.game_state.summary());
        println!(
            "Environment: {} (speed x{:.2})",
            self.environment.id, self.environment.speed_multiplier
        );
        println!(
            "Player: lane {} speed {:.2}/{:.2}",
            self.player.lane.current_lane, self.player.speed, self.player.max_speed
        );
        println!(
            "Boost: {:?} {:.2}/{:.0}",
            resource.state(),
            resource.remaining(),
            resource.max()
        );
        println!("Traffic: {}  Items: {}", self.traffic.len(), self.items.len());
        println!();

        if !self.traffic.is_empty() {
            println!("--- Traffic ---");
            for vehicle in self.traffic.values() {
                println!(
                    "  {:?} {:<8} lane={} y={:>7.1} speed={:.2} {:?}",
                    vehicle.id.0,
                    vehicle.kind.name,
                    vehicle.lane.current_lane,
                    vehicle.y,
                    vehicle.speed,
                    vehicle.behavior
                );
            }
            println!();
        }
    }

    /// Print the visible stretch of road as ASCII, one column block per lane
    pub fn draw_map(&self) {
        const ROW_HEIGHT: f32 = 25.0;
        const LANE_CELLS: usize = 5;

        let lanes = self.grid.lane_count();
        let rows = (self.config.canvas.height / ROW_HEIGHT).ceil().max(1.0) as usize;
        let mut grid = vec![vec![' '; lanes * LANE_CELLS]; rows];

        let mut mark = |bounds: Aabb, symbol: char| {
            let first_row = (bounds.y / ROW_HEIGHT).floor();
            let last_row = ((bounds.y + bounds.height) / ROW_HEIGHT).ceil();
            let center = bounds.x + bounds.width / 2.0;
            let lane = self.grid.lane_at(center);
            let col = lane * LANE_CELLS + LANE_CELLS / 2;
            let mut row = first_row;
            while row < last_row {
                if row >= 0.0 && (row as usize) < rows {
                    grid[row as usize][col] = symbol;
                }
                row += 1.0;
            }
        };

        for item in self.items.values() {
            let symbol = match item.kind {
                ItemKind::Nitro => 'n',
                ItemKind::Pothole => 'o',
                ItemKind::Coin => '$',
            };
            mark(item.bounds(), symbol);
        }
        for vehicle in self.traffic.values() {
            let symbol = match vehicle.behavior {
                BehaviorState::Cruise => 'C',
                BehaviorState::Evade => 'E',
                BehaviorState::Overtake => 'O',
            };
            mark(vehicle.bounds(), symbol);
        }
        mark(self.player.bounds(), 'P');

        println!("\n=== Road Map ===");
        println!("Legend: P=Player, C=Cruise, E=Evade, O=Overtake, n=Nitro, o=Pothole, $=Coin");
        println!();
        for row in &grid {
            let line: String = row
                .chunks(LANE_CELLS)
                .map(|cells| cells.iter().collect::<String>())
                .collect::<Vec<_>>()
                .join("|");
            println!("|{}|", line);
        }
        println!();
    }
}
