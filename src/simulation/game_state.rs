//! Run state and scoring
//!
//! Tracks the current run's mode, score, distance and level. Everything
//! here is reset on restart; nothing is persisted.

use serde::Serialize;

use super::types::frames;

/// Distance needed per level
pub const DISTANCE_PER_LEVEL: f64 = 1000.0;
/// Distance gained per unit of (road speed + player speed) per frame
pub const DISTANCE_RATE: f64 = 0.1;
/// Score gained per unit of player speed per frame
pub const SCORE_RATE: f64 = 0.5;
/// Difficulty gained per level above the first
pub const DIFFICULTY_PER_LEVEL: f32 = 0.05;

/// Whether the simulation is advancing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunMode {
    Playing,
    Paused,
    /// Terminal: a collision ended the run; only a restart resumes
    Crashed,
}

/// Game state that tracks the player's progress in the current run
#[derive(Debug, Clone, Serialize)]
pub struct GameState {
    pub mode: RunMode,
    /// Kept fractional so scoring does not depend on the tick rate
    pub score: f64,
    pub distance: f64,
    pub level: u32,
    /// Highest player speed reached this run
    pub max_speed: f32,
    pub vehicles_passed: u32,
    pub items_collected: u32,
    pub collisions: u32,
    /// Simulated seconds of play
    pub time: f64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            mode: RunMode::Playing,
            score: 0.0,
            distance: 0.0,
            level: 1,
            max_speed: 0.0,
            vehicles_passed: 0,
            items_collected: 0,
            collisions: 0,
            time: 0.0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.mode == RunMode::Playing
    }

    pub fn is_crashed(&self) -> bool {
        self.mode == RunMode::Crashed
    }

    /// Playing <-> Paused; a crashed run stays crashed
    pub fn toggle_pause(&mut self) {
        self.mode = match self.mode {
            RunMode::Playing => RunMode::Paused,
            RunMode::Paused => RunMode::Playing,
            RunMode::Crashed => RunMode::Crashed,
        };
    }

    pub fn crash(&mut self) {
        self.collisions += 1;
        self.mode = RunMode::Crashed;
    }

    /// Accrue distance and score for one tick.
    /// Returns the new level when a level boundary was crossed.
    pub fn update(&mut self, dt: f32, player_speed: f32, road_speed: f32) -> Option<u32> {
        let n = frames(dt) as f64;
        self.time += dt as f64;
        self.max_speed = self.max_speed.max(player_speed);
        self.distance += (road_speed + player_speed) as f64 * DISTANCE_RATE * n;
        self.score += player_speed as f64 * SCORE_RATE * n;

        let level = (self.distance / DISTANCE_PER_LEVEL).floor() as u32 + 1;
        if level > self.level {
            self.level = level;
            Some(level)
        } else {
            None
        }
    }

    /// Award the points of a passed vehicle
    pub fn vehicle_passed(&mut self, points: u32) {
        self.vehicles_passed += 1;
        self.score += points as f64;
    }

    pub fn earn(&mut self, amount: f64) {
        self.score += amount;
    }

    /// Difficulty in [0, 1] derived from the level
    pub fn difficulty(&self) -> f32 {
        ((self.level.saturating_sub(1)) as f32 * DIFFICULTY_PER_LEVEL).clamp(0.0, 1.0)
    }

    /// Score as displayed
    pub fn display_score(&self) -> u64 {
        self.score.max(0.0).floor() as u64
    }

    /// Get a summary string for display
    pub fn summary(&self) -> String {
        format!(
            "Score: {} | Distance: {:.0}m | Level: {} | Top speed: {:.0} km/h | Passed: {} | Mode: {:?}",
            self.display_score(),
            self.distance,
            self.level,
            self.max_speed * 10.0,
            self.vehicles_passed,
            self.mode
        )
    }
}
