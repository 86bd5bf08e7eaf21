//! Environment catalog
//!
//! Environments tune the player's acceleration and the item spawn densities.
//! They come from an external JSON list; every failure path lands on
//! [`Environment::default`].

use anyhow::{bail, Context, Result};
use log::{info, warn};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Visual hint passed through to the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisualHint {
    pub bg_type: Option<String>,
    pub sky_color: Option<String>,
}

/// One entry of the environment list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Environment {
    pub id: String,
    pub name: String,
    pub seed: i64,
    pub friction: f32,
    pub speed_multiplier: f32,
    pub obstacle_density: f32,
    pub powerup_density: f32,
    pub coin_density: f32,
    pub visual: VisualHint,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            name: "Default".to_string(),
            seed: 0,
            friction: 1.0,
            speed_multiplier: 1.0,
            obstacle_density: 0.04,
            powerup_density: 0.02,
            coin_density: 0.0,
            visual: VisualHint::default(),
        }
    }
}

impl Environment {
    /// Replace out-of-range values with the defaults
    fn sanitized(mut self) -> Self {
        let fallback = Environment::default();
        if !(self.friction.is_finite() && self.friction > 0.0) {
            self.friction = fallback.friction;
        }
        if !(self.speed_multiplier.is_finite() && self.speed_multiplier > 0.0) {
            self.speed_multiplier = fallback.speed_multiplier;
        }
        let unit = |v: f32, d: f32| if v.is_finite() && (0.0..=1.0).contains(&v) { v } else { d };
        self.obstacle_density = unit(self.obstacle_density, fallback.obstacle_density);
        self.powerup_density = unit(self.powerup_density, fallback.powerup_density);
        self.coin_density = unit(self.coin_density, fallback.coin_density);

        // Densities share one uniform draw, so they cannot sum past 1
        let total = self.obstacle_density + self.powerup_density + self.coin_density;
        if total > 1.0 {
            self.obstacle_density /= total;
            self.powerup_density /= total;
            self.coin_density /= total;
        }
        self
    }
}

/// Parse a JSON array of environments
pub fn parse_catalog(text: &str) -> Result<Vec<Environment>> {
    let value: serde_json::Value =
        serde_json::from_str(text).context("Failed to parse environment JSON")?;
    if !value.is_array() {
        bail!("Expected a JSON array of environments");
    }
    let envs: Vec<Environment> =
        serde_json::from_value(value).context("Malformed environment entry")?;
    Ok(envs.into_iter().map(Environment::sanitized).collect())
}

/// Read an environment list from disk
pub fn read_catalog(path: &Path) -> Result<Vec<Environment>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    parse_catalog(&text)
}

/// Pick the configured environment, or a random one when the id is unknown
pub fn select<R: Rng + ?Sized>(
    catalog: &[Environment],
    wanted: Option<&str>,
    rng: &mut R,
) -> Environment {
    if let Some(id) = wanted {
        if let Some(env) = catalog.iter().find(|e| e.id == id) {
            return env.clone();
        }
        if !catalog.is_empty() {
            warn!("Environment '{}' not found; choosing at random", id);
        }
    }
    catalog.choose(rng).cloned().unwrap_or_default()
}

/// Load and select an environment; never fails
pub fn load_environment<R: Rng + ?Sized>(
    path: Option<&Path>,
    wanted: Option<&str>,
    rng: &mut R,
) -> Environment {
    let catalog = match path.map(read_catalog) {
        Some(Ok(catalog)) => catalog,
        Some(Err(err)) => {
            warn!("{:#}; using default environment", err);
            Vec::new()
        }
        None => Vec::new(),
    };
    let env = select(&catalog, wanted, rng);
    info!(
        "Environment '{}': friction={} speedMultiplier={} obstacles={} powerups={}",
        env.id, env.friction, env.speed_multiplier, env.obstacle_density, env.powerup_density
    );
    env
}
