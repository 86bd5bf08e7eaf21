//! Boost resource
//!
//! A depletable, rechargeable resource that multiplies the player's top
//! speed. The state machine is IDLE -> ACTIVE -> RECHARGING -> IDLE:
//!
//! - ACTIVE drains at `(max / boost_duration) * (0.25 + 0.75 * speed_norm)`
//!   until empty, so a full charge at top speed lasts exactly
//!   `boost_duration` seconds.
//! - RECHARGING refills linearly and completes in exactly `cooldown` seconds.
//!
//! [`PersistedBoost`] couples the resource to a [`BoostStore`]: every
//! transition is written immediately, steady-state changes are written at
//! most once per flush interval, and write failures never reach the tick.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::storage::BoostStore;

/// Relative tolerance used to absorb float drift at the end of a phase
const SETTLE_EPSILON: f64 = 1e-9;

/// Capacity and timing of the boost resource
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoostSettings {
    pub max: f64,
    /// Seconds a full charge lasts at sustained top speed
    pub boost_duration: f64,
    /// Seconds to refill from empty
    pub cooldown: f64,
    /// Top speed multiplier while active
    pub active_factor: f64,
    /// Top speed multiplier at the start of a recharge
    pub recharge_floor: f64,
    /// Minimum simulated seconds between steady-state writes
    pub flush_interval: f64,
}

impl Default for BoostSettings {
    fn default() -> Self {
        Self {
            max: 30.0,
            boost_duration: 30.0,
            cooldown: 20.0,
            active_factor: 1.5,
            recharge_floor: 0.7,
            flush_interval: 1.0,
        }
    }
}

impl BoostSettings {
    fn sanitized(self) -> Self {
        let fallback = Self::default();
        let positive = |v: f64, d: f64| if v.is_finite() && v > 0.0 { v } else { d };
        Self {
            max: positive(self.max, fallback.max),
            boost_duration: positive(self.boost_duration, fallback.boost_duration),
            cooldown: positive(self.cooldown, fallback.cooldown),
            active_factor: positive(self.active_factor, fallback.active_factor),
            recharge_floor: positive(self.recharge_floor, fallback.recharge_floor),
            flush_interval: positive(self.flush_interval, fallback.flush_interval),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoostState {
    Idle,
    Active,
    Recharging,
}

/// A state change reported by the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostTransition {
    Activated,
    Depleted,
    Recharged,
}

/// The durable record: `{ remaining, recharging, cooldownTimer }`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostRecord {
    pub remaining: f64,
    pub recharging: bool,
    pub cooldown_timer: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoostResource {
    settings: BoostSettings,
    remaining: f64,
    state: BoostState,
    cooldown_elapsed: f64,
}

impl BoostResource {
    /// A full, idle resource
    pub fn new(settings: BoostSettings) -> Self {
        let settings = settings.sanitized();
        Self {
            remaining: settings.max,
            settings,
            state: BoostState::Idle,
            cooldown_elapsed: 0.0,
        }
    }

    /// Start a recharge from `elapsed` seconds in
    pub fn recharging(settings: BoostSettings, elapsed: f64) -> Self {
        let mut boost = Self::new(settings);
        boost.enter_recharge(elapsed);
        boost
    }

    /// Rebuild from a stored record. Anything invalid is an error; the
    /// caller decides on the fallback.
    pub fn from_record(settings: BoostSettings, record: &BoostRecord) -> Result<Self> {
        let settings = settings.sanitized();
        anyhow::ensure!(
            record.remaining.is_finite() && (0.0..=settings.max).contains(&record.remaining),
            "remaining {} outside [0, {}]",
            record.remaining,
            settings.max
        );
        anyhow::ensure!(
            record.cooldown_timer.is_finite() && record.cooldown_timer >= 0.0,
            "invalid cooldown timer {}",
            record.cooldown_timer
        );

        if record.recharging {
            return Ok(Self::recharging(settings, record.cooldown_timer));
        }
        if record.remaining <= 0.0 {
            // An empty idle record could never activate again
            return Ok(Self::recharging(settings, 0.0));
        }
        let mut boost = Self::new(settings);
        boost.remaining = record.remaining;
        Ok(boost)
    }

    /// Decode raw stored text
    pub fn decode(settings: BoostSettings, raw: &str) -> Result<Self> {
        let record: BoostRecord =
            serde_json::from_str(raw).context("Malformed boost record")?;
        Self::from_record(settings, &record)
    }

    pub fn record(&self) -> BoostRecord {
        BoostRecord {
            remaining: self.remaining,
            recharging: self.state == BoostState::Recharging,
            cooldown_timer: self.cooldown_elapsed,
        }
    }

    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(&self.record()).context("Failed to encode boost record")
    }

    pub fn settings(&self) -> &BoostSettings {
        &self.settings
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn max(&self) -> f64 {
        self.settings.max
    }

    pub fn state(&self) -> BoostState {
        self.state
    }

    pub fn cooldown_elapsed(&self) -> f64 {
        self.cooldown_elapsed
    }

    /// Fraction of the recharge completed, 0 outside RECHARGING
    fn recharge_progress(&self) -> f64 {
        match self.state {
            BoostState::Recharging => (self.cooldown_elapsed / self.settings.cooldown).min(1.0),
            _ => 0.0,
        }
    }

    /// Multiplier applied to the player's effective top speed
    pub fn speed_factor(&self) -> f64 {
        match self.state {
            BoostState::Idle => 1.0,
            BoostState::Active => self.settings.active_factor,
            BoostState::Recharging => {
                let floor = self.settings.recharge_floor;
                floor + (1.0 - floor) * self.recharge_progress()
            }
        }
    }

    /// Forward throttle activates an idle resource that still has charge.
    /// Ignored while ACTIVE or RECHARGING.
    pub fn try_activate(&mut self) -> Option<BoostTransition> {
        if self.state == BoostState::Idle && self.remaining > 0.0 {
            self.state = BoostState::Active;
            Some(BoostTransition::Activated)
        } else {
            None
        }
    }

    /// Advance by `dt` seconds. `speed_norm` is the player's speed over its
    /// base top speed; it is clamped to [0, 1].
    pub fn advance(&mut self, dt: f64, speed_norm: f64) -> Option<BoostTransition> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        match self.state {
            BoostState::Idle => None,
            BoostState::Active => {
                let norm = if speed_norm.is_finite() {
                    speed_norm.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let full_rate = self.settings.max / self.settings.boost_duration;
                self.remaining -= full_rate * (0.25 + 0.75 * norm) * dt;
                if self.remaining <= self.settings.max * SETTLE_EPSILON {
                    self.enter_recharge(0.0);
                    Some(BoostTransition::Depleted)
                } else {
                    None
                }
            }
            BoostState::Recharging => {
                let cooldown = self.settings.cooldown;
                self.cooldown_elapsed = (self.cooldown_elapsed + dt).min(cooldown);
                if self.cooldown_elapsed >= cooldown * (1.0 - SETTLE_EPSILON) {
                    self.state = BoostState::Idle;
                    self.remaining = self.settings.max;
                    self.cooldown_elapsed = 0.0;
                    Some(BoostTransition::Recharged)
                } else {
                    self.remaining = self.settings.max * (self.cooldown_elapsed / cooldown);
                    None
                }
            }
        }
    }

    fn enter_recharge(&mut self, elapsed: f64) {
        let cooldown = self.settings.cooldown;
        let elapsed = elapsed.clamp(0.0, cooldown);
        if elapsed >= cooldown {
            self.state = BoostState::Idle;
            self.remaining = self.settings.max;
            self.cooldown_elapsed = 0.0;
            return;
        }
        self.state = BoostState::Recharging;
        self.cooldown_elapsed = elapsed;
        self.remaining = self.settings.max * (elapsed / cooldown);
    }
}

/// A boost resource bound to durable storage
pub struct PersistedBoost {
    resource: BoostResource,
    store: Box<dyn BoostStore>,
    dirty: bool,
    since_flush: f64,
}

impl PersistedBoost {
    /// Load from the store, starting fresh when the record is absent or bad
    pub fn load(settings: BoostSettings, store: Box<dyn BoostStore>) -> Self {
        let resource = match store.read() {
            Ok(Some(raw)) => match BoostResource::decode(settings, &raw) {
                Ok(resource) => {
                    info!(
                        "Restored boost: remaining={:.2} state={:?}",
                        resource.remaining(),
                        resource.state()
                    );
                    resource
                }
                Err(err) => {
                    warn!("{:#}; starting with a full boost", err);
                    BoostResource::new(settings)
                }
            },
            Ok(None) => BoostResource::new(settings),
            Err(err) => {
                warn!("{:#}; starting with a full boost", err);
                BoostResource::new(settings)
            }
        };
        Self {
            resource,
            store,
            dirty: false,
            since_flush: 0.0,
        }
    }

    pub fn resource(&self) -> &BoostResource {
        &self.resource
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// One tick of the boost: activation, drain or refill, then persistence
    pub fn update(&mut self, dt: f64, forward: bool, speed_norm: f64) -> Option<BoostTransition> {
        let mut transition = None;
        if forward {
            transition = self.resource.try_activate();
        }
        if let Some(t) = self.resource.advance(dt, speed_norm) {
            transition = Some(t);
        }

        self.since_flush += dt.max(0.0);
        if let Some(t) = transition {
            debug!("Boost transition {:?}", t);
            self.flush();
        } else {
            if self.resource.state() != BoostState::Idle {
                self.dirty = true;
            }
            if self.dirty && self.since_flush >= self.resource.settings().flush_interval {
                self.flush();
            }
        }
        transition
    }

    /// Write the current record; failures are logged and dropped
    pub fn flush(&mut self) {
        let written = self
            .resource
            .encode()
            .and_then(|raw| self.store.write(&raw));
        if let Err(err) = written {
            warn!("{:#}; boost state not saved", err);
        }
        self.dirty = false;
        self.since_flush = 0.0;
    }
}

impl Drop for PersistedBoost {
    fn drop(&mut self) {
        if self.dirty {
            self.flush();
        }
    }
}
