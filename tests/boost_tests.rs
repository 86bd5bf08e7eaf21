//! Boost resource validation tests
//!
//! Covers the IDLE -> ACTIVE -> RECHARGING -> IDLE cycle, its exact timing
//! at a fixed 60 Hz step, record decoding and the persistence cadence.

use highway_sim::simulation::{
    BoostResource, BoostSettings, BoostState, BoostStore, BoostTransition, MemoryBoostStore,
    PersistedBoost,
};

const STEP: f64 = 1.0 / 60.0;

fn settings() -> BoostSettings {
    BoostSettings::default()
}

#[test]
fn test_fresh_boost_is_full_and_idle() {
    let boost = BoostResource::new(settings());
    assert_eq!(boost.state(), BoostState::Idle);
    assert_eq!(boost.remaining(), 30.0);
    assert_eq!(boost.speed_factor(), 1.0);
}

#[test]
fn test_full_charge_lasts_exactly_thirty_seconds_at_top_speed() {
    let mut boost = BoostResource::new(settings());
    assert_eq!(boost.try_activate(), Some(BoostTransition::Activated));
    assert_eq!(boost.speed_factor(), 1.5);

    for tick in 1..1800 {
        assert_eq!(
            boost.advance(STEP, 1.0),
            None,
            "boost depleted early at tick {}",
            tick
        );
        assert_eq!(boost.state(), BoostState::Active);
    }
    assert_eq!(boost.advance(STEP, 1.0), Some(BoostTransition::Depleted));
    assert_eq!(boost.state(), BoostState::Recharging);
    assert_eq!(boost.remaining(), 0.0);
}

#[test]
fn test_slow_driving_drains_at_quarter_rate() {
    let mut boost = BoostResource::new(settings());
    boost.try_activate();
    boost.advance(1.0, 0.0);
    assert!((boost.remaining() - 29.75).abs() < 1e-9);
}

#[test]
fn test_recharge_takes_exactly_twenty_seconds() {
    let mut boost = BoostResource::recharging(settings(), 0.0);
    assert_eq!(boost.state(), BoostState::Recharging);
    assert!((boost.speed_factor() - 0.7).abs() < 1e-9);

    for tick in 1..1200 {
        assert_eq!(
            boost.advance(STEP, 1.0),
            None,
            "recharge finished early at tick {}",
            tick
        );
    }
    assert!(boost.remaining() < 30.0);
    assert_eq!(boost.advance(STEP, 1.0), Some(BoostTransition::Recharged));
    assert_eq!(boost.state(), BoostState::Idle);
    assert_eq!(boost.remaining(), 30.0);
}

#[test]
fn test_recharge_is_linear() {
    let mut boost = BoostResource::recharging(settings(), 0.0);
    boost.advance(5.0, 0.0);
    assert!((boost.remaining() - 7.5).abs() < 1e-9);
    // Halfway through the speed factor has climbed halfway from 0.7 to 1
    boost.advance(5.0, 0.0);
    assert!((boost.speed_factor() - 0.85).abs() < 1e-9);
}

#[test]
fn test_activation_ignored_while_recharging() {
    let mut boost = BoostResource::recharging(settings(), 3.0);
    assert_eq!(boost.try_activate(), None);
    assert_eq!(boost.state(), BoostState::Recharging);
}

#[test]
fn test_remaining_stays_in_bounds_through_many_cycles() {
    let mut boost = BoostResource::new(settings());
    for tick in 0..20_000 {
        boost.try_activate();
        let norm = (tick % 7) as f64 / 6.0;
        boost.advance(0.05, norm);
        assert!(boost.remaining() >= 0.0);
        assert!(boost.remaining() <= boost.max());
    }
}

#[test]
fn test_record_round_trip_keeps_recharge_progress() {
    let mut boost = BoostResource::recharging(settings(), 0.0);
    boost.advance(8.0, 0.0);
    let raw = boost.encode().unwrap();
    assert!(raw.contains("cooldownTimer"));

    let restored = BoostResource::decode(settings(), &raw).unwrap();
    assert_eq!(restored.state(), BoostState::Recharging);
    assert!((restored.cooldown_elapsed() - 8.0).abs() < 1e-9);
    assert!((restored.remaining() - 12.0).abs() < 1e-9);
}

#[test]
fn test_recharging_record_recomputes_remaining_from_timer() {
    let raw = r#"{"remaining":29,"recharging":true,"cooldownTimer":5}"#;
    let boost = BoostResource::decode(settings(), raw).unwrap();
    assert_eq!(boost.state(), BoostState::Recharging);
    assert!((boost.remaining() - 7.5).abs() < 1e-9);
}

#[test]
fn test_empty_idle_record_resumes_recharging() {
    let raw = r#"{"remaining":0,"recharging":false,"cooldownTimer":0}"#;
    let boost = BoostResource::decode(settings(), raw).unwrap();
    assert_eq!(boost.state(), BoostState::Recharging);
    assert_eq!(boost.remaining(), 0.0);
}

#[test]
fn test_invalid_records_are_rejected() {
    for raw in [
        "{not json",
        r#"{"remaining":45,"recharging":false,"cooldownTimer":0}"#,
        r#"{"remaining":-1,"recharging":false,"cooldownTimer":0}"#,
        r#"{"remaining":10,"recharging":true,"cooldownTimer":-2}"#,
        r#"{"remaining":10}"#,
    ] {
        assert!(
            BoostResource::decode(settings(), raw).is_err(),
            "accepted {}",
            raw
        );
    }
}

#[test]
fn test_malformed_store_contents_start_fresh() {
    let store = MemoryBoostStore::with_raw("{not json");
    let boost = PersistedBoost::load(settings(), Box::new(store));
    assert_eq!(boost.resource().state(), BoostState::Idle);
    assert_eq!(boost.resource().remaining(), 30.0);
}

#[test]
fn test_load_restores_stored_charge() {
    let store = MemoryBoostStore::with_raw(r#"{"remaining":12.5,"recharging":false,"cooldownTimer":0}"#);
    let boost = PersistedBoost::load(settings(), Box::new(store));
    assert_eq!(boost.resource().state(), BoostState::Idle);
    assert_eq!(boost.resource().remaining(), 12.5);
}

#[test]
fn test_transitions_are_written_immediately() {
    let store = MemoryBoostStore::new();
    let mut boost = PersistedBoost::load(settings(), Box::new(store.clone()));
    assert_eq!(store.write_count(), 0);

    assert_eq!(
        boost.update(STEP, true, 1.0),
        Some(BoostTransition::Activated)
    );
    assert_eq!(store.write_count(), 1);
    assert!(store.contents().unwrap().contains("\"recharging\":false"));
}

#[test]
fn test_steady_state_writes_are_throttled() {
    let store = MemoryBoostStore::new();
    let mut boost = PersistedBoost::load(settings(), Box::new(store.clone()));
    boost.update(STEP, true, 1.0);
    assert_eq!(store.write_count(), 1);

    for _ in 0..30 {
        boost.update(STEP, true, 1.0);
    }
    assert_eq!(store.write_count(), 1);
    assert!(boost.is_dirty());

    for _ in 30..100 {
        boost.update(STEP, true, 1.0);
    }
    assert_eq!(store.write_count(), 2);

    drop(boost);
    assert_eq!(store.write_count(), 3);
}

#[test]
fn test_idle_boost_is_not_rewritten() {
    let store = MemoryBoostStore::new();
    let mut boost = PersistedBoost::load(settings(), Box::new(store.clone()));
    for _ in 0..600 {
        boost.update(STEP, false, 0.5);
    }
    drop(boost);
    assert_eq!(store.write_count(), 0);
}

#[test]
fn test_depletion_is_persisted_as_recharging() {
    let store = MemoryBoostStore::new();
    let mut boost = PersistedBoost::load(settings(), Box::new(store.clone()));
    let mut depleted = false;
    for _ in 0..1800 {
        if boost.update(STEP, true, 1.0) == Some(BoostTransition::Depleted) {
            depleted = true;
            break;
        }
    }
    assert!(depleted);
    assert!(store.contents().unwrap().contains("\"recharging\":true"));

    // A new session picks up the recharge where it was left
    let resumed = PersistedBoost::load(settings(), Box::new(store.clone()));
    assert_eq!(resumed.resource().state(), BoostState::Recharging);
}

/// A store whose writes always fail
struct BrokenStore;

impl BoostStore for BrokenStore {
    fn read(&self) -> anyhow::Result<Option<String>> {
        anyhow::bail!("storage unavailable")
    }

    fn write(&mut self, _raw: &str) -> anyhow::Result<()> {
        anyhow::bail!("storage unavailable")
    }
}

#[test]
fn test_storage_failures_never_interrupt_the_boost() {
    let mut boost = PersistedBoost::load(settings(), Box::new(BrokenStore));
    assert_eq!(boost.resource().remaining(), 30.0);
    assert_eq!(
        boost.update(STEP, true, 1.0),
        Some(BoostTransition::Activated)
    );
    for _ in 0..120 {
        boost.update(STEP, true, 1.0);
    }
    assert_eq!(boost.resource().state(), BoostState::Active);
}
