//! Persistence tests: the stored record, restore-time normalisation and
//! tolerance of missing or broken storage.

use derby_core::{
    config::GameConfig,
    engine::RaceEngine,
    rng::SeededRandom,
    schedule::RaceStatus,
    snapshot::GameRecord,
    state::GameState,
    store::{GamePersistence, GameStore, MemoryPersistence},
    types::Millis,
};

const KEY: &str = "horse-racing-game-state";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine(seed: u64) -> RaceEngine {
    init_logging();
    RaceEngine::new(GameConfig::default(), SeededRandom::new(seed))
}

fn sqlite_store() -> GameStore {
    let store = GameStore::in_memory(KEY).expect("in-memory store");
    store.migrate().expect("migration");
    store
}

/// Simulate a page reload: hand the adapter to a brand-new engine.
fn reload(old: &mut RaceEngine, seed: u64) -> RaceEngine {
    let persistence = old.detach_persistence().expect("persistence attached");
    let mut fresh = engine(seed);
    fresh.attach_persistence(persistence);
    fresh
}

fn race_frames(engine: &mut RaceEngine, now: &mut Millis, frames: usize) {
    for _ in 0..frames {
        *now += 16.0;
        engine.advance_frame(*now);
    }
}

#[test]
fn record_json_has_the_documented_shape() {
    let mut e = engine(3);
    e.initialize();
    e.generate_schedule();
    let json: serde_json::Value = serde_json::to_value(e.record()).unwrap();

    assert_eq!(json["gameState"], "SCHEDULE_READY");
    assert_eq!(json["horses"].as_array().unwrap().len(), 20);
    for key in ["id", "name", "condition", "color"] {
        assert!(json["horses"][0].get(key).is_some(), "horse missing {key}");
    }
    assert_eq!(json["schedule"].as_array().unwrap().len(), 6);
    assert_eq!(json["schedule"][0]["horseIds"].as_array().unwrap().len(), 10);
    assert_eq!(json["results"], serde_json::json!([]));
    assert_eq!(json["currentRoundIndex"], 0);

    let idle = engine(3).record();
    let json = serde_json::to_value(idle).unwrap();
    assert_eq!(json["schedule"], serde_json::Value::Null);
}

#[test]
fn racing_record_reloads_as_schedule_ready() {
    let mut e = engine(10).with_persistence(Box::new(sqlite_store()));
    e.initialize();
    e.generate_schedule();
    e.start_racing();
    let mut now = 0.0;
    race_frames(&mut e, &mut now, 50);
    assert_eq!(e.state(), GameState::Racing);
    let schedule_before = e.schedule().unwrap().to_vec();

    let mut reloaded = reload(&mut e, 11);
    assert!(reloaded.restore());
    assert_eq!(reloaded.state(), GameState::ScheduleReady);
    assert!(reloaded.participants().is_empty(), "live race state must not survive a reload");
    assert_eq!(reloaded.horses(), e.horses());

    let schedule_after = reloaded.schedule().expect("schedule");
    assert_eq!(schedule_after.len(), 6);
    for (after, before) in schedule_after.iter().zip(&schedule_before) {
        assert_eq!(after.distance, before.distance);
        assert_eq!(after.horse_ids, before.horse_ids);
    }
    assert_eq!(schedule_after[0].status, RaceStatus::Pending);
    assert!(reloaded.results().is_empty());
}

#[test]
fn paused_record_reloads_as_schedule_ready() {
    let mut e = engine(12).with_persistence(Box::new(MemoryPersistence::new()));
    e.initialize();
    e.generate_schedule();
    e.start_racing();
    e.pause();

    let mut reloaded = reload(&mut e, 13);
    assert!(reloaded.restore());
    assert_eq!(reloaded.state(), GameState::ScheduleReady);
}

#[test]
fn reload_after_a_finished_round_restarts_the_interrupted_round() {
    let mut e = engine(14).with_persistence(Box::new(sqlite_store()));
    e.initialize();
    e.generate_schedule();
    e.start_racing();
    let mut now = 0.0;
    while e.results().is_empty() {
        race_frames(&mut e, &mut now, 1);
    }
    // Into round 2.
    race_frames(&mut e, &mut now, 100);
    assert_eq!(e.current_race().unwrap().round_number, 2);
    let results_before = e.results().to_vec();

    let mut reloaded = reload(&mut e, 15);
    assert!(reloaded.restore());
    assert_eq!(reloaded.state(), GameState::ScheduleReady);
    assert_eq!(reloaded.current_round_index(), 1);
    assert_eq!(reloaded.results(), results_before.as_slice());

    assert!(reloaded.start_racing());
    let race = reloaded.current_race().unwrap();
    assert_eq!(race.round_number, 2);
    assert_eq!(race.distance, 1400);
    assert_eq!(reloaded.participants().len(), 10);
    assert!(reloaded.participants().iter().all(|p| p.position == 0.0));
}

#[test]
fn completed_game_round_trips_unchanged() {
    let mut e = engine(16).with_persistence(Box::new(MemoryPersistence::new()));
    e.initialize();
    e.generate_schedule();
    e.start_racing();
    let mut now = 0.0;
    while e.state() != GameState::Completed {
        race_frames(&mut e, &mut now, 1);
    }
    let saved = e.record();

    let mut reloaded = reload(&mut e, 17);
    assert!(reloaded.restore());
    assert_eq!(reloaded.record(), saved);
}

#[test]
fn malformed_records_are_treated_as_absent() {
    let mut broken = MemoryPersistence::new();
    broken.set_raw("{ this is not json");
    let mut e = engine(18).with_persistence(Box::new(broken));
    assert!(!e.restore());
    assert_eq!(e.state(), GameState::Idle);

    // Valid JSON, inconsistent content: a five-horse roster.
    let mut source = engine(19);
    source.initialize();
    let mut record = source.record();
    record.horses.truncate(5);
    let mut short = MemoryPersistence::new();
    short.set_raw(serde_json::to_string(&record).unwrap());
    let mut e = engine(20).with_persistence(Box::new(short));
    assert!(!e.restore());
    assert!(e.horses().is_empty());
}

#[test]
fn schedule_referencing_unknown_horses_is_rejected() {
    let mut source = engine(21);
    source.initialize();
    source.generate_schedule();
    let mut record = source.record();
    record.schedule.as_mut().unwrap()[2].horse_ids[0] = 999;

    let json = serde_json::to_string(&record).unwrap();
    assert!(GameRecord::from_json(&json).is_err());
}

#[test]
fn no_stored_game_means_a_fresh_start() {
    let mut e = engine(22).with_persistence(Box::new(sqlite_store()));
    assert!(!e.restore());
    assert_eq!(e.state(), GameState::Idle);

    let mut bare = engine(23);
    assert!(!bare.restore(), "no adapter at all is fine too");
}

#[test]
fn broken_database_degrades_to_in_memory_play() {
    // No migration: every read and write fails inside the adapter.
    let store = GameStore::in_memory(KEY).expect("in-memory store");
    let mut e = engine(24).with_persistence(Box::new(store));
    assert!(e.initialize());
    assert!(e.generate_schedule());
    assert!(e.start_racing());
    assert_eq!(e.state(), GameState::Racing);

    let mut reloaded = reload(&mut e, 25);
    assert!(!reloaded.restore());
}

#[test]
fn store_put_get_delete() {
    let mut store = sqlite_store();
    assert_eq!(store.get(KEY).unwrap(), None);

    store.put(KEY, "{}").unwrap();
    store.put(KEY, "{\"v\":2}").unwrap();
    assert_eq!(store.get(KEY).unwrap().as_deref(), Some("{\"v\":2}"));

    store.delete(KEY).unwrap();
    assert_eq!(store.get(KEY).unwrap(), None);
    assert!(store.load().is_none());
}

#[test]
fn reset_is_persisted() {
    let mut e = engine(26).with_persistence(Box::new(MemoryPersistence::new()));
    e.initialize();
    e.generate_schedule();
    e.reset_game();

    let mut reloaded = reload(&mut e, 27);
    assert!(reloaded.restore());
    assert_eq!(reloaded.state(), GameState::Idle);
    assert!(reloaded.horses().is_empty());
}

/// Plant `record` as stored JSON and try to restore it into a fresh engine.
fn restore_planted(record: &GameRecord, seed: u64) -> RaceEngine {
    let mut planted = MemoryPersistence::new();
    planted.set_raw(serde_json::to_string(record).unwrap());
    let mut e = engine(seed).with_persistence(Box::new(planted));
    assert!(!e.restore(), "inconsistent record was adopted: {:?}", record.game_state);
    assert_eq!(e.state(), GameState::Idle);
    assert!(e.horses().is_empty());
    e
}

fn scheduled_record(seed: u64) -> GameRecord {
    let mut source = engine(seed);
    source.initialize();
    source.generate_schedule();
    source.record()
}

#[test]
fn horses_ready_without_a_roster_is_rejected() {
    let mut source = engine(30);
    source.initialize();
    let mut record = source.record();
    record.horses.clear();

    let mut e = restore_planted(&record, 31);
    // The rejected record must not leak into schedule generation.
    assert!(!e.generate_schedule());
    assert!(e.initialize());
    assert!(e.generate_schedule());
    assert!(e.schedule().unwrap().iter().all(|r| r.horse_ids.len() == 10));
}

#[test]
fn out_of_range_conditions_are_rejected() {
    let mut record = scheduled_record(32);
    for horse in record.horses.iter_mut() {
        horse.condition = 1000;
    }
    restore_planted(&record, 33);

    let mut record = scheduled_record(34);
    record.horses[0].condition = 0;
    restore_planted(&record, 35);
}

#[test]
fn duplicate_colors_are_rejected() {
    let mut record = scheduled_record(36);
    record.horses[1].color = record.horses[0].color.clone();
    restore_planted(&record, 37);
}

#[test]
fn round_index_must_match_results() {
    let mut record = scheduled_record(38);
    record.current_round_index = 5;
    restore_planted(&record, 39);
}

#[test]
fn completed_needs_all_six_results() {
    let mut e = engine(40);
    e.initialize();
    e.generate_schedule();
    e.start_racing();
    let mut now = 0.0;
    while e.state() != GameState::Completed {
        race_frames(&mut e, &mut now, 1);
    }
    let mut record = e.record();
    record.results.truncate(1);
    record.current_round_index = 1;
    restore_planted(&record, 41);
}

#[test]
fn mid_game_states_need_a_schedule() {
    for state in [GameState::ScheduleReady, GameState::Racing, GameState::Paused] {
        let mut record = scheduled_record(42);
        record.game_state = state;
        record.schedule = None;
        restore_planted(&record, 43);
    }
}

#[test]
fn schedule_out_of_distance_order_is_rejected() {
    let mut record = scheduled_record(44);
    record.schedule.as_mut().unwrap().swap(0, 1);
    restore_planted(&record, 45);

    let mut record = scheduled_record(46);
    record.schedule.as_mut().unwrap()[3].distance = 1900;
    restore_planted(&record, 47);
}
