//! race-runner: headless host for the horse racing engine.
//!
//! Drives the engine with a virtual frame clock instead of a display.
//!
//! Usage:
//!   race-runner                          play one full game in memory
//!   race-runner --seed 12345 --fps 30    reproducible run at 30 frames/s
//!   race-runner --db game.db             persist and resume across runs
//!   race-runner --config game.json       override pacing/clock settings
//!   race-runner --ipc-mode               line-delimited JSON on stdin/stdout

use anyhow::Result;
use derby_core::{
    command::PlayerCommand,
    config::GameConfig,
    engine::RaceEngine,
    physics::{ParticipantState, RoundResult},
    rng::{SeededRandom, ThreadRandom},
    schedule::Race,
    state::GameState,
    store::{GameStore, MemoryPersistence},
    types::Millis,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Frames { count: u64 },
    Action { action: PlayerCommand },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    state: GameState,
    now_ms: Millis,
    current_round_index: usize,
    current_race: Option<&'a Race>,
    next_race_pending: bool,
    standings: Vec<ParticipantState>,
    results: &'a [RoundResult],
}

/// Virtual frame clock: a fixed step per frame.
struct VirtualClock {
    now:      Millis,
    frame_ms: Millis,
}

impl VirtualClock {
    fn tick(&mut self, engine: &mut RaceEngine) {
        self.now += self.frame_ms;
        engine.advance_frame(self.now);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = args
        .windows(2)
        .find(|w| w[0] == "--seed")
        .and_then(|w| w[1].parse::<u64>().ok());
    let fps = parse_arg(&args, "--fps", 60.0f64).max(1.0);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args.windows(2).find(|w| w[0] == "--db").map(|w| w[1].as_str());
    let config = match args.windows(2).find(|w| w[0] == "--config") {
        Some(w) => GameConfig::load(&w[1])?,
        None => GameConfig::default(),
    };

    if !ipc_mode {
        println!("Derby race-runner");
        println!("  started: {}", chrono::Utc::now().to_rfc3339());
        println!("  seed:    {}", seed.map_or("unseeded".to_string(), |s| s.to_string()));
        println!("  fps:     {fps}");
        println!("  db:      {}", db.unwrap_or("(memory)"));
        println!();
    }

    let mut engine = match seed {
        Some(seed) => RaceEngine::new(config.clone(), SeededRandom::new(seed)),
        None => RaceEngine::new(config.clone(), ThreadRandom),
    };
    engine = match db {
        Some(path) => {
            let store = GameStore::open(path, &config.storage_key)?;
            store.migrate()?;
            engine.with_persistence(Box::new(store))
        }
        None => engine.with_persistence(Box::new(MemoryPersistence::new())),
    };
    engine.restore();

    let mut clock = VirtualClock { now: 0.0, frame_ms: 1000.0 / fps };

    if ipc_mode {
        run_ipc_loop(&mut engine, &mut clock)?;
    } else {
        play_full_game(&mut engine, &mut clock);
        print_summary(&engine, &clock);
    }
    Ok(())
}

/// Press whichever buttons the current state allows until the game ends.
fn play_full_game(engine: &mut RaceEngine, clock: &mut VirtualClock) {
    loop {
        match engine.state() {
            GameState::Idle => {
                engine.initialize();
            }
            GameState::HorsesReady => {
                engine.generate_schedule();
            }
            GameState::ScheduleReady => {
                engine.start_racing();
            }
            GameState::Paused => {
                engine.resume();
            }
            GameState::Racing => clock.tick(engine),
            GameState::Completed => break,
        }
    }
}

fn run_ipc_loop(engine: &mut RaceEngine, clock: &mut VirtualClock) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Frames { count } => {
                for _ in 0..count {
                    clock.tick(engine);
                }
            }
            IpcCommand::Action { action } => {
                if !engine.apply(action) {
                    log::warn!("ipc: {} ignored in {}", action.name(), engine.state());
                }
            }
            IpcCommand::GetState => {}
        }
        let state = build_ui_state(engine, clock);
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state<'a>(engine: &'a RaceEngine, clock: &VirtualClock) -> UiState<'a> {
    UiState {
        state: engine.state(),
        now_ms: clock.now,
        current_round_index: engine.current_round_index(),
        current_race: engine.current_race(),
        next_race_pending: engine.next_race_pending(),
        standings: engine.live_standings(),
        results: engine.results(),
    }
}

fn print_summary(engine: &RaceEngine, clock: &VirtualClock) {
    println!("=== GAME SUMMARY ===");
    println!("  state:        {}", engine.state());
    println!("  rounds run:   {}", engine.results().len());
    println!("  virtual time: {:.1}s", clock.now / 1000.0);
    if engine.missing_horse_lookups() > 0 {
        println!("  missing horse lookups: {}", engine.missing_horse_lookups());
    }

    for round in engine.results() {
        println!();
        println!(
            "=== ROUND {} - {}m (finished {}) ===",
            round.round_number,
            round.distance,
            round.completed_at.format("%H:%M:%S")
        );
        for entry in &round.results {
            println!(
                "  {:>2}. {:<16} cond {:>3}  {:>7.2}s",
                entry.position,
                entry.horse.name,
                entry.horse.condition,
                entry.time / 1000.0
            );
        }
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
