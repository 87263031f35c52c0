//! The race engine. Owns all game state and sequences the six rounds.
//!
//! LIFECYCLE:
//!   IDLE ──initialize──▶ HORSES_READY ──generate_schedule──▶ SCHEDULE_READY
//!   SCHEDULE_READY ──start_racing──▶ RACING ⇄ PAUSED
//!   RACING ──(last race finishes)──▶ COMPLETED ──generate_schedule──▶ SCHEDULE_READY
//!   any ──reset_game──▶ IDLE
//!
//! RULES:
//!   - Actions attempted from a state that does not allow them are
//!     ignored and logged, never fatal.
//!   - Within one frame every participant moves on the same delta and
//!     the same timestamp.
//!   - The next race is started by a deferred task on the frame clock;
//!     reset and schedule regeneration cancel it.
//!   - A record is saved after every accepted action and every finished
//!     race. Live participant state is never saved.

use crate::{
    clock::{DeferredTask, FrameClock},
    command::PlayerCommand,
    config::GameConfig,
    event::{GameEvent, Listener},
    physics::{self, FrameInput, ParticipantState, RoundResult, FALLBACK_CONDITION},
    roster::{Horse, RosterGenerator},
    rng::RandomSource,
    schedule::{Race, RaceStatus, ScheduleBuilder},
    snapshot::GameRecord,
    state::GameState,
    store::GamePersistence,
    types::{wall_clock_now, HorseId, Millis, Round},
};

/// The race currently on the track.
#[derive(Debug, Clone)]
struct ActiveRace {
    round_index:         usize,
    distance_multiplier: f64,
    participants:        Vec<ParticipantState>,
    /// Anchored to the first frame the race sees.
    animation_start:     Option<Millis>,
}

pub struct RaceEngine {
    config:              GameConfig,
    state:               GameState,
    horses:              Vec<Horse>,
    schedule:            Option<Vec<Race>>,
    results:             Vec<RoundResult>,
    current_round_index: usize,
    active:              Option<ActiveRace>,
    clock:               FrameClock,
    rng:                 Box<dyn RandomSource>,
    persistence:         Option<Box<dyn GamePersistence>>,
    listeners:           Vec<Listener>,
    missing_horse_lookups: u64,
}

impl RaceEngine {
    pub fn new(config: GameConfig, rng: impl RandomSource + 'static) -> Self {
        Self {
            clock:               FrameClock::new(config.max_frame_delta_ms),
            config,
            state:               GameState::Idle,
            horses:              Vec::new(),
            schedule:            None,
            results:             Vec::new(),
            current_round_index: 0,
            active:              None,
            rng:                 Box::new(rng),
            persistence:         None,
            listeners:           Vec::new(),
            missing_horse_lookups: 0,
        }
    }

    pub fn with_persistence(mut self, persistence: Box<dyn GamePersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Hand the persistence adapter back, e.g. to a fresh engine.
    pub fn detach_persistence(&mut self) -> Option<Box<dyn GamePersistence>> {
        self.persistence.take()
    }

    pub fn attach_persistence(&mut self, persistence: Box<dyn GamePersistence>) {
        self.persistence = Some(persistence);
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Adopt the stored record, if there is a valid one. Mid-race records
    /// come back at SCHEDULE_READY. Returns whether a record was adopted.
    pub fn restore(&mut self) -> bool {
        let Some(record) = self.persistence.as_mut().and_then(|p| p.load()) else {
            log::info!("engine: no stored game, starting fresh");
            return false;
        };
        let record = record.normalized();

        self.clock.cancel_all();
        self.active = None;
        self.state = record.game_state;
        self.horses = record.horses;
        self.schedule = record.schedule;
        self.results = record.results;
        self.current_round_index = record.current_round_index;

        log::info!(
            "engine: restored game at {} (round index {}, {} results)",
            self.state, self.current_round_index, self.results.len()
        );
        self.emit(GameEvent::Restored { state: self.state });
        true
    }

    // ── Player actions ─────────────────────────────────────────

    pub fn apply(&mut self, command: PlayerCommand) -> bool {
        match command {
            PlayerCommand::Initialize       => self.initialize(),
            PlayerCommand::GenerateSchedule => self.generate_schedule(),
            PlayerCommand::StartRacing      => self.start_racing(),
            PlayerCommand::Pause            => self.pause(),
            PlayerCommand::Resume           => self.resume(),
            PlayerCommand::ResetGame        => self.reset_game(),
        }
    }

    pub fn initialize(&mut self) -> bool {
        if self.state != GameState::Idle {
            return self.ignore(PlayerCommand::Initialize);
        }
        self.horses = RosterGenerator::generate(&mut self.rng);
        self.state = GameState::HorsesReady;
        self.emit(GameEvent::RosterGenerated { horses: self.horses.len() });
        self.persist();
        true
    }

    pub fn generate_schedule(&mut self) -> bool {
        if !matches!(self.state, GameState::HorsesReady | GameState::Completed) {
            return self.ignore(PlayerCommand::GenerateSchedule);
        }
        let schedule = ScheduleBuilder::build(&self.horses, &mut self.rng);
        let rounds = schedule.len();
        self.schedule = Some(schedule);
        self.results.clear();
        self.current_round_index = 0;
        self.active = None;
        self.clock.cancel_all();
        self.state = GameState::ScheduleReady;
        self.emit(GameEvent::ScheduleGenerated { rounds });
        self.persist();
        true
    }

    pub fn start_racing(&mut self) -> bool {
        if self.state != GameState::ScheduleReady || self.schedule.is_none() {
            return self.ignore(PlayerCommand::StartRacing);
        }
        self.state = GameState::Racing;
        self.start_next_race();
        self.persist();
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state != GameState::Racing {
            return self.ignore(PlayerCommand::Pause);
        }
        self.clock.rewind();
        self.state = GameState::Paused;
        self.emit(GameEvent::Paused);
        self.persist();
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != GameState::Paused {
            return self.ignore(PlayerCommand::Resume);
        }
        // The first frame after resuming measures from itself, not from
        // the frame before the pause.
        self.clock.rewind();
        self.state = GameState::Racing;
        self.emit(GameEvent::Resumed);
        self.persist();
        true
    }

    /// Legal from every state.
    pub fn reset_game(&mut self) -> bool {
        self.clock.cancel_all();
        self.active = None;
        self.horses.clear();
        self.schedule = None;
        self.results.clear();
        self.current_round_index = 0;
        self.state = GameState::Idle;
        log::info!("engine: game reset");
        self.emit(GameEvent::GameReset);
        self.persist();
        true
    }

    // ── Frame clock callback ───────────────────────────────────

    /// Drive the game by one frame at timestamp `now`.
    ///
    /// Runs due deferred tasks, then moves every participant of the
    /// active race on one shared delta, then finishes the race if
    /// everyone has crossed the line. Does nothing unless RACING.
    pub fn advance_frame(&mut self, now: Millis) {
        if self.state != GameState::Racing {
            return;
        }

        for task in self.clock.take_due(now) {
            match task {
                DeferredTask::StartNextRace => {
                    self.start_next_race();
                    self.persist();
                }
            }
        }
        if self.state != GameState::Racing {
            return;
        }

        let delta_ms = self.clock.delta(now);
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.animation_start.is_none() {
            active.animation_start = Some(now);
        }

        let frame = FrameInput {
            delta_ms,
            distance_multiplier: active.distance_multiplier,
            pacing_divisor:      self.config.pacing_divisor,
            now,
        };
        for participant in active.participants.iter_mut() {
            let variation = self
                .rng
                .range_f64(self.config.speed_variation_min, self.config.speed_variation_max);
            *participant = physics::advance(participant, &frame, variation);
        }

        if physics::all_finished(&active.participants) {
            self.complete_current_race(now);
        }
    }

    // ── Race sequencing ────────────────────────────────────────

    /// Put the race at the current round index on the track, or finish
    /// the game if there is none left.
    fn start_next_race(&mut self) {
        if self.state != GameState::Racing {
            log::warn!("engine: start of next race skipped in state {}", self.state);
            return;
        }
        let round_count = self.schedule.as_ref().map_or(0, Vec::len);
        if self.current_round_index >= round_count {
            self.finish_game();
            return;
        }

        let index = self.current_round_index;
        let (horse_ids, distance) = match self.schedule.as_ref().and_then(|s| s.get(index)) {
            Some(race) => (race.horse_ids.clone(), race.distance),
            None => return,
        };

        let participants: Vec<ParticipantState> = horse_ids
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let condition = self.condition_of(id);
                ParticipantState::at_gate(id, i as u8 + 1, physics::speed_for_condition(condition as f64))
            })
            .collect();

        if let Some(race) = self.schedule.as_mut().and_then(|s| s.get_mut(index)) {
            race.status = RaceStatus::Running;
            race.start_time = Some(wall_clock_now());
            race.end_time = None;
        }

        log::debug!(
            "engine: round {} lanes {:?}",
            index + 1,
            participants.iter().map(|p| (p.lane, p.horse_id)).collect::<Vec<_>>()
        );

        self.active = Some(ActiveRace {
            round_index: index,
            distance_multiplier: physics::distance_multiplier(distance, self.config.base_distance),
            participants,
            animation_start: None,
        });
        self.clock.rewind();

        let round = index as Round + 1;
        log::info!("engine: round {round} started ({distance}m)");
        self.emit(GameEvent::RaceStarted { round, distance });
    }

    /// Rank the active race, record the result and queue the next race.
    fn complete_current_race(&mut self, now: Millis) {
        let Some(active) = self.active.take() else {
            return;
        };
        let animation_start = active.animation_start.unwrap_or(now);
        let ranked = physics::rank(&active.participants, animation_start, now, |id| {
            self.horse_or_default(id)
        });

        let completed_at = wall_clock_now();
        let distance = match self.schedule.as_mut().and_then(|s| s.get_mut(active.round_index)) {
            Some(race) => {
                race.status = RaceStatus::Completed;
                race.end_time = Some(completed_at);
                race.distance
            }
            None => 0,
        };

        let round = active.round_index as Round + 1;
        let result = RoundResult {
            round_number: round,
            distance,
            results: ranked,
            completed_at,
        };
        let winner = result.winner().map(|w| w.horse_id);
        log::info!("engine: round {round} finished, winner {winner:?}");
        log::debug!(
            "engine: round {round} order {:?}",
            result.results.iter().map(|r| (r.position, r.horse_id, r.time)).collect::<Vec<_>>()
        );

        self.results.push(result);
        self.current_round_index = active.round_index + 1;
        self.emit(GameEvent::RaceFinished { round, winner });

        let round_count = self.schedule.as_ref().map_or(0, Vec::len);
        if self.current_round_index >= round_count {
            self.finish_game();
        } else {
            self.clock
                .schedule(DeferredTask::StartNextRace, now + self.config.inter_race_pause_ms);
        }
        self.persist();
    }

    fn finish_game(&mut self) {
        self.active = None;
        self.state = GameState::Completed;
        log::info!("engine: all {} rounds complete", self.results.len());
        self.emit(GameEvent::GameCompleted { rounds: self.results.len() });
    }

    // ── Horse lookup ───────────────────────────────────────────

    fn condition_of(&mut self, id: HorseId) -> u32 {
        match self.horses.iter().find(|h| h.id == id) {
            Some(horse) => horse.condition,
            None => {
                self.note_missing_horse(id);
                FALLBACK_CONDITION
            }
        }
    }

    fn horse_or_default(&mut self, id: HorseId) -> Horse {
        match self.horses.iter().find(|h| h.id == id) {
            Some(horse) => horse.clone(),
            None => {
                self.note_missing_horse(id);
                Horse {
                    id,
                    name: format!("Horse #{id}"),
                    condition: FALLBACK_CONDITION,
                    color: "#808080".to_string(),
                }
            }
        }
    }

    fn note_missing_horse(&mut self, id: HorseId) {
        self.missing_horse_lookups += 1;
        log::warn!("engine: horse {id} not in roster, using condition {FALLBACK_CONDITION}");
    }

    // ── Plumbing ───────────────────────────────────────────────

    fn ignore(&mut self, command: PlayerCommand) -> bool {
        log::warn!("engine: '{}' ignored in state {}", command.name(), self.state);
        self.emit(GameEvent::ActionIgnored {
            action: command.name().to_string(),
            state:  self.state,
        });
        false
    }

    fn emit(&mut self, event: GameEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    fn persist(&mut self) {
        let record = self.record();
        if let Some(persistence) = self.persistence.as_mut() {
            persistence.save(&record);
        }
    }

    // ── Queries ────────────────────────────────────────────────

    /// The durable subset of state, as it would be persisted.
    pub fn record(&self) -> GameRecord {
        GameRecord {
            game_state:          self.state,
            horses:              self.horses.clone(),
            schedule:            self.schedule.clone(),
            results:             self.results.clone(),
            current_round_index: self.current_round_index,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn horses(&self) -> &[Horse] {
        &self.horses
    }

    pub fn horse(&self, id: HorseId) -> Option<&Horse> {
        self.horses.iter().find(|h| h.id == id)
    }

    pub fn schedule(&self) -> Option<&[Race]> {
        self.schedule.as_deref()
    }

    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    pub fn current_round_index(&self) -> usize {
        self.current_round_index
    }

    /// The race at the current round index, if the schedule has one.
    pub fn current_race(&self) -> Option<&Race> {
        self.schedule.as_ref()?.get(self.current_round_index)
    }

    /// Live participants of the race on the track, in lane order.
    pub fn participants(&self) -> &[ParticipantState] {
        match &self.active {
            Some(active) => &active.participants,
            None => &[],
        }
    }

    /// Live participants ordered for display.
    pub fn live_standings(&self) -> Vec<ParticipantState> {
        physics::standings(self.participants())
    }

    pub fn is_animating(&self) -> bool {
        self.state == GameState::Racing && self.active.is_some()
    }

    /// True while the pause between two races is running.
    pub fn next_race_pending(&self) -> bool {
        self.clock.has_pending()
    }

    pub fn missing_horse_lookups(&self) -> u64 {
        self.missing_horse_lookups
    }

    /// Replace the roster. Only for tooling and tests that need a
    /// specific field.
    pub fn set_horses(&mut self, horses: Vec<Horse>) {
        self.horses = horses;
    }
}
