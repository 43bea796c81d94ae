//! A running game: state, content, randomness and audio behind one handle.
use log::{debug, info, warn};

use crate::audio::{self, AudioMixer, SoundCue};
use crate::combat::{self, ControlMode};
use crate::config::GameConfig;
use crate::constants::{
    FRAME_MS, LOG_LOTTERY_REWARD, LOG_PASSENGER_NO_SEAT, LOG_PASSENGER_ONBOARD, LOG_SESSION_START,
    LOG_VEHICLE_CHANGED, MAX_STEPS_PER_ADVANCE,
};
use crate::data::EncounterData;
use crate::encounter::{self, CloseOutcome};
use crate::error::GameError;
use crate::frame::{FrameContext, step_frame};
use crate::input::{Command, InputState, commands_for};
use crate::lottery::{LotteryReward, SpinResult};
use crate::passengers::Passenger;
use crate::rng::{RngStreams, StreamDraws};
use crate::seed::{decode_to_seed, encode_friendly};
use crate::state::{ChoiceOutcome, GameEvent, GameState, GameStatus};
use crate::theme::Theme;
use crate::vehicle::{self, VehicleChange, VehicleKind};

pub struct GameSession {
    config: GameConfig,
    data: EncounterData,
    seed: u64,
    streams: RngStreams,
    state: GameState,
    mixer: AudioMixer,
    accumulator_ms: f32,
}

fn require(state: &GameState, expected: GameStatus) -> Result<(), GameError> {
    if state.status == expected {
        Ok(())
    } else {
        Err(GameError::WrongStatus {
            expected,
            actual: state.status,
        })
    }
}

impl GameSession {
    /// A session sitting on the title screen with the intro music queued.
    #[must_use]
    pub fn new(config: GameConfig, data: EncounterData, seed: u64) -> Self {
        let state = GameState::new(config.features());
        let mut session = Self {
            config,
            data,
            seed,
            streams: RngStreams::from_user_seed(seed),
            state,
            mixer: AudioMixer::default(),
            accumulator_ms: 0.0,
        };
        let intro = session.mixer.start_intro();
        session.state.audio(intro);
        session
    }

    /// Begin a run from the title screen, or restart after an ending.
    ///
    /// # Errors
    ///
    /// Fails while a run is in progress.
    pub fn start(&mut self) -> Result<(), GameError> {
        let status = self.state.status;
        if status != GameStatus::Title && !status.is_terminal() {
            return Err(GameError::WrongStatus {
                expected: GameStatus::Title,
                actual: status,
            });
        }
        let theme_override = self.state.theme_override;
        let pending = self.state.drain_events();
        let mut fresh = GameState::new(self.config.features());
        fresh.theme_override = theme_override;
        fresh.status = status;
        for event in pending {
            fresh.emit(event);
        }
        self.state = fresh;
        self.accumulator_ms = 0.0;

        let run_audio = self.mixer.start_run();
        self.state.audio(run_audio);
        self.state.cue(SoundCue::Confirm);
        self.state.log(LOG_SESSION_START);
        self.state.set_status(GameStatus::Playing);
        info!(
            "run started: {} seed {:#x} ({})",
            self.config.variant,
            self.seed,
            self.share_code().as_deref().unwrap_or("no share code")
        );
        Ok(())
    }

    /// Feed wall-clock time; runs whole 60 Hz frames and returns how many ran.
    ///
    /// Presses queued on `input` are applied first, in press order.
    pub fn advance(&mut self, elapsed_ms: f32, input: &mut InputState) -> u32 {
        for key in input.take_queued() {
            // Rejected presses are logged by `press`.
            let _ = self.press(&key);
        }
        if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
            return 0;
        }
        let theme = self.state.active_theme();
        let notes = self.mixer.tick(elapsed_ms, self.streams.music(), theme);
        self.state.audio(notes);

        self.accumulator_ms += elapsed_ms;
        let mut steps = 0;
        let mut frames = 0;
        while self.accumulator_ms >= FRAME_MS && steps < MAX_STEPS_PER_ADVANCE {
            self.accumulator_ms -= FRAME_MS;
            steps += 1;
            if self.state.status == GameStatus::Playing {
                let ctx = FrameContext {
                    config: &self.config,
                    data: &self.data,
                };
                step_frame(&mut self.state, &*input, ctx, &mut self.streams);
                frames += 1;
            }
        }
        if self.accumulator_ms >= FRAME_MS {
            debug!("dropping {:.1}ms of frame backlog", self.accumulator_ms);
            self.accumulator_ms = 0.0;
        }
        self.silence_if_finished();
        frames
    }

    /// Apply a single key press in whatever way the current status allows.
    ///
    /// Returns the command that was applied, or `None` when the key means
    /// nothing right now.
    ///
    /// # Errors
    ///
    /// Propagates the error of the operation the key triggered.
    pub fn press(&mut self, key: &str) -> Result<Option<Command>, GameError> {
        let features = self.state.features;
        for command in commands_for(key) {
            let status = self.state.status;
            let applied = match (status, command) {
                (GameStatus::Title, Command::Confirm) => self.start().map(|()| true),
                (GameStatus::GameOver | GameStatus::Victory, Command::Restart) => {
                    self.start().map(|()| true)
                }
                (GameStatus::Playing, Command::Interact) => self.interact().map(|_| true),
                (GameStatus::Playing, Command::ToggleMode) if features.walking_mode => {
                    self.toggle_mode().map(|_| true)
                }
                (GameStatus::Playing, Command::OpenHangar) if features.vehicles => {
                    self.open_hangar().map(|()| true)
                }
                (GameStatus::Encounter, Command::Choose(n)) => {
                    self.choose(n.saturating_sub(1)).map(|_| true)
                }
                (GameStatus::Encounter, Command::Confirm) => {
                    self.close_encounter().map(|_| true)
                }
                (GameStatus::Lottery, Command::Confirm) => self.spin_lottery().map(|_| true),
                (GameStatus::VehicleSelect, Command::Close) => self.close_hangar().map(|()| true),
                (GameStatus::VehicleSelect, Command::Choose(n)) => {
                    match VehicleKind::ALL.get(n.saturating_sub(1)) {
                        Some(kind) => self.select_vehicle(*kind).map(|_| true),
                        None => Ok(false),
                    }
                }
                _ => Ok(false),
            };
            match applied {
                Ok(true) => return Ok(Some(command)),
                Ok(false) => {}
                Err(err) => {
                    warn!("key '{key}' rejected: {err}");
                    return Err(err);
                }
            }
        }
        Ok(None)
    }

    /// Onboard the nearest person in reach.
    ///
    /// # Errors
    ///
    /// Fails off the road, with nobody in range or with every seat taken.
    pub fn interact(&mut self) -> Result<Passenger, GameError> {
        require(&self.state, GameStatus::Playing)?;
        let Some(index) = self
            .state
            .person_in_range(self.config.tuning.interaction_range)
        else {
            return Err(GameError::NothingInRange);
        };
        let state = &mut self.state;
        if !state.resources.has_free_seat(&state.flags) {
            let seated = state.resources.passengers.len();
            let capacity = state.resources.capacity(&state.flags);
            state.log(LOG_PASSENGER_NO_SEAT);
            state.notify("No free seats!");
            return Err(GameError::CapacityFull { seated, capacity });
        }
        let npc = state.npcs.remove(index);
        let Some(passenger) = npc.passenger else {
            return Err(GameError::NothingInRange);
        };
        state.resources.passengers.push(passenger.clone());
        state.cue(SoundCue::Onboard);
        state.log(LOG_PASSENGER_ONBOARD);
        state.emit(GameEvent::PassengerBoarded {
            name: passenger.name.clone(),
            kind: passenger.kind,
        });
        state.notify(format!("{} joined: {}", passenger.name, passenger.bonus_text));
        info!("{} the {} came aboard", passenger.name, passenger.kind);
        Ok(passenger)
    }

    /// # Errors
    ///
    /// See [`encounter::choose`].
    pub fn choose(&mut self, index: usize) -> Result<ChoiceOutcome, GameError> {
        encounter::choose(&mut self.state, &self.data, index)
    }

    /// # Errors
    ///
    /// See [`encounter::close_encounter`].
    pub fn close_encounter(&mut self) -> Result<CloseOutcome, GameError> {
        let outcome = encounter::close_encounter(&mut self.state, &self.data)?;
        self.silence_if_finished();
        Ok(outcome)
    }

    /// Spin the prize wheel opened by a mystery box.
    ///
    /// # Errors
    ///
    /// Fails unless the wheel is showing.
    pub fn spin_lottery(&mut self) -> Result<SpinResult, GameError> {
        require(&self.state, GameStatus::Lottery)?;
        let result = self.state.lottery.spin(self.streams.lottery());
        let reward = result.reward;
        let opens_hangar = reward.apply(&mut self.state.resources);
        self.state.resources.recompute_score();
        self.state.cue(if reward == LotteryReward::Nothing {
            SoundCue::Select
        } else {
            SoundCue::Win
        });
        self.state.log(LOG_LOTTERY_REWARD);
        self.state.emit(GameEvent::LotteryLanded { reward });
        self.state.notify(reward.label());
        info!("lottery landed on {}", reward.id());
        if opens_hangar && self.state.features.vehicles {
            self.state.set_status(GameStatus::VehicleSelect);
        } else {
            self.state.set_status(GameStatus::Playing);
        }
        Ok(result)
    }

    /// # Errors
    ///
    /// Fails when vehicles are not part of the variant or the road is not live.
    pub fn open_hangar(&mut self) -> Result<(), GameError> {
        if !self.state.features.vehicles {
            return Err(GameError::FeatureDisabled("vehicles"));
        }
        require(&self.state, GameStatus::Playing)?;
        self.state.cue(SoundCue::Select);
        self.state.set_status(GameStatus::VehicleSelect);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails unless the hangar is open.
    pub fn close_hangar(&mut self) -> Result<(), GameError> {
        require(&self.state, GameStatus::VehicleSelect)?;
        self.state.set_status(GameStatus::Playing);
        Ok(())
    }

    /// Buy or switch to `kind` and return to the road.
    ///
    /// # Errors
    ///
    /// Fails outside the hangar, or per [`vehicle::select_vehicle`].
    pub fn select_vehicle(&mut self, kind: VehicleKind) -> Result<VehicleChange, GameError> {
        if !self.state.features.vehicles {
            return Err(GameError::FeatureDisabled("vehicles"));
        }
        require(&self.state, GameStatus::VehicleSelect)?;
        let state = &mut self.state;
        let change = vehicle::select_vehicle(&mut state.resources, &mut state.flags, kind)?;
        state.resources.recompute_score();
        state.cue(if change.paid > 0 {
            SoundCue::Trade
        } else {
            SoundCue::Select
        });
        state.log(LOG_VEHICLE_CHANGED);
        state.notify(format!("Now driving the {}", kind.spec().label));
        state.set_status(GameStatus::Playing);
        info!("vehicle {} -> {} (paid {})", change.from, change.to, change.paid);
        Ok(change)
    }

    /// # Errors
    ///
    /// See [`combat::toggle_mode`].
    pub fn toggle_mode(&mut self) -> Result<ControlMode, GameError> {
        combat::toggle_mode(&mut self.state)
    }

    /// Set music and ambient volumes in `[0, 1]`.
    pub fn set_volumes(&mut self, music: f32, ambient: f32) {
        let commands = self.mixer.set_volumes(music, ambient);
        self.state.audio(commands);
    }

    /// Pick a theme on the title screen, or clear the pick with `None`.
    ///
    /// # Errors
    ///
    /// Fails when themes are not part of the variant or a run is underway.
    pub fn set_theme_override(&mut self, theme: Option<Theme>) -> Result<(), GameError> {
        if !self.state.features.themes {
            return Err(GameError::FeatureDisabled("themes"));
        }
        require(&self.state, GameStatus::Title)?;
        self.state.theme_override = theme;
        Ok(())
    }

    /// A fresh loop of ambient wind for the host to play.
    pub fn render_wind(&mut self, sample_rate: u32) -> Vec<f32> {
        audio::render_wind(self.streams.noise(), sample_rate)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn data(&self) -> &EncounterData {
        &self.data
    }

    #[must_use]
    pub const fn mixer(&self) -> &AudioMixer {
        &self.mixer
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// The code that replays this run, if the seed lives in code space.
    #[must_use]
    pub fn share_code(&self) -> Option<String> {
        let code = encode_friendly(self.config.variant, self.seed);
        decode_to_seed(&code)
            .filter(|&(_, seed)| seed == self.seed)
            .map(|_| code)
    }

    #[must_use]
    pub const fn rng_draws(&self) -> StreamDraws {
        self.streams.draws()
    }

    /// Run a closure with mutable access to the state, for tools and tests.
    pub fn with_state_mut<F>(&mut self, f: F)
    where
        F: FnOnce(&mut GameState),
    {
        f(&mut self.state);
    }

    fn silence_if_finished(&mut self) {
        if self.state.status.is_terminal() && self.mixer.any_active() {
            let commands = self.mixer.stop_all();
            self.state.audio(commands);
        }
    }
}
