use caravan_game::constants::FRAME_MS;
use caravan_game::{
    ChoiceAction, CloseOutcome, EncounterData, GameConfig, GameError, GameEvent, GameSession,
    GameState, GameStatus, LotteryReward, NpcKind, Passenger, Variant, VehicleChange,
};

use crate::logic::pilot::Pilot;
use crate::logic::policy::{GameplayStrategy, PlayerPolicy, PolicyDecision};

/// Configuration for a simulation session.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub variant: Variant,
    pub strategy: GameplayStrategy,
    pub max_frames: u64,
    /// Journeys to complete before retiring at the Haven.
    pub journeys: u32,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(variant: Variant, strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            variant,
            strategy,
            max_frames: 20_000,
            journeys: 1,
        }
    }

    #[must_use]
    pub const fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = max_frames;
        self
    }

    #[must_use]
    pub const fn with_journeys(mut self, journeys: u32) -> Self {
        self.journeys = journeys;
        self
    }
}

/// Snapshot of a resolved encounter.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub frame: u64,
    pub journey: u32,
    pub encounter_id: String,
    pub encounter_title: String,
    /// `None` when nothing was affordable and the caravan moved on.
    pub choice_index: Option<usize>,
    pub choice_label: String,
    pub policy_name: String,
    pub rationale: Option<String>,
}

/// What one call to [`SimulationSession::advance`] did.
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    pub frame: u64,
    pub frames_run: u32,
    pub decision: Option<DecisionRecord>,
    pub boarded: Option<Passenger>,
    pub lottery: Option<LotteryReward>,
    pub vehicle: Option<VehicleChange>,
    pub journey_completed: bool,
    pub game_ended: bool,
}

/// Deterministic autopilot around a [`GameSession`].
pub struct SimulationSession {
    session: GameSession,
    pilot: Pilot,
    journeys: u32,
    max_frames: u64,
    events: Vec<GameEvent>,
    /// Frame of the last hangar visit, so a refused purchase cannot stall the road.
    hangar_frame: Option<u64>,
}

impl SimulationSession {
    /// Start a run on the road.
    ///
    /// # Errors
    ///
    /// Fails if the fresh session refuses to start.
    pub fn new(
        config: SimulationConfig,
        game_config: GameConfig,
        encounters: EncounterData,
    ) -> Result<Self, GameError> {
        let mut game_config = game_config;
        game_config.variant = config.variant;
        let mut session = GameSession::new(game_config, encounters, config.seed);
        session.start()?;
        Ok(Self {
            session,
            pilot: Pilot::new(config.strategy),
            journeys: config.journeys.max(1),
            max_frames: config.max_frames,
            events: Vec::new(),
            hangar_frame: None,
        })
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        self.session.state()
    }

    #[must_use]
    pub const fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn with_state_mut<F>(&mut self, f: F)
    where
        F: FnOnce(&mut GameState),
    {
        self.session.with_state_mut(f);
    }

    /// Every event drained so far.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_session(self) -> GameSession {
        self.session
    }

    /// Take one decision, or simulate one frame of road.
    ///
    /// # Errors
    ///
    /// Surfaces any command the session rejected.
    pub fn advance(&mut self, policy: &mut dyn PlayerPolicy) -> Result<TurnOutcome, GameError> {
        let mut outcome = TurnOutcome::default();
        match self.session.state().status {
            GameStatus::Playing => self.drive(policy, &mut outcome)?,
            GameStatus::Encounter => self.resolve_encounter(policy, &mut outcome)?,
            GameStatus::Lottery => {
                outcome.lottery = Some(self.session.spin_lottery()?.reward);
            }
            GameStatus::VehicleSelect => self.visit_hangar(policy, &mut outcome)?,
            GameStatus::Title | GameStatus::GameOver | GameStatus::Victory => {}
        }
        self.events.extend(self.session.drain_events());

        let state = self.session.state();
        outcome.frame = state.frame;
        outcome.game_ended = state.status.is_terminal() || state.frame >= self.max_frames;
        Ok(outcome)
    }

    fn drive(
        &mut self,
        policy: &mut dyn PlayerPolicy,
        outcome: &mut TurnOutcome,
    ) -> Result<(), GameError> {
        let state = self.session.state();
        let range = self.session.config().tuning.interaction_range;
        if state.person_in_range(range).is_some() && state.resources.has_free_seat(&state.flags) {
            outcome.boarded = Some(self.session.interact()?);
        }

        let state = self.session.state();
        if state.features.vehicles
            && self.hangar_frame != Some(state.frame)
            && policy.pick_vehicle(state).is_some()
        {
            self.hangar_frame = Some(state.frame);
            return self.session.open_hangar();
        }

        let mut input = self.pilot.steer(self.session.state());
        outcome.frames_run = self.session.advance(FRAME_MS, &mut input);
        Ok(())
    }

    fn resolve_encounter(
        &mut self,
        policy: &mut dyn PlayerPolicy,
        outcome: &mut TurnOutcome,
    ) -> Result<(), GameError> {
        let state = self.session.state();
        let Some(active) = state.encounter.as_ref() else {
            return Ok(());
        };
        let Some(encounter) = self.session.data().get(&active.encounter_id) else {
            return Err(GameError::UnknownEncounter(active.encounter_id.clone()));
        };

        let journey = state.resources.journey_count;
        let decision = if encounter.npc_kind == NpcKind::Haven {
            let wanted = if journey < self.journeys {
                ChoiceAction::ContinueJourney
            } else {
                ChoiceAction::EndJourney
            };
            encounter
                .choices
                .iter()
                .position(|choice| choice.action == Some(wanted))
                .map(|idx| PolicyDecision::new(idx, Some(format!("journey {journey}"))))
        } else {
            policy.pick_choice(state, encounter)
        };

        let record = DecisionRecord {
            frame: state.frame,
            journey,
            encounter_id: encounter.id.clone(),
            encounter_title: encounter.title.clone(),
            choice_index: decision.as_ref().map(|d| d.choice_index),
            choice_label: decision
                .as_ref()
                .and_then(|d| encounter.choices.get(d.choice_index))
                .map_or_else(|| "Move on".to_string(), |choice| choice.text.clone()),
            policy_name: policy.name().to_string(),
            rationale: decision.as_ref().and_then(|d| d.rationale.clone()),
        };

        if let Some(decision) = decision {
            self.session.choose(decision.choice_index)?;
        }
        let closed = self.session.close_encounter()?;
        outcome.journey_completed = matches!(closed, CloseOutcome::JourneyContinued { .. });
        outcome.decision = Some(record);
        Ok(())
    }

    fn visit_hangar(
        &mut self,
        policy: &mut dyn PlayerPolicy,
        outcome: &mut TurnOutcome,
    ) -> Result<(), GameError> {
        let Some(kind) = policy.pick_vehicle(self.session.state()) else {
            return self.session.close_hangar();
        };
        match self.session.select_vehicle(kind) {
            Ok(change) => {
                outcome.vehicle = Some(change);
                Ok(())
            }
            Err(GameError::InsufficientGold { .. } | GameError::VehicleTooSmall { .. }) => {
                self.session.close_hangar()
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(variant: Variant, strategy: GameplayStrategy, seed: u64) -> SimulationSession {
        let mut game_config = GameConfig::for_variant(variant);
        game_config.tuning.food_drain_rate = 0.005;
        let config = SimulationConfig::new(variant, strategy, seed).with_max_frames(30_000);
        SimulationSession::new(config, game_config, EncounterData::bundled().unwrap()).unwrap()
    }

    fn run(sim: &mut SimulationSession, policy: &mut dyn PlayerPolicy) -> Vec<TurnOutcome> {
        let mut turns = Vec::new();
        loop {
            let turn = sim.advance(policy).unwrap();
            let done = turn.game_ended;
            turns.push(turn);
            if done {
                return turns;
            }
        }
    }

    #[test]
    fn hoarding_autopilot_retires_at_the_haven() {
        let mut sim = session(Variant::CaravanOnly, GameplayStrategy::Hoarder, 11);
        let mut policy = GameplayStrategy::Hoarder.create_policy(11);
        let turns = run(&mut sim, policy.as_mut());
        assert_eq!(sim.state().status, GameStatus::Victory);
        let decisions: Vec<_> = turns.iter().filter_map(|t| t.decision.as_ref()).collect();
        assert!(!decisions.is_empty());
        assert_eq!(decisions.last().unwrap().encounter_id, "haven_checkpoint");
        assert!(sim.events().iter().any(|event| matches!(event, GameEvent::Audio(_))));
    }

    #[test]
    fn journeys_setting_loops_before_retiring() {
        let mut sim = SimulationSession::new(
            SimulationConfig::new(Variant::Expanded, GameplayStrategy::Hoarder, 5)
                .with_journeys(2)
                .with_max_frames(60_000),
            {
                let mut cfg = GameConfig::for_variant(Variant::Expanded);
                cfg.tuning.food_drain_rate = 0.005;
                cfg
            },
            EncounterData::bundled().unwrap(),
        )
        .unwrap();
        let mut policy = GameplayStrategy::Hoarder.create_policy(5);
        let turns = run(&mut sim, policy.as_mut());
        assert_eq!(turns.iter().filter(|t| t.journey_completed).count(), 1);
        assert_eq!(sim.state().status, GameStatus::Victory);
        assert_eq!(sim.state().ending.as_ref().unwrap().regions, 2);
    }

    #[test]
    fn frame_cap_ends_the_run() {
        let mut sim = SimulationSession::new(
            SimulationConfig::new(Variant::CaravanOnly, GameplayStrategy::Conservative, 3)
                .with_max_frames(120),
            GameConfig::default(),
            EncounterData::empty(),
        )
        .unwrap();
        let mut policy = GameplayStrategy::Conservative.create_policy(3);
        let turns = run(&mut sim, policy.as_mut());
        assert_eq!(sim.state().status, GameStatus::Playing);
        assert_eq!(turns.last().unwrap().frame, 120);
    }
}
