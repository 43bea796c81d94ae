use anyhow::{Context, Result};
use caravan_game::{
    EncounterData, GameConfig, GameEvent, GameState, StreamDraws, Variant, canonical_seed,
    encode_friendly,
};
use colored::Colorize;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{DecisionRecord, SimulationConfig, SimulationSession, TurnOutcome};

/// Default frame budget for a single autopilot run.
pub const DEFAULT_MAX_FRAMES: u64 = 20_000;

/// What to run and what must hold afterwards.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub variant: Variant,
    pub strategy: GameplayStrategy,
    pub max_frames: Option<u64>,
    pub journeys: u32,
    pub setup: Option<fn(&mut GameState)>,
    pub tuning: Option<fn(&mut GameConfig)>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(variant: Variant, strategy: GameplayStrategy) -> Self {
        Self {
            variant,
            strategy,
            max_frames: None,
            journeys: 1,
            setup: None,
            tuning: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    #[must_use]
    pub const fn with_journeys(mut self, journeys: u32) -> Self {
        self.journeys = journeys;
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut GameState)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub fn with_tuning(mut self, tuning: fn(&mut GameConfig)) -> Self {
        self.tuning = Some(tuning);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    /// # Errors
    ///
    /// Returns the expectation's failure.
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Aggregated numbers from one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunMetrics {
    pub frames: u64,
    pub journeys_completed: u32,
    pub encounters_resolved: u32,
    pub passengers_boarded: u32,
    pub coins_collected: u32,
    pub lottery_spins: u32,
    pub vehicle_changes: u32,
    pub audio_commands: usize,
    pub final_food: f32,
    pub final_gold: i32,
    pub final_reputation: i32,
    pub lives_left: u32,
    pub score: i64,
    pub ending: String,
    pub rng_draws: StreamDraws,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub share_code: String,
    pub variant: Variant,
    pub strategy: GameplayStrategy,
    pub decisions: Vec<DecisionRecord>,
    pub metrics: RunMetrics,
    pub final_state: GameState,
    pub game_ended: bool,
}

/// Headless deterministic runner for the core game logic.
#[derive(Clone)]
pub struct GameTester {
    verbose: bool,
    data: Arc<EncounterData>,
    config: Option<Arc<GameConfig>>,
}

impl GameTester {
    #[must_use]
    pub const fn new(data: Arc<EncounterData>, config: Option<Arc<GameConfig>>, verbose: bool) -> Self {
        Self {
            verbose,
            data,
            config,
        }
    }

    /// Tester over the bundled catalog and default tuning.
    ///
    /// # Errors
    ///
    /// Fails if the bundled catalog no longer parses.
    pub fn bundled(verbose: bool) -> Result<Self> {
        let data = EncounterData::bundled().context("bundled encounter catalog is invalid")?;
        Ok(Self::new(Arc::new(data), None, verbose))
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    fn game_config(&self, plan: &SimulationPlan) -> GameConfig {
        let mut config = self
            .config
            .as_deref()
            .cloned()
            .unwrap_or_else(|| GameConfig::for_variant(plan.variant));
        config.variant = plan.variant;
        if let Some(tuning) = plan.tuning {
            tuning(&mut config);
        }
        config
    }

    /// Drive one seeded run to its end.
    ///
    /// # Errors
    ///
    /// Fails when the session rejects a command the autopilot issued.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        // Runs always use a seed their share code replays.
        let seed = canonical_seed(plan.variant, seed);
        let config = SimulationConfig::new(plan.variant, plan.strategy, seed)
            .with_max_frames(plan.max_frames.unwrap_or(DEFAULT_MAX_FRAMES))
            .with_journeys(plan.journeys);
        let mut sim = SimulationSession::new(config, self.game_config(plan), (*self.data).clone())
            .with_context(|| format!("seed {seed} would not start"))?;
        if let Some(setup) = plan.setup {
            sim.with_state_mut(setup);
        }

        let mut policy = plan.strategy.create_policy(seed);
        let mut metrics = RunMetrics::default();
        let mut decisions = Vec::new();
        loop {
            let turn = sim
                .advance(policy.as_mut())
                .with_context(|| format!("seed {seed} stalled"))?;
            self.record_turn(&turn, &mut metrics);
            let ended = turn.game_ended;
            if let Some(decision) = turn.decision {
                decisions.push(decision);
            }
            if ended {
                break;
            }
        }

        let session = sim.session();
        let state = session.state();
        metrics.frames = state.frame;
        metrics.encounters_resolved = state.encounters_resolved;
        metrics.coins_collected = state.coins_collected;
        metrics.audio_commands = sim
            .events()
            .iter()
            .filter(|event| matches!(event, GameEvent::Audio(_)))
            .count();
        metrics.final_food = state.resources.food;
        metrics.final_gold = state.resources.gold;
        metrics.final_reputation = state.resources.reputation;
        metrics.lives_left = state.resources.lives;
        metrics.score = state.resources.score;
        metrics.ending = state
            .ending
            .as_ref()
            .map_or_else(|| "unfinished".to_string(), |ending| ending.title.clone());
        metrics.rng_draws = session.rng_draws();
        debug!("seed {seed} finished after {} frames", metrics.frames);

        let share_code = session
            .share_code()
            .with_context(|| format!("seed {seed} has no share code"))?;
        Ok(SimulationSummary {
            seed,
            share_code,
            variant: plan.variant,
            strategy: plan.strategy,
            decisions,
            metrics,
            final_state: state.clone(),
            game_ended: state.status.is_terminal(),
        })
    }

    fn record_turn(&self, turn: &TurnOutcome, metrics: &mut RunMetrics) {
        if turn.journey_completed {
            metrics.journeys_completed += 1;
        }
        if let Some(passenger) = &turn.boarded {
            metrics.passengers_boarded += 1;
            if self.verbose {
                println!("  🧳 {} boarded at frame {}", passenger.name, turn.frame);
            }
        }
        if turn.lottery.is_some() {
            metrics.lottery_spins += 1;
        }
        if turn.vehicle.is_some() {
            metrics.vehicle_changes += 1;
        }
        if self.verbose
            && let Some(decision) = &turn.decision
        {
            println!(
                "  🗺️  frame {} {}: {}",
                decision.frame,
                decision.encounter_title.bright_white(),
                decision.choice_label
            );
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub share_code: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

/// A named plan the CLI can select.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

pub struct LogicTester {
    tester: GameTester,
}

impl LogicTester {
    #[must_use]
    pub const fn new(tester: GameTester) -> Self {
        Self { tester }
    }

    #[must_use]
    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.tester.verbose() {
                    println!(
                        "🧪 Testing scenario: {} (variant: {} seed: {})",
                        scenario.name.bright_white(),
                        scenario.plan.variant,
                        seed
                    );
                }
                self.run_single_scenario(scenario, seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = canonical_seed(
                scenario.plan.variant,
                seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX)),
            );
            let verdict = self
                .tester
                .run_plan(&scenario.plan, iteration_seed)
                .and_then(|summary| {
                    evaluate_expectations(&scenario.plan, &summary)
                        .with_context(|| describe_failure(&summary))
                        .map(|()| summary)
                });

            match verdict {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.tester.verbose() {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) frames:{} ending:{}",
                            i + 1,
                            iterations,
                            summary.metrics.frames,
                            summary.metrics.ending
                        );
                    }
                }
                Err(err) => {
                    let message = format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1);
                    if self.tester.verbose() {
                        println!("  ❌ {}", message.clone().red());
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        let seed = canonical_seed(scenario.plan.variant, seed);
        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            share_code: encode_friendly(scenario.plan.variant, seed),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Result<()> {
    plan.expectations
        .iter()
        .try_for_each(|expectation| expectation.evaluate(summary))
}

fn describe_failure(summary: &SimulationSummary) -> String {
    let path = if summary.decisions.is_empty() {
        "no decisions recorded".to_string()
    } else {
        summary
            .decisions
            .iter()
            .rev()
            .take(3)
            .map(|entry| {
                format!(
                    "frame {} ({}): {} [{}] {}",
                    entry.frame,
                    entry.encounter_id,
                    entry.choice_label,
                    entry.policy_name,
                    entry.rationale.as_deref().unwrap_or("-")
                )
            })
            .collect::<Vec<_>>()
            .join(" | ")
    };
    format!(
        "{} {} after {} frames, ending '{}', food {:.1} gold {} renown {} | {path}",
        summary.share_code,
        summary.strategy,
        summary.metrics.frames,
        summary.metrics.ending,
        summary.metrics.final_food,
        summary.metrics.final_gold,
        summary.metrics.final_reputation,
    )
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caravan_game::GameStatus;

    fn starve(config: &mut GameConfig) {
        config.tuning.food_drain_rate = 2.0;
    }

    fn generous(config: &mut GameConfig) {
        config.tuning.food_drain_rate = 0.005;
    }

    #[test]
    fn passing_plan_counts_every_iteration() {
        let tester = LogicTester::new(GameTester::bundled(false).unwrap());
        let scenario = TestScenario {
            name: "haven".to_string(),
            plan: SimulationPlan::new(Variant::CaravanOnly, GameplayStrategy::Hoarder)
                .with_tuning(generous)
                .with_expectation(|summary: &SimulationSummary| {
                    anyhow::ensure!(summary.final_state.status == GameStatus::Victory);
                    Ok(())
                }),
        };
        let results = tester.run_scenario(&scenario, &[21], 2);
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(result.passed, "{:?}", result.failures);
        assert_eq!(result.successful_iterations, 2);
        assert_eq!(result.performance_data.len(), 2);
    }

    #[test]
    fn failed_expectations_describe_the_run() {
        let tester = LogicTester::new(GameTester::bundled(false).unwrap());
        let scenario = TestScenario {
            name: "doomed".to_string(),
            plan: SimulationPlan::new(Variant::CaravanOnly, GameplayStrategy::Conservative)
                .with_tuning(starve)
                .with_expectation(|summary: &SimulationSummary| {
                    anyhow::ensure!(summary.metrics.lives_left > 0, "caravan starved");
                    Ok(())
                }),
        };
        let result = &tester.run_scenario(&scenario, &[4], 1)[0];
        assert!(!result.passed);
        assert_eq!(result.successful_iterations, 0);
        assert!(result.failures[0].contains("caravan starved"));
        assert!(result.failures[0].contains("CV-"));
    }

    #[test]
    fn setup_hooks_shape_the_starting_state() {
        let tester = GameTester::bundled(false).unwrap();
        let plan = SimulationPlan::new(Variant::Expanded, GameplayStrategy::Hoarder)
            .with_max_frames(10)
            .with_setup(|state| state.resources.gold = 400);
        let summary = tester.run_plan(&plan, 8).unwrap();
        assert!(!summary.game_ended);
        assert_eq!(summary.metrics.frames, 10);
        assert!(summary.metrics.final_gold >= 400);
        assert!(summary.metrics.rng_draws.total() >= summary.metrics.rng_draws.spawn);
    }

    #[test]
    fn reported_codes_replay_the_seed_that_ran() {
        let tester = GameTester::bundled(false).unwrap();
        let plan = SimulationPlan::new(Variant::Expanded, GameplayStrategy::Balanced)
            .with_max_frames(30);
        let summary = tester.run_plan(&plan, 1337).unwrap();
        assert_eq!(
            caravan_game::decode_to_seed(&summary.share_code),
            Some((Variant::Expanded, summary.seed))
        );

        let scenario = TestScenario {
            name: "short".to_string(),
            plan,
        };
        let result = &LogicTester::new(tester).run_scenario(&scenario, &[1337], 1)[0];
        assert_eq!(result.seed, summary.seed);
        assert_eq!(result.share_code, summary.share_code);
    }

    #[test]
    fn results_serialize_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "smoke".to_string(),
            seed: 1,
            share_code: "CV-DUNE01".to_string(),
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 12);
        assert_eq!(json["performance_data"][0], 12);
    }
}
