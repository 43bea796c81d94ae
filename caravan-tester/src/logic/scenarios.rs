use anyhow::{Context, Result, ensure};
use caravan_game::{
    ControlMode, Ending, GameConfig, GameStatus, SoundCue, Variant, VehicleKind, decode_to_seed,
    encode_friendly, render_cue,
};

use crate::logic::policy::GameplayStrategy;
use crate::logic::tester::{GameTester, SimulationPlan, SimulationSummary, TestScenario};

const CATALOG: [(&str, &str); 9] = [
    ("smoke", "Ten seconds on the road without errors"),
    ("haven-retire", "Reach the Haven and retire with an ending"),
    ("journey-loop", "Continue once at the Haven, then retire in the next theme"),
    ("starvation", "Famine tuning burns every life and ends the run"),
    ("caravan-only", "Caravan-only variant never shows expanded features"),
    ("expanded-economy", "Expanded variant with coins, prize wheel and hangar"),
    ("deterministic-replay", "Same seed replays to the identical state"),
    ("share-code", "Share code round-trips to the run's seed"),
    ("audio-cues", "Every sound cue renders and the run emits audio"),
];

const SMOKE_FRAMES: u64 = 600;

/// Every scenario key with its description.
#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG.to_vec()
}

/// Expand `all` into every scenario, keeping explicit names in order.
#[must_use]
pub fn expand_scenarios(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = names
        .iter()
        .filter(|name| !name.eq_ignore_ascii_case("all"))
        .cloned()
        .collect();
    if names.iter().any(|name| name.eq_ignore_ascii_case("all")) {
        for (key, _) in CATALOG {
            if !out.iter().any(|existing| existing == key) {
                out.push(key.to_string());
            }
        }
    }
    out
}

/// Build the named scenario for `variant`; some scenarios pin their own.
#[must_use]
pub fn get_scenario(name: &str, variant: Variant) -> Option<TestScenario> {
    let plan = match name {
        "smoke" => SimulationPlan::new(variant, GameplayStrategy::Balanced)
            .with_max_frames(SMOKE_FRAMES)
            .with_expectation(smoke_expectation),
        "haven-retire" => SimulationPlan::new(variant, GameplayStrategy::Hoarder)
            .with_tuning(relaxed)
            .with_expectation(retire_expectation),
        "journey-loop" => SimulationPlan::new(Variant::Expanded, GameplayStrategy::Hoarder)
            .with_journeys(2)
            .with_max_frames(60_000)
            .with_tuning(relaxed)
            .with_expectation(journey_loop_expectation),
        "starvation" => SimulationPlan::new(variant, GameplayStrategy::Conservative)
            .with_tuning(famine)
            .with_expectation(starvation_expectation),
        "caravan-only" => SimulationPlan::new(Variant::CaravanOnly, GameplayStrategy::Aggressive)
            .with_max_frames(3_000)
            .with_setup(|state| state.resources.gold = 500)
            .with_expectation(caravan_only_expectation),
        "expanded-economy" => SimulationPlan::new(Variant::Expanded, GameplayStrategy::Aggressive)
            .with_tuning(relaxed)
            .with_setup(|state| state.resources.gold = 120)
            .with_expectation(economy_expectation),
        "deterministic-replay" => SimulationPlan::new(variant, GameplayStrategy::Wanderer)
            .with_max_frames(2_000)
            .with_expectation(replay_expectation),
        "share-code" => SimulationPlan::new(variant, GameplayStrategy::Balanced)
            .with_max_frames(60)
            .with_expectation(share_code_expectation),
        "audio-cues" => SimulationPlan::new(variant, GameplayStrategy::Balanced)
            .with_max_frames(SMOKE_FRAMES)
            .with_expectation(audio_expectation),
        _ => return None,
    };
    Some(TestScenario {
        name: name.to_string(),
        plan,
    })
}

fn relaxed(config: &mut GameConfig) {
    config.tuning.food_drain_rate = 0.005;
}

fn famine(config: &mut GameConfig) {
    config.tuning.food_drain_rate = 1.5;
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.metrics.frames >= SMOKE_FRAMES || summary.game_ended,
        "run stopped early at frame {}",
        summary.metrics.frames
    );
    ensure!(
        summary.final_state.status != GameStatus::GameOver,
        "caravan starved during the smoke run"
    );
    Ok(())
}

fn retire_expectation(summary: &SimulationSummary) -> Result<()> {
    let ending = summary
        .final_state
        .ending
        .as_ref()
        .context("run finished without an ending")?;
    ensure!(ending.is_victory(), "expected a victory, got {:?}", ending.ending);
    ensure!(ending.regions == 1, "retired after {} regions", ending.regions);
    let last = summary.decisions.last().context("no encounter was resolved")?;
    ensure!(
        last.encounter_id == "haven_checkpoint",
        "last decision was {}",
        last.encounter_id
    );
    Ok(())
}

fn journey_loop_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.metrics.journeys_completed == 1,
        "completed {} journeys",
        summary.metrics.journeys_completed
    );
    let ending = summary.final_state.ending.as_ref().context("no ending")?;
    ensure!(ending.is_victory() && ending.regions == 2, "ended {:?}", ending.ending);
    Ok(())
}

fn starvation_expectation(summary: &SimulationSummary) -> Result<()> {
    let ending = summary.final_state.ending.as_ref().context("no ending")?;
    ensure!(ending.ending == Ending::Starved, "ended {:?}", ending.ending);
    ensure!(summary.metrics.lives_left == 0, "{} lives left", summary.metrics.lives_left);
    ensure!(
        summary
            .final_state
            .journal
            .iter()
            .any(|key| key == "log.life.lost"),
        "no life was lost before the end"
    );
    Ok(())
}

fn caravan_only_expectation(summary: &SimulationSummary) -> Result<()> {
    let state = &summary.final_state;
    ensure!(summary.metrics.coins_collected == 0, "coins appeared");
    ensure!(summary.metrics.lottery_spins == 0, "prize wheel appeared");
    ensure!(summary.metrics.vehicle_changes == 0, "hangar opened");
    ensure!(state.resources.vehicle == VehicleKind::Caravan, "vehicle changed");
    ensure!(state.mode == ControlMode::Caravan, "walking mode engaged");
    ensure!(
        state.npcs.iter().all(|npc| !npc.kind.is_pickup()),
        "pickup on the road"
    );
    Ok(())
}

fn economy_expectation(summary: &SimulationSummary) -> Result<()> {
    let metrics = &summary.metrics;
    ensure!(
        metrics.vehicle_changes > 0,
        "aggressive autopilot never bought a vehicle"
    );
    ensure!(
        summary.final_state.resources.vehicle != VehicleKind::Caravan,
        "still driving the caravan"
    );
    ensure!(
        metrics.rng_draws.lottery >= u64::from(metrics.lottery_spins),
        "{} spins drew {} times",
        metrics.lottery_spins,
        metrics.rng_draws.lottery
    );
    Ok(())
}

fn replay_expectation(summary: &SimulationSummary) -> Result<()> {
    let plan = SimulationPlan::new(summary.variant, summary.strategy).with_max_frames(2_000);
    let replay = GameTester::bundled(false)?.run_plan(&plan, summary.seed)?;
    ensure!(
        replay.final_state == summary.final_state,
        "replay diverged at frame {}",
        replay.metrics.frames
    );
    ensure!(
        replay.metrics.rng_draws == summary.metrics.rng_draws,
        "draw counts diverged"
    );
    Ok(())
}

fn share_code_expectation(summary: &SimulationSummary) -> Result<()> {
    let (variant, seed) =
        decode_to_seed(&summary.share_code).context("share code does not parse")?;
    ensure!(variant == summary.variant, "share code names {variant}");
    ensure!(
        seed == summary.seed,
        "{} replays seed {seed:#x}, not the run's {:#x}",
        summary.share_code,
        summary.seed
    );
    ensure!(
        encode_friendly(variant, seed) == summary.share_code,
        "{} does not round-trip",
        summary.share_code
    );
    Ok(())
}

fn audio_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.metrics.audio_commands > 0, "run emitted no audio");
    for cue in SoundCue::ALL {
        let samples = render_cue(cue, 8_000);
        ensure!(!samples.is_empty(), "{} rendered nothing", cue.as_str());
        ensure!(
            samples.iter().all(|sample| sample.is_finite() && sample.abs() <= 1.0),
            "{} clips",
            cue.as_str()
        );
    }
    Ok(())
}
