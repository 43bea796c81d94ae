use caravan_game::constants::FRAME_MS;
use caravan_game::{
    CloseOutcome, EncounterData, Ending, GameConfig, GameError, GameSession, GameStatus,
    InputState, NpcKind, Theme, Variant, availability, classify_victory,
};

const FRAME_CAP: u32 = 30_000;

#[derive(Clone, Copy, PartialEq, Eq)]
enum AtHaven {
    Continue,
    Retire,
}

fn relaxed_session(variant: Variant, seed: u64) -> GameSession {
    let mut config = GameConfig::for_variant(variant);
    config.tuning.food_drain_rate = 0.01;
    let mut session = GameSession::new(config, EncounterData::bundled().unwrap(), seed);
    session.start().unwrap();
    session
}

/// Lines up with the Haven once it is on the road, otherwise idles.
fn steer(session: &GameSession) -> InputState {
    let state = session.state();
    let player = state.player;
    let target = state
        .npcs
        .iter()
        .find(|npc| npc.kind == NpcKind::Haven && npc.x > player.x - 20.0);
    let mut input = InputState::new();
    if let Some(npc) = target {
        if npc.y < player.y - 3.0 {
            input.key_down("w");
        } else if npc.y > player.y + 3.0 {
            input.key_down("s");
        }
    }
    input
}

fn resolve_encounter(session: &mut GameSession, at_haven: AtHaven) -> Option<CloseOutcome> {
    let state = session.state();
    let id = state.encounter.as_ref()?.encounter_id.clone();
    let encounter = session.data().get(&id)?.clone();
    let pick = if id == "haven_checkpoint" {
        Some(match at_haven {
            AtHaven::Continue => 0,
            AtHaven::Retire => 1,
        })
    } else {
        encounter
            .choices
            .iter()
            .enumerate()
            .filter(|(_, choice)| {
                availability(choice, &state.resources, &state.flags).is_available()
            })
            .min_by_key(|(_, choice)| choice.costs.food)
            .map(|(index, _)| index)
    };
    if let Some(index) = pick {
        session.choose(index).unwrap();
    }
    Some(session.close_encounter().unwrap())
}

/// Drive until the run ends or `stop` says so. Returns frames simulated.
fn autopilot(
    session: &mut GameSession,
    at_haven: AtHaven,
    mut stop: impl FnMut(&GameSession, Option<&CloseOutcome>) -> bool,
) -> u32 {
    let mut frames = 0;
    while frames < FRAME_CAP {
        let mut closed = None;
        match session.state().status {
            GameStatus::Playing => {
                match session.interact() {
                    Ok(_) | Err(GameError::NothingInRange | GameError::CapacityFull { .. }) => {}
                    Err(err) => panic!("unexpected interact error: {err}"),
                }
                let mut input = steer(session);
                frames += session.advance(FRAME_MS, &mut input);
            }
            GameStatus::Encounter => closed = resolve_encounter(session, at_haven),
            GameStatus::Lottery => {
                session.spin_lottery().unwrap();
            }
            GameStatus::VehicleSelect => session.close_hangar().unwrap(),
            GameStatus::Title | GameStatus::GameOver | GameStatus::Victory => break,
        }
        session.drain_events();
        if stop(session, closed.as_ref()) {
            break;
        }
    }
    frames
}

#[test]
fn caravan_only_run_reaches_the_haven_and_retires() {
    let mut session = relaxed_session(Variant::CaravanOnly, 0x5EED);
    let frames = autopilot(&mut session, AtHaven::Retire, |_, _| false);
    let state = session.state();
    assert_eq!(state.status, GameStatus::Victory, "stuck after {frames} frames");
    let ending = state.ending.as_ref().unwrap();
    assert!(ending.is_victory());
    assert_eq!(ending.regions, 1);
    assert!(state.encounters_resolved >= 1);
    assert!(state.journal.iter().any(|key| key == "log.journey.end"));
    assert!(!session.mixer().any_active());
    assert_eq!(state.coins_collected, 0);
}

#[test]
fn expanded_run_continues_into_the_next_theme() {
    let mut session = relaxed_session(Variant::Expanded, 0xFACADE);
    autopilot(&mut session, AtHaven::Continue, |_, closed| {
        matches!(closed, Some(CloseOutcome::JourneyContinued { .. }))
    });
    let state = session.state();
    assert_eq!(state.status, GameStatus::Playing);
    assert_eq!(state.resources.journey_count, 2);
    assert_eq!(state.active_theme(), Theme::Neon);
    assert!(state.resources.progress < 1.0);
    assert!(state.npcs.is_empty());
}

#[test]
fn retire_classification_follows_the_ledger() {
    let mut session = relaxed_session(Variant::CaravanOnly, 77);
    session.with_state_mut(|state| {
        state.resources.gold = 300;
        state.resources.reputation = 0;
    });
    autopilot(&mut session, AtHaven::Retire, |_, _| false);
    let state = session.state();
    assert_eq!(state.status, GameStatus::Victory);
    let expected = classify_victory(state.resources.reputation, state.resources.gold);
    let ending = state.ending.as_ref().unwrap();
    assert_eq!(ending.ending, Ending::Victory(expected));
    assert_eq!(ending.wealth, state.resources.gold);
}

#[test]
fn unattended_caravan_starves() {
    let mut session = GameSession::new(
        GameConfig::for_variant(Variant::CaravanOnly),
        EncounterData::empty(),
        1,
    );
    session.start().unwrap();
    let mut idle = InputState::new();
    let mut frames = 0;
    while session.state().status == GameStatus::Playing && frames < 20_000 {
        frames += session.advance(FRAME_MS, &mut idle);
    }
    let state = session.state();
    assert_eq!(state.status, GameStatus::GameOver);
    assert_eq!(state.resources.lives, 0);
    // 100 food, then two revivals at 50, draining 0.05 per frame.
    assert!((3_990..=4_010).contains(&frames), "starved after {frames} frames");
    assert_eq!(
        state.journal.iter().filter(|key| *key == "log.life.lost").count(),
        2
    );
}
