//! Opening encounters, resolving choices and closing the consequence panel.
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::audio::SoundCue;
use crate::constants::{
    LOG_ENCOUNTER_CHOICE, LOG_ENCOUNTER_CLOSE, LOG_ENCOUNTER_OPEN, LOG_JOURNEY_CONTINUE,
    LOG_JOURNEY_END, LOG_PASSENGER_REMOVED,
};
use crate::data::{Choice, ChoiceAction, EncounterData, Requirement};
use crate::ending::{EndSummary, Ending, VictoryKind, classify_victory};
use crate::error::GameError;
use crate::flags::FlagSet;
use crate::passengers::{
    Passenger, PassengerKind, boosted_gold_gain, boosted_renown_gain, guard_food_bonus,
};
use crate::resources::ResourceState;
use crate::state::{ActiveEncounter, ChoiceOutcome, GameEvent, GameState, GameStatus};
use crate::theme::Theme;

/// Whether a choice can be picked right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Available,
    Locked(String),
    NeedPassenger(PassengerKind),
    CannotAfford { needed: i32, available: i32 },
}

impl Availability {
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

#[must_use]
pub fn availability(choice: &Choice, resources: &ResourceState, flags: &FlagSet) -> Availability {
    for requirement in choice.requirements() {
        match requirement {
            Requirement::Flag(flag) if !flags.contains(flag) => {
                return Availability::Locked(flag.to_string());
            }
            Requirement::Renown(threshold) if resources.reputation < threshold => {
                return Availability::Locked(format!("reputation_{threshold}"));
            }
            Requirement::Passenger(kind) if !resources.has_passenger(kind) => {
                return Availability::NeedPassenger(kind);
            }
            _ => {}
        }
    }
    if choice.costs.gold > resources.gold {
        return Availability::CannotAfford {
            needed: choice.costs.gold,
            available: resources.gold,
        };
    }
    Availability::Available
}

/// What closing the consequence panel did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CloseOutcome {
    Resumed,
    JourneyContinued { journey: u32 },
    Retired(VictoryKind),
    PassengerRemoved(Option<Passenger>),
}

fn expect_status(state: &GameState, expected: GameStatus) -> Result<(), GameError> {
    if state.status == expected {
        Ok(())
    } else {
        Err(GameError::WrongStatus {
            expected,
            actual: state.status,
        })
    }
}

/// Show the encounter `encounter_id` and pause the road.
///
/// # Errors
///
/// Returns [`GameError::UnknownEncounter`] when the catalog has no such id.
pub fn open_encounter(
    state: &mut GameState,
    data: &EncounterData,
    encounter_id: &str,
) -> Result<(), GameError> {
    if data.get(encounter_id).is_none() {
        return Err(GameError::UnknownEncounter(encounter_id.to_string()));
    }
    state.encounter = Some(ActiveEncounter::new(encounter_id));
    state.set_status(GameStatus::Encounter);
    state.cue(SoundCue::Collision);
    state.log(LOG_ENCOUNTER_OPEN);
    state.emit(GameEvent::EncounterOpened {
        encounter_id: encounter_id.to_string(),
    });
    info!("encounter opened: {encounter_id}");
    Ok(())
}

/// Resolve the choice at zero-based `index` of the open encounter.
///
/// # Errors
///
/// Fails when no encounter is open, a choice was already made, the index is out
/// of range, or the choice is locked or unaffordable.
pub fn choose(
    state: &mut GameState,
    data: &EncounterData,
    index: usize,
) -> Result<ChoiceOutcome, GameError> {
    expect_status(state, GameStatus::Encounter)?;
    let Some(active) = state.encounter.as_ref() else {
        return Err(GameError::UnknownEncounter(String::new()));
    };
    if active.outcome.is_some() {
        return Err(GameError::ChoiceAlreadyMade);
    }
    let encounter = data
        .get(&active.encounter_id)
        .ok_or_else(|| GameError::UnknownEncounter(active.encounter_id.clone()))?;
    let choice = encounter
        .choices
        .get(index)
        .ok_or_else(|| GameError::UnknownChoice {
            encounter: encounter.id.clone(),
            index,
        })?;

    match availability(choice, &state.resources, &state.flags) {
        Availability::Available => {}
        Availability::Locked(flag) => {
            warn!("choice {} locked behind {flag}", choice.id);
            return Err(GameError::ChoiceLocked {
                choice: choice.id.clone(),
                flag,
            });
        }
        Availability::NeedPassenger(kind) => {
            warn!("choice {} needs a {kind}", choice.id);
            return Err(GameError::PassengerRequired {
                choice: choice.id.clone(),
                kind,
            });
        }
        Availability::CannotAfford { needed, available } => {
            warn!("choice {} costs {needed} gold, have {available}", choice.id);
            return Err(GameError::InsufficientGold { needed, available });
        }
    }

    let resources = &mut state.resources;
    let gold_gain = boosted_gold_gain(
        choice.gains.gold,
        resources.has_passenger(PassengerKind::Merchant),
    );
    let renown_gain = boosted_renown_gain(
        choice.gains.reputation,
        resources.has_passenger(PassengerKind::Scholar),
    );
    let food_gain = crate::numbers::i32_to_f32(choice.gains.food)
        + guard_food_bonus(resources.has_passenger(PassengerKind::Guard), choice.theft);

    let (food_before, gold_before, renown_before) =
        (resources.food, resources.gold, resources.reputation);
    resources.add_food(food_gain - crate::numbers::i32_to_f32(choice.costs.food));
    resources.add_gold(gold_gain - choice.costs.gold);
    resources.add_reputation(renown_gain - choice.costs.reputation);
    resources.recompute_score();

    let outcome = ChoiceOutcome {
        choice_id: choice.id.clone(),
        consequence: choice.consequence.clone(),
        food: resources.food - food_before,
        gold: resources.gold - gold_before,
        reputation: resources.reputation - renown_before,
    };

    if let Some(flag) = &choice.flag_to_set {
        state.flags.insert(flag.clone());
    }
    let pending_action = choice.action;
    let removal = choice.required_passenger;
    if let Some(active) = state.encounter.as_mut() {
        active.pending_action = pending_action;
        active.removal = removal;
        active.outcome = Some(outcome.clone());
    }
    state.encounters_resolved += 1;
    state.cue(SoundCue::Trade);
    state.log(LOG_ENCOUNTER_CHOICE);
    Ok(outcome)
}

/// Dismiss the consequence panel and run the pending action.
///
/// An encounter whose every choice is unavailable may be dismissed without
/// choosing, so the player is never trapped.
///
/// # Errors
///
/// Fails when no encounter is open or no choice has been made yet while one
/// is still available.
pub fn close_encounter(
    state: &mut GameState,
    data: &EncounterData,
) -> Result<CloseOutcome, GameError> {
    expect_status(state, GameStatus::Encounter)?;
    let Some(active) = state.encounter.as_ref() else {
        return Err(GameError::UnknownEncounter(String::new()));
    };
    if active.outcome.is_none() {
        let stranded = data.get(&active.encounter_id).is_none_or(|encounter| {
            encounter
                .choices
                .iter()
                .all(|choice| !availability(choice, &state.resources, &state.flags).is_available())
        });
        if !stranded {
            return Err(GameError::NoChoiceMade);
        }
    }

    let Some(active) = state.encounter.take() else {
        return Err(GameError::UnknownEncounter(String::new()));
    };
    state.cue(SoundCue::Confirm);
    state.log(LOG_ENCOUNTER_CLOSE);

    let outcome = match active.pending_action {
        Some(ChoiceAction::ContinueJourney) => continue_journey(state),
        Some(ChoiceAction::EndJourney) => retire(state),
        Some(ChoiceAction::RemovePassenger) => {
            let removed = state.resources.remove_passenger(active.removal);
            state.log(LOG_PASSENGER_REMOVED);
            state.set_status(GameStatus::Playing);
            CloseOutcome::PassengerRemoved(removed)
        }
        None => {
            state.set_status(GameStatus::Playing);
            CloseOutcome::Resumed
        }
    };
    Ok(outcome)
}

fn continue_journey(state: &mut GameState) -> CloseOutcome {
    let finished = state.resources.journey_count;
    state.resources.journey_count += 1;
    state.resources.progress = 0.0;
    state.resources.recompute_score();
    state.npcs.clear();
    state.bullets.clear();
    state.spawn_timer_ms = 0.0;
    state.theme = Theme::for_journey(state.resources.journey_count);
    state.cue(SoundCue::Victory);
    state.log(LOG_JOURNEY_CONTINUE);
    state.emit(GameEvent::JourneyCompleted { journey: finished });
    let journey = state.resources.journey_count;
    state.notify(format!("Journey {journey} begins"));
    state.set_status(GameStatus::Playing);
    info!("journey {finished} complete, heading out on journey {journey}");
    CloseOutcome::JourneyContinued { journey }
}

fn retire(state: &mut GameState) -> CloseOutcome {
    let kind = classify_victory(state.resources.reputation, state.resources.gold);
    state.resources.recompute_score();
    state.ending = Some(EndSummary::new(Ending::Victory(kind), &state.resources));
    state.cue(SoundCue::Victory);
    state.log(LOG_JOURNEY_END);
    state.set_status(GameStatus::Victory);
    info!("retired as {}", kind.as_str());
    CloseOutcome::Retired(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Features, Variant};
    use crate::constants::FLOAT_EPSILON;

    fn data() -> EncounterData {
        EncounterData::bundled().unwrap()
    }

    fn open(id: &str) -> (GameState, EncounterData) {
        let data = data();
        let mut state = GameState::new(Features::for_variant(Variant::Expanded));
        state.status = GameStatus::Playing;
        open_encounter(&mut state, &data, id).unwrap();
        (state, data)
    }

    fn board(state: &mut GameState, kind: PassengerKind) {
        let id = state.next_id();
        state.resources.passengers.push(Passenger::new(id, "Elias", kind));
    }

    #[test]
    fn opening_unknown_encounter_fails() {
        let data = data();
        let mut state = GameState::new(Features::for_variant(Variant::CaravanOnly));
        assert_eq!(
            open_encounter(&mut state, &data, "dragon"),
            Err(GameError::UnknownEncounter("dragon".into()))
        );
        assert!(state.encounter.is_none());
    }

    #[test]
    fn trade_applies_costs_and_gains() {
        let (mut state, data) = open("hungry_merchant");
        let outcome = choose(&mut state, &data, 1).unwrap();
        assert_eq!(outcome.choice_id, "trade_supplies");
        assert!((state.resources.food - 85.0).abs() < FLOAT_EPSILON);
        assert_eq!(state.resources.gold, 77);
        assert_eq!(outcome.gold, 45);
        assert_eq!(choose(&mut state, &data, 0), Err(GameError::ChoiceAlreadyMade));
    }

    #[test]
    fn merchant_scholar_and_guard_bonuses_apply() {
        let (mut state, data) = open("hungry_merchant");
        board(&mut state, PassengerKind::Merchant);
        board(&mut state, PassengerKind::Guard);
        state.resources.food = 50.0;
        choose(&mut state, &data, 1).unwrap();
        assert_eq!(state.resources.gold, 32 + 51);
        assert!((state.resources.food - 40.0).abs() < FLOAT_EPSILON);

        let (mut state, data) = open("strange_traveler");
        board(&mut state, PassengerKind::Scholar);
        choose(&mut state, &data, 0).unwrap();
        assert_eq!(state.resources.reputation, 7);
        assert!(state.flags.contains("helped_wanderer"));
    }

    #[test]
    fn theft_skips_guard_bonus() {
        let (mut state, data) = open("food_cart");
        board(&mut state, PassengerKind::Guard);
        state.resources.food = 10.0;
        state.resources.reputation = 40;
        choose(&mut state, &data, 2).unwrap();
        assert!((state.resources.food - 55.0).abs() < FLOAT_EPSILON);
        assert_eq!(state.resources.reputation, 10);
    }

    #[test]
    fn locked_and_unaffordable_choices_are_rejected() {
        let (mut state, data) = open("bandit_toll");
        assert_eq!(
            choose(&mut state, &data, 0),
            Err(GameError::PassengerRequired {
                choice: "guard_standoff".into(),
                kind: PassengerKind::Guard
            })
        );
        assert_eq!(
            choose(&mut state, &data, 1),
            Ok(ChoiceOutcome {
                choice_id: "pay_toll".into(),
                consequence: data.get("bandit_toll").unwrap().choices[1].consequence.clone(),
                food: 0.0,
                gold: -25,
                reputation: 0,
            })
        );

        let (mut state, data) = open("bandit_toll");
        state.resources.gold = 10;
        assert_eq!(
            choose(&mut state, &data, 1),
            Err(GameError::InsufficientGold {
                needed: 25,
                available: 10
            })
        );
        assert_eq!(
            choose(&mut state, &data, 2),
            Err(GameError::ChoiceLocked {
                choice: "intimidate".into(),
                flag: "reputation_5".into()
            })
        );
        state.resources.reputation = 5;
        assert!(choose(&mut state, &data, 2).is_ok());
    }

    #[test]
    fn close_requires_a_choice_unless_stranded() {
        let (mut state, data) = open("bandit_toll");
        assert_eq!(close_encounter(&mut state, &data), Err(GameError::NoChoiceMade));

        state.resources.gold = 0;
        assert_eq!(close_encounter(&mut state, &data), Ok(CloseOutcome::Resumed));
        assert_eq!(state.status, GameStatus::Playing);
    }

    #[test]
    fn haven_continue_starts_next_journey() {
        let (mut state, data) = open("haven_checkpoint");
        state.resources.progress = 97.0;
        state.resources.food = 20.0;
        choose(&mut state, &data, 0).unwrap();
        assert!((state.resources.food - 70.0).abs() < FLOAT_EPSILON);
        let outcome = close_encounter(&mut state, &data).unwrap();
        assert_eq!(outcome, CloseOutcome::JourneyContinued { journey: 2 });
        assert_eq!(state.resources.journey_count, 2);
        assert!(state.resources.progress.abs() < FLOAT_EPSILON);
        assert_eq!(state.theme, Theme::Neon);
        assert_eq!(state.status, GameStatus::Playing);
    }

    #[test]
    fn haven_retire_classifies_ending() {
        let (mut state, data) = open("haven_checkpoint");
        state.resources.gold = 400;
        state.resources.reputation = 2;
        choose(&mut state, &data, 1).unwrap();
        let outcome = close_encounter(&mut state, &data).unwrap();
        assert_eq!(outcome, CloseOutcome::Retired(VictoryKind::IronMonger));
        assert_eq!(state.status, GameStatus::Victory);
        let ending = state.ending.as_ref().unwrap();
        assert_eq!(ending.title, "THE IRON MONGER");
    }

    #[test]
    fn remove_passenger_action_drops_required_kind() {
        let json = r#"{ "encounters": [ { "id": "deserter", "title": "Deserter",
            "description": "A guard wants off.", "choices": [
              { "id": "let_go", "text": "Let them go", "consequence": "They leave.",
                "required_passenger": "guard", "action": "remove_passenger",
                "gains": { "reputation": 1 } } ] } ] }"#;
        let data = EncounterData::from_json(json).unwrap();
        let mut state = GameState::new(Features::for_variant(Variant::CaravanOnly));
        state.status = GameStatus::Playing;
        board(&mut state, PassengerKind::Cook);
        board(&mut state, PassengerKind::Guard);
        open_encounter(&mut state, &data, "deserter").unwrap();
        choose(&mut state, &data, 0).unwrap();
        let outcome = close_encounter(&mut state, &data).unwrap();
        let CloseOutcome::PassengerRemoved(Some(removed)) = outcome else {
            panic!("expected a removal, got {outcome:?}");
        };
        assert_eq!(removed.kind, PassengerKind::Guard);
        assert_eq!(state.resources.passengers.len(), 1);
    }
}
