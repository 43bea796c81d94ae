use std::collections::HashSet;

use caravan_game::{ChoiceAction, EncounterData, NpcKind, Requirement};

fn bundled() -> EncounterData {
    EncounterData::bundled().expect("bundled catalog parses")
}

#[test]
fn catalog_ids_are_unique() {
    let data = bundled();
    let mut seen = HashSet::new();
    for encounter in &data.encounters {
        assert!(seen.insert(encounter.id.as_str()), "duplicate {}", encounter.id);
        let mut choice_ids = HashSet::new();
        for choice in &encounter.choices {
            assert!(
                choice_ids.insert(choice.id.as_str()),
                "duplicate choice {} in {}",
                choice.id,
                encounter.id
            );
        }
    }
}

#[test]
fn every_encounter_is_playable() {
    for encounter in &bundled().encounters {
        assert!(!encounter.title.is_empty(), "{} has no title", encounter.id);
        assert!(
            (1..=9).contains(&encounter.choices.len()),
            "{} needs between one and nine choices",
            encounter.id
        );
        assert!(encounter.npc_kind.opens_encounter(), "{} uses a pickup sprite", encounter.id);
        for choice in &encounter.choices {
            assert!(!choice.text.is_empty());
            assert!(choice.costs.food >= 0 && choice.costs.gold >= 0 && choice.costs.reputation >= 0);
            for requirement in choice.requirements() {
                if let Requirement::Renown(min) = requirement {
                    assert!(min > 0, "{} has a trivial renown gate", choice.id);
                }
            }
        }
    }
}

#[test]
fn scripted_stops_stay_out_of_the_spawn_pool() {
    let data = bundled();
    let pool: HashSet<&str> = data.spawn_pool().into_iter().map(|(id, _)| id).collect();
    assert!(!pool.contains("waystation"));
    assert!(!pool.contains("haven_checkpoint"));
    assert!(pool.len() >= 5);

    let haven = data.get("haven_checkpoint").unwrap();
    assert_eq!(haven.npc_kind, NpcKind::Haven);
    let actions: Vec<_> = haven.choices.iter().filter_map(|choice| choice.action).collect();
    assert!(actions.contains(&ChoiceAction::ContinueJourney));
    assert!(actions.contains(&ChoiceAction::EndJourney));
}

#[test]
fn digest_tracks_content_not_parse() {
    let first = bundled();
    let second = bundled();
    assert_eq!(first.digest(), second.digest());

    let mut edited = bundled();
    edited.encounters[0].choices[0].gains.gold += 1;
    assert_ne!(first.digest(), edited.digest());
}
