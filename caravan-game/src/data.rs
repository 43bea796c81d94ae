use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::npc::NpcKind;
use crate::passengers::PassengerKind;

const BUNDLED_ENCOUNTERS: &str = include_str!("../assets/data/encounters.json");
const RENOWN_FLAG_PREFIX: &str = "reputation_";

/// Resource deltas carried by a choice, either as costs or as gains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ledger {
    #[serde(default)]
    pub food: i32,
    #[serde(default)]
    pub gold: i32,
    #[serde(default)]
    pub reputation: i32,
}

impl Ledger {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.food == 0 && self.gold == 0 && self.reputation == 0
    }
}

/// Follow-up applied when the consequence panel is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceAction {
    ContinueJourney,
    EndJourney,
    RemovePassenger,
}

/// What a choice needs before it can be picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement<'a> {
    /// A permanent flag must have been set earlier in the run.
    Flag(&'a str),
    /// Renown must be at least this value (`reputation_<n>` flags).
    Renown(i32),
    /// A passenger of this kind must be aboard.
    Passenger(PassengerKind),
}

/// A choice within an encounter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
    pub consequence: String,
    #[serde(default)]
    pub costs: Ledger,
    #[serde(default)]
    pub gains: Ledger,
    #[serde(default)]
    pub flag_to_set: Option<String>,
    #[serde(default)]
    pub required_flag: Option<String>,
    #[serde(default)]
    pub required_passenger: Option<PassengerKind>,
    #[serde(default)]
    pub action: Option<ChoiceAction>,
    /// Theft choices never receive the guard's food bonus.
    #[serde(default)]
    pub theft: bool,
    #[serde(default)]
    pub color: Option<String>,
}

impl Choice {
    /// Every requirement attached to this choice, flag requirements first.
    #[must_use]
    pub fn requirements(&self) -> Vec<Requirement<'_>> {
        let mut out = Vec::with_capacity(2);
        if let Some(flag) = self.required_flag.as_deref() {
            out.push(parse_flag_requirement(flag));
        }
        if let Some(kind) = self.required_passenger {
            out.push(Requirement::Passenger(kind));
        }
        out
    }
}

/// Interpret a required flag, recognising the synthetic renown thresholds.
#[must_use]
pub fn parse_flag_requirement(flag: &str) -> Requirement<'_> {
    flag.strip_prefix(RENOWN_FLAG_PREFIX)
        .and_then(|n| n.parse::<i32>().ok())
        .map_or(Requirement::Flag(flag), Requirement::Renown)
}

/// An encounter in the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default = "default_npc_kind")]
    pub npc_kind: NpcKind,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default = "default_spawnable")]
    pub spawnable: bool,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

const fn default_npc_kind() -> NpcKind {
    NpcKind::Trader
}

const fn default_weight() -> u32 {
    5
}

const fn default_spawnable() -> bool {
    true
}

impl Encounter {
    #[must_use]
    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.id == choice_id)
    }
}

/// Container for all encounter data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EncounterData {
    pub encounters: Vec<Encounter>,
}

impl EncounterData {
    /// Create empty encounter data (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self {
            encounters: Vec::new(),
        }
    }

    /// Load encounter data from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid encounter data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Create encounter data from pre-parsed encounters
    #[must_use]
    pub fn from_encounters(encounters: Vec<Encounter>) -> Self {
        Self { encounters }
    }

    /// The catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled asset no longer parses.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        Self::from_json(BUNDLED_ENCOUNTERS)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Encounter> {
        self.encounters.iter().find(|encounter| encounter.id == id)
    }

    /// Encounters eligible for the random spawn table, with their weights.
    #[must_use]
    pub fn spawn_pool(&self) -> Vec<(&str, u32)> {
        self.encounters
            .iter()
            .filter(|encounter| encounter.spawnable && encounter.weight > 0)
            .map(|encounter| (encounter.id.as_str(), encounter.weight))
            .collect()
    }

    /// Stable digest of the catalog, used to pin content versions in reports.
    #[must_use]
    pub fn digest(&self) -> u64 {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&canonical);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_has_every_encounter() {
        let data = EncounterData::bundled().unwrap();
        for id in [
            "strange_traveler",
            "hungry_merchant",
            "bandit_toll",
            "mystic_oracle",
            "food_cart",
            "rival_caravan",
            "master_artisan",
            "mysterious_gambler",
            "merchant_convoy",
            "waystation",
            "haven_checkpoint",
        ] {
            assert!(data.get(id).is_some(), "missing encounter {id}");
        }
    }

    #[test]
    fn scripted_encounters_stay_out_of_spawn_pool() {
        let data = EncounterData::bundled().unwrap();
        let pool: Vec<&str> = data.spawn_pool().into_iter().map(|(id, _)| id).collect();
        assert_eq!(pool.len(), 9);
        assert!(!pool.contains(&"waystation"));
        assert!(!pool.contains(&"haven_checkpoint"));
    }

    #[test]
    fn renown_flags_parse_as_thresholds() {
        assert_eq!(parse_flag_requirement("reputation_15"), Requirement::Renown(15));
        assert_eq!(
            parse_flag_requirement("axle_upgrade"),
            Requirement::Flag("axle_upgrade")
        );
        assert_eq!(
            parse_flag_requirement("reputation_high"),
            Requirement::Flag("reputation_high")
        );
    }

    #[test]
    fn encounter_from_json_uses_defaults() {
        let json = r#"{
            "encounters": [
                {
                    "id": "test1",
                    "title": "Test Encounter",
                    "description": "A test encounter",
                    "choices": [
                        { "id": "c1", "text": "Do something", "consequence": "Done",
                          "costs": { "food": 3 }, "gains": { "gold": 2 } }
                    ]
                }
            ]
        }"#;

        let data = EncounterData::from_json(json).unwrap();
        let encounter = &data.encounters[0];
        assert_eq!(encounter.weight, 5);
        assert!(encounter.spawnable);
        assert_eq!(encounter.npc_kind, NpcKind::Trader);
        assert_eq!(encounter.choices[0].costs.food, 3);
        assert_eq!(encounter.choices[0].gains.gold, 2);
        assert!(encounter.choices[0].requirements().is_empty());
    }

    #[test]
    fn digest_changes_with_content() {
        let data = EncounterData::bundled().unwrap();
        let mut edited = data.clone();
        edited.encounters[0].weight += 1;
        assert_eq!(data.digest(), data.clone().digest());
        assert_ne!(data.digest(), edited.digest());
    }
}
