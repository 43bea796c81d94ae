use std::fmt;

use caravan_game::resources::passenger_capacity;
use caravan_game::{Choice, Encounter, GameState, VehicleKind, availability};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub choice_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(choice_index: usize, rationale: Option<String>) -> Self {
        Self {
            choice_index,
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select one of the choices the caravan can currently take.
    ///
    /// Returns `None` only when no choice is available.
    fn pick_choice(&mut self, state: &GameState, encounter: &Encounter) -> Option<PolicyDecision>;

    /// Vehicle to switch to while the hangar is open.
    fn pick_vehicle(&mut self, _state: &GameState) -> Option<VehicleKind> {
        None
    }
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Conservative,
    Aggressive,
    Balanced,
    Hoarder,
    Wanderer,
}

impl GameplayStrategy {
    pub const ALL: [Self; 5] = [
        Self::Conservative,
        Self::Aggressive,
        Self::Balanced,
        Self::Hoarder,
        Self::Wanderer,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Conservative => "Conservative",
            Self::Aggressive => "Aggressive",
            Self::Balanced => "Balanced",
            Self::Hoarder => "Hoarder",
            Self::Wanderer => "Wanderer",
        }
    }

    /// Whether the pilot should steer into trouble rather than around it.
    #[must_use]
    pub const fn seeks_encounters(self) -> bool {
        matches!(self, Self::Aggressive | Self::Balanced | Self::Wanderer)
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Conservative => Box::new(ConservativePolicy),
            Self::Aggressive => Box::new(AggressivePolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Hoarder => Box::new(HoarderPolicy),
            Self::Wanderer => Box::new(WandererPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for GameplayStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.label().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

struct ConservativePolicy;
struct AggressivePolicy;
struct BalancedPolicy;
struct HoarderPolicy;

struct WandererPolicy {
    rng: ChaCha20Rng,
}

impl WandererPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

fn open_choices<'a>(state: &GameState, encounter: &'a Encounter) -> Vec<(usize, &'a Choice)> {
    encounter
        .choices
        .iter()
        .enumerate()
        .filter(|(_, choice)| {
            availability(choice, &state.resources, &state.flags).is_available()
        })
        .collect()
}

fn best_by<F>(state: &GameState, encounter: &Encounter, label: &str, score: F) -> Option<PolicyDecision>
where
    F: Fn(&GameState, &Choice) -> i32,
{
    open_choices(state, encounter)
        .into_iter()
        .map(|(idx, choice)| (idx, score(state, choice)))
        .max_by_key(|(_, value)| *value)
        .map(|(idx, value)| PolicyDecision::new(idx, Some(format!("{label} {value}"))))
}

impl PlayerPolicy for ConservativePolicy {
    fn name(&self) -> &'static str {
        "Conservative"
    }

    fn pick_choice(&mut self, state: &GameState, encounter: &Encounter) -> Option<PolicyDecision> {
        best_by(state, encounter, "risk", |state, choice| -risk(state, choice))
    }
}

impl PlayerPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "Aggressive"
    }

    fn pick_choice(&mut self, state: &GameState, encounter: &Encounter) -> Option<PolicyDecision> {
        best_by(state, encounter, "reward", |_, choice| reward(choice))
    }

    fn pick_vehicle(&mut self, state: &GameState) -> Option<VehicleKind> {
        let seated = state.resources.passengers.len();
        VehicleKind::ALL
            .into_iter()
            .filter(|kind| passenger_capacity(*kind, &state.flags) >= seated)
            .filter(|kind| kind.is_owned(&state.flags) || kind.spec().cost <= state.resources.gold)
            .max_by(|a, b| a.spec().speed.total_cmp(&b.spec().speed))
            .filter(|kind| *kind != state.resources.vehicle)
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_choice(&mut self, state: &GameState, encounter: &Encounter) -> Option<PolicyDecision> {
        best_by(state, encounter, "score", |_, choice| {
            net(choice) - if choice.theft { 10 } else { 0 }
        })
    }

    fn pick_vehicle(&mut self, state: &GameState) -> Option<VehicleKind> {
        let seats = passenger_capacity(state.resources.vehicle, &state.flags);
        if state.resources.has_free_seat(&state.flags) {
            return None;
        }
        VehicleKind::ALL
            .into_iter()
            .filter(|kind| passenger_capacity(*kind, &state.flags) > seats)
            .filter(|kind| kind.is_owned(&state.flags) || kind.spec().cost <= state.resources.gold)
            .min_by_key(|kind| kind.spec().cost)
    }
}

impl PlayerPolicy for HoarderPolicy {
    fn name(&self) -> &'static str {
        "Hoarder"
    }

    fn pick_choice(&mut self, state: &GameState, encounter: &Encounter) -> Option<PolicyDecision> {
        best_by(state, encounter, "hoard", |state, choice| {
            let food = choice.gains.food - choice.costs.food;
            let gold = choice.gains.gold - choice.costs.gold;
            if state.resources.food < 30.0 {
                food * 3 + gold
            } else {
                gold * 2 + food
            }
        })
    }
}

impl PlayerPolicy for WandererPolicy {
    fn name(&self) -> &'static str {
        "Wanderer"
    }

    fn pick_choice(&mut self, state: &GameState, encounter: &Encounter) -> Option<PolicyDecision> {
        let open = open_choices(state, encounter);
        if open.is_empty() {
            return None;
        }
        let pick = self.rng.gen_range(0..open.len());
        let (idx, _) = open[pick];
        Some(PolicyDecision::new(idx, Some(format!("rolled {pick}"))))
    }
}

fn risk(state: &GameState, choice: &Choice) -> i32 {
    let hunger = if state.resources.food < 40.0 { 3 } else { 1 };
    let mut risk = choice.costs.food * hunger + choice.costs.gold + choice.costs.reputation * 2;
    if choice.theft {
        risk += 20;
    }
    risk
}

fn reward(choice: &Choice) -> i32 {
    choice.gains.food + choice.gains.gold + choice.gains.reputation * 3
}

fn net(choice: &Choice) -> i32 {
    (choice.gains.food - choice.costs.food)
        + (choice.gains.gold - choice.costs.gold)
        + (choice.gains.reputation - choice.costs.reputation) * 2
}
