use caravan_game::{ControlMode, GameState, InputState, Npc, NpcKind};

use super::policy::GameplayStrategy;

/// Vertical distance at which the pilot stops correcting.
const DEADBAND: f32 = 3.0;
/// How far ahead a bandit counts as a threat worth dodging.
const DODGE_LOOKAHEAD: f32 = 300.0;
const DODGE_CLEARANCE: f32 = 60.0;
const FIRE_WINDOW: f32 = 20.0;

/// Turns the road ahead into held keys, one frame at a time.
#[derive(Debug, Clone, Copy)]
pub struct Pilot {
    strategy: GameplayStrategy,
}

impl Pilot {
    #[must_use]
    pub const fn new(strategy: GameplayStrategy) -> Self {
        Self { strategy }
    }

    #[must_use]
    pub fn steer(&self, state: &GameState) -> InputState {
        let mut input = InputState::new();
        let player = state.player;

        if let Some(target_y) = self.target_y(state) {
            if target_y < player.y - DEADBAND {
                input.key_down("w");
            } else if target_y > player.y + DEADBAND {
                input.key_down("s");
            }
        }

        if state.mode == ControlMode::Walking
            && ahead(state)
                .any(|npc| npc.kind == NpcKind::Bandit && (npc.y - player.y).abs() < FIRE_WINDOW)
        {
            input.key_down("f");
        }
        input
    }

    fn target_y(&self, state: &GameState) -> Option<f32> {
        if let Some(haven) = nearest(state, |npc| npc.kind == NpcKind::Haven) {
            return Some(haven.y);
        }
        if !self.strategy.seeks_encounters()
            && let Some(bandit) = nearest(state, |npc| npc.kind == NpcKind::Bandit)
            && bandit.x - state.player.x < DODGE_LOOKAHEAD
            && (bandit.y - state.player.y).abs() < DODGE_CLEARANCE
        {
            let away = if bandit.y >= state.player.y { -1.0 } else { 1.0 };
            return Some(state.player.y + away * DODGE_CLEARANCE);
        }
        if state.resources.has_free_seat(&state.flags)
            && let Some(person) = nearest(state, |npc| npc.kind == NpcKind::Person)
        {
            return Some(person.y);
        }
        if let Some(pickup) = nearest(state, |npc| npc.kind.is_pickup()) {
            return Some(pickup.y);
        }
        if self.strategy.seeks_encounters() {
            return nearest(state, |npc| npc.kind.opens_encounter()).map(|npc| npc.y);
        }
        None
    }
}

fn ahead(state: &GameState) -> impl Iterator<Item = &Npc> {
    let x = state.player.x;
    state.npcs.iter().filter(move |npc| npc.x > x - 10.0)
}

fn nearest(state: &GameState, pred: impl Fn(&Npc) -> bool) -> Option<&Npc> {
    ahead(state)
        .filter(|npc| pred(npc))
        .min_by(|a, b| a.x.total_cmp(&b.x))
}
