//! Walking mode and the shooting mechanic.
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::audio::SoundCue;
use crate::config::WorldConfig;
use crate::constants::{
    BANDIT_BOUNTY, BANDIT_SCORE_BONUS, BULLET_COOLDOWN_FRAMES, BULLET_HIT_RANGE, BULLET_SPEED,
    LOG_BANDIT_DOWN, LOG_MODE_CHANGED, MAX_LIVE_BULLETS,
};
use crate::error::GameError;
use crate::input::Direction;
use crate::npc::NpcKind;
use crate::passengers::{PassengerKind, boosted_gold_gain};
use crate::state::{GameEvent, GameState, GameStatus, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    #[default]
    Caravan,
    Walking,
}

impl ControlMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Caravan => "caravan",
            Self::Walking => "walking",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Caravan => Self::Walking,
            Self::Walking => Self::Caravan,
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl Bullet {
    #[must_use]
    pub fn fired(id: u64, origin: Point, facing: Direction) -> Self {
        let (dx, dy) = facing.delta();
        Self {
            id,
            x: origin.x,
            y: origin.y,
            vx: dx * BULLET_SPEED,
            vy: dy * BULLET_SPEED,
        }
    }

    pub fn advance(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
    }

    #[must_use]
    pub fn in_world(&self, world: &WorldConfig) -> bool {
        (0.0..=world.width).contains(&self.x) && (0.0..=world.height).contains(&self.y)
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Switch between driving and walking.
///
/// # Errors
///
/// Fails when walking is not part of the variant or the road is not active.
pub fn toggle_mode(state: &mut GameState) -> Result<ControlMode, GameError> {
    if !state.features.walking_mode {
        return Err(GameError::FeatureDisabled("walking_mode"));
    }
    if state.status != GameStatus::Playing {
        return Err(GameError::WrongStatus {
            expected: GameStatus::Playing,
            actual: state.status,
        });
    }
    state.mode = state.mode.toggled();
    state.fire_cooldown = 0;
    state.log(LOG_MODE_CHANGED);
    state.cue(SoundCue::Select);
    let mode = state.mode;
    state.notify(format!("Now {mode}"));
    Ok(mode)
}

/// Per-frame bullet phase: fire, move, cull and resolve hits on bandits.
pub(crate) fn update_bullets(state: &mut GameState, fire_held: bool, world: &WorldConfig) {
    state.fire_cooldown = state.fire_cooldown.saturating_sub(1);

    if state.mode == ControlMode::Walking
        && fire_held
        && state.fire_cooldown == 0
        && state.bullets.len() < MAX_LIVE_BULLETS
    {
        let id = state.next_id();
        let bullet = Bullet::fired(id, state.player, state.facing);
        state.bullets.push(bullet);
        state.fire_cooldown = BULLET_COOLDOWN_FRAMES;
        state.cue(SoundCue::Shoot);
    }

    for bullet in &mut state.bullets {
        bullet.advance();
    }
    state.bullets.retain(|bullet| bullet.in_world(world));

    let mut spent = Vec::new();
    let mut downed = Vec::new();
    for bullet in &state.bullets {
        let target = state.npcs.iter().find(|npc| {
            npc.kind == NpcKind::Bandit
                && !downed.contains(&npc.id)
                && npc.overlaps(bullet.position(), BULLET_HIT_RANGE)
        });
        if let Some(npc) = target {
            spent.push(bullet.id);
            downed.push(npc.id);
        }
    }
    if downed.is_empty() {
        return;
    }

    state.bullets.retain(|bullet| !spent.contains(&bullet.id));
    state.npcs.retain(|npc| !downed.contains(&npc.id));
    let has_merchant = state.resources.has_passenger(PassengerKind::Merchant);
    for _ in &downed {
        let bounty = boosted_gold_gain(BANDIT_BOUNTY, has_merchant);
        state.resources.add_gold(bounty);
        state.resources.score_bonus += BANDIT_SCORE_BONUS;
        state.bandits_downed += 1;
        state.log(LOG_BANDIT_DOWN);
        state.emit(GameEvent::BanditDowned { bounty });
        state.notify(format!("Bandit down! +{bounty} gold"));
        debug!("bandit downed, bounty {bounty}");
    }
    state.resources.recompute_score();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Features, Variant};
    use crate::npc::Npc;

    fn walking_state() -> GameState {
        let mut state = GameState::new(Features::for_variant(Variant::Expanded));
        state.status = GameStatus::Playing;
        state.mode = ControlMode::Walking;
        state
    }

    #[test]
    fn toggle_requires_feature_and_play() {
        let mut state = GameState::new(Features::for_variant(Variant::CaravanOnly));
        state.status = GameStatus::Playing;
        assert_eq!(
            toggle_mode(&mut state),
            Err(GameError::FeatureDisabled("walking_mode"))
        );

        let mut state = GameState::new(Features::for_variant(Variant::Expanded));
        assert!(matches!(
            toggle_mode(&mut state),
            Err(GameError::WrongStatus { .. })
        ));
        state.status = GameStatus::Playing;
        assert_eq!(toggle_mode(&mut state), Ok(ControlMode::Walking));
        assert_eq!(toggle_mode(&mut state), Ok(ControlMode::Caravan));
    }

    #[test]
    fn firing_respects_cooldown() {
        let mut state = walking_state();
        let world = WorldConfig::default();
        update_bullets(&mut state, true, &world);
        assert_eq!(state.bullets.len(), 1);
        update_bullets(&mut state, true, &world);
        assert_eq!(state.bullets.len(), 1);
        for _ in 0..BULLET_COOLDOWN_FRAMES {
            update_bullets(&mut state, true, &world);
        }
        assert_eq!(state.bullets.len(), 2);
    }

    #[test]
    fn driving_never_fires() {
        let mut state = walking_state();
        state.mode = ControlMode::Caravan;
        update_bullets(&mut state, true, &WorldConfig::default());
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn bullets_down_bandits_for_bounty() {
        let mut state = walking_state();
        let start_gold = state.resources.gold;
        let at = Point::new(state.player.x + BULLET_SPEED * 2.0, state.player.y);
        state
            .npcs
            .push(Npc::encounter(99, at, NpcKind::Bandit, "bandit_toll", 1.0));
        state.bullets.push(Bullet::fired(7, state.player, Direction::Right));

        update_bullets(&mut state, false, &WorldConfig::default());

        assert!(state.npcs.is_empty());
        assert!(state.bullets.is_empty());
        assert_eq!(state.resources.gold, start_gold + BANDIT_BOUNTY);
        assert_eq!(state.resources.score_bonus, BANDIT_SCORE_BONUS);
        assert_eq!(state.bandits_downed, 1);
        assert!(state.journal.iter().any(|key| key == LOG_BANDIT_DOWN));
    }

    #[test]
    fn bullets_leave_the_world() {
        let mut state = walking_state();
        state
            .bullets
            .push(Bullet::fired(1, Point::new(1_195.0, 300.0), Direction::Right));
        update_bullets(&mut state, false, &WorldConfig::default());
        assert!(state.bullets.is_empty());
    }
}
