//! The ordered per-frame update.
//!
//! Every phase works on the same `&mut GameState`, so later phases always see
//! what earlier phases did in this frame: collisions use the moved player, the
//! spawner sees the culled road.
use log::{debug, info, warn};

use crate::audio::SoundCue;
use crate::combat::{ControlMode, update_bullets};
use crate::config::GameConfig;
use crate::constants::{
    BANDIT_AMBUSH_FOOD, COIN_VALUE, FRAME_MS, LOG_BANDIT_AMBUSH, LOG_COIN_COLLECTED,
    LOG_GAME_OVER, LOG_LIFE_LOST, LOG_MYSTERY_OPENED, MAX_PROGRESS, MOVING_DRAIN_FACTOR,
    PLAYER_EDGE_MARGIN_X, PLAYER_EDGE_MARGIN_Y, POINTER_EASE, PROGRESS_DIVISOR, REVIVE_FOOD,
    SCROLL_WRAP,
};
use crate::data::EncounterData;
use crate::encounter::open_encounter;
use crate::ending::{EndSummary, Ending};
use crate::input::{Direction, InputState};
use crate::npc::NpcKind;
use crate::passengers::{PassengerKind, boosted_gold_gain};
use crate::rng::RngStreams;
use crate::spawner::update_spawner;
use crate::state::{GameEvent, GameState, GameStatus};

/// Borrowed read-only context for a frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub config: &'a GameConfig,
    pub data: &'a EncounterData,
}

/// Run one fixed-length frame. Does nothing unless the road is live.
pub fn step_frame(
    state: &mut GameState,
    input: &InputState,
    ctx: FrameContext<'_>,
    streams: &mut RngStreams,
) {
    if state.status != GameStatus::Playing {
        return;
    }
    state.frame += 1;

    move_player(state, input, ctx.config);
    drain_food(state, input, ctx.config);
    if state.status == GameStatus::GameOver {
        return;
    }
    advance_progress(state, ctx.config);
    scroll_road(state, ctx.config);
    resolve_collision(state, ctx.data, ctx.config);
    if state.features.walking_mode {
        update_bullets(state, input.fire_held(), &ctx.config.world);
    }
    update_spawner(state, ctx.config, ctx.data, streams);
    state.age_notifications(FRAME_MS);
    state.resources.recompute_score();

    if state.frame % 600 == 0 {
        debug!(
            "frame {}: journey {} progress {:.1} food {:.1} npcs {}",
            state.frame,
            state.resources.journey_count,
            state.resources.progress,
            state.resources.food,
            state.npcs.len()
        );
    }
}

fn move_player(state: &mut GameState, input: &InputState, config: &GameConfig) {
    let speed = match state.mode {
        ControlMode::Walking => config.tuning.walk_speed,
        ControlMode::Caravan => config.tuning.player_speed * state.resources.vehicle.spec().speed,
    };
    let (dx, dy) = input.movement();
    state.player.x += dx * speed;
    state.player.y += dy * speed;

    if dx != 0.0 {
        state.facing = if dx > 0.0 { Direction::Right } else { Direction::Left };
    } else if dy != 0.0 {
        state.facing = if dy > 0.0 { Direction::Down } else { Direction::Up };
    }

    if state.features.pointer_steering
        && let Some(target) = input.pointer_x
    {
        state.player.x += (target - state.player.x) * POINTER_EASE;
    }

    let world = &config.world;
    state.player.x = state
        .player
        .x
        .clamp(PLAYER_EDGE_MARGIN_X, world.width - PLAYER_EDGE_MARGIN_X);
    state.player.y = state.player.y.clamp(
        world.road_top + PLAYER_EDGE_MARGIN_Y,
        world.road_bottom - PLAYER_EDGE_MARGIN_Y,
    );
}

fn drain_food(state: &mut GameState, input: &InputState, config: &GameConfig) {
    let moving = if input.is_moving() {
        MOVING_DRAIN_FACTOR
    } else {
        1.0
    };
    let multiplier =
        state
            .resources
            .drain_multiplier(&state.flags, state.mode, state.active_theme());
    state
        .resources
        .add_food(-(config.tuning.food_drain_rate * moving * multiplier));

    if state.resources.food > 0.0 {
        return;
    }
    if state.resources.lives > 1 {
        state.resources.lives -= 1;
        state.resources.food = REVIVE_FOOD;
        state.cue(SoundCue::Hurt);
        state.log(LOG_LIFE_LOST);
        let lives = state.resources.lives;
        state.notify(format!("Starving! {lives} lives left"));
        info!("life lost, {lives} remaining");
    } else {
        state.resources.lives = 0;
        state.resources.recompute_score();
        state.ending = Some(EndSummary::new(Ending::Starved, &state.resources));
        state.cue(SoundCue::GameOver);
        state.log(LOG_GAME_OVER);
        state.set_status(GameStatus::GameOver);
        info!("game over after {} frames", state.frame);
    }
}

fn advance_progress(state: &mut GameState, config: &GameConfig) {
    let step = config.tuning.scroll_speed * state.resources.vehicle.spec().speed / PROGRESS_DIVISOR;
    state.resources.progress = (state.resources.progress + step).min(MAX_PROGRESS);
    state.resources.recompute_score();
}

fn scroll_road(state: &mut GameState, config: &GameConfig) {
    let scroll = config.tuning.scroll_speed;
    state.scroll_offset = (state.scroll_offset + scroll) % SCROLL_WRAP;
    for npc in &mut state.npcs {
        npc.advance(scroll);
    }
    state.npcs.retain(crate::npc::Npc::in_bounds);
}

fn resolve_collision(state: &mut GameState, data: &EncounterData, config: &GameConfig) {
    let range = config.tuning.collision_range;
    let player = state.player;
    let Some(index) = state
        .npcs
        .iter()
        .position(|npc| npc.kind != NpcKind::Person && npc.overlaps(player, range))
    else {
        return;
    };
    let npc = state.npcs.remove(index);

    match npc.kind {
        NpcKind::Coin => {
            let gold = boosted_gold_gain(
                COIN_VALUE,
                state.resources.has_passenger(PassengerKind::Merchant),
            );
            state.resources.add_gold(gold);
            state.coins_collected += 1;
            state.cue(SoundCue::Coin);
            state.log(LOG_COIN_COLLECTED);
            state.emit(GameEvent::CoinCollected { gold });
            state.notify(format!("+{gold} gold"));
        }
        NpcKind::Mystery => {
            if state.features.lottery {
                state.cue(SoundCue::Spin);
                state.log(LOG_MYSTERY_OPENED);
                state.set_status(GameStatus::Lottery);
                info!("mystery box opened");
            }
        }
        NpcKind::Bandit if state.mode == ControlMode::Walking => {
            state.resources.add_food(-BANDIT_AMBUSH_FOOD);
            state.cue(SoundCue::Hurt);
            state.log(LOG_BANDIT_AMBUSH);
            state.notify(format!("Ambushed! -{BANDIT_AMBUSH_FOOD:.0} food"));
        }
        _ => {
            if let Err(err) = open_encounter(state, data, &npc.encounter_id) {
                warn!("collision with npc {} ignored: {err}", npc.id);
            }
        }
    }
}
