//! What appears on the road, and when.
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{Features, GameConfig, SpawnTable, WorldConfig};
use crate::constants::{
    FRAME_MS, HAVEN_PROGRESS, NPC_LANE_PADDING, NPC_SPAWN_OFFSET_X, PERSON_CUTOFF_PROGRESS,
    SPAWN_CUTOFF_PROGRESS, SPEED_MULTIPLIER_MIN, SPEED_MULTIPLIER_SPAN, WAYSTATION_WINDOW,
};
use crate::data::EncounterData;
use crate::npc::Npc;
use crate::passengers::Passenger;
use crate::rng::RngStreams;
use crate::state::{GameState, Point};

pub const WAYSTATION_ID: &str = "waystation";
pub const HAVEN_ID: &str = "haven_checkpoint";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnKind {
    Encounter,
    Person,
    Coin,
    Mystery,
}

/// Pick one option with probability proportional to its weight.
pub fn weighted_pick<T, R>(options: &[(T, u32)], rng: &mut R) -> Option<T>
where
    R: Rng + ?Sized,
    T: Clone,
{
    let total_weight: u32 = options.iter().map(|(_, weight)| *weight).sum();
    if total_weight == 0 {
        return None;
    }

    let roll = rng.gen_range(0..total_weight);
    let mut current_weight = 0;
    for (item, weight) in options {
        current_weight += weight;
        if roll < current_weight {
            return Some(item.clone());
        }
    }
    options.first().map(|(item, _)| item.clone())
}

/// Spawn kinds on offer at `progress`, with their weights.
#[must_use]
pub fn spawn_options(table: SpawnTable, progress: f32, features: Features) -> Vec<(SpawnKind, u32)> {
    let mut options = vec![(SpawnKind::Encounter, table.encounter)];
    if progress < PERSON_CUTOFF_PROGRESS {
        options.push((SpawnKind::Person, table.person));
    }
    if features.coins {
        options.push((SpawnKind::Coin, table.coin));
    }
    if features.mystery_boxes && features.lottery {
        options.push((SpawnKind::Mystery, table.mystery));
    }
    options.retain(|(_, weight)| *weight > 0);
    options
}

/// Encounter to place for a random encounter spawn, with scripted overrides.
pub fn pick_encounter<R: Rng + ?Sized>(
    state: &GameState,
    data: &EncounterData,
    rng: &mut R,
) -> Option<String> {
    let progress = state.resources.progress;
    let (low, high) = WAYSTATION_WINDOW;
    if progress > low
        && progress < high
        && data.get(WAYSTATION_ID).is_some()
        && !state.has_encounter_on_road(WAYSTATION_ID)
    {
        return Some(WAYSTATION_ID.to_string());
    }
    let pool = data.spawn_pool();
    weighted_pick(&pool, rng).map(str::to_string)
}

/// Random lane position just off the right edge of the world.
pub fn spawn_position<R: Rng + ?Sized>(world: &WorldConfig, rng: &mut R) -> Point {
    let lane = world.road_bottom - world.road_top - NPC_LANE_PADDING;
    let offset = if lane > 0.0 {
        rng.gen_range(0.0..lane)
    } else {
        0.0
    };
    Point::new(world.width + NPC_SPAWN_OFFSET_X, world.road_top + offset)
}

fn speed_multiplier<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    SPEED_MULTIPLIER_MIN + rng.gen_range(0.0..SPEED_MULTIPLIER_SPAN)
}

/// Per-frame spawn phase.
pub(crate) fn update_spawner(
    state: &mut GameState,
    config: &GameConfig,
    data: &EncounterData,
    streams: &mut RngStreams,
) {
    state.spawn_timer_ms += FRAME_MS;
    if state.spawn_timer_ms <= config.spawn.interval_ms(state.resources.journey_count) {
        return;
    }
    state.spawn_timer_ms = 0.0;

    if state.resources.progress >= HAVEN_PROGRESS {
        if !state.has_encounter_on_road(HAVEN_ID) {
            spawn_encounter(state, config, data, HAVEN_ID, streams);
        }
        return;
    }
    if state.resources.progress >= SPAWN_CUTOFF_PROGRESS {
        return;
    }

    let options = spawn_options(config.spawn_table(), state.resources.progress, state.features);
    let Some(kind) = weighted_pick(&options, streams.spawn()) else {
        return;
    };
    match kind {
        SpawnKind::Encounter => {
            if let Some(encounter_id) = pick_encounter(state, data, streams.spawn()) {
                spawn_encounter(state, config, data, &encounter_id, streams);
            }
        }
        SpawnKind::Person => {
            let at = spawn_position(&config.world, streams.spawn());
            let speed = speed_multiplier(streams.spawn());
            let passenger_id = state.next_id();
            let passenger = Passenger::roll(passenger_id, streams.passenger());
            let id = state.next_id();
            debug!("spawned {} ({}) at y={:.0}", passenger.name, passenger.kind, at.y);
            state.npcs.push(Npc::person(id, at, passenger, speed));
        }
        SpawnKind::Coin => {
            let at = spawn_position(&config.world, streams.spawn());
            let speed = speed_multiplier(streams.spawn());
            let id = state.next_id();
            state.npcs.push(Npc::coin(id, at, speed));
        }
        SpawnKind::Mystery => {
            let at = spawn_position(&config.world, streams.spawn());
            let speed = speed_multiplier(streams.spawn());
            let id = state.next_id();
            state.npcs.push(Npc::mystery(id, at, speed));
        }
    }
}

fn spawn_encounter(
    state: &mut GameState,
    config: &GameConfig,
    data: &EncounterData,
    encounter_id: &str,
    streams: &mut RngStreams,
) {
    let Some(encounter) = data.get(encounter_id) else {
        warn!("cannot spawn unknown encounter {encounter_id}");
        return;
    };
    let at = spawn_position(&config.world, streams.spawn());
    let speed = speed_multiplier(streams.spawn());
    let id = state.next_id();
    debug!("spawned encounter {encounter_id} at y={:.0}", at.y);
    state
        .npcs
        .push(Npc::encounter(id, at, encounter.npc_kind, encounter_id, speed));
}
