//! Game configuration: variant selection, world geometry, tuning and spawn tables.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    COLLISION_RANGE, FOOD_DRAIN_RATE, INTERACTION_RANGE, PLAYER_SPEED, ROAD_BOTTOM, ROAD_TOP,
    SCROLL_SPEED, SPAWN_BASE_INTERVAL_MS, SPAWN_JOURNEY_STEP_MS, SPAWN_MIN_INTERVAL_MS,
    WALK_SPEED, WORLD_HEIGHT, WORLD_WIDTH,
};
use crate::error::ConfigError;

/// Which edition of the game is being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    CaravanOnly,
    #[default]
    Expanded,
}

impl Variant {
    pub const ALL: [Self; 2] = [Self::CaravanOnly, Self::Expanded];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CaravanOnly => "caravan-only",
            Self::Expanded => "expanded",
        }
    }

    /// Prefix used in share codes.
    #[must_use]
    pub const fn code_prefix(self) -> &'static str {
        match self {
            Self::CaravanOnly => "CV",
            Self::Expanded => "EX",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "caravan-only" | "caravan_only" | "caravan" | "cv" => Ok(Self::CaravanOnly),
            "expanded" | "ex" => Ok(Self::Expanded),
            _ => Err(()),
        }
    }
}

/// Feature switches that separate the two variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Features {
    pub walking_mode: bool,
    pub vehicles: bool,
    pub themes: bool,
    pub coins: bool,
    pub mystery_boxes: bool,
    pub lottery: bool,
    pub notifications: bool,
    pub pointer_steering: bool,
}

impl Features {
    #[must_use]
    pub const fn for_variant(variant: Variant) -> Self {
        let expanded = matches!(variant, Variant::Expanded);
        Self {
            walking_mode: expanded,
            vehicles: expanded,
            themes: expanded,
            coins: expanded,
            mystery_boxes: expanded,
            lottery: expanded,
            notifications: expanded,
            pointer_steering: expanded,
        }
    }
}

/// Relative weights of what the spawner puts on the road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnTable {
    pub encounter: u32,
    pub person: u32,
    #[serde(default)]
    pub coin: u32,
    #[serde(default)]
    pub mystery: u32,
}

impl SpawnTable {
    #[must_use]
    pub const fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::CaravanOnly => Self {
                encounter: 70,
                person: 30,
                coin: 0,
                mystery: 0,
            },
            Variant::Expanded => Self {
                encounter: 55,
                person: 25,
                coin: 15,
                mystery: 5,
            },
        }
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.encounter + self.person + self.coin + self.mystery
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub road_top: f32,
    pub road_bottom: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            road_top: ROAD_TOP,
            road_bottom: ROAD_BOTTOM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningConfig {
    pub player_speed: f32,
    pub walk_speed: f32,
    pub scroll_speed: f32,
    pub food_drain_rate: f32,
    pub interaction_range: f32,
    pub collision_range: f32,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            player_speed: PLAYER_SPEED,
            walk_speed: WALK_SPEED,
            scroll_speed: SCROLL_SPEED,
            food_drain_rate: FOOD_DRAIN_RATE,
            interaction_range: INTERACTION_RANGE,
            collision_range: COLLISION_RANGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    pub base_interval_ms: f32,
    pub journey_step_ms: f32,
    pub min_interval_ms: f32,
    /// Overrides the variant's default table when present.
    #[serde(default)]
    pub table: Option<SpawnTable>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: SPAWN_BASE_INTERVAL_MS,
            journey_step_ms: SPAWN_JOURNEY_STEP_MS,
            min_interval_ms: SPAWN_MIN_INTERVAL_MS,
            table: None,
        }
    }
}

impl SpawnConfig {
    /// Milliseconds between spawns for the given journey number.
    #[must_use]
    pub fn interval_ms(&self, journey: u32) -> f32 {
        let journey = f32::from(u16::try_from(journey).unwrap_or(u16::MAX));
        (self.journey_step_ms.mul_add(-journey, self.base_interval_ms)).max(self.min_interval_ms)
    }
}

/// Complete runtime configuration for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub variant: Variant,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub tuning: TuningConfig,
    #[serde(default)]
    pub spawn: SpawnConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::for_variant(Variant::default())
    }
}

impl GameConfig {
    #[must_use]
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            variant,
            world: WorldConfig::default(),
            tuning: TuningConfig::default(),
            spawn: SpawnConfig::default(),
        }
    }

    #[must_use]
    pub const fn features(&self) -> Features {
        Features::for_variant(self.variant)
    }

    #[must_use]
    pub fn spawn_table(&self) -> SpawnTable {
        self.spawn
            .table
            .unwrap_or_else(|| SpawnTable::for_variant(self.variant))
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the JSON is malformed or a value is out of bounds.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_world()?;
        self.validate_tuning()?;
        self.validate_spawn()?;
        Ok(())
    }

    fn validate_world(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        positive("world.width", world.width)?;
        positive("world.height", world.height)?;
        if world.road_top < 0.0 || world.road_top >= world.road_bottom || world.road_bottom > world.height
        {
            return Err(ConfigError::RoadBand {
                top: world.road_top,
                bottom: world.road_bottom,
                height: world.height,
            });
        }
        Ok(())
    }

    fn validate_tuning(&self) -> Result<(), ConfigError> {
        let tuning = &self.tuning;
        positive("tuning.player_speed", tuning.player_speed)?;
        positive("tuning.walk_speed", tuning.walk_speed)?;
        positive("tuning.scroll_speed", tuning.scroll_speed)?;
        in_range("tuning.food_drain_rate", tuning.food_drain_rate, 0.0, 5.0)?;
        in_range("tuning.interaction_range", tuning.interaction_range, 1.0, 500.0)?;
        in_range("tuning.collision_range", tuning.collision_range, 1.0, 500.0)?;
        Ok(())
    }

    fn validate_spawn(&self) -> Result<(), ConfigError> {
        let spawn = &self.spawn;
        positive("spawn.base_interval_ms", spawn.base_interval_ms)?;
        positive("spawn.min_interval_ms", spawn.min_interval_ms)?;
        in_range("spawn.journey_step_ms", spawn.journey_step_ms, 0.0, spawn.base_interval_ms)?;
        if spawn.min_interval_ms > spawn.base_interval_ms {
            return Err(ConfigError::SpawnInterval {
                min: spawn.min_interval_ms,
                base: spawn.base_interval_ms,
            });
        }
        if self.spawn_table().total() == 0 {
            return Err(ConfigError::EmptySpawnTable);
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}
