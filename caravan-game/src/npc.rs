//! Entities scrolling toward the player.
use serde::{Deserialize, Serialize};

use crate::constants::{ENCOUNTER_SIZE, NPC_DESPAWN_X, PERSON_SIZE, PICKUP_SIZE};
use crate::passengers::Passenger;
use crate::state::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcKind {
    Trader,
    Bandit,
    Traveler,
    Mystic,
    Haven,
    FoodCart,
    Person,
    Coin,
    Mystery,
}

impl NpcKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trader => "trader",
            Self::Bandit => "bandit",
            Self::Traveler => "traveler",
            Self::Mystic => "mystic",
            Self::Haven => "haven",
            Self::FoodCart => "food_cart",
            Self::Person => "person",
            Self::Coin => "coin",
            Self::Mystery => "mystery",
        }
    }

    /// Kinds that open an encounter on contact.
    #[must_use]
    pub const fn opens_encounter(self) -> bool {
        !matches!(self, Self::Person | Self::Coin | Self::Mystery)
    }

    #[must_use]
    pub const fn is_pickup(self) -> bool {
        matches!(self, Self::Coin | Self::Mystery)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub kind: NpcKind,
    /// Empty for kinds that carry no encounter.
    pub encounter_id: String,
    pub width: f32,
    pub height: f32,
    pub speed_multiplier: f32,
    #[serde(default)]
    pub passenger: Option<Passenger>,
}

impl Npc {
    #[must_use]
    pub fn encounter(
        id: u64,
        at: Point,
        kind: NpcKind,
        encounter_id: impl Into<String>,
        speed_multiplier: f32,
    ) -> Self {
        Self {
            id,
            x: at.x,
            y: at.y,
            kind,
            encounter_id: encounter_id.into(),
            width: ENCOUNTER_SIZE.0,
            height: ENCOUNTER_SIZE.1,
            speed_multiplier,
            passenger: None,
        }
    }

    #[must_use]
    pub fn person(id: u64, at: Point, passenger: Passenger, speed_multiplier: f32) -> Self {
        Self {
            id,
            x: at.x,
            y: at.y,
            kind: NpcKind::Person,
            encounter_id: String::new(),
            width: PERSON_SIZE.0,
            height: PERSON_SIZE.1,
            speed_multiplier,
            passenger: Some(passenger),
        }
    }

    #[must_use]
    pub fn coin(id: u64, at: Point, speed_multiplier: f32) -> Self {
        Self::pickup(id, at, NpcKind::Coin, speed_multiplier)
    }

    #[must_use]
    pub fn mystery(id: u64, at: Point, speed_multiplier: f32) -> Self {
        Self::pickup(id, at, NpcKind::Mystery, speed_multiplier)
    }

    fn pickup(id: u64, at: Point, kind: NpcKind, speed_multiplier: f32) -> Self {
        Self {
            id,
            x: at.x,
            y: at.y,
            kind,
            encounter_id: String::new(),
            width: PICKUP_SIZE.0,
            height: PICKUP_SIZE.1,
            speed_multiplier,
            passenger: None,
        }
    }

    /// Scroll toward the player.
    pub fn advance(&mut self, scroll_speed: f32) {
        self.x -= scroll_speed * self.speed_multiplier;
    }

    /// Axis-aligned proximity test against a point.
    #[must_use]
    pub fn overlaps(&self, point: Point, range: f32) -> bool {
        (self.x - point.x).abs() < range && (self.y - point.y).abs() < range
    }

    #[must_use]
    pub fn in_bounds(&self) -> bool {
        self.x > NPC_DESPAWN_X
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}
