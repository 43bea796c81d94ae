//! The prize wheel opened by mystery boxes.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::resources::ResourceState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotteryReward {
    GoldStash,
    FoodDrop,
    FameBoost,
    MysteryShop,
    ExtraLife,
    Nothing,
}

const FULL_TURN: f32 = 360.0;
const SPIN_TURNS: f32 = 5.0;
pub const WEDGE_DEGREES: f32 = FULL_TURN / 6.0;

impl LotteryReward {
    /// Wedges in clockwise order starting at the pointer.
    pub const WHEEL: [Self; 6] = [
        Self::GoldStash,
        Self::FoodDrop,
        Self::FameBoost,
        Self::MysteryShop,
        Self::ExtraLife,
        Self::Nothing,
    ];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::GoldStash => "gold_stash",
            Self::FoodDrop => "food_drop",
            Self::FameBoost => "fame_boost",
            Self::MysteryShop => "mystic_shop",
            Self::ExtraLife => "extra_life",
            Self::Nothing => "nothing",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GoldStash => "100 GOLD",
            Self::FoodDrop => "50 FOOD",
            Self::FameBoost => "30 RENOWN",
            Self::MysteryShop => "MYSTERY SHOP",
            Self::ExtraLife => "BONUS LIFE",
            Self::Nothing => "EMPTY BOX",
        }
    }

    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::GoldStash => "#fbbf24",
            Self::FoodDrop => "#f87171",
            Self::FameBoost => "#60a5fa",
            Self::MysteryShop => "#d946ef",
            Self::ExtraLife => "#ef4444",
            Self::Nothing => "#71717a",
        }
    }

    /// Apply the prize. Returns `true` when the vehicle hangar should open.
    pub fn apply(self, resources: &mut ResourceState) -> bool {
        match self {
            Self::GoldStash => resources.add_gold(100),
            Self::FoodDrop => resources.add_food(50.0),
            Self::FameBoost => resources.add_reputation(30),
            Self::ExtraLife => resources.add_lives(1),
            Self::MysteryShop => return true,
            Self::Nothing => {}
        }
        false
    }
}

/// Wedge under the pointer for a wheel rotated by `rotation` degrees.
#[must_use]
pub fn wedge_index(rotation: f32) -> usize {
    let normalized = rotation.rem_euclid(FULL_TURN);
    let offset = (FULL_TURN - normalized + WEDGE_DEGREES / 2.0).rem_euclid(FULL_TURN);
    let index = (offset / WEDGE_DEGREES).floor();
    // Float rounding can land exactly on the upper edge.
    crate::numbers::f32_to_usize(index).min(LotteryReward::WHEEL.len() - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    pub from_rotation: f32,
    pub to_rotation: f32,
    pub reward: LotteryReward,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LotteryWheel {
    /// Resting rotation in `[0, 360)`.
    pub rotation: f32,
    pub spins: u32,
}

impl LotteryWheel {
    /// Spin five full turns plus a random extra angle.
    pub fn spin<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SpinResult {
        let extra = f32::from(rng.gen_range(0u16..360));
        let from_rotation = self.rotation;
        let to_rotation = from_rotation + FULL_TURN * SPIN_TURNS + extra;
        let reward = LotteryReward::WHEEL[wedge_index(to_rotation)];
        self.rotation = to_rotation.rem_euclid(FULL_TURN);
        self.spins += 1;
        SpinResult {
            from_rotation,
            to_rotation,
            reward,
        }
    }
}
