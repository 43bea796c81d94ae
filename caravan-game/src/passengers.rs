//! Passengers picked up along the road and the bonuses they grant.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{GUARD_FOOD_BONUS, MERCHANT_GOLD_FACTOR, SCHOLAR_RENOWN_BONUS};
use crate::numbers::floor_f64_to_i32;

pub const PASSENGER_NAMES: [&str; 7] = ["Oliver", "Elias", "Soren", "Kael", "Bryn", "Jana", "Mira"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassengerKind {
    Merchant,
    Cook,
    Scholar,
    Guard,
}

impl PassengerKind {
    pub const ALL: [Self; 4] = [Self::Merchant, Self::Cook, Self::Scholar, Self::Guard];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Merchant => "merchant",
            Self::Cook => "cook",
            Self::Scholar => "scholar",
            Self::Guard => "guard",
        }
    }

    #[must_use]
    pub const fn bonus_text(self) -> &'static str {
        match self {
            Self::Merchant => "+15% Gold Earnings",
            Self::Cook => "-20% Food Consumption",
            Self::Scholar => "+5 Renown from encounters",
            Self::Guard => "+5 Food on encounter",
        }
    }

    /// Palette hint used by hosts to tint the passenger sprite.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Merchant => "#fbbf24",
            Self::Cook => "#f87171",
            Self::Scholar => "#60a5fa",
            Self::Guard => "#4ade80",
        }
    }
}

impl fmt::Display for PassengerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PassengerKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: u64,
    pub name: String,
    pub kind: PassengerKind,
    pub bonus_text: String,
}

impl Passenger {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, kind: PassengerKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            bonus_text: kind.bonus_text().to_string(),
        }
    }

    /// Roll a random passenger for a person spawned on the road.
    pub fn roll<R: Rng + ?Sized>(id: u64, rng: &mut R) -> Self {
        let kind = PassengerKind::ALL
            .choose(rng)
            .copied()
            .unwrap_or(PassengerKind::Merchant);
        let name = PASSENGER_NAMES.choose(rng).copied().unwrap_or("Oliver");
        Self::new(id, name, kind)
    }
}

/// Merchant bonus: positive gold gains are multiplied and floored.
#[must_use]
pub fn boosted_gold_gain(gain: i32, has_merchant: bool) -> i32 {
    if gain > 0 && has_merchant {
        floor_f64_to_i32(f64::from(gain) * MERCHANT_GOLD_FACTOR)
    } else {
        gain
    }
}

/// Scholar bonus: positive renown gains receive a flat bonus.
#[must_use]
pub const fn boosted_renown_gain(gain: i32, has_scholar: bool) -> i32 {
    if gain > 0 && has_scholar {
        gain + SCHOLAR_RENOWN_BONUS
    } else {
        gain
    }
}

/// Guard bonus: extra food on every choice that is not a theft.
#[must_use]
pub const fn guard_food_bonus(has_guard: bool, theft: bool) -> f32 {
    if has_guard && !theft {
        GUARD_FOOD_BONUS
    } else {
        0.0
    }
}
