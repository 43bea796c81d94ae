//! Purchasable vehicles and the hangar purchase flow.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::BASE_PASSENGER_CAPACITY;
use crate::error::GameError;
use crate::flags::FlagSet;
use crate::resources::{ResourceState, passenger_capacity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VehicleKind {
    #[default]
    Caravan,
    Bike,
    Car,
    Truck,
    Train,
}

/// Static stats for a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleSpec {
    pub kind: VehicleKind,
    pub label: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    /// Multiplier on player movement and road progress.
    pub speed: f32,
    pub cost: i32,
    pub seats: usize,
    /// Multiplier on food drain.
    pub drain: f32,
}

const VEHICLES: [VehicleSpec; 5] = [
    VehicleSpec {
        kind: VehicleKind::Caravan,
        label: "Caravan",
        icon: "📦",
        description: "The classic hauler. Balanced and reliable.",
        speed: 1.0,
        cost: 0,
        seats: BASE_PASSENGER_CAPACITY,
        drain: 1.0,
    },
    VehicleSpec {
        kind: VehicleKind::Bike,
        label: "Sand Bike",
        icon: "🏍️",
        description: "Fast and nimble. Low consumption, but limited space.",
        speed: 1.4,
        cost: 50,
        seats: 2,
        drain: 0.8,
    },
    VehicleSpec {
        kind: VehicleKind::Car,
        label: "Wasteland Car",
        icon: "🚗",
        description: "A repurposed scout car. Smooth riding.",
        speed: 1.2,
        cost: 100,
        seats: 3,
        drain: 1.0,
    },
    VehicleSpec {
        kind: VehicleKind::Truck,
        label: "Heavy Truck",
        icon: "🚛",
        description: "Slower, but can carry a full crew with ease.",
        speed: 0.8,
        cost: 200,
        seats: 5,
        drain: 1.2,
    },
    VehicleSpec {
        kind: VehicleKind::Train,
        label: "Chunk Train",
        icon: "🚂",
        description: "Extremely fast and massive, but burns resources.",
        speed: 1.6,
        cost: 500,
        seats: 5,
        drain: 1.5,
    },
];

impl VehicleKind {
    pub const ALL: [Self; 5] = [Self::Caravan, Self::Bike, Self::Car, Self::Truck, Self::Train];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Caravan => "caravan",
            Self::Bike => "bike",
            Self::Car => "car",
            Self::Truck => "truck",
            Self::Train => "train",
        }
    }

    #[must_use]
    pub const fn spec(self) -> &'static VehicleSpec {
        match self {
            Self::Caravan => &VEHICLES[0],
            Self::Bike => &VEHICLES[1],
            Self::Car => &VEHICLES[2],
            Self::Truck => &VEHICLES[3],
            Self::Train => &VEHICLES[4],
        }
    }

    /// Flag recording that the vehicle has been bought.
    #[must_use]
    pub fn ownership_flag(self) -> String {
        format!("vehicle_{}", self.as_str())
    }

    #[must_use]
    pub fn is_owned(self, flags: &FlagSet) -> bool {
        self.spec().cost == 0 || flags.contains(&self.ownership_flag())
    }
}

impl fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// Result of a successful hangar selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleChange {
    pub from: VehicleKind,
    pub to: VehicleKind,
    /// Gold paid; zero when the vehicle was already owned.
    pub paid: i32,
}

/// Switch to `kind`, buying it first when it is not owned yet.
///
/// # Errors
///
/// Returns [`GameError::InsufficientGold`] when an unowned vehicle cannot be
/// afforded and [`GameError::VehicleTooSmall`] when the current passengers
/// would not fit.
pub fn select_vehicle(
    resources: &mut ResourceState,
    flags: &mut FlagSet,
    kind: VehicleKind,
) -> Result<VehicleChange, GameError> {
    let capacity = passenger_capacity(kind, flags);
    let seated = resources.passengers.len();
    if seated > capacity {
        return Err(GameError::VehicleTooSmall { seated, capacity });
    }

    let mut paid = 0;
    if !kind.is_owned(flags) {
        let cost = kind.spec().cost;
        if resources.gold < cost {
            return Err(GameError::InsufficientGold {
                needed: cost,
                available: resources.gold,
            });
        }
        resources.gold -= cost;
        flags.insert(kind.ownership_flag());
        paid = cost;
    }

    let from = resources.vehicle;
    resources.vehicle = kind;
    resources.clamp();
    Ok(VehicleChange {
        from,
        to: kind,
        paid,
    })
}
