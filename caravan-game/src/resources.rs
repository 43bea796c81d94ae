//! The player's resource ledger and the rules that keep it in bounds.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::combat::ControlMode;
use crate::constants::{
    AXLE_DRAIN_FACTOR, COOK_DRAIN_FACTOR, MAX_FOOD, MAX_GOLD, MAX_LIVES,
    MAX_PROGRESS, MAX_REPUTATION, SCORE_PER_GOLD, SCORE_PER_JOURNEY, SCORE_PER_PROGRESS,
    SCORE_PER_RENOWN, START_FOOD, START_GOLD, START_LIVES, UPGRADED_PASSENGER_CAPACITY,
    WALK_DRAIN_FACTOR,
};
use crate::flags::FlagSet;
use crate::numbers::floor_f32_to_i64;
use crate::passengers::{Passenger, PassengerKind};
use crate::theme::Theme;
use crate::vehicle::VehicleKind;

pub const AXLE_UPGRADE_FLAG: &str = "axle_upgrade";
pub const CAPACITY_UPGRADE_FLAG: &str = "capacity_upgrade";

pub type Roster = SmallVec<[Passenger; 5]>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub food: f32,
    pub gold: i32,
    pub reputation: i32,
    pub lives: u32,
    pub journey_count: u32,
    pub progress: f32,
    pub score: i64,
    /// Score earned outside the ledger formula, such as bandit bounties.
    #[serde(default)]
    pub score_bonus: i64,
    pub passengers: Roster,
    pub vehicle: VehicleKind,
}

impl Default for ResourceState {
    fn default() -> Self {
        Self::initial()
    }
}

impl ResourceState {
    #[must_use]
    pub fn initial() -> Self {
        Self {
            food: START_FOOD,
            gold: START_GOLD,
            reputation: 0,
            lives: START_LIVES,
            journey_count: 1,
            progress: 0.0,
            score: 0,
            score_bonus: 0,
            passengers: Roster::new(),
            vehicle: VehicleKind::Caravan,
        }
    }

    /// Clamp every bounded field into its legal range.
    pub fn clamp(&mut self) {
        self.food = if self.food.is_nan() {
            0.0
        } else {
            self.food.clamp(0.0, MAX_FOOD)
        };
        self.gold = self.gold.clamp(0, MAX_GOLD);
        self.reputation = self.reputation.clamp(0, MAX_REPUTATION);
        self.lives = self.lives.min(MAX_LIVES);
        self.progress = self.progress.clamp(0.0, MAX_PROGRESS);
        self.journey_count = self.journey_count.max(1);
    }

    /// Recompute the score from the current ledger.
    pub fn recompute_score(&mut self) {
        self.score = i64::from(self.gold) * SCORE_PER_GOLD
            + i64::from(self.reputation) * SCORE_PER_RENOWN
            + i64::from(self.journey_count) * SCORE_PER_JOURNEY
            + floor_f32_to_i64(self.progress * SCORE_PER_PROGRESS)
            + self.score_bonus;
    }

    #[must_use]
    pub fn has_passenger(&self, kind: PassengerKind) -> bool {
        self.passengers.iter().any(|p| p.kind == kind)
    }

    #[must_use]
    pub fn capacity(&self, flags: &FlagSet) -> usize {
        passenger_capacity(self.vehicle, flags)
    }

    #[must_use]
    pub fn has_free_seat(&self, flags: &FlagSet) -> bool {
        self.passengers.len() < self.capacity(flags)
    }

    /// Remove a passenger of `kind`, or the most recent one when `kind` is `None`.
    pub fn remove_passenger(&mut self, kind: Option<PassengerKind>) -> Option<Passenger> {
        let index = match kind {
            Some(kind) => self.passengers.iter().position(|p| p.kind == kind)?,
            None => self.passengers.len().checked_sub(1)?,
        };
        Some(self.passengers.remove(index))
    }

    /// Combined food-drain multiplier from crew, upgrades, vehicle, theme and mode.
    #[must_use]
    pub fn drain_multiplier(&self, flags: &FlagSet, mode: ControlMode, theme: Theme) -> f32 {
        let mut multiplier = 1.0;
        if self.has_passenger(PassengerKind::Cook) {
            multiplier *= COOK_DRAIN_FACTOR;
        }
        if flags.contains(AXLE_UPGRADE_FLAG) {
            multiplier *= AXLE_DRAIN_FACTOR;
        }
        multiplier *= self.vehicle.spec().drain;
        multiplier *= theme.drain_factor();
        if mode == ControlMode::Walking {
            multiplier *= WALK_DRAIN_FACTOR;
        }
        multiplier
    }

    pub fn add_food(&mut self, delta: f32) {
        self.food = (self.food + delta).clamp(0.0, MAX_FOOD);
    }

    pub fn add_gold(&mut self, delta: i32) {
        self.gold = self.gold.saturating_add(delta).clamp(0, MAX_GOLD);
    }

    pub fn add_reputation(&mut self, delta: i32) {
        self.reputation = self.reputation.saturating_add(delta).clamp(0, MAX_REPUTATION);
    }

    pub fn add_lives(&mut self, delta: u32) {
        self.lives = self.lives.saturating_add(delta).min(MAX_LIVES);
    }
}

/// Seats available in `vehicle`, raised by the capacity upgrade.
#[must_use]
pub fn passenger_capacity(vehicle: VehicleKind, flags: &FlagSet) -> usize {
    let seats = vehicle.spec().seats;
    if flags.contains(CAPACITY_UPGRADE_FLAG) {
        seats.max(UPGRADED_PASSENGER_CAPACITY)
    } else {
        seats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLOAT_EPSILON;

    #[test]
    fn initial_ledger_matches_new_run() {
        let resources = ResourceState::initial();
        assert!((resources.food - 100.0).abs() < FLOAT_EPSILON);
        assert_eq!(resources.gold, 32);
        assert_eq!(resources.lives, 3);
        assert_eq!(resources.journey_count, 1);
        assert!(resources.passengers.is_empty());
    }

    #[test]
    fn clamp_bounds_every_field() {
        let mut resources = ResourceState {
            food: 140.0,
            gold: -5,
            reputation: 5_000,
            lives: 9,
            progress: 130.0,
            ..ResourceState::initial()
        };
        resources.clamp();
        assert!((resources.food - MAX_FOOD).abs() < FLOAT_EPSILON);
        assert_eq!(resources.gold, 0);
        assert_eq!(resources.reputation, MAX_REPUTATION);
        assert_eq!(resources.lives, MAX_LIVES);
        assert!((resources.progress - MAX_PROGRESS).abs() < FLOAT_EPSILON);
    }

    #[test]
    fn score_formula() {
        let mut resources = ResourceState {
            gold: 40,
            reputation: 3,
            journey_count: 2,
            progress: 12.34,
            score_bonus: 100,
            ..ResourceState::initial()
        };
        resources.recompute_score();
        assert_eq!(resources.score, 400 + 150 + 2_000 + 123 + 100);
    }

    #[test]
    fn drain_multiplier_stacks() {
        let mut resources = ResourceState::initial();
        let mut flags = FlagSet::new();
        let base = resources.drain_multiplier(&flags, ControlMode::Caravan, Theme::Desert);
        assert!((base - 1.0).abs() < FLOAT_EPSILON);

        resources
            .passengers
            .push(Passenger::new(1, "Mira", PassengerKind::Cook));
        flags.insert(AXLE_UPGRADE_FLAG);
        let stacked = resources.drain_multiplier(&flags, ControlMode::Walking, Theme::Frozen);
        assert!((stacked - 0.8 * 0.7 * 1.15 * 0.6).abs() < FLOAT_EPSILON);
    }

    #[test]
    fn capacity_follows_vehicle_and_upgrade() {
        let mut flags = FlagSet::new();
        assert_eq!(passenger_capacity(VehicleKind::Caravan, &flags), 3);
        assert_eq!(passenger_capacity(VehicleKind::Bike, &flags), 2);
        assert_eq!(passenger_capacity(VehicleKind::Truck, &flags), 5);
        flags.insert(CAPACITY_UPGRADE_FLAG);
        assert_eq!(passenger_capacity(VehicleKind::Caravan, &flags), 5);
        assert_eq!(passenger_capacity(VehicleKind::Bike, &flags), 5);
    }

    #[test]
    fn remove_passenger_prefers_requested_kind() {
        let mut resources = ResourceState::initial();
        resources
            .passengers
            .push(Passenger::new(1, "Kael", PassengerKind::Guard));
        resources
            .passengers
            .push(Passenger::new(2, "Jana", PassengerKind::Scholar));
        let removed = resources.remove_passenger(Some(PassengerKind::Guard)).unwrap();
        assert_eq!(removed.id, 1);
        let removed = resources.remove_passenger(None).unwrap();
        assert_eq!(removed.id, 2);
        assert!(resources.remove_passenger(None).is_none());
    }
}
