//! Centralized balance and tuning constants for Caravan Crossroads.
//!
//! These values define the deterministic math for the road simulation and
//! seed the defaults of [`crate::config::GameConfig`]. Hosts may override the
//! tuning through configuration; the constants remain the reviewed baseline.

// Journal keys -------------------------------------------------------------
pub(crate) const LOG_SESSION_START: &str = "log.session.start";
pub(crate) const LOG_ENCOUNTER_OPEN: &str = "log.encounter.open";
pub(crate) const LOG_ENCOUNTER_CHOICE: &str = "log.encounter.choice";
pub(crate) const LOG_ENCOUNTER_CLOSE: &str = "log.encounter.close";
pub(crate) const LOG_JOURNEY_CONTINUE: &str = "log.journey.continue";
pub(crate) const LOG_JOURNEY_END: &str = "log.journey.end";
pub(crate) const LOG_LIFE_LOST: &str = "log.life.lost";
pub(crate) const LOG_GAME_OVER: &str = "log.game-over";
pub(crate) const LOG_PASSENGER_ONBOARD: &str = "log.passenger.onboard";
pub(crate) const LOG_PASSENGER_REMOVED: &str = "log.passenger.removed";
pub(crate) const LOG_PASSENGER_NO_SEAT: &str = "log.passenger.no-seat";
pub(crate) const LOG_COIN_COLLECTED: &str = "log.coin.collected";
pub(crate) const LOG_MYSTERY_OPENED: &str = "log.mystery.opened";
pub(crate) const LOG_LOTTERY_REWARD: &str = "log.lottery.reward";
pub(crate) const LOG_VEHICLE_CHANGED: &str = "log.vehicle.changed";
pub(crate) const LOG_BANDIT_DOWN: &str = "log.bandit.down";
pub(crate) const LOG_BANDIT_AMBUSH: &str = "log.bandit.ambush";
pub(crate) const LOG_MODE_CHANGED: &str = "log.mode.changed";

// World geometry -----------------------------------------------------------
pub const WORLD_WIDTH: f32 = 1_200.0;
pub const WORLD_HEIGHT: f32 = 600.0;
pub const ROAD_TOP: f32 = 150.0;
pub const ROAD_BOTTOM: f32 = 450.0;
pub const PLAYER_START_X: f32 = 200.0;
pub const PLAYER_START_Y: f32 = 300.0;
pub(crate) const PLAYER_EDGE_MARGIN_X: f32 = 50.0;
pub(crate) const PLAYER_EDGE_MARGIN_Y: f32 = 20.0;
pub(crate) const NPC_SPAWN_OFFSET_X: f32 = 100.0;
pub(crate) const NPC_DESPAWN_X: f32 = -150.0;
pub(crate) const NPC_LANE_PADDING: f32 = 40.0;
pub(crate) const SCROLL_WRAP: f32 = 100.0;

// Movement & drain ---------------------------------------------------------
pub const PLAYER_SPEED: f32 = 5.0;
pub const WALK_SPEED: f32 = 3.5;
pub const SCROLL_SPEED: f32 = 2.5;
pub const FOOD_DRAIN_RATE: f32 = 0.05;
pub(crate) const MOVING_DRAIN_FACTOR: f32 = 2.0;
pub(crate) const PROGRESS_DIVISOR: f32 = 80.0;
pub(crate) const POINTER_EASE: f32 = 0.15;
pub(crate) const COOK_DRAIN_FACTOR: f32 = 0.80;
pub(crate) const AXLE_DRAIN_FACTOR: f32 = 0.70;
pub(crate) const WALK_DRAIN_FACTOR: f32 = 0.60;
pub(crate) const REVIVE_FOOD: f32 = 50.0;

// Interaction --------------------------------------------------------------
pub const INTERACTION_RANGE: f32 = 60.0;
pub const COLLISION_RANGE: f32 = 45.0;
pub(crate) const BULLET_HIT_RANGE: f32 = 30.0;
pub(crate) const BANDIT_AMBUSH_FOOD: f32 = 15.0;

// Resource limits ----------------------------------------------------------
pub const MAX_FOOD: f32 = 100.0;
pub const MAX_GOLD: i32 = 99_999;
pub const MAX_REPUTATION: i32 = 999;
pub const MAX_LIVES: u32 = 5;
pub const MAX_PROGRESS: f32 = 100.0;
pub(crate) const START_FOOD: f32 = 100.0;
pub(crate) const START_GOLD: i32 = 32;
pub(crate) const START_LIVES: u32 = 3;
pub(crate) const BASE_PASSENGER_CAPACITY: usize = 3;
pub(crate) const UPGRADED_PASSENGER_CAPACITY: usize = 5;

// Scoring ------------------------------------------------------------------
pub(crate) const SCORE_PER_GOLD: i64 = 10;
pub(crate) const SCORE_PER_RENOWN: i64 = 50;
pub(crate) const SCORE_PER_JOURNEY: i64 = 1_000;
pub(crate) const SCORE_PER_PROGRESS: f32 = 10.0;
pub(crate) const BANDIT_SCORE_BONUS: i64 = 100;

// Passenger bonuses --------------------------------------------------------
pub(crate) const MERCHANT_GOLD_FACTOR: f64 = 1.15;
pub(crate) const SCHOLAR_RENOWN_BONUS: i32 = 5;
pub(crate) const GUARD_FOOD_BONUS: f32 = 5.0;

// Spawning -----------------------------------------------------------------
pub(crate) const SPAWN_BASE_INTERVAL_MS: f32 = 2_800.0;
pub(crate) const SPAWN_JOURNEY_STEP_MS: f32 = 200.0;
pub(crate) const SPAWN_MIN_INTERVAL_MS: f32 = 600.0;
pub(crate) const SPAWN_CUTOFF_PROGRESS: f32 = 95.0;
pub(crate) const PERSON_CUTOFF_PROGRESS: f32 = 90.0;
pub(crate) const WAYSTATION_WINDOW: (f32, f32) = (45.0, 55.0);
pub(crate) const HAVEN_PROGRESS: f32 = 95.0;
pub(crate) const SPEED_MULTIPLIER_MIN: f32 = 0.5;
pub(crate) const SPEED_MULTIPLIER_SPAN: f32 = 0.5;
pub(crate) const PERSON_SIZE: (f32, f32) = (32.0, 42.0);
pub(crate) const ENCOUNTER_SIZE: (f32, f32) = (48.0, 48.0);
pub(crate) const PICKUP_SIZE: (f32, f32) = (24.0, 24.0);
pub(crate) const COIN_VALUE: i32 = 5;

// Combat -------------------------------------------------------------------
pub(crate) const BULLET_SPEED: f32 = 12.0;
pub(crate) const BULLET_COOLDOWN_FRAMES: u32 = 12;
pub(crate) const MAX_LIVE_BULLETS: usize = 8;
pub(crate) const BANDIT_BOUNTY: i32 = 15;

// Timing -------------------------------------------------------------------
pub const FRAME_MS: f32 = 1_000.0 / 60.0;
pub(crate) const MAX_STEPS_PER_ADVANCE: u32 = 5;
pub(crate) const NOTIFICATION_TTL_MS: f32 = 2_500.0;
pub(crate) const MAX_NOTIFICATIONS: usize = 4;

// Victory thresholds -------------------------------------------------------
pub(crate) const HERO_RENOWN: i32 = 20;
pub(crate) const WEALTH_GOLD: i32 = 250;
pub(crate) const IRON_MONGER_RENOWN_CEILING: i32 = 5;

#[cfg(test)]
pub(crate) const FLOAT_EPSILON: f32 = 1e-4;
