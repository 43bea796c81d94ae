//! Error types surfaced by game operations.
use thiserror::Error;

use crate::passengers::PassengerKind;
use crate::state::GameStatus;

/// Why a command could not be applied to the current game state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("operation requires status {expected:?} but game is {actual:?}")]
    WrongStatus {
        expected: GameStatus,
        actual: GameStatus,
    },
    #[error("unknown encounter '{0}'")]
    UnknownEncounter(String),
    #[error("choice {index} is out of range for encounter '{encounter}'")]
    UnknownChoice { encounter: String, index: usize },
    #[error("a choice has already been made for this encounter")]
    ChoiceAlreadyMade,
    #[error("pick a choice before closing the encounter")]
    NoChoiceMade,
    #[error("choice '{choice}' is locked behind flag '{flag}'")]
    ChoiceLocked { choice: String, flag: String },
    #[error("choice '{choice}' needs a {kind} aboard")]
    PassengerRequired {
        choice: String,
        kind: PassengerKind,
    },
    #[error("not enough gold: need {needed}, have {available}")]
    InsufficientGold { needed: i32, available: i32 },
    #[error("no free seat: {seated} of {capacity} taken")]
    CapacityFull { seated: usize, capacity: usize },
    #[error("vehicle seats {capacity} but {seated} passengers are aboard")]
    VehicleTooSmall { seated: usize, capacity: usize },
    #[error("feature '{0}' is disabled for this variant")]
    FeatureDisabled(&'static str),
    #[error("nothing to interact with")]
    NothingInRange,
}

/// Validation failures for [`crate::config::GameConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value:.2})")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    OutOfRange {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },
    #[error("road band invalid (top {top:.1} must be below bottom {bottom:.1} within height {height:.1})")]
    RoadBand { top: f32, bottom: f32, height: f32 },
    #[error("spawn interval floor {min:.0}ms exceeds base interval {base:.0}ms")]
    SpawnInterval { min: f32, base: f32 },
    #[error("spawn table has no weight")]
    EmptySpawnTable,
    #[error(transparent)]
    Parse(#[from] JsonError),
}

/// Why [`crate::GameEngine`] could not build a session.
#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + 'static,
{
    #[error("data loader failed: {0}")]
    Loader(#[source] E),
    #[error("loaded config is invalid: {0}")]
    Config(#[source] ConfigError),
}

/// Parse failure wrapper so [`ConfigError`] stays `Clone + PartialEq`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config parse failed: {0}")]
pub struct JsonError(pub String);

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(JsonError(err.to_string()))
    }
}
