//! Caravan Crossroads Game Engine
//!
//! Platform-agnostic core of a scrolling caravan road game: resources,
//! passengers, scripted encounters, spawning, vehicles, themes, the prize
//! wheel, walking combat and procedural audio. Hosts draw the state and play
//! the emitted audio commands; this crate never touches a window or a device.

pub mod audio;
pub mod combat;
pub mod config;
pub mod constants;
pub mod data;
pub mod encounter;
pub mod ending;
pub mod error;
pub mod flags;
pub mod frame;
pub mod input;
pub mod lottery;
pub mod npc;
pub mod numbers;
pub mod passengers;
pub mod resources;
pub mod rng;
pub mod seed;
pub mod session;
pub mod spawner;
pub mod state;
pub mod theme;
pub mod vehicle;

// Re-export commonly used types
pub use audio::{
    AudioChannel, AudioCommand, AudioMixer, MusicNote, MusicTrack, SoundCue, render_cue,
    render_note, render_wind,
};
pub use combat::{Bullet, ControlMode};
pub use config::{Features, GameConfig, SpawnTable, Variant};
pub use data::{Choice, ChoiceAction, Encounter, EncounterData, Ledger, Requirement};
pub use encounter::{Availability, CloseOutcome, availability};
pub use ending::{EndSummary, Ending, VictoryKind, classify_victory};
pub use error::{ConfigError, EngineError, GameError};
pub use flags::FlagSet;
pub use input::{Command, Direction, InputState};
pub use lottery::{LotteryReward, SpinResult};
pub use npc::{Npc, NpcKind};
pub use passengers::{Passenger, PassengerKind};
pub use resources::ResourceState;
pub use rng::StreamDraws;
pub use seed::{canonical_seed, decode_to_seed, encode_friendly, generate_code_from_entropy};
pub use session::GameSession;
pub use state::{ChoiceOutcome, GameEvent, GameState, GameStatus, Point};
pub use theme::{Palette, Theme};
pub use vehicle::{VehicleChange, VehicleKind};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the encounter catalog from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the encounter data cannot be loaded.
    fn load_encounter_data(&self) -> Result<EncounterData, Self::Error>;

    /// Load the runtime configuration for a variant
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config(&self, variant: Variant) -> Result<GameConfig, Self::Error> {
        Ok(GameConfig::for_variant(variant))
    }
}

/// Loads the catalog compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledLoader;

impl DataLoader for BundledLoader {
    type Error = serde_json::Error;

    fn load_encounter_data(&self) -> Result<EncounterData, Self::Error> {
        EncounterData::bundled()
    }
}

/// Main game engine for creating sessions
pub struct GameEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> GameEngine<L>
where
    L: DataLoader,
{
    /// Create a new game engine with the provided data loader
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// Create a session on the title screen for `variant` and `seed`
    ///
    /// # Errors
    ///
    /// Returns an error if the encounter data or configuration cannot be
    /// loaded, or if the loaded configuration fails validation.
    pub fn create_session(
        &self,
        variant: Variant,
        seed: u64,
    ) -> Result<GameSession, EngineError<L::Error>> {
        let data = self
            .data_loader
            .load_encounter_data()
            .map_err(EngineError::Loader)?;
        let mut config = self
            .data_loader
            .load_config(variant)
            .map_err(EngineError::Loader)?;
        config.variant = variant;
        config.validate().map_err(EngineError::Config)?;
        Ok(GameSession::new(config, data, seed))
    }

    /// Create a session from a share code such as `EX-LANTERN07`
    ///
    /// Returns `Ok(None)` when the code does not parse.
    ///
    /// # Errors
    ///
    /// Returns an error if the encounter data or configuration cannot be loaded.
    pub fn create_session_from_code(
        &self,
        code: &str,
    ) -> Result<Option<GameSession>, EngineError<L::Error>> {
        match decode_to_seed(code) {
            Some((variant, seed)) => self.create_session(variant, seed).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_encounter_data(&self) -> Result<EncounterData, Self::Error> {
            Ok(EncounterData::empty())
        }

        fn load_config(&self, variant: Variant) -> Result<GameConfig, Self::Error> {
            let mut config = GameConfig::for_variant(variant);
            config.tuning.scroll_speed = 5.0;
            Ok(config)
        }
    }

    #[test]
    fn engine_creates_sessions_from_loader() {
        let engine = GameEngine::new(FixtureLoader);
        let mut session = engine.create_session(Variant::CaravanOnly, 0xABCD).unwrap();
        assert_eq!(session.config().variant, Variant::CaravanOnly);
        assert!((session.config().tuning.scroll_speed - 5.0).abs() < f32::EPSILON);
        assert!(session.data().encounters.is_empty());

        session.start().unwrap();
        session.advance(constants::FRAME_MS, &mut InputState::new());
        assert!((session.state().resources.progress - 5.0 / 80.0).abs() < 1e-4);
    }

    #[derive(Clone, Copy, Default)]
    struct BrokenLoader;

    impl DataLoader for BrokenLoader {
        type Error = Infallible;

        fn load_encounter_data(&self) -> Result<EncounterData, Self::Error> {
            Ok(EncounterData::empty())
        }

        fn load_config(&self, variant: Variant) -> Result<GameConfig, Self::Error> {
            let mut config = GameConfig::for_variant(variant);
            config.tuning.player_speed = 0.0;
            config.spawn.table = Some(SpawnTable {
                encounter: 0,
                person: 0,
                coin: 0,
                mystery: 0,
            });
            Ok(config)
        }
    }

    #[test]
    fn engine_rejects_invalid_loader_config() {
        let engine = GameEngine::new(BrokenLoader);
        let Err(err) = engine.create_session(Variant::Expanded, 7) else {
            panic!("zero player speed was accepted");
        };
        assert!(matches!(
            err,
            EngineError::Config(ConfigError::NotPositive {
                field: "tuning.player_speed",
                ..
            })
        ));
        assert!(err.to_string().contains("loaded config is invalid"));
        assert!(matches!(
            engine.create_session_from_code("CV-DUNE42"),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn share_codes_pick_variant_and_seed() {
        let engine = GameEngine::new(BundledLoader);
        let session = engine
            .create_session_from_code("EX-LANTERN07")
            .unwrap()
            .expect("code parses");
        assert_eq!(session.config().variant, Variant::Expanded);
        assert_eq!(session.share_code().as_deref(), Some("EX-LANTERN07"));
        assert!(engine.create_session_from_code("nonsense").unwrap().is_none());
    }

    #[test]
    fn bundled_loader_ships_the_catalog() {
        let data = BundledLoader.load_encounter_data().unwrap();
        assert_eq!(data.encounters.len(), 11);
        let config = BundledLoader.load_config(Variant::Expanded).unwrap();
        assert!(config.validate().is_ok());
    }
}
