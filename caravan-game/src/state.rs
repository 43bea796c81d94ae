//! The single mutable game state threaded through every update.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::audio::{AudioCommand, SoundCue};
use crate::combat::{Bullet, ControlMode};
use crate::config::Features;
use crate::constants::{
    MAX_NOTIFICATIONS, NOTIFICATION_TTL_MS, PLAYER_START_X, PLAYER_START_Y,
};
use crate::data::ChoiceAction;
use crate::ending::EndSummary;
use crate::flags::FlagSet;
use crate::input::Direction;
use crate::lottery::{LotteryReward, LotteryWheel};
use crate::npc::{Npc, NpcKind};
use crate::passengers::PassengerKind;
use crate::resources::ResourceState;
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Title,
    Playing,
    Encounter,
    Lottery,
    VehicleSelect,
    GameOver,
    Victory,
}

impl GameStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Playing => "playing",
            Self::Encounter => "encounter",
            Self::Lottery => "lottery",
            Self::VehicleSelect => "vehicle_select",
            Self::GameOver => "game_over",
            Self::Victory => "victory",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Net effect of a resolved choice, shown alongside the consequence text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOutcome {
    pub choice_id: String,
    pub consequence: String,
    pub food: f32,
    pub gold: i32,
    pub reputation: i32,
}

/// The encounter currently on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEncounter {
    pub encounter_id: String,
    pub outcome: Option<ChoiceOutcome>,
    pub pending_action: Option<ChoiceAction>,
    /// Passenger kind to drop when the pending action removes one.
    pub removal: Option<PassengerKind>,
}

impl ActiveEncounter {
    #[must_use]
    pub fn new(encounter_id: impl Into<String>) -> Self {
        Self {
            encounter_id: encounter_id.into(),
            outcome: None,
            pending_action: None,
            removal: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    pub remaining_ms: f32,
}

/// Things that happened since the host last drained the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Audio(AudioCommand),
    StatusChanged { from: GameStatus, to: GameStatus },
    EncounterOpened { encounter_id: String },
    PassengerBoarded { name: String, kind: PassengerKind },
    CoinCollected { gold: i32 },
    BanditDowned { bounty: i32 },
    LotteryLanded { reward: LotteryReward },
    JourneyCompleted { journey: u32 },
    Notification { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub status: GameStatus,
    pub mode: ControlMode,
    pub facing: Direction,
    pub features: Features,
    pub resources: ResourceState,
    pub flags: FlagSet,
    pub player: Point,
    pub npcs: Vec<Npc>,
    pub bullets: Vec<Bullet>,
    pub scroll_offset: f32,
    pub spawn_timer_ms: f32,
    pub fire_cooldown: u32,
    pub encounter: Option<ActiveEncounter>,
    pub theme: Theme,
    pub theme_override: Option<Theme>,
    pub lottery: LotteryWheel,
    pub notifications: Vec<Notification>,
    pub ending: Option<EndSummary>,
    pub frame: u64,
    pub encounters_resolved: u32,
    pub coins_collected: u32,
    pub bandits_downed: u32,
    /// Stable journal keys, in order.
    pub journal: Vec<String>,
    next_id: u64,
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl GameState {
    #[must_use]
    pub fn new(features: Features) -> Self {
        Self {
            status: GameStatus::Title,
            mode: ControlMode::Caravan,
            facing: Direction::Right,
            features,
            resources: ResourceState::initial(),
            flags: FlagSet::new(),
            player: Point::new(PLAYER_START_X, PLAYER_START_Y),
            npcs: Vec::new(),
            bullets: Vec::new(),
            scroll_offset: 0.0,
            spawn_timer_ms: 0.0,
            fire_cooldown: 0,
            encounter: None,
            theme: Theme::Desert,
            theme_override: None,
            lottery: LotteryWheel::default(),
            notifications: Vec::new(),
            ending: None,
            frame: 0,
            encounters_resolved: 0,
            coins_collected: 0,
            bandits_downed: 0,
            journal: Vec::new(),
            next_id: 1,
            events: Vec::new(),
        }
    }

    /// Theme in effect, honouring a title-screen override.
    #[must_use]
    pub fn active_theme(&self) -> Theme {
        if !self.features.themes {
            return Theme::Desert;
        }
        self.theme_override.unwrap_or(self.theme)
    }

    #[must_use]
    pub fn has_encounter_on_road(&self, encounter_id: &str) -> bool {
        self.npcs.iter().any(|npc| npc.encounter_id == encounter_id)
    }

    #[must_use]
    pub fn count_on_road(&self, kind: NpcKind) -> usize {
        self.npcs.iter().filter(|npc| npc.kind == kind).count()
    }

    /// Index of the nearest person close enough to interact with.
    #[must_use]
    pub fn person_in_range(&self, range: f32) -> Option<usize> {
        let player = self.player;
        let distance_sq = |npc: &Npc| (npc.x - player.x).powi(2) + (npc.y - player.y).powi(2);
        self.npcs
            .iter()
            .enumerate()
            .filter(|(_, npc)| npc.kind == NpcKind::Person && npc.overlaps(player, range))
            .min_by(|(_, a), (_, b)| distance_sq(a).total_cmp(&distance_sq(b)))
            .map(|(index, _)| index)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }

    pub(crate) fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub(crate) fn set_status(&mut self, to: GameStatus) {
        let from = self.status;
        if from == to {
            return;
        }
        self.status = to;
        self.events.push(GameEvent::StatusChanged { from, to });
    }

    pub(crate) fn log(&mut self, key: &str) {
        self.journal.push(key.to_string());
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(crate) fn cue(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Audio(AudioCommand::PlayCue(cue)));
    }

    pub(crate) fn audio(&mut self, commands: impl IntoIterator<Item = AudioCommand>) {
        self.events
            .extend(commands.into_iter().map(GameEvent::Audio));
    }

    pub(crate) fn notify(&mut self, text: impl Into<String>) {
        if !self.features.notifications {
            return;
        }
        let text = text.into();
        self.notifications.push(Notification {
            text: text.clone(),
            remaining_ms: NOTIFICATION_TTL_MS,
        });
        if self.notifications.len() > MAX_NOTIFICATIONS {
            let overflow = self.notifications.len() - MAX_NOTIFICATIONS;
            self.notifications.drain(..overflow);
        }
        self.events.push(GameEvent::Notification { text });
    }

    /// Age notifications by one frame and drop the expired ones.
    pub(crate) fn age_notifications(&mut self, elapsed_ms: f32) {
        for note in &mut self.notifications {
            note.remaining_ms -= elapsed_ms;
        }
        self.notifications.retain(|note| note.remaining_ms > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;

    #[test]
    fn person_in_range_prefers_the_nearest() {
        use crate::passengers::{Passenger, PassengerKind};

        let mut state = GameState::new(Features::for_variant(Variant::CaravanOnly));
        let player = state.player;
        for (id, dx) in [(1_u64, 55.0), (2, 1.0), (3, 200.0)] {
            let passenger = Passenger::new(id, format!("p{id}"), PassengerKind::Guard);
            let at = Point::new(player.x + dx, player.y);
            state.npcs.push(Npc::person(id, at, passenger, 1.0));
        }
        assert_eq!(state.person_in_range(60.0), Some(1));
        assert_eq!(state.person_in_range(30.0), Some(1));
        state.npcs.remove(1);
        assert_eq!(state.person_in_range(60.0), Some(0));
        assert_eq!(state.person_in_range(30.0), None);
    }

    #[test]
    fn status_changes_emit_once() {
        let mut state = GameState::new(Features::for_variant(Variant::Expanded));
        state.set_status(GameStatus::Playing);
        state.set_status(GameStatus::Playing);
        let events = state.drain_events();
        assert_eq!(
            events,
            vec![GameEvent::StatusChanged {
                from: GameStatus::Title,
                to: GameStatus::Playing
            }]
        );
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn notifications_cap_and_expire() {
        let mut state = GameState::new(Features::for_variant(Variant::Expanded));
        for n in 0..6 {
            state.notify(format!("note {n}"));
        }
        assert_eq!(state.notifications.len(), MAX_NOTIFICATIONS);
        assert_eq!(state.notifications[0].text, "note 2");
        state.age_notifications(NOTIFICATION_TTL_MS);
        assert!(state.notifications.is_empty());
    }

    #[test]
    fn caravan_only_ignores_notifications_and_themes() {
        let mut state = GameState::new(Features::for_variant(Variant::CaravanOnly));
        state.notify("hello");
        state.theme_override = Some(Theme::Toxic);
        assert!(state.notifications.is_empty());
        assert_eq!(state.active_theme(), Theme::Desert);
    }

    #[test]
    fn ids_increase() {
        let mut state = GameState::new(Features::for_variant(Variant::CaravanOnly));
        let a = state.next_id();
        let b = state.next_id();
        assert!(b > a);
    }
}
