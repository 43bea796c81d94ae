//! Keyboard and pointer input.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    const fn keys(self) -> [&'static str; 2] {
        match self {
            Self::Up => ["w", "arrowup"],
            Self::Down => ["s", "arrowdown"],
            Self::Left => ["a", "arrowleft"],
            Self::Right => ["d", "arrowright"],
        }
    }

    /// Unit step on each axis, screen coordinates (y grows downward).
    #[must_use]
    pub const fn delta(self) -> (f32, f32) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Down => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
        }
    }
}

/// Discrete actions triggered by a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Interact,
    Choose(usize),
    Confirm,
    Restart,
    ToggleMode,
    Fire,
    OpenHangar,
    Close,
}

const SPACE: &str = " ";

/// Canonical key name: lower-cased, with `space`/`spacebar` folded to `" "`.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    if key == SPACE {
        return SPACE.to_string();
    }
    let lowered = key.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "space" | "spacebar" => SPACE.to_string(),
        "esc" => "escape".to_string(),
        "return" => "enter".to_string(),
        _ => lowered,
    }
}

/// Every command a key can mean; the session picks the one that fits its status.
#[must_use]
pub fn commands_for(key: &str) -> SmallVec<[Command; 2]> {
    let key = normalize_key(key);
    let mut out = SmallVec::new();
    match key.as_str() {
        "e" => out.push(Command::Interact),
        " " => {
            out.push(Command::Confirm);
            out.push(Command::Fire);
        }
        "enter" => {
            out.push(Command::Confirm);
            out.push(Command::Restart);
        }
        "r" => out.push(Command::Restart),
        "q" => out.push(Command::ToggleMode),
        "f" => out.push(Command::Fire),
        "v" => out.push(Command::OpenHangar),
        "escape" => out.push(Command::Close),
        digit => {
            if let Ok(n) = digit.parse::<usize>()
                && (1..=9).contains(&n)
            {
                out.push(Command::Choose(n));
            }
        }
    }
    out
}

/// Held keys, presses waiting for the next frame, and an optional pointer
/// target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    held: BTreeSet<String>,
    #[serde(default)]
    queued: SmallVec<[String; 4]>,
    /// Pointer x in world coordinates, for pointer steering.
    pub pointer_x: Option<f32>,
}

impl InputState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `key`. A fresh press of a command key is also queued for the
    /// next frame; holding it down does not repeat the press.
    pub fn key_down(&mut self, key: &str) {
        let key = normalize_key(key);
        if self.held.insert(key.clone()) && !commands_for(&key).is_empty() {
            self.queued.push(key);
        }
    }

    pub fn key_up(&mut self, key: &str) {
        self.held.remove(&normalize_key(key));
    }

    /// Release every held key. Queued presses stay until taken.
    pub fn clear(&mut self) {
        self.held.clear();
    }

    /// Presses queued since the last frame, oldest first.
    #[must_use]
    pub fn queued(&self) -> &[String] {
        &self.queued
    }

    /// Hand over the queued presses in press order, leaving the queue empty.
    pub fn take_queued(&mut self) -> SmallVec<[String; 4]> {
        std::mem::take(&mut self.queued)
    }

    #[must_use]
    pub fn is_held(&self, key: &str) -> bool {
        self.held.contains(&normalize_key(key))
    }

    #[must_use]
    pub fn direction_held(&self, direction: Direction) -> bool {
        direction.keys().iter().any(|key| self.held.contains(*key))
    }

    /// Any direction key is held.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        Direction::ALL.iter().any(|dir| self.direction_held(*dir))
    }

    #[must_use]
    pub fn fire_held(&self) -> bool {
        self.held.contains(SPACE) || self.held.contains("f")
    }

    /// Held directions as a movement vector (not normalised, like keyboard steering).
    #[must_use]
    pub fn movement(&self) -> (f32, f32) {
        Direction::ALL
            .iter()
            .filter(|dir| self.direction_held(**dir))
            .fold((0.0, 0.0), |(x, y), dir| {
                let (dx, dy) = dir.delta();
                (x + dx, y + dy)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_normalized() {
        assert_eq!(normalize_key("ArrowUp"), "arrowup");
        assert_eq!(normalize_key(" "), " ");
        assert_eq!(normalize_key("Space"), " ");
        assert_eq!(normalize_key("Esc"), "escape");
    }

    #[test]
    fn commands_cover_bindings() {
        assert_eq!(commands_for("E").as_slice(), &[Command::Interact]);
        assert_eq!(commands_for("3").as_slice(), &[Command::Choose(3)]);
        assert!(commands_for("0").is_empty());
        assert_eq!(
            commands_for("Enter").as_slice(),
            &[Command::Confirm, Command::Restart]
        );
        assert_eq!(commands_for(" ").as_slice(), &[Command::Confirm, Command::Fire]);
        assert_eq!(commands_for("v").as_slice(), &[Command::OpenHangar]);
        assert!(commands_for("x").is_empty());
    }

    #[test]
    fn only_direction_keys_count_as_moving() {
        let mut input = InputState::new();
        input.key_down("e");
        assert!(!input.is_moving());
        input.key_down("ArrowLeft");
        input.key_down("w");
        assert!(input.is_moving());
        assert_eq!(input.movement(), (-1.0, -1.0));
        input.key_up("arrowleft");
        assert_eq!(input.movement(), (0.0, -1.0));
    }

    #[test]
    fn command_presses_queue_once_per_press() {
        let mut input = InputState::new();
        input.key_down("E");
        input.key_down("e");
        input.key_down("w");
        input.key_down("2");
        assert_eq!(input.queued(), ["e", "2"]);

        input.clear();
        input.key_down("e");
        let taken = input.take_queued();
        assert_eq!(taken.as_slice(), ["e", "2", "e"]);
        assert!(input.queued().is_empty());
        assert!(input.is_held("e"));
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut input = InputState::new();
        input.key_down("a");
        input.key_down("d");
        assert_eq!(input.movement(), (0.0, 0.0));
        assert!(input.is_moving());
    }
}
