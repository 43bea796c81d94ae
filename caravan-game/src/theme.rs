//! Visual and musical themes that rotate with each journey.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Desert,
    Neon,
    Frozen,
    Toxic,
}

/// Colours a host needs to paint the road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub road: &'static str,
    pub grass: &'static str,
    pub accent: &'static str,
    pub sky: &'static str,
}

impl Theme {
    pub const ALL: [Self; 4] = [Self::Desert, Self::Neon, Self::Frozen, Self::Toxic];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Desert => "desert",
            Self::Neon => "neon",
            Self::Frozen => "frozen",
            Self::Toxic => "toxic",
        }
    }

    /// Theme for the given 1-based journey number.
    #[must_use]
    pub fn for_journey(journey: u32) -> Self {
        let index = usize::try_from(journey.saturating_sub(1) % 4).unwrap_or(0);
        Self::ALL[index]
    }

    #[must_use]
    pub const fn drain_factor(self) -> f32 {
        match self {
            Self::Desert | Self::Neon => 1.0,
            Self::Frozen => 1.15,
            Self::Toxic => 1.1,
        }
    }

    #[must_use]
    pub const fn palette(self) -> Palette {
        match self {
            Self::Desert => Palette {
                road: "#866043",
                grass: "#55aa33",
                accent: "#fbbf24",
                sky: "#1a1a1a",
            },
            Self::Neon => Palette {
                road: "#1e1b4b",
                grass: "#0f172a",
                accent: "#f0abfc",
                sky: "#020617",
            },
            Self::Frozen => Palette {
                road: "#cbd5e1",
                grass: "#e0f2fe",
                accent: "#38bdf8",
                sky: "#0c4a6e",
            },
            Self::Toxic => Palette {
                road: "#3f3f46",
                grass: "#4d7c0f",
                accent: "#a3e635",
                sky: "#1a2e05",
            },
        }
    }

    /// Semitone offset applied to the background music.
    #[must_use]
    pub const fn transpose_semitones(self) -> i8 {
        match self {
            Self::Desert => 0,
            Self::Neon => 2,
            Self::Frozen => -2,
            Self::Toxic => -5,
        }
    }

    #[must_use]
    pub fn transpose(self, frequency: f32) -> f32 {
        frequency * 2f32.powf(f32::from(self.transpose_semitones()) / 12.0)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLOAT_EPSILON;

    #[test]
    fn journeys_cycle_through_themes() {
        assert_eq!(Theme::for_journey(1), Theme::Desert);
        assert_eq!(Theme::for_journey(2), Theme::Neon);
        assert_eq!(Theme::for_journey(4), Theme::Toxic);
        assert_eq!(Theme::for_journey(5), Theme::Desert);
        assert_eq!(Theme::for_journey(0), Theme::Desert);
    }

    #[test]
    fn harsh_themes_drain_faster() {
        assert!((Theme::Frozen.drain_factor() - 1.15).abs() < FLOAT_EPSILON);
        assert!((Theme::Toxic.drain_factor() - 1.1).abs() < FLOAT_EPSILON);
        assert!((Theme::Desert.drain_factor() - 1.0).abs() < FLOAT_EPSILON);
    }

    #[test]
    fn desert_is_untransposed() {
        assert!((Theme::Desert.transpose(220.0) - 220.0).abs() < FLOAT_EPSILON);
        assert!(Theme::Neon.transpose(220.0) > 220.0);
        assert!(Theme::Toxic.transpose(220.0) < 220.0);
    }
}
