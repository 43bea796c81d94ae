//! How a run ended and the summary shown on the end screen.
use serde::{Deserialize, Serialize};

use crate::constants::{HERO_RENOWN, IRON_MONGER_RENOWN_CEILING, WEALTH_GOLD};
use crate::resources::ResourceState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryKind {
    Hero,
    MerchantPrince,
    IronMonger,
    Survivor,
}

impl VictoryKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::MerchantPrince => "merchant_prince",
            Self::IronMonger => "iron_monger",
            Self::Survivor => "survivor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "victory")]
pub enum Ending {
    Victory(VictoryKind),
    Starved,
}

/// Classify a retirement at the Haven.
#[must_use]
pub const fn classify_victory(renown: i32, gold: i32) -> VictoryKind {
    if renown >= HERO_RENOWN {
        VictoryKind::Hero
    } else if gold >= WEALTH_GOLD && renown < IRON_MONGER_RENOWN_CEILING {
        VictoryKind::IronMonger
    } else if gold >= WEALTH_GOLD {
        VictoryKind::MerchantPrince
    } else {
        VictoryKind::Survivor
    }
}

struct EndingText {
    title: &'static str,
    subtitle: &'static str,
    epilogue: &'static str,
    color: &'static str,
    icon: &'static str,
}

const fn ending_text(ending: Ending) -> EndingText {
    match ending {
        Ending::Starved => EndingText {
            title: "YOU DIED",
            subtitle: "OUT OF PROVISIONS",
            epilogue: "The sand dunes of the Westfold claim your wagons. The wanderers will find only blocky skeletons and empty chests in the years to come.",
            color: "#ff5555",
            icon: "💀",
        },
        Ending::Victory(VictoryKind::Hero) => EndingText {
            title: "SAVIOR OF THE ROADS",
            subtitle: "LEGENDARY STATUS",
            epilogue: "You arrived with little gold, but the cheers of the villagers shake the sky. They tell stories of the Caravanner who prioritized lives over profit.",
            color: "#55ff55",
            icon: "⭐",
        },
        Ending::Victory(VictoryKind::MerchantPrince) => EndingText {
            title: "MERCHANT PRINCE",
            subtitle: "WEALTHY & WISE",
            epilogue: "Your wagons are heavy with emeralds and gold ingots. The Eastmere Haven welcomes its new richest citizen.",
            color: "#ffff55",
            icon: "👑",
        },
        Ending::Victory(VictoryKind::IronMonger) => EndingText {
            title: "THE IRON MONGER",
            subtitle: "PROFIT AT ANY COST",
            epilogue: "You arrived with mountains of gold, but the road is quieter now. Power is yours, even if it is lonely.",
            color: "#aaaaaa",
            icon: "⚔️",
        },
        Ending::Victory(VictoryKind::Survivor) => EndingText {
            title: "HUMBLE SURVIVOR",
            subtitle: "JOURNEY ENDED",
            epilogue: "The gates of Eastmere Haven open. You are weary, hungry, and your pockets aren't full, but you made it.",
            color: "#ffffff",
            icon: "🏠",
        },
    }
}

/// Everything the end screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndSummary {
    pub ending: Ending,
    pub title: String,
    pub subtitle: String,
    pub epilogue: String,
    pub color: String,
    pub icon: String,
    pub renown: i32,
    pub wealth: i32,
    /// Journeys started, shown as regions crossed.
    pub regions: u32,
    pub score: i64,
    pub passengers: usize,
}

impl EndSummary {
    #[must_use]
    pub fn new(ending: Ending, resources: &ResourceState) -> Self {
        let text = ending_text(ending);
        Self {
            ending,
            title: text.title.to_string(),
            subtitle: text.subtitle.to_string(),
            epilogue: text.epilogue.to_string(),
            color: text.color.to_string(),
            icon: text.icon.to_string(),
            renown: resources.reputation,
            wealth: resources.gold,
            regions: resources.journey_count,
            score: resources.score,
            passengers: resources.passengers.len(),
        }
    }

    #[must_use]
    pub const fn is_victory(&self) -> bool {
        matches!(self.ending, Ending::Victory(_))
    }
}
