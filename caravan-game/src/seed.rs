//! Reversible share codes for seeded runs.
//! Code format: <VARIANT>-<WORD><NN>, e.g., CV-DUNE42, EX-LANTERN07

use crate::config::Variant;

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub const WORD_LIST: [&str; 64] = [
    "DUNE", "CAMEL", "OASIS", "WAGON", "AXLE", "LANTERN", "SPICE", "SILK", "AMBER", "COPPER",
    "EMBER", "MIRAGE", "BANDIT", "GUARD", "SCHOLAR", "COOK", "MERCHNT", "HAVEN", "GATE", "TOLL",
    "CONVOY", "CARAVAN", "ROAD", "CHUNK", "BLOCK", "EMERALD", "INGOT", "CRATE", "JERKY", "RATION",
    "WELL", "CANYON", "MESA", "CACTUS", "SCORPN", "VULTURE", "FALCON", "HORIZON", "COMPASS",
    "MAP", "ORACLE", "SEER", "GAMBLER", "FORGE", "ANVIL", "WHEEL", "SADDLE", "TENT", "DRUM",
    "FLUTE", "BAZAAR", "RELIC", "TOTEM", "STORM", "SAND", "NEON", "FROST", "TOXIC", "BIKE",
    "TRUCK", "TRAIN", "COIN", "LOTTERY", "WANDER",
];

const NN_LIMIT: u8 = 100;

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    word_index & 0x01FF | ((u16::from(nn) & 0x7F) << 9)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    let nn = u8::try_from((packed >> 9) & 0x7F).unwrap_or(0);
    (packed & 0x01FF, nn)
}

fn compose_seed(variant: Variant, word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    let [low, high] = packed.to_le_bytes();
    // Domain-separated FNV input
    let mut buf = [0u8; 11];
    buf[..6].copy_from_slice(b"CARVN-");
    buf[6..8].copy_from_slice(variant.code_prefix().as_bytes());
    buf[8] = low;
    buf[9] = high;
    buf[10] = 0xA5;
    let h = fnv1a64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Word index and suffix naming `seed`. Seeds composed from a code keep that
/// code; any other seed is spread over the code space by its low digits.
fn code_parts(variant: Variant, seed: u64) -> (u16, u8) {
    let (wi, nn) = unpack(u16::try_from(seed & 0xFFFF).unwrap_or(0));
    if usize::from(wi) < WORD_LIST.len()
        && nn < NN_LIMIT
        && compose_seed(variant, wi, nn) == seed
    {
        return (wi, nn);
    }
    let words = u64::try_from(WORD_LIST.len()).unwrap_or(1);
    let wi = u16::try_from(seed % words).unwrap_or(0);
    let nn = u8::try_from((seed / words) % u64::from(NN_LIMIT)).unwrap_or(0);
    (wi, nn)
}

/// Share code for `seed`. Only seeds in code space (see [`canonical_seed`])
/// decode back to themselves.
#[must_use]
pub fn encode_friendly(variant: Variant, seed: u64) -> String {
    let (wi, nn) = code_parts(variant, seed);
    let word = WORD_LIST.get(usize::from(wi)).copied().unwrap_or(WORD_LIST[0]);
    format!("{}-{word}{nn:02}", variant.code_prefix())
}

/// The seed a run should actually use so that its share code replays it.
#[must_use]
pub fn canonical_seed(variant: Variant, seed: u64) -> u64 {
    let (wi, nn) = code_parts(variant, seed);
    compose_seed(variant, wi, nn)
}

#[must_use]
pub fn decode_to_seed(code: &str) -> Option<(Variant, u64)> {
    let s = code.trim();
    let (prefix, rest) = s.split_once('-')?;
    let variant: Variant = prefix.parse().ok()?;
    if rest.len() < 3 || !rest.is_ascii() {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    if nn >= NN_LIMIT {
        return None;
    }
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| sanitize_word(w) == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some((variant, compose_seed(variant, wi, nn)))
}

/// Build a fresh code from host entropy (a clock, an OS random number).
#[must_use]
pub fn generate_code_from_entropy(variant: Variant, entropy: u64) -> String {
    let words = u64::try_from(WORD_LIST.len()).unwrap_or(1);
    let wi = u16::try_from(entropy % words).unwrap_or(0);
    let nn = u8::try_from((entropy >> 17) % u64::from(NN_LIMIT)).unwrap_or(0);
    encode_friendly(variant, compose_seed(variant, wi, nn))
}
