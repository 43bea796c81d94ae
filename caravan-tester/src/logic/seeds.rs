use anyhow::{Result, bail};
use caravan_game::seed::WORD_LIST;
use caravan_game::{Variant, decode_to_seed, encode_friendly};
use std::collections::HashMap;

/// Detailed seed metadata used for logic runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
    pub source_variant: Option<Variant>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            code: None,
            source_variant: None,
        }
    }

    #[must_use]
    pub const fn from_share_code(seed: u64, variant: Variant, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
            source_variant: Some(variant),
        }
    }

    #[must_use]
    pub fn matches_variant(&self, variant: Variant) -> bool {
        self.source_variant.is_none_or(|source| source == variant)
    }

    #[must_use]
    pub fn share_code_for(&self, variant: Variant) -> String {
        if let (Some(code), Some(source)) = (&self.code, self.source_variant)
            && source == variant
        {
            return code.clone();
        }
        encode_friendly(variant, self.seed)
    }
}

/// Resolve CLI seed arguments into canonical seed metadata.
///
/// Accepts integers, share codes and the keyword `words`, which expands to
/// every word of the share-code list at suffix `00` for both variants.
///
/// # Errors
///
/// Fails on a token that is neither a number nor a share code.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if token.eq_ignore_ascii_case("words") {
            pending.extend(word_seeds());
            continue;
        }
        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }
        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }
        if let Some((variant, seed)) = decode_to_seed(token) {
            pending.push(SeedInfo::from_share_code(
                seed,
                variant,
                encode_friendly(variant, seed),
            ));
            continue;
        }
        bail!("Unrecognized seed token: {token}");
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<(u64, Option<Variant>), usize> = HashMap::new();
    for info in pending {
        let key = (info.seed, info.source_variant);
        if !index.contains_key(&key) {
            index.insert(key, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }
    Ok(deduped)
}

fn word_seeds() -> Vec<SeedInfo> {
    let mut seeds = Vec::with_capacity(WORD_LIST.len() * Variant::ALL.len());
    for word in WORD_LIST {
        for variant in Variant::ALL {
            let code = format!("{}-{word}00", variant.code_prefix());
            if let Some((variant, seed)) = decode_to_seed(&code) {
                seeds.push(SeedInfo::from_share_code(seed, variant, code));
            }
        }
    }
    seeds
}
