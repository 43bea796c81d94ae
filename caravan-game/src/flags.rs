use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::data::{Requirement, parse_flag_requirement};

/// Permanent unlocks collected during a run. The set only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(BTreeSet<String>);

impl FlagSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the flag was not present before.
    pub fn insert(&mut self, flag: impl Into<String>) -> bool {
        self.0.insert(flag.into())
    }

    #[must_use]
    pub fn contains(&self, flag: &str) -> bool {
        self.0.contains(flag)
    }

    /// Whether a `required_flag` is met, honouring `reputation_<n>` thresholds.
    #[must_use]
    pub fn satisfies(&self, required: &str, renown: i32) -> bool {
        if self.contains(required) {
            return true;
        }
        match parse_flag_requirement(required) {
            Requirement::Renown(threshold) => renown >= threshold,
            _ => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_monotonic() {
        let mut flags = FlagSet::new();
        assert!(flags.insert("axle_upgrade"));
        assert!(!flags.insert("axle_upgrade"));
        assert_eq!(flags.len(), 1);
        assert!(flags.contains("axle_upgrade"));
    }

    #[test]
    fn renown_thresholds_are_synthetic() {
        let flags = FlagSet::new();
        assert!(!flags.satisfies("reputation_10", 9));
        assert!(flags.satisfies("reputation_10", 10));
        assert!(flags.satisfies("reputation_3", 42));
        assert!(!flags.satisfies("helped_wanderer", 999));
    }
}
