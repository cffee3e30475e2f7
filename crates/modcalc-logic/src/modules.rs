//! Module model — kinds, tiered entries, application modes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::limits;

/// Upgrade module kind. Fixed set, never extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Speed,
    Efficiency,
    Productivity,
}

impl ModuleKind {
    /// All kinds in display order.
    pub const ALL: [ModuleKind; 3] = [
        ModuleKind::Speed,
        ModuleKind::Efficiency,
        ModuleKind::Productivity,
    ];

    /// Lowercase identifier used in files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            ModuleKind::Speed => "speed",
            ModuleKind::Efficiency => "efficiency",
            ModuleKind::Productivity => "productivity",
        }
    }

    /// Capitalized label for display.
    pub fn label(self) -> &'static str {
        match self {
            ModuleKind::Speed => "Speed",
            ModuleKind::Efficiency => "Efficiency",
            ModuleKind::Productivity => "Productivity",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the modules are installed. Selects whether energy consumption or
/// energy production is the meaningful output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationMode {
    #[default]
    Machines,
    Generators,
}

impl ApplicationMode {
    pub fn name(self) -> &'static str {
        match self {
            ApplicationMode::Machines => "machines",
            ApplicationMode::Generators => "generators",
        }
    }
}

impl fmt::Display for ApplicationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure to parse a kind or mode name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseNameError {
    #[error("unknown module kind `{0}` (expected speed, efficiency or productivity)")]
    UnknownKind(String),
    #[error("unknown application mode `{0}` (expected machines or generators)")]
    UnknownMode(String),
}

impl FromStr for ModuleKind {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ModuleKind::ALL
            .into_iter()
            .find(|k| k.name() == lower)
            .ok_or_else(|| ParseNameError::UnknownKind(s.to_string()))
    }
}

impl FromStr for ApplicationMode {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "machines" | "machine" => Ok(ApplicationMode::Machines),
            "generators" | "generator" => Ok(ApplicationMode::Generators),
            _ => Err(ParseNameError::UnknownMode(s.to_string())),
        }
    }
}

/// One configured stack of modules of a single kind at a single tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub amount: u32,
    pub tier: u32,
}

impl ModuleEntry {
    pub fn new(amount: u32, tier: u32) -> Self {
        Self { amount, tier }
    }

    /// Tier-1 equivalent count of this stack (`amount * tier`).
    ///
    /// Linear in tier. Saturates instead of overflowing.
    pub fn tier_one_equivalent(&self) -> u64 {
        u64::from(self.amount).saturating_mul(u64::from(self.tier))
    }
}

impl Default for ModuleEntry {
    fn default() -> Self {
        Self {
            amount: 0,
            tier: limits::DEFAULT_TIER,
        }
    }
}

/// Entries grouped by module kind — the aggregator's input shape.
pub type EntriesByKind = BTreeMap<ModuleKind, Vec<ModuleEntry>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("Speed".parse::<ModuleKind>(), Ok(ModuleKind::Speed));
        assert_eq!(
            " productivity ".parse::<ModuleKind>(),
            Ok(ModuleKind::Productivity)
        );
        assert!(matches!(
            "quality".parse::<ModuleKind>(),
            Err(ParseNameError::UnknownKind(_))
        ));
    }

    #[test]
    fn modes_parse_with_singular_alias() {
        assert_eq!(
            "generator".parse::<ApplicationMode>(),
            Ok(ApplicationMode::Generators)
        );
        assert_eq!(
            "MACHINES".parse::<ApplicationMode>(),
            Ok(ApplicationMode::Machines)
        );
        assert!("furnace".parse::<ApplicationMode>().is_err());
    }

    #[test]
    fn default_mode_is_machines() {
        assert_eq!(ApplicationMode::default(), ApplicationMode::Machines);
    }

    #[test]
    fn tier_one_equivalent_is_linear() {
        assert_eq!(ModuleEntry::new(3, 1).tier_one_equivalent(), 3);
        assert_eq!(ModuleEntry::new(2, 5).tier_one_equivalent(), 10);
        assert_eq!(ModuleEntry::new(4, 0).tier_one_equivalent(), 0);
    }

    #[test]
    fn tier_one_equivalent_does_not_overflow() {
        let huge = ModuleEntry::new(u32::MAX, u32::MAX);
        assert_eq!(
            huge.tier_one_equivalent(),
            u64::from(u32::MAX) * u64::from(u32::MAX)
        );
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ModuleKind::Efficiency).unwrap();
        assert_eq!(json, "\"efficiency\"");
        let mode: ApplicationMode = serde_json::from_str("\"generators\"").unwrap();
        assert_eq!(mode, ApplicationMode::Generators);
    }
}
