//! Stat aggregation — tier-1 normalization and the four stat formulas.
//!
//! Every module entry is reduced to a tier-1 equivalent count
//! (`amount * tier`), summed per kind, and the sums feed closed-form
//! formulas. With `S`, `E`, `P` the speed, efficiency and productivity
//! counts:
//!
//! | Stat | Formula |
//! |------|---------|
//! | Processing speed | `1 + S - 0.25P` |
//! | Energy consumption (machines) | `(1 + 2S + 0.5P) * 0.85^E` |
//! | Energy production (generators) | `(1 + 0.5E) * round3(0.9^S) * 0.8^P` |
//! | Product waste | `100 - round(10S * round3(0.75^P))` |
//!
//! All four are floored at zero. The functions here are total: any
//! non-negative input produces a value, none of them panic or return errors.
//!
//! ```
//! use modcalc_logic::modules::{ApplicationMode, EntriesByKind, ModuleEntry, ModuleKind};
//! use modcalc_logic::stats::compute_stats;
//!
//! let mut entries = EntriesByKind::new();
//! entries.insert(ModuleKind::Speed, vec![ModuleEntry::new(2, 1)]);
//! let stats = compute_stats(&entries, ApplicationMode::Machines);
//! assert_eq!(stats.processing_speed, 3.0);
//! assert_eq!(stats.product_waste, 80.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::coefficients as c;
use crate::modules::{ApplicationMode, EntriesByKind, ModuleEntry, ModuleKind};

/// Tier-1 equivalent counts per module kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierOneCounts {
    pub speed: u64,
    pub efficiency: u64,
    pub productivity: u64,
}

impl TierOneCounts {
    /// Sum tier-1 equivalents over `(kind, entry)` pairs.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ModuleKind, ModuleEntry)>,
    {
        let mut counts = Self::default();
        for (kind, entry) in entries {
            let slot = counts.get_mut(kind);
            *slot = slot.saturating_add(entry.tier_one_equivalent());
        }
        counts
    }

    /// Sum tier-1 equivalents over a kind-keyed map.
    pub fn from_map(entries: &EntriesByKind) -> Self {
        Self::from_entries(
            entries
                .iter()
                .flat_map(|(kind, list)| list.iter().map(move |e| (*kind, *e))),
        )
    }

    pub fn get(&self, kind: ModuleKind) -> u64 {
        match kind {
            ModuleKind::Speed => self.speed,
            ModuleKind::Efficiency => self.efficiency,
            ModuleKind::Productivity => self.productivity,
        }
    }

    fn get_mut(&mut self, kind: ModuleKind) -> &mut u64 {
        match kind {
            ModuleKind::Speed => &mut self.speed,
            ModuleKind::Efficiency => &mut self.efficiency,
            ModuleKind::Productivity => &mut self.productivity,
        }
    }
}

/// Derived stats as multipliers (`1.0` = 100%), except `product_waste`
/// which is already an integer percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub processing_speed: f64,
    /// Zero in generator mode.
    pub energy_consumption: f64,
    /// Zero in machine mode.
    pub energy_production: f64,
    pub product_waste: f64,
}

/// Compute stats for the given entries and application mode.
pub fn compute_stats(entries: &EntriesByKind, mode: ApplicationMode) -> Stats {
    stats_from_counts(&TierOneCounts::from_map(entries), mode)
}

/// Compute stats from already-normalized tier-1 counts.
pub fn stats_from_counts(counts: &TierOneCounts, mode: ApplicationMode) -> Stats {
    let s = counts.speed as f64;
    let e = counts.efficiency as f64;
    let p = counts.productivity as f64;

    Stats {
        processing_speed: processing_speed(s, p),
        energy_consumption: match mode {
            ApplicationMode::Machines => energy_consumption(s, e, p),
            ApplicationMode::Generators => 0.0,
        },
        energy_production: match mode {
            ApplicationMode::Machines => 0.0,
            ApplicationMode::Generators => energy_production(s, e, p),
        },
        product_waste: product_waste(s, p),
    }
}

fn processing_speed(s: f64, p: f64) -> f64 {
    (1.0 + s - c::SPEED_PRODUCTIVITY_PENALTY * p).max(0.0)
}

fn energy_consumption(s: f64, e: f64, p: f64) -> f64 {
    let base = 1.0 + c::CONSUMPTION_PER_SPEED * s + c::CONSUMPTION_PER_PRODUCTIVITY * p;
    (base * c::CONSUMPTION_EFFICIENCY_BASE.powf(e)).max(0.0)
}

fn energy_production(s: f64, e: f64, p: f64) -> f64 {
    let base = 1.0 + c::PRODUCTION_PER_EFFICIENCY * e;
    (base * round3(c::PRODUCTION_SPEED_BASE.powf(s)) * c::PRODUCTION_PRODUCTIVITY_BASE.powf(p))
        .max(0.0)
}

fn product_waste(s: f64, p: f64) -> f64 {
    let reduction = (c::WASTE_PER_SPEED * s * round3(c::WASTE_PRODUCTIVITY_BASE.powf(p))).round();
    (c::WASTE_CEILING - reduction).max(0.0)
}

/// Round to three decimal places, half away from zero.
pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
