//! Display rows for computed stats and a per-kind module summary.
//!
//! Front-ends render these directly; nothing here formats for a specific
//! terminal or widget toolkit.

use serde::{Deserialize, Serialize};

use crate::form::AppState;
use crate::modules::{ApplicationMode, ModuleKind};
use crate::stats::Stats;

/// Multiplier as a whole percentage (`1.215` → `122`).
pub fn percent(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// One labelled stat line, e.g. `Processing Speed: 300%`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRow {
    pub label: String,
    pub value: String,
}

/// Rows shown for `stats` under `mode`: processing speed, then whichever
/// energy stat applies, then product waste.
pub fn stat_rows(stats: &Stats, mode: ApplicationMode) -> Vec<StatRow> {
    let energy = match mode {
        ApplicationMode::Machines => StatRow {
            label: "Energy Consumption".to_string(),
            value: format!("{}%", percent(stats.energy_consumption)),
        },
        ApplicationMode::Generators => StatRow {
            label: "Energy Production".to_string(),
            value: format!("{}%", percent(stats.energy_production)),
        },
    };
    vec![
        StatRow {
            label: "Processing Speed".to_string(),
            value: format!("{}%", percent(stats.processing_speed)),
        },
        energy,
        StatRow {
            label: "Product Waste".to_string(),
            // Already an integer percentage.
            value: format!("{}%", stats.product_waste as i64),
        },
    ]
}

/// Installed amount at one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTotal {
    pub tier: u32,
    pub amount: u32,
}

/// Installed modules of one kind, grouped by tier in ascending order.
/// Empty `tiers` means no modules of this kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSummary {
    pub kind: ModuleKind,
    pub tiers: Vec<TierTotal>,
}

/// Summarize installed modules per kind, skipping empty slots and merging
/// slots that share a tier.
pub fn module_summary(state: &AppState) -> Vec<KindSummary> {
    ModuleKind::ALL
        .into_iter()
        .map(|kind| {
            let mut tiers: Vec<TierTotal> = Vec::new();
            for slot in state.slots(kind).iter().filter(|s| s.entry.amount > 0) {
                match tiers.iter_mut().find(|t| t.tier == slot.entry.tier) {
                    Some(existing) => {
                        existing.amount = existing.amount.saturating_add(slot.entry.amount)
                    }
                    None => tiers.push(TierTotal {
                        tier: slot.entry.tier,
                        amount: slot.entry.amount,
                    }),
                }
            }
            tiers.sort_by_key(|t| t.tier);
            KindSummary { kind, tiers }
        })
        .collect()
}

/// Everything a front-end shows for one form state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub mode: ApplicationMode,
    pub total_modules: u32,
    /// `None` until the form has been populated.
    pub stats: Option<Stats>,
    pub rows: Vec<StatRow>,
    pub summary: Vec<KindSummary>,
}

/// Build the report for a form state.
pub fn build_report(state: &AppState) -> Report {
    let stats = state.results().copied();
    Report {
        mode: state.mode(),
        total_modules: state.total_amount(),
        stats,
        rows: stats
            .map(|s| stat_rows(&s, state.mode()))
            .unwrap_or_default(),
        summary: module_summary(state),
    }
}
