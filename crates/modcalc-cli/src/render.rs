//! Plain-text rendering of a calculator report.

use std::fmt::Write;

use modcalc_logic::constants::limits;
use modcalc_logic::report::Report;

/// Render a report the way the calculator screen lays it out: results
/// first, then the module summary.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Module Upgrade Calculator");
    let _ = writeln!(out, "Application: {}", report.mode);
    let _ = writeln!(
        out,
        "Modules: {}/{}",
        report.total_modules,
        limits::MAX_TOTAL_MODULES
    );

    let _ = writeln!(out, "\nCalculated Results");
    if report.rows.is_empty() {
        let _ = writeln!(out, "  Populate the modules to see results.");
    }
    let width = report.rows.iter().map(|r| r.label.len()).max().unwrap_or(0) + 1;
    for row in &report.rows {
        let _ = writeln!(
            out,
            "  {:<width$} {:>6}",
            format!("{}:", row.label),
            row.value,
            width = width
        );
    }

    let _ = writeln!(out, "\nModule Summary");
    for kind in &report.summary {
        let _ = writeln!(out, "  {}:", kind.kind.label());
        if kind.tiers.is_empty() {
            let _ = writeln!(out, "    No modules");
        }
        for tier in &kind.tiers {
            let _ = writeln!(out, "    Tier {}: {}x", tier.tier, tier.amount);
        }
    }

    out
}
