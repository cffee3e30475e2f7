//! modcalc Headless Validation Harness
//!
//! Sweeps the stat aggregator and the form reducer over fixed scenarios and
//! seeded random loadouts. Runs entirely in-process — no front-end, no I/O
//! beyond the summary printed at the end.
//!
//! Usage:
//!   cargo run -p modcalc-simtest
//!   cargo run -p modcalc-simtest -- --verbose --seed 7 --samples 5000

use modcalc_logic::constants::limits;
use modcalc_logic::form::{reduce, Action, AppState};
use modcalc_logic::modules::{ApplicationMode, EntriesByKind, ModuleEntry, ModuleKind};
use modcalc_logic::report::{build_report, percent};
use modcalc_logic::stats::{compute_stats, stats_from_counts, Stats, TierOneCounts};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MODES: [ApplicationMode; 2] = [ApplicationMode::Machines, ApplicationMode::Generators];

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

#[derive(Debug)]
struct Options {
    verbose: bool,
    seed: u64,
    samples: usize,
}

/// Read harness options. A flag given without a usable value is an error.
fn parse_options(args: &[String]) -> Result<Options, String> {
    fn value_after<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>, String> {
        let Some(i) = args.iter().position(|a| a == flag) else {
            return Ok(None);
        };
        let raw = args
            .get(i + 1)
            .ok_or_else(|| format!("{flag} needs a value"))?;
        raw.parse()
            .map(Some)
            .map_err(|_| format!("{flag}: '{raw}' is not a non-negative integer"))
    }

    Ok(Options {
        verbose: args.iter().any(|a| a == "--verbose"),
        seed: value_after(args, "--seed")?.unwrap_or(42),
        samples: value_after(args, "--samples")?.unwrap_or(2_000),
    })
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let opts = match parse_options(&args) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };
    println!("=== modcalc Validation Harness ===");
    println!("seed {} · {} samples\n", opts.seed, opts.samples);

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut results = Vec::new();

    // 1. Fixed scenarios
    results.extend(validate_scenarios(opts.verbose));

    // 2. Mode gating & non-negativity
    results.extend(validate_output_bounds(&mut rng, opts.samples));

    // 3. Monotonicity in speed
    results.extend(validate_speed_monotonicity(&mut rng, opts.samples));

    // 4. Determinism
    results.extend(validate_determinism(&mut rng, opts.samples));

    // 5. Out-of-range input
    results.extend(validate_out_of_range());

    // 6. Form reducer invariants
    results.extend(validate_form_reducer(&mut rng, opts.samples, opts.verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || opts.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn loadout(list: &[(ModuleKind, u32, u32)]) -> EntriesByKind {
    let mut map = EntriesByKind::new();
    for &(kind, amount, tier) in list {
        map.entry(kind)
            .or_default()
            .push(ModuleEntry::new(amount, tier));
    }
    map
}

/// Random loadout the form could produce: at most 9 modules, tiers 1–40.
fn random_loadout(rng: &mut StdRng) -> EntriesByKind {
    let mut map = EntriesByKind::new();
    let mut left = limits::MAX_TOTAL_MODULES;
    for kind in ModuleKind::ALL {
        let slots = rng.gen_range(1..=3);
        for _ in 0..slots {
            let amount = rng.gen_range(0..=left);
            left -= amount;
            let tier = rng.gen_range(limits::MIN_TIER..=limits::MAX_TIER);
            map.entry(kind)
                .or_default()
                .push(ModuleEntry::new(amount, tier));
        }
    }
    map
}

fn random_mode(rng: &mut StdRng) -> ApplicationMode {
    MODES[rng.gen_range(0..MODES.len())]
}

fn values(stats: &Stats) -> [f64; 4] {
    [
        stats.processing_speed,
        stats.energy_consumption,
        stats.energy_production,
        stats.product_waste,
    ]
}

fn bits(stats: &Stats) -> [u64; 4] {
    values(stats).map(f64::to_bits)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ── 1. Scenarios ────────────────────────────────────────────────────────

fn validate_scenarios(verbose: bool) -> Vec<TestResult> {
    println!("--- Scenarios ---");
    let mut results = Vec::new();

    // Empty loadout is the baseline in both modes
    let machines = compute_stats(&EntriesByKind::new(), ApplicationMode::Machines);
    let generators = compute_stats(&EntriesByKind::new(), ApplicationMode::Generators);
    results.push(TestResult {
        name: "baseline_empty_loadout".into(),
        passed: machines.processing_speed == 1.0
            && machines.energy_consumption == 1.0
            && generators.energy_production == 1.0
            && machines.product_waste == 100.0
            && generators.product_waste == 100.0,
        detail: format!("machines {:?} · generators {:?}", machines, generators),
    });

    // Two tier-1 speed modules in a machine
    let s1 = compute_stats(
        &loadout(&[(ModuleKind::Speed, 2, 1)]),
        ApplicationMode::Machines,
    );
    results.push(TestResult {
        name: "scenario_speed_machines".into(),
        passed: percent(s1.processing_speed) == 300
            && percent(s1.energy_consumption) == 500
            && s1.product_waste == 80.0,
        detail: format!(
            "speed {}% · consumption {}% · waste {}%",
            percent(s1.processing_speed),
            percent(s1.energy_consumption),
            s1.product_waste
        ),
    });

    // One tier-3 productivity module in a machine
    let s2 = compute_stats(
        &loadout(&[(ModuleKind::Productivity, 1, 3)]),
        ApplicationMode::Machines,
    );
    results.push(TestResult {
        name: "scenario_productivity_machines".into(),
        passed: percent(s2.processing_speed) == 25
            && percent(s2.energy_consumption) == 250
            && s2.product_waste == 100.0,
        detail: format!(
            "speed {}% · consumption {}% · waste {}%",
            percent(s2.processing_speed),
            percent(s2.energy_consumption),
            s2.product_waste
        ),
    });

    // Efficiency + speed in a generator
    let s3 = compute_stats(
        &loadout(&[(ModuleKind::Efficiency, 1, 1), (ModuleKind::Speed, 1, 2)]),
        ApplicationMode::Generators,
    );
    results.push(TestResult {
        name: "scenario_generator_production".into(),
        passed: close(s3.energy_production, 1.215) && percent(s3.energy_production) == 122,
        detail: format!("production {:.4} ({}%)", s3.energy_production, percent(s3.energy_production)),
    });

    if verbose {
        for r in &results {
            println!("  {} → {}", r.name, r.detail);
        }
    }
    results
}

// ── 2. Output bounds ────────────────────────────────────────────────────

fn validate_output_bounds(rng: &mut StdRng, samples: usize) -> Vec<TestResult> {
    println!("--- Output Bounds ---");
    let mut negative = 0;
    let mut gating = 0;

    for _ in 0..samples {
        let entries = random_loadout(rng);
        let mode = random_mode(rng);
        let stats = compute_stats(&entries, mode);

        if values(&stats).iter().any(|v| !v.is_finite() || *v < 0.0) {
            negative += 1;
        }
        let gated = match mode {
            ApplicationMode::Machines => stats.energy_production == 0.0,
            ApplicationMode::Generators => stats.energy_consumption == 0.0,
        };
        if !gated {
            gating += 1;
        }
    }

    vec![
        TestResult {
            name: "bounds_non_negative".into(),
            passed: negative == 0,
            detail: format!("{negative}/{samples} loadouts produced a negative or non-finite stat"),
        },
        TestResult {
            name: "bounds_mode_gating".into(),
            passed: gating == 0,
            detail: format!("{gating}/{samples} loadouts leaked the inactive energy stat"),
        },
    ]
}

// ── 3. Speed monotonicity ───────────────────────────────────────────────

fn validate_speed_monotonicity(rng: &mut StdRng, samples: usize) -> Vec<TestResult> {
    println!("--- Speed Monotonicity ---");
    let mut violations = Vec::new();

    for _ in 0..samples.min(500) {
        let efficiency = rng.gen_range(0..=360);
        let productivity = rng.gen_range(0..=360);
        let mut prev: Option<Stats> = None;
        for speed in 0..=360u64 {
            let counts = TierOneCounts {
                speed,
                efficiency,
                productivity,
            };
            let machines = stats_from_counts(&counts, ApplicationMode::Machines);
            let generators = stats_from_counts(&counts, ApplicationMode::Generators);
            let current = Stats {
                energy_production: generators.energy_production,
                ..machines
            };
            if let Some(p) = prev {
                if current.processing_speed < p.processing_speed
                    || current.energy_production > p.energy_production
                    || current.product_waste > p.product_waste
                {
                    violations.push((speed, efficiency, productivity));
                }
            }
            prev = Some(current);
        }
    }

    vec![TestResult {
        name: "monotonic_in_speed".into(),
        passed: violations.is_empty(),
        detail: match violations.first() {
            None => "speed up, production down, waste down for every sweep".into(),
            Some((s, e, p)) => format!(
                "{} violations, first at S={s} E={e} P={p}",
                violations.len()
            ),
        },
    }]
}

// ── 4. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(rng: &mut StdRng, samples: usize) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let mut drift = 0;
    for _ in 0..samples {
        let entries = random_loadout(rng);
        let mode = random_mode(rng);
        if bits(&compute_stats(&entries, mode)) != bits(&compute_stats(&entries, mode)) {
            drift += 1;
        }
    }
    vec![TestResult {
        name: "deterministic_repeat".into(),
        passed: drift == 0,
        detail: format!("{drift}/{samples} repeated calls differed"),
    }]
}

// ── 5. Out-of-range input ───────────────────────────────────────────────

fn validate_out_of_range() -> Vec<TestResult> {
    println!("--- Out-of-Range Input ---");
    let mut results = Vec::new();

    let tier_zero = loadout(&[
        (ModuleKind::Speed, 5, 0),
        (ModuleKind::Efficiency, 3, 0),
        (ModuleKind::Productivity, 2, 0),
    ]);
    let zero = compute_stats(&tier_zero, ApplicationMode::Machines);
    let empty = compute_stats(&EntriesByKind::new(), ApplicationMode::Machines);
    results.push(TestResult {
        name: "tier_zero_counts_nothing".into(),
        passed: bits(&zero) == bits(&empty),
        detail: format!("{:?}", zero),
    });

    let huge = loadout(&[
        (ModuleKind::Speed, u32::MAX, u32::MAX),
        (ModuleKind::Speed, u32::MAX, u32::MAX),
        (ModuleKind::Efficiency, u32::MAX, 40),
        (ModuleKind::Productivity, 1_000_000, 1_000_000),
    ]);
    let all_finite = MODES.iter().all(|&mode| {
        values(&compute_stats(&huge, mode))
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    });
    results.push(TestResult {
        name: "huge_values_stay_finite".into(),
        passed: all_finite,
        detail: format!(
            "speed count saturates at {}",
            TierOneCounts::from_map(&huge).speed
        ),
    });

    results
}

// ── 6. Form reducer ─────────────────────────────────────────────────────

fn random_action(rng: &mut StdRng, state: &AppState) -> Action {
    let kind = ModuleKind::ALL[rng.gen_range(0..ModuleKind::ALL.len())];
    let slots = state.slots(kind);
    let id = slots[rng.gen_range(0..slots.len())].id;
    match rng.gen_range(0..10) {
        0 => Action::AddEntry(kind),
        1 => Action::RemoveEntry { kind, id },
        2 => Action::SetMode(random_mode(rng)),
        3..=6 => Action::SetAmount {
            kind,
            id,
            value: rng.gen_range(-3..=15),
        },
        _ => Action::SetTier {
            kind,
            id,
            value: rng.gen_range(-5..=60),
        },
    }
}

fn validate_form_reducer(rng: &mut StdRng, samples: usize, verbose: bool) -> Vec<TestResult> {
    println!("--- Form Reducer ---");
    let mut cap_breaks = 0;
    let mut tier_breaks = 0;
    let mut empty_kinds = 0;
    let mut stale = 0;
    let mut rejected = 0;
    let mut steps = 0;

    let runs = (samples / 20).max(1);
    for _ in 0..runs {
        let mut state = AppState::default();
        for _ in 0..40 {
            let action = random_action(rng, &state);
            steps += 1;
            match reduce(&state, action) {
                Ok(next) => state = next,
                Err(_) => {
                    rejected += 1;
                    continue;
                }
            }

            if state.total_amount() > limits::MAX_TOTAL_MODULES {
                cap_breaks += 1;
            }
            if state
                .iter_slots()
                .any(|(_, s)| !(limits::MIN_TIER..=limits::MAX_TIER).contains(&s.entry.tier))
            {
                tier_breaks += 1;
            }
            if ModuleKind::ALL.iter().any(|&k| state.slots(k).is_empty()) {
                empty_kinds += 1;
            }
            if state.has_modules() {
                let direct = compute_stats(&state.entries_by_kind(), state.mode());
                if state.results().map(bits) != Some(bits(&direct)) {
                    stale += 1;
                }
            }
        }
        if verbose {
            let report = build_report(&state);
            if let Ok(json) = serde_json::to_string(&report) {
                println!("  final state: {json}");
            }
        }
    }

    vec![
        TestResult {
            name: "form_module_cap".into(),
            passed: cap_breaks == 0,
            detail: format!("{cap_breaks} states over {} modules", limits::MAX_TOTAL_MODULES),
        },
        TestResult {
            name: "form_tier_range".into(),
            passed: tier_breaks == 0,
            detail: format!("{tier_breaks} states with a tier outside 1–40"),
        },
        TestResult {
            name: "form_kind_keeps_a_slot".into(),
            passed: empty_kinds == 0,
            detail: format!("{empty_kinds} states with a kind left slotless"),
        },
        TestResult {
            name: "form_results_fresh".into(),
            passed: stale == 0,
            detail: format!(
                "{stale} stale results over {steps} actions ({rejected} rejected)"
            ),
        },
    ]
}
