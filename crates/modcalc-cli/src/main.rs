//! modcalc - Module Upgrade Calculator
//!
//! Command-line front-end over `modcalc-logic`: reads a loadout from a
//! TOML file and/or flags, replays it through the form reducer, and prints
//! the resulting stats and module summary.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (unreadable loadout, bad arguments, output failure)

mod cli;
mod config;
mod render;

use std::path::Path;

use anyhow::{bail, Context, Result};
use cli::{Args, OutputFormat};
use config::{Loadout, DEFAULT_LOADOUT_FILE};
use modcalc_logic::report::build_report;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse_args();
    init_logging(&args);

    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize logging. `RUST_LOG` wins over the verbosity flags; records
/// from the logic crate's `log` calls are forwarded too.
fn init_logging(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn run(args: &Args) -> Result<()> {
    if args.init_config {
        return handle_init_config();
    }

    let mut loadout = load_loadout(args)?;
    loadout.merge_with_args(args);
    info!("Mode: {}", loadout.mode);

    let state = loadout.to_state();
    let report = build_report(&state);

    match args.format {
        OutputFormat::Text => print!("{}", render::render_text(&report)),
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{}", json);
        }
    }
    Ok(())
}

/// Explicit `--config` must exist; the default file is optional.
fn load_loadout(args: &Args) -> Result<Loadout> {
    match &args.config {
        Some(path) => {
            info!("Loading loadout from {}", path.display());
            Loadout::load(path)
        }
        None => match Loadout::load_default()? {
            Some(loadout) => {
                info!("Loaded {}", DEFAULT_LOADOUT_FILE);
                Ok(loadout)
            }
            None => Ok(Loadout::default()),
        },
    }
}

/// Handle --init-config: write a starter .modcalc.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_LOADOUT_FILE);

    if path.exists() {
        bail!("{} already exists. Remove it first or edit it manually.", DEFAULT_LOADOUT_FILE);
    }

    std::fs::write(path, Loadout::default_toml())
        .with_context(|| format!("Failed to write {}", DEFAULT_LOADOUT_FILE))?;

    println!("Created {} with a starter loadout.", DEFAULT_LOADOUT_FILE);
    Ok(())
}
