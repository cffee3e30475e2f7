//! Loadout file handling.
//!
//! A loadout is the form content saved as TOML: the application mode and
//! the module stacks per kind. Loading never bypasses the form rules: the
//! stacks are replayed through the reducer, so clamping and the module cap
//! apply exactly as if typed in by hand.

use std::path::Path;

use anyhow::{Context, Result};
use modcalc_logic::constants::limits;
use modcalc_logic::form::{reduce, Action, AppState};
use modcalc_logic::modules::{ApplicationMode, ModuleKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cli::{Args, StackArg};

/// Default loadout file looked up in the current directory.
pub const DEFAULT_LOADOUT_FILE: &str = ".modcalc.toml";

/// Root loadout structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    /// Where the modules are installed.
    #[serde(default)]
    pub mode: ApplicationMode,

    #[serde(default)]
    pub speed: Vec<Stack>,

    #[serde(default)]
    pub efficiency: Vec<Stack>,

    #[serde(default)]
    pub productivity: Vec<Stack>,
}

/// One stack of modules. Signed so out-of-range values reach the reducer
/// and get clamped there instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    #[serde(default)]
    pub amount: i64,

    #[serde(default = "default_tier")]
    pub tier: i64,
}

fn default_tier() -> i64 {
    i64::from(limits::DEFAULT_TIER)
}

impl From<StackArg> for Stack {
    fn from(arg: StackArg) -> Self {
        Self {
            amount: arg.amount,
            tier: arg.tier,
        }
    }
}

impl Loadout {
    /// Load a loadout from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read loadout file: {}", path.display()))?;

        let loadout: Loadout = toml::from_str(&content)
            .with_context(|| format!("Failed to parse loadout file: {}", path.display()))?;

        Ok(loadout)
    }

    /// Try to load the loadout from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_LOADOUT_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge command-line arguments into this loadout.
    ///
    /// An explicit `--mode` wins; stacks given on the command line are
    /// appended after the file's stacks.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(mode) = args.mode {
            self.mode = mode;
        }
        self.speed.extend(args.speed.iter().copied().map(Stack::from));
        self.efficiency
            .extend(args.efficiency.iter().copied().map(Stack::from));
        self.productivity
            .extend(args.productivity.iter().copied().map(Stack::from));
    }

    pub fn stacks(&self, kind: ModuleKind) -> &[Stack] {
        match kind {
            ModuleKind::Speed => &self.speed,
            ModuleKind::Efficiency => &self.efficiency,
            ModuleKind::Productivity => &self.productivity,
        }
    }

    /// Replay the loadout through the form reducer.
    ///
    /// The first stack of a kind fills that kind's initial slot; further
    /// stacks get new slots. Stacks rejected because the module cap is
    /// full are skipped with a warning.
    pub fn to_state(&self) -> AppState {
        let mut state = AppState::new(self.mode);

        for kind in ModuleKind::ALL {
            for (i, stack) in self.stacks(kind).iter().enumerate() {
                if i > 0 {
                    match reduce(&state, Action::AddEntry(kind)) {
                        Ok(next) => state = next,
                        Err(err) => {
                            warn!("skipping {kind} stack {}x{}: {err}", stack.amount, stack.tier);
                            continue;
                        }
                    }
                }
                state = apply_stack(state, kind, *stack);
            }
        }

        debug!("loadout replayed: {} modules installed", state.total_amount());
        state
    }

    /// Starter file content for `--init-config`.
    pub fn default_toml() -> String {
        let starter = Loadout {
            mode: ApplicationMode::Machines,
            speed: vec![Stack { amount: 2, tier: 1 }],
            efficiency: vec![Stack { amount: 1, tier: 1 }],
            productivity: Vec::new(),
        };
        toml::to_string_pretty(&starter).unwrap_or_default()
    }
}

/// Set tier then amount on the newest slot of `kind`.
fn apply_stack(state: AppState, kind: ModuleKind, stack: Stack) -> AppState {
    let Some(id) = state.slots(kind).last().map(|slot| slot.id) else {
        return state;
    };
    let actions = [
        Action::SetTier {
            kind,
            id,
            value: stack.tier,
        },
        Action::SetAmount {
            kind,
            id,
            value: stack.amount,
        },
    ];
    actions
        .into_iter()
        .fold(state, |state, action| match reduce(&state, action) {
            Ok(next) => next,
            Err(err) => {
                warn!("ignoring {action:?}: {err}");
                state
            }
        })
}
