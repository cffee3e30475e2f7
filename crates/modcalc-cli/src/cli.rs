//! Command-line argument parsing.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Parser, ValueEnum};
use modcalc_logic::constants::limits;
use modcalc_logic::form::parse_field;
use modcalc_logic::modules::ApplicationMode;

/// Module Upgrade Calculator - combined effect of stacked upgrade modules
///
/// Stacks are written AMOUNTxTIER (e.g. 2x5 = two tier-5 modules); a bare
/// AMOUNT means tier 1. At most 9 modules fit at once.
///
/// Examples:
///   modcalc --speed 2x1
///   modcalc --mode generators --efficiency 1 --speed 1x2
///   modcalc --config loadout.toml --format json
///   modcalc --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Loadout file to start from
    ///
    /// If not specified, .modcalc.toml in the current directory is used
    /// when present.
    #[arg(short, long, value_name = "FILE", env = "MODCALC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where the modules are installed (machines, generators)
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<ApplicationMode>,

    /// Speed module stack, repeatable
    #[arg(short, long, value_name = "AxT")]
    pub speed: Vec<StackArg>,

    /// Efficiency module stack, repeatable
    #[arg(short, long, value_name = "AxT")]
    pub efficiency: Vec<StackArg>,

    /// Productivity module stack, repeatable
    #[arg(short, long, value_name = "AxT")]
    pub productivity: Vec<StackArg>,

    /// Output format
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write a starter .modcalc.toml and exit
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log filter for the requested verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One `AMOUNTxTIER` stack from the command line.
///
/// Values stay signed and unclamped here; the form reducer clamps them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackArg {
    pub amount: i64,
    pub tier: i64,
}

impl FromStr for StackArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, tier) = match s.split_once(['x', 'X']) {
            Some((amount, tier)) => (amount, Some(tier)),
            None => (s, None),
        };
        let amount = number(amount).ok_or_else(|| format!("bad amount in `{s}`"))?;
        let tier = match tier {
            Some(t) => number(t).ok_or_else(|| format!("bad tier in `{s}`"))?,
            None => i64::from(limits::DEFAULT_TIER),
        };
        Ok(Self { amount, tier })
    }
}

/// Strict on the command line: the whole token must be a number.
fn number(text: &str) -> Option<i64> {
    let text = text.trim();
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    let looks_numeric = !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());
    looks_numeric.then(|| parse_field(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_with_tier() {
        assert_eq!(
            "2x5".parse::<StackArg>(),
            Ok(StackArg { amount: 2, tier: 5 })
        );
        assert_eq!(
            "3X40".parse::<StackArg>(),
            Ok(StackArg { amount: 3, tier: 40 })
        );
    }

    #[test]
    fn bare_amount_means_tier_one() {
        assert_eq!("4".parse::<StackArg>(), Ok(StackArg { amount: 4, tier: 1 }));
    }

    #[test]
    fn out_of_range_values_pass_through() {
        assert_eq!(
            "12x99".parse::<StackArg>(),
            Ok(StackArg { amount: 12, tier: 99 })
        );
    }

    #[test]
    fn junk_is_rejected() {
        assert!("".parse::<StackArg>().is_err());
        assert!("twox1".parse::<StackArg>().is_err());
        assert!("2x".parse::<StackArg>().is_err());
        assert!("2x3x4".parse::<StackArg>().is_err());
        assert!("-x1".parse::<StackArg>().is_err());
    }

    #[test]
    fn parses_full_command_line() {
        let args = Args::try_parse_from([
            "modcalc",
            "--mode",
            "generators",
            "-s",
            "1x2",
            "--efficiency",
            "1",
            "--format",
            "json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.mode, Some(ApplicationMode::Generators));
        assert_eq!(args.speed, vec![StackArg { amount: 1, tier: 2 }]);
        assert_eq!(args.efficiency, vec![StackArg { amount: 1, tier: 1 }]);
        assert!(args.productivity.is_empty());
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.log_filter(), "debug");
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Args::try_parse_from(["modcalc", "--mode", "furnace"]).is_err());
    }
}
