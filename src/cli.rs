use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, ValueEnum};

use crate::core::rules::RuleId;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
}

#[derive(Parser, Debug)]
#[command(name = "jdlint")]
#[command(about = "Check a Johnny Decimal file tree, and optionally its JDex, for problems")]
#[command(version, long_about = None)]
pub struct Cli {
    /// Root of the Johnny Decimal file tree (`~` and `$VAR` are expanded)
    #[arg(required_unless_present_any = ["explain", "completions", "show_config"])]
    pub root: Option<Utf8PathBuf>,

    /// JDex to cross-check against: a directory (nested or flat) or a single file
    #[arg(long, value_name = "PATH")]
    pub jdex: Option<Utf8PathBuf>,

    /// File-name glob to skip at every level; repeatable
    #[arg(long, value_name = "PATTERN", action = ArgAction::Append)]
    pub ignore: Vec<String>,

    /// Rule id to leave out of the report; repeatable or comma-separated
    #[arg(long, value_name = "RULE_ID", action = ArgAction::Append, value_delimiter = ',')]
    pub disable: Vec<RuleId>,

    /// Use alternative zeros (area management in 00-09, area headers)
    #[arg(long)]
    pub altzeros: bool,

    /// Print diagnostics as a JSON array
    #[arg(long)]
    pub json: bool,

    /// Print every rule with its explanation and suggested fix, then exit
    #[arg(long)]
    pub explain: bool,

    /// Print a shell completion script, then exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Print the effective configuration as TOML, then exit
    #[arg(long)]
    pub show_config: bool,

    /// Read configuration from this file instead of searching for jdlint.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Omit the summary line
    #[arg(long, global = true)]
    pub quiet: bool,
}

impl Cli {
    pub fn context(&self) -> AppContext {
        AppContext {
            quiet: self.quiet,
            no_color: self.no_color,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
