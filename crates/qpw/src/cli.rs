//! Clap derive structures for the `qpw` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use qpw_core::LookupKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// qpw -- log in to a contact-center platform and build search criteria
#[derive(Debug, Parser)]
#[command(
    name = "qpw",
    version,
    about = "Log in to a contact-center platform and build search criteria",
    long_about = "Authenticates through the platform's browser login (implicit grant),\n\
        keeps the session in the system keyring per profile, and loads the\n\
        reference data (users, queues, skills, ...) that search criteria select from.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use
    #[arg(long, short = 'p', env = "QPW_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Region domain, e.g. mypurecloud.ie (overrides profile)
    #[arg(long, short = 'r', env = "QPW_REGION", global = true)]
    pub region: Option<String>,

    /// OAuth client id (overrides profile)
    #[arg(long, env = "QPW_CLIENT_ID", global = true, hide_env = true)]
    pub client_id: Option<String>,

    /// Output format [default: `defaults.output` from config, else table]
    #[arg(long, short = 'o', env = "QPW_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "QPW_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    /// The output format in effect once config defaults are applied.
    pub fn output(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Table)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in through the browser and store the session
    Login(LoginArgs),

    /// Forget the stored session
    Logout,

    /// Show profile and session state
    Status,

    /// Show the logged-in user
    Whoami,

    /// Load reference data used by search criteria
    #[command(alias = "lk")]
    Lookups(LookupsArgs),

    /// Create and check search criteria documents
    Criteria(CriteriaArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Redirect URL the browser landed on; prompted for when omitted
    #[arg(long)]
    pub redirect: Option<String>,
}

// ── Lookups ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LookupsArgs {
    /// Load one kind only (users, queues, skills, languages, teams,
    /// wrapup_codes, topics, categories)
    #[arg(value_parser = parse_lookup_kind)]
    pub kind: Option<LookupKind>,
}

fn parse_lookup_kind(s: &str) -> Result<LookupKind, String> {
    s.parse()
        .map_err(|_| format!("unknown lookup kind '{s}'"))
}

// ── Criteria ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CriteriaArgs {
    #[command(subcommand)]
    pub command: CriteriaCommand,
}

#[derive(Debug, Subcommand)]
pub enum CriteriaCommand {
    /// Print initial criteria (last 7 days, voice, both directions)
    New {
        /// Day the range ends on (YYYY-MM-DD); defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Validate a criteria file against freshly loaded lookups
    Check {
        /// Criteria JSON file
        file: PathBuf,
    },

    /// Print a criteria file with disabled advanced groups cleared
    Effective {
        /// Criteria JSON file
        file: PathBuf,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive profile setup
    Init,

    /// Show the loaded configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a key on the active profile
    Set {
        /// Key (client_id, redirect_uri, region, api_base, login_base, timeout, max_pages)
        key: String,
        /// Value
        value: String,
    },

    /// List profiles (* marks the default)
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
