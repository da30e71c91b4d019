//! Clap derive structures for the `nrgym` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// nrgym -- read your NRG gym portal from the command line
#[derive(Debug, Parser)]
#[command(
    name = "nrgym",
    version,
    about = "Bookings, club occupancy and membership details from the NRG gym portal",
    long_about = "Talks to the NRG gym member portal with your member login.\n\n\
        Shows class bookings, live club occupancy, your profile and contracts,\n\
        and the sensor/calendar entities a home-automation host would see.",
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
    /// Account profile to use
    #[arg(long, short = 'p', env = "NRGYM_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Login email (overrides profile)
    #[arg(long, short = 'e', env = "NRGYM_EMAIL", global = true)]
    pub email: Option<String>,

    /// Portal root URL (overrides profile)
    #[arg(long, env = "NRGYM_PORTAL_URL", global = true)]
    pub portal_url: Option<String>,

    /// Club used for the bookings calendar
    #[arg(long, short = 'c', env = "NRGYM_CLUB_ID", global = true)]
    pub club_id: Option<i64>,

    /// Member id for profile and contract lookups
    #[arg(long, short = 'u', env = "NRGYM_USER_ID", global = true)]
    pub user_id: Option<i64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NRGYM_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

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
    #[arg(long, env = "NRGYM_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
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
    /// Log in and show who the portal thinks you are
    Login,

    /// List class bookings
    #[command(alias = "b")]
    Bookings(BookingsArgs),

    /// Show how many members are in each club right now
    #[command(alias = "occ")]
    Occupancy,

    /// Show the logged-in member's identity
    Identity,

    /// Show the member profile
    Profile,

    /// List membership contracts and the next payment
    Contracts,

    /// Run a full refresh and report which sections are unavailable
    Check,

    /// Show the sensors and calendars a host would register
    #[command(alias = "ent")]
    Entities(EntitiesArgs),

    /// Refresh on an interval and print entity states until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BOOKINGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BookingsArgs {
    /// Include bookings that have already started
    #[arg(long, short = 'a')]
    pub all: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ENTITIES / WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EntitiesArgs {
    /// Include entities that are disabled by default
    #[arg(long, short = 'a')]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds (minimum 300; overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<i64>,

    /// Include entities that are disabled by default
    #[arg(long, short = 'a')]
    pub all: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or update a profile with guided setup
    Init,

    /// Display current resolved configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,

    /// Store a profile's password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
