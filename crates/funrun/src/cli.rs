//! Clap derive structures for the `funrun` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// funrun -- record fun-run payments
#[derive(Debug, Parser)]
#[command(
    name = "funrun",
    version,
    about = "Record fun-run registration payments",
    long_about = "Record cash payments for the campus fun run.\n\n\
        Staff sign in with a school Google account, enter the student's\n\
        details, and each payment is sent to the spreadsheet backend with\n\
        retries. Only authorized staff can record payments.",
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
    /// Config file to use instead of the default location
    #[arg(long, short = 'C', env = "FUNRUN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Backend web-app URL (overrides backend.submit_url)
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// Overall submission timeout in seconds (overrides backend.timeout)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Output format [default: defaults.output, or table]
    #[arg(long, short = 'o', env = "FUNRUN_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: defaults.color, or auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Record a payment (prompts for anything not given as a flag)
    #[command(alias = "r")]
    Record(RecordArgs),

    /// Check payment details without sending anything
    Validate(PaymentArgs),

    /// Show how many payments you have recorded
    Stats(StatsArgs),

    /// Sign in with a Google ID token
    Login(LoginArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in staff member
    Whoami,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Payments ─────────────────────────────────────────────────────────

/// Student details for one payment.
#[derive(Debug, Clone, Default, Args)]
pub struct PaymentArgs {
    /// Student's full name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Student ID number
    #[arg(long, short = 'i')]
    pub student_id: Option<String>,

    /// Student's school email
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// College code (CABE, CEDAS, CHS, COE, CCIS)
    #[arg(long)]
    pub college: Option<String>,

    /// Course or program
    #[arg(long)]
    pub course: Option<String>,
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    #[command(flatten)]
    pub payment: PaymentArgs,

    /// Never prompt; fail on missing fields instead
    #[arg(long)]
    pub no_input: bool,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Date to report on, as M/D/YYYY (defaults to today in school time)
    #[arg(long, short = 'd')]
    pub date: Option<String>,
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Google ID token (JWT), or '-' to read it from stdin
    #[arg(long, env = "FUNRUN_ID_TOKEN", hide_env_values = true)]
    pub id_token: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration (file + environment)
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
