//! Clap derive structures for the `vouchly` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vouchly -- admin console and checkout client for voucher stores
#[derive(Debug, Parser)]
#[command(
    name = "vouchly",
    version,
    about = "Manage result-checker vouchers from the command line",
    long_about = "Administer a vouchly voucher store: log in, list and filter vouchers,\n\
        add or bulk-import them from CSV, mark them used, resend or delete them,\n\
        and review stats and sales. The `pay` commands run the buyer checkout.",
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
    /// Backend profile to use
    #[arg(long, short = 'p', env = "VOUCHLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend site URL (overrides profile)
    #[arg(long, short = 'b', env = "VOUCHLY_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VOUCHLY_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "VOUCHLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "VOUCHLY_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
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
    /// HTML table with escaped values
    Html,
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

/// Voucher status filter.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum StatusArg {
    #[default]
    All,
    Used,
    Unused,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session token
    Login(LoginArgs),

    /// Clear the stored session
    Logout,

    /// Show the active profile and session state
    Whoami,

    /// Manage vouchers
    #[command(alias = "v")]
    Vouchers(VouchersArgs),

    /// Review completed sales
    Sales(SalesArgs),

    /// Show voucher counts
    Stats,

    /// Buyer checkout: pay and reveal a voucher
    Pay(PayArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Admin username (only for backends that ask for one)
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Keep the token for this invocation only
    #[arg(long)]
    pub no_remember: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VOUCHERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct VouchersArgs {
    #[command(subcommand)]
    pub command: VouchersCommand,
}

/// Status + search filter shared by list and export.
#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Status filter
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusArg,

    /// Case-insensitive search over serial, PIN, phone and email
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum VouchersCommand {
    /// List vouchers
    #[command(alias = "ls")]
    List(FilterArgs),

    /// Add a single voucher
    Add {
        /// Voucher serial number
        serial: String,

        /// Voucher PIN
        pin: String,

        /// Category, e.g. WASSCE or BECE
        #[arg(long = "type", short = 't')]
        kind: Option<String>,
    },

    /// Bulk-import vouchers from a CSV file (header: serial,pin,type)
    Import {
        /// CSV file to upload
        file: PathBuf,

        /// Parse and report without uploading
        #[arg(long)]
        dry_run: bool,
    },

    /// Mark a voucher as used
    MarkUsed {
        /// Voucher ID (or serial with --by-serial)
        voucher: String,

        /// Identify the voucher by serial instead of ID
        #[arg(long)]
        by_serial: bool,

        /// Buyer identifier (phone or email) to record
        #[arg(long)]
        buyer: Option<String>,
    },

    /// Delete a voucher
    #[command(alias = "rm")]
    Delete {
        /// Voucher ID
        id: String,
    },

    /// Resend a voucher to its buyer
    Resend {
        /// Voucher ID
        id: String,
    },

    /// Export vouchers as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Write to a file instead of stdout
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SALES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SalesArgs {
    #[command(subcommand)]
    pub command: SalesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SalesCommand {
    /// List recent sales
    #[command(alias = "ls")]
    List,

    /// Export sales as CSV
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PAY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PayArgs {
    #[command(subcommand)]
    pub command: PayCommand,
}

/// Buyer contact details.
#[derive(Debug, Args)]
pub struct BuyerArgs {
    /// Buyer name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Buyer phone number
    #[arg(long)]
    pub phone: String,

    /// Buyer email
    #[arg(long)]
    pub email: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum PayCommand {
    /// Start a checkout and verify the payment reference afterwards
    Start(BuyerArgs),

    /// Verify an already-completed payment reference
    Verify {
        /// Payment reference from the provider
        reference: String,

        #[command(flatten)]
        buyer: BuyerArgs,
    },
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
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key, e.g. "backend", "api_layout", "payment.public_key"
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the admin password in the system keyring (for --profile)
    SetPassword,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
