//! Clap derive structures for the `erpdesk` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Only depends on clap so `build.rs` can include it for man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// erpdesk -- payroll, budget, and staff from the command line
#[derive(Debug, Parser)]
#[command(
    name = "erpdesk",
    version,
    about = "Work with the erpdesk ERP backend from the command line",
    long_about = "A command-line client for the erpdesk ERP backend.\n\n\
        Sign in once with `erpdesk login`; the session token is kept in the\n\
        profile's token store and reused by every later command.",
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
    #[arg(long, short = 'p', env = "ERPDESK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend root URL (overrides profile)
    #[arg(long, env = "ERPDESK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ERPDESK_OUTPUT",
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

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "ERPDESK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "ERPDESK_TIMEOUT", global = true)]
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
    /// Sign in and store the session token
    Login(LoginArgs),

    /// Create an account (and sign in to it)
    Signup(SignupArgs),

    /// Sign out and forget local credentials
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Organization overview
    #[command(alias = "dash")]
    Dashboard(DashboardArgs),

    /// Payroll KPIs, salary and tax definitions, payslips
    #[command(alias = "pay")]
    Payroll(PayrollArgs),

    /// Budget requests and KPIs
    Budget(BudgetArgs),

    /// Staff directory
    Staff(StaffArgs),

    /// Refresh cached views and show their state
    Refresh(RefreshArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (prompted if omitted)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Password (prompted if omitted)
    #[arg(long, env = "ERPDESK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct SignupArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Account email
    #[arg(long, short = 'e')]
    pub email: String,

    /// Password (prompted if omitted)
    #[arg(long, env = "ERPDESK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

// ── Dashboard ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Keep refreshing and redraw on every change (Ctrl-C to stop)
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Seconds between refreshes in watch mode
    #[arg(long, default_value = "30", requires = "watch")]
    pub interval: u64,
}

// ── Payroll ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PayrollArgs {
    #[command(subcommand)]
    pub command: PayrollCommand,
}

#[derive(Debug, Subcommand)]
pub enum PayrollCommand {
    /// Headline figures: gross, net, tax, loans
    Kpis,

    /// Month-by-month totals
    Summary,

    /// Salary definitions (grades and pay)
    #[command(alias = "salaries")]
    SalaryDefinitions(SalaryDefinitionsArgs),

    /// Tax definitions
    #[command(alias = "taxes")]
    TaxDefinitions(TaxDefinitionsArgs),

    /// Payslips
    Payslips(PayslipsArgs),
}

#[derive(Debug, Args)]
pub struct SalaryDefinitionsArgs {
    #[command(subcommand)]
    pub command: SalaryDefinitionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SalaryDefinitionsCommand {
    /// List salary definitions
    #[command(alias = "ls")]
    List,

    /// Create a salary definition
    Create(SalaryDefinitionFields),

    /// Replace a salary definition
    Update {
        /// Salary definition ID
        id: String,

        #[command(flatten)]
        fields: SalaryDefinitionFields,
    },

    /// Delete a salary definition
    #[command(alias = "rm")]
    Delete {
        /// Salary definition ID
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct SalaryDefinitionFields {
    /// Definition name
    #[arg(long)]
    pub name: String,

    /// Grade label
    #[arg(long)]
    pub grade: Option<String>,

    /// Basic monthly pay
    #[arg(long)]
    pub basic: f64,

    /// Monthly allowances
    #[arg(long, default_value = "0")]
    pub allowances: f64,
}

#[derive(Debug, Args)]
pub struct TaxDefinitionsArgs {
    #[command(subcommand)]
    pub command: TaxDefinitionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TaxDefinitionsCommand {
    /// List tax definitions
    #[command(alias = "ls")]
    List,

    /// Create a tax definition
    Create {
        /// Definition name
        #[arg(long)]
        name: String,

        /// Rate in percent (e.g. 7.5)
        #[arg(long)]
        rate: f64,

        /// Income threshold the rate applies above
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Delete a tax definition
    #[command(alias = "rm")]
    Delete {
        /// Tax definition ID
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct PayslipsArgs {
    #[command(subcommand)]
    pub command: PayslipsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PayslipsCommand {
    /// List payslips
    #[command(alias = "ls")]
    List,

    /// Generate a payslip for one staff member
    Create {
        /// Staff ID
        #[arg(long)]
        staff: String,

        /// Pay period (YYYY-MM)
        #[arg(long)]
        period: String,
    },
}

// ── Budget ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BudgetArgs {
    #[command(subcommand)]
    pub command: BudgetCommand,
}

#[derive(Debug, Subcommand)]
pub enum BudgetCommand {
    /// List budget requests
    #[command(alias = "ls")]
    List,

    /// Submit a budget request
    Create {
        /// Request title
        #[arg(long)]
        title: String,

        /// Amount requested
        #[arg(long)]
        amount: f64,

        /// Requesting department
        #[arg(long)]
        department: Option<String>,
    },

    /// Approve a budget request
    Approve {
        /// Budget entry ID
        id: String,
    },

    /// Reject a budget request
    Reject {
        /// Budget entry ID
        id: String,
    },

    /// Budget KPIs
    Kpis,
}

// ── Staff ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StaffArgs {
    #[command(subcommand)]
    pub command: StaffCommand,
}

#[derive(Debug, Subcommand)]
pub enum StaffCommand {
    /// Search the staff directory
    #[command(alias = "ls", alias = "list")]
    Search {
        /// Name or email fragment
        query: Option<String>,

        /// Restrict to one department
        #[arg(long, short = 'd')]
        department: Option<String>,

        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,

        /// Results per page
        #[arg(long, short = 'l', default_value = "50")]
        limit: u32,
    },

    /// Show one staff member
    #[command(alias = "get")]
    Show {
        /// Staff ID
        id: String,
    },

    /// Attach a document to a staff record
    Upload {
        /// Staff ID
        id: String,

        /// File to upload
        file: PathBuf,
    },
}

// ── Refresh ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RefreshArgs {
    /// Views to refresh (e.g. payroll.kpis budget.entries)
    #[arg(required_unless_present_any = ["all", "list"])]
    pub keys: Vec<String>,

    /// Refresh every view
    #[arg(long, short = 'a', conflicts_with = "keys")]
    pub all: bool,

    /// List view names and exit
    #[arg(long, conflicts_with_all = ["keys", "all"])]
    pub list: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a configuration value
    Set {
        /// Config key (dot-separated path, e.g., "profiles.prod.api_url")
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

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
