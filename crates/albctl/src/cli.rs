//! Clap derive structures for the `albctl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Compiled by `build.rs` as well, so it depends on clap only.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// albctl -- operational toolbox for Avi / NSX Advanced Load Balancer
#[derive(Debug, Parser)]
#[command(
    name = "albctl",
    version,
    about = "Operational utilities for the Avi load balancer controller",
    long_about = "Automates day-to-day controller chores: inventory and WAF reports,\n\
        license and token housekeeping, certificate and cipher clean-up,\n\
        metrics and log export, backups, Terraform export and ControlScripts.",
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
    /// Controller profile to use
    #[arg(long, short = 'p', env = "ALBCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller address or URL (overrides profile)
    #[arg(long, short = 'c', env = "ALBCTL_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// API username
    #[arg(long, short = 'u', env = "ALBCTL_USER", global = true)]
    pub user: Option<String>,

    /// API password (prompted when missing)
    #[arg(long, env = "ALBCTL_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// API token (used instead of a password)
    #[arg(long, env = "ALBCTL_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Tenant ("*" for all tenants where supported)
    #[arg(long, short = 't', env = "ALBCTL_TENANT", global = true)]
    pub tenant: Option<String>,

    /// API version (discovered from the controller when omitted)
    #[arg(long, short = 'x', env = "ALBCTL_API_VERSION", global = true)]
    pub api_version: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ALBCTL_OUTPUT",
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

    /// Accept self-signed TLS certificates (the default unless a profile
    /// disables it)
    #[arg(long, short = 'k', env = "ALBCTL_INSECURE", global = true)]
    pub insecure: bool,

    /// Verify the controller certificate against this CA bundle
    #[arg(long, env = "ALBCTL_CA_CERT", global = true, conflicts_with = "insecure")]
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "ALBCTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
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
    /// List and delete licenses
    #[command(alias = "lic")]
    Licenses(LicensesArgs),

    /// Manage user API tokens
    Tokens(TokensArgs),

    /// Controller and SE upgrade history
    Upgrades(UpgradesArgs),

    /// Inventory reports for virtual services, pools and service engines
    #[command(alias = "inv")]
    Inventory(InventoryArgs),

    /// WAF policy reports
    Waf(WafArgs),

    /// Virtual MAC addresses of network-service floating IPs
    Vmac(VmacArgs),

    /// VRF to namespace mapping per service engine
    VrfMap(VrfMapArgs),

    /// Certificate operations
    Certs(CertsArgs),

    /// SSL profile operations
    SslProfiles(SslProfilesArgs),

    /// Virtual service analytics settings
    Analytics(AnalyticsArgs),

    /// Virtual service operations
    Vs(VsArgs),

    /// Find and delete unreferenced objects
    Unused(UnusedArgs),

    /// Back up virtual service configurations to a file
    Backup(BackupArgs),

    /// Restore virtual service configurations from a backup file
    Restore(RestoreArgs),

    /// Query metrics
    Metrics(MetricsArgs),

    /// Application logs
    Logs(LogsArgs),

    /// Export objects as Terraform configuration
    #[command(alias = "tf")]
    Terraform(TerraformArgs),

    /// ControlScript entry points (run by the controller)
    #[command(alias = "cs")]
    Controlscript(ControlscriptArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LICENSES / TOKENS / UPGRADES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LicensesArgs {
    #[command(subcommand)]
    pub command: LicensesCommand,
}

#[derive(Debug, Subcommand)]
pub enum LicensesCommand {
    /// List installed licenses
    #[command(alias = "ls")]
    List,

    /// Delete a license by ID
    Delete {
        /// License ID
        license_id: String,
    },

    /// Delete every license that has expired
    DeleteExpired,
}

#[derive(Debug, Args)]
pub struct TokensArgs {
    #[command(subcommand)]
    pub command: TokensCommand,
}

#[derive(Debug, Subcommand)]
pub enum TokensCommand {
    /// List API tokens
    #[command(alias = "ls")]
    List {
        /// Only tokens of this user
        #[arg(long, short = 'n')]
        username: Option<String>,
    },

    /// Create a token for a user
    Create {
        /// User name
        username: String,

        /// Destroy the token after this many hours (0 = single use)
        #[arg(long, short = 'e', default_value = "0",
              value_parser = clap::value_parser!(u32).range(0..=87_600))]
        expires: u32,
    },

    /// Delete a token
    Delete {
        /// Token UUID
        uuid: String,
    },
}

#[derive(Debug, Args)]
pub struct UpgradesArgs {
    #[command(subcommand)]
    pub command: UpgradesCommand,
}

#[derive(Debug, Subcommand)]
pub enum UpgradesCommand {
    /// Upgrade history per node
    History {
        /// Include SE groups and service engines, not only the controller
        #[arg(long, short = 'a')]
        all: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REPORTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct InventoryArgs {
    /// What to report on
    #[arg(value_enum, default_value = "vs")]
    pub kind: InventoryKindArg,

    /// Write CSV to this file instead of printing
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InventoryKindArg {
    /// Virtual services
    Vs,
    /// Pools
    Pool,
    /// Pools with their servers
    #[value(alias = "pooldetail")]
    PoolDetail,
    /// Service engines
    Se,
}

#[derive(Debug, Args)]
pub struct WafArgs {
    #[command(subcommand)]
    pub command: WafCommand,
}

#[derive(Debug, Subcommand)]
pub enum WafCommand {
    /// WAF policies with their virtual services, mode and paranoia level
    Report,
}

#[derive(Debug, Args)]
pub struct VmacArgs {
    /// Only this network service
    #[arg(long, short = 'n')]
    pub network_service: Option<String>,
}

#[derive(Debug, Args)]
pub struct VrfMapArgs {
    /// Service engine names to match (glob)
    #[arg(long, short = 's', default_value = "*")]
    pub se: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CHANGES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CertsArgs {
    #[command(subcommand)]
    pub command: CertsCommand,
}

#[derive(Debug, Subcommand)]
pub enum CertsCommand {
    /// Swap certificates on every virtual service that uses them
    Replace {
        /// Certificates to replace (names or UUIDs, comma-separated)
        #[arg(value_delimiter = ',', num_args = 1, required = true)]
        search: Vec<String>,

        /// Replacements, in the same order (comma-separated)
        #[arg(value_delimiter = ',', num_args = 1, required = true)]
        replace: Vec<String>,
    },
}

#[derive(Debug, Args)]
pub struct SslProfilesArgs {
    #[command(subcommand)]
    pub command: SslProfilesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SslProfilesCommand {
    /// Remove CBC and RSA key-exchange ciphers from SSL profiles
    RemoveCiphers {
        /// Only profiles whose name contains this text
        #[arg(long, short = 'n', default_value = "")]
        name: String,

        /// Profiles to leave alone (comma-separated or repeated)
        #[arg(long, short = 'e', value_delimiter = ',')]
        exclude: Vec<String>,
    },
}

#[derive(Debug, Args)]
pub struct AnalyticsArgs {
    #[command(subcommand)]
    pub command: AnalyticsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AnalyticsCommand {
    /// Switch off expensive analytics settings
    Reset {
        /// Settings to reset (default: all)
        #[arg(long, short = 'a', value_enum, value_delimiter = ',')]
        action: Vec<AnalyticsActionArg>,

        /// Virtual services to leave alone
        #[arg(long, short = 'e', value_delimiter = ',')]
        exclude: Vec<String>,

        /// Only list matching virtual services
        #[arg(long, short = 'l')]
        list: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnalyticsActionArg {
    /// Client insights
    Clientinsights,
    /// Non-significant logs
    Nonsiglogs,
    /// Real-time metrics
    Realtimemetrics,
}

#[derive(Debug, Args)]
pub struct VsArgs {
    #[command(subcommand)]
    pub command: VsCommand,
}

#[derive(Debug, Subcommand)]
pub enum VsCommand {
    /// Move virtual services from one SE group to another
    MoveSeGroup {
        /// Source SE group
        source: String,

        /// Destination SE group
        dest: String,

        /// Only these virtual services (comma-separated)
        #[arg(long, short = 'i', value_delimiter = ',')]
        include: Vec<String>,

        /// Skip these virtual services (comma-separated)
        #[arg(long, short = 'e', value_delimiter = ',')]
        exclude: Vec<String>,
    },
}

#[derive(Debug, Args)]
pub struct UnusedArgs {
    /// Object types to check (comma-separated; default: all common types)
    #[arg(long, value_delimiter = ',')]
    pub object_types: Vec<String>,

    /// Include built-in System-* and default objects
    #[arg(long, short = 'i')]
    pub include_system: bool,

    /// Include UUIDs in the report
    #[arg(long)]
    pub show_uuid: bool,

    /// Offer to delete each unused object
    #[arg(long, short = 'd', conflicts_with = "force")]
    pub delete: bool,

    /// Delete unused objects without prompting
    #[arg(long, short = 'f')]
    pub force: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BACKUP / RESTORE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Backup file to write
    pub file: PathBuf,

    /// Virtual service name or glob
    #[arg(long, default_value = "*")]
    pub vs: String,

    /// Passphrase for encrypting secrets in the export
    #[arg(long, short = 'e', env = "ALBCTL_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Include certificates referenced by the virtual services
    #[arg(long, short = 'i')]
    pub include_certs: bool,
}

#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Backup file to read
    pub file: PathBuf,

    /// Virtual service name or glob
    #[arg(long, default_value = "*")]
    pub vs: String,

    /// Passphrase used when the backup was taken
    #[arg(long, short = 'e', env = "ALBCTL_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  METRICS / LOGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MetricsArgs {
    /// Metric IDs (comma-separated)
    #[arg(
        long,
        short = 'm',
        value_delimiter = ',',
        default_value = "l4_client.avg_rx_bytes,l4_client.avg_tx_bytes"
    )]
    pub metrics: Vec<String>,

    /// Sample granularity
    #[arg(long, short = 'g', value_enum, default_value = "5min")]
    pub granularity: GranularityArg,

    /// End of the window (ISO 8601; default now)
    #[arg(long, short = 'e')]
    pub end: Option<String>,

    /// Window length: seconds, or a span such as 60m, 2h, 1d
    #[arg(long, short = 'l', default_value = "60m")]
    pub history: String,

    /// Service engine name
    #[arg(long)]
    pub se: Option<String>,

    /// Virtual service name
    #[arg(long)]
    pub vs: Option<String>,

    /// Pool name
    #[arg(long)]
    pub pool: Option<String>,

    /// Aggregate across entities
    #[arg(long, short = 'a')]
    pub aggregate: bool,

    /// Object ID for component metrics (WAF rules, groups)
    #[arg(long)]
    pub obj_id: Option<String>,

    /// Aggregate across object IDs
    #[arg(long)]
    pub aggregate_obj_id: bool,

    /// Pad missing samples
    #[arg(long)]
    pub pad_data: bool,

    /// Write CSV to this file instead of printing
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GranularityArg {
    /// 5-second samples
    Realtime,
    /// 5-minute samples
    #[value(name = "5min")]
    FiveMin,
    /// Hourly samples
    Hour,
    /// Daily samples
    Day,
}

#[derive(Debug, Args)]
pub struct LogsArgs {
    #[command(subcommand)]
    pub command: LogsCommand,
}

#[derive(Debug, Subcommand)]
pub enum LogsCommand {
    /// Export a virtual service's logs to CSV
    Export {
        /// Virtual service name
        virtual_service: String,

        /// Start of the window (ISO 8601; UTC unless an offset is given)
        start: String,

        /// End of the window (ISO 8601; UTC unless an offset is given)
        end: String,

        /// Output file (default: stdout)
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,

        /// Include non-significant logs
        #[arg(long)]
        include_non_significant: bool,

        /// Include user-defined logs
        #[arg(long)]
        include_user_defined: bool,

        /// Exclude significant logs
        #[arg(long)]
        exclude_significant: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TERRAFORM / CONTROLSCRIPTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TerraformArgs {
    #[command(subcommand)]
    pub command: TerraformCommand,
}

#[derive(Debug, Subcommand)]
pub enum TerraformCommand {
    /// Generate resource definitions for existing objects
    Export {
        /// Object type (e.g. pool, virtualservice)
        object_type: String,

        /// Output .tf file
        file: PathBuf,

        /// Objects whose name contains this text
        #[arg(long, short = 's', conflicts_with = "names")]
        search: Option<String>,

        /// Exact object names (comma-separated)
        #[arg(long, short = 'n', value_delimiter = ',')]
        names: Vec<String>,

        /// Terraform provider version (default: controller API version)
        #[arg(long)]
        tf_version: Option<String>,

        /// Use `terraform import` + `state show` instead of config generation
        #[arg(long)]
        legacy_import: bool,

        /// Terraform executable
        #[arg(long, env = "ALBCTL_TERRAFORM", default_value = "terraform")]
        terraform: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct ControlscriptArgs {
    #[command(subcommand)]
    pub command: ControlscriptCommand,
}

#[derive(Debug, Subcommand)]
pub enum ControlscriptCommand {
    /// Stop a pool group failing back after its primary pool recovers
    StickyPoolGroup {
        /// Alert payload (JSON)
        alert: String,
    },

    /// Clear VS_DOWN alerts when the virtual service comes back up
    ClearAlerts {
        /// Alert payload (JSON)
        alert: String,
    },

    /// Turn client insights off across all tenants
    DisableClientInsights,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (controller, username, tenant, api_version, ...)
        key: String,
        /// New value
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store a password or token in the system keyring
    SetPassword {
        /// Profile (default: active profile)
        #[arg(long)]
        profile: Option<String>,

        /// Store an API token instead of a password
        #[arg(long)]
        token: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
