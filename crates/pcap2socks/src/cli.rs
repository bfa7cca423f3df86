//! Clap derive structures for the `pcap2socks` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// pcap2socks -- redirect a device's traffic to a SOCKS proxy
#[derive(Debug, Parser)]
#[command(
    name = "pcap2socks",
    version,
    about = "Redirect a device's traffic to a SOCKS proxy from the command line",
    long_about = "Configure and control the pcap2socks backend, which redirects a\n\
        device's traffic to a SOCKS proxy.\n\n\
        Save an interface, device and proxy configuration with `config`,\n\
        then start the engine with `run` and watch it with `status`.",
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
    /// Backend invoke endpoint (overrides settings)
    #[arg(long, short = 'e', env = "PCAP2SOCKS_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Directory holding saved configuration (overrides settings)
    #[arg(long, env = "PCAP2SOCKS_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PCAP2SOCKS_OUTPUT",
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

    /// Request timeout in seconds (overrides settings)
    #[arg(long, env = "PCAP2SOCKS_TIMEOUT", global = true)]
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
    /// List capture-capable network interfaces
    #[command(alias = "if")]
    Interfaces,

    /// Start redirecting with the saved configuration
    Run(RunArgs),

    /// Stop the running engine
    Stop,

    /// Test a proxy and report its NAT type
    Test(TestArgs),

    /// Show traffic statistics of the running engine
    Status,

    /// Manage saved configuration and settings
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Engine ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Keep polling status until Ctrl-C, then stop the engine
    #[arg(long, short = 'w')]
    pub watch: bool,
}

#[derive(Debug, Args)]
pub struct TestArgs {
    /// Test the proxy in an exported file instead of the saved one
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show settings and the saved configuration (passwords masked)
    Show,

    /// Print the settings file path
    Path,

    /// Save the capture interface
    SetInterface {
        /// Interface name, as listed by `pcap2socks interfaces`
        name: String,

        /// MTU (576-1500); 0 uses the interface's own MTU
        #[arg(long, default_value = "0")]
        mtu: u32,
    },

    /// Save the device whose traffic is redirected
    SetDevice {
        /// Address preset
        #[arg(long, short = 'p', default_value = "tencent")]
        preset: PresetArg,

        /// Source IP or CIDR (custom preset only)
        #[arg(long, default_value = "10.6.0.1")]
        source: String,

        /// Virtual gateway address, empty for none (custom preset only)
        #[arg(long, default_value = "10.6.0.2")]
        publish: String,
    },

    /// Save the upstream SOCKS proxy
    SetProxy {
        /// Proxy address as host:port
        destination: String,

        /// Username; enables authentication and prompts for the password
        #[arg(long, short = 'u')]
        username: Option<String>,

        /// Password (prompted when omitted and a username is given)
        #[arg(long, requires = "username")]
        password: Option<String>,

        /// Extra engine options, passed through untouched
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        extra: String,
    },

    /// Export the saved proxy to pcap2socks.json
    Export {
        /// Target directory
        #[arg(long, short = 'd', default_value = ".")]
        dir: PathBuf,
    },

    /// Import a proxy from an exported file and save it
    Import {
        /// Exported proxy file
        file: PathBuf,
    },

    /// Delete all saved configuration
    Clear,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PresetArg {
    /// Custom source and gateway addresses
    Custom,
    /// Tencent game accelerator network (10.6.0.0/24)
    Tencent,
    /// NetEase UU accelerator network (172.24.0.0/16)
    Netease,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
