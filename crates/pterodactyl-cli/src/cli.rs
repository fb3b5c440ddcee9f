//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Pterodactyl CLI - rate-limited access to the Pterodactyl Panel APIs
///
/// Sends authenticated requests to a panel's Client or Application API,
/// keeping each API key inside its request budget and retrying rate-limited
/// calls with exponential backoff.
#[derive(Parser, Debug)]
#[command(
    name = "pterodactyl",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PTERODACTYL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a single request to the panel
    Request(RequestArgs),

    /// Fetch every page of a list endpoint
    List(ListArgs),

    /// Manage configuration files and profiles
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the request command
#[derive(Parser, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    #[arg(value_name = "METHOD")]
    pub method: String,

    /// Endpoint relative to the API base, e.g. /servers/abc123/resources
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: String,

    /// Which panel API to call
    #[arg(short, long, value_enum, default_value = "client")]
    pub api: ApiArg,

    /// JSON request body, or @path to read it from a file
    #[arg(short, long)]
    pub body: Option<String>,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "query", value_name = "KEY=VALUE")]
    pub query: Vec<String>,

    /// Extra header as name=value (repeatable, replaces defaults)
    #[arg(long = "header", value_name = "NAME=VALUE")]
    pub headers: Vec<String>,

    /// Configuration profile to use
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// List endpoint relative to the API base, e.g. /servers
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: String,

    /// Which panel API to call
    #[arg(short, long, value_enum, default_value = "client")]
    pub api: ApiArg,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "query", value_name = "KEY=VALUE")]
    pub query: Vec<String>,

    /// Configuration profile to use
    #[arg(short, long)]
    pub profile: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a starter configuration file
    Init(ConfigInitArgs),

    /// Show current configuration values (API keys redacted)
    Show(ConfigShowArgs),

    /// List configured profiles
    Profiles,

    /// Validate current configuration
    Validate,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Write to the user config directory instead of the current directory
    #[arg(long)]
    pub user: bool,

    /// File format to write
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl ConfigFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
        }
    }
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Panel API selector
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ApiArg {
    /// Client API (/api/client)
    Client,
    /// Application API (/api/application)
    Application,
}

impl From<ApiArg> for pterodactyl_core::ApiKind {
    fn from(api: ApiArg) -> Self {
        match api {
            ApiArg::Client => pterodactyl_core::ApiKind::Client,
            ApiArg::Application => pterodactyl_core::ApiKind::Application,
        }
    }
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
