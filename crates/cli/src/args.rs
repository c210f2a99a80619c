//! Command-line surface of `nprt`.

use clap::{Parser, ValueEnum};

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Color when stdout is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

/// Track which nixpkgs channels contain a given pull request.
#[derive(Debug, Parser)]
#[command(name = "nprt", version, about)]
pub struct Cli {
    /// Pull request number (e.g. 476497) or URL
    /// (e.g. https://github.com/NixOS/nixpkgs/pull/476497)
    #[arg(value_name = "PR")]
    pub pr: String,

    /// Comma-separated list of channels to check
    /// [default: master,staging-next,nixpkgs-unstable,nixos-unstable-small,nixos-unstable]
    #[arg(long, value_name = "LIST")]
    pub channels: Option<String>,

    /// Color output mode
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed progress and debug information on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// GitHub personal access token for higher rate limits
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "NPRT_API_URL", value_name = "URL", default_value = github::DEFAULT_API_URL)]
    pub api_url: String,

    /// Give up on the whole check after this many seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub timeout: u64,
}
