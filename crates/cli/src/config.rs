//! Resolution of command-line input and environment into run settings.

use std::collections::HashSet;
use std::io::IsTerminal;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracker::{ChannelName, PrNumber, DEFAULT_CHANNELS, REPO_NAME, REPO_OWNER};

use crate::args::{Cli, ColorMode};

/// Everything `main` needs to run one check.
#[derive(Debug, Clone)]
pub struct Settings {
    pub pr: PrNumber,
    pub channels: Vec<ChannelName>,
    pub token: Option<String>,
    pub api_url: String,
    pub timeout: Duration,
    pub json: bool,
    pub color: bool,
    pub hyperlinks: bool,
}

impl Settings {
    /// Validates `cli` and reads terminal state and `NO_COLOR`/`TERM`.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let pr = parse_pr_input(&cli.pr)?;
        let channels = parse_channels(cli.channels.as_deref())?;
        if cli.timeout == 0 {
            bail!("--timeout must be at least 1 second");
        }

        let stdout_is_terminal = std::io::stdout().is_terminal();
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        let term = std::env::var("TERM").ok();

        Ok(Self {
            pr,
            channels,
            token: normalize_token(cli.github_token.as_deref()),
            api_url: cli.api_url.clone(),
            timeout: Duration::from_secs(cli.timeout),
            json: cli.json,
            color: should_use_color(cli.color, stdout_is_terminal, no_color, term.as_deref()),
            hyperlinks: stdout_is_terminal,
        })
    }
}

/// Parses a pull request given as `476497`, `#476497`, or a
/// `https://github.com/NixOS/nixpkgs/pull/476497[/...]` URL.
pub fn parse_pr_input(input: &str) -> Result<PrNumber> {
    let input = input.trim();
    if input.is_empty() {
        bail!("pull request number or URL is required");
    }

    let digits = match input.strip_prefix('#') {
        Some(rest) => rest,
        None if input.contains('/') => pr_number_from_url(input)?,
        None => input,
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        bail!("invalid pull request number '{input}'");
    }
    let value: u64 = digits
        .parse()
        .with_context(|| format!("pull request number '{digits}' is out of range"))?;
    PrNumber::new(value).context("pull request number must be positive")
}

fn pr_number_from_url(url: &str) -> Result<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let rest = rest.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();

    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    let host = segments.next().unwrap_or_default();
    let owner = segments.next().unwrap_or_default();
    let repo = segments.next().unwrap_or_default();
    let kind = segments.next().unwrap_or_default();
    let number = segments.next().unwrap_or_default();

    if !matches!(host.to_ascii_lowercase().as_str(), "github.com" | "www.github.com") {
        bail!("'{url}' is not a github.com pull request URL");
    }
    if !owner.eq_ignore_ascii_case(REPO_OWNER) || !repo.eq_ignore_ascii_case(REPO_NAME) {
        bail!("only {REPO_OWNER}/{REPO_NAME} pull requests are supported, got {owner}/{repo}");
    }
    if kind != "pull" {
        bail!("'{url}' is not a pull request URL");
    }
    Ok(number)
}

/// Parses `--channels`, falling back to [`DEFAULT_CHANNELS`].
///
/// Entries are trimmed, empty entries dropped, and duplicates removed keeping
/// the first occurrence, so the result is non-empty and duplicate-free.
pub fn parse_channels(raw: Option<&str>) -> Result<Vec<ChannelName>> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_CHANNELS
            .iter()
            .filter_map(|name| ChannelName::new(*name))
            .collect());
    };

    let mut seen = HashSet::new();
    let mut channels = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if name.chars().any(char::is_whitespace) || name.contains("..") {
            bail!("invalid channel name '{name}'");
        }
        if seen.insert(name) {
            channels.extend(ChannelName::new(name));
        }
    }

    if channels.is_empty() {
        bail!("no channels given");
    }
    Ok(channels)
}

/// Treats an unset or blank token as absent.
pub fn normalize_token(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Decides whether to emit ANSI colors.
pub fn should_use_color(
    mode: ColorMode,
    stdout_is_terminal: bool,
    no_color: bool,
    term: Option<&str>,
) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => stdout_is_terminal && !no_color && term != Some("dumb"),
    }
}
