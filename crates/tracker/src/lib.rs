//! Channel-membership domain for nprt.
//!
//! This crate holds every domain concept the tool reasons about: pull
//! requests and their lifecycle state, ancestry comparisons, per-channel
//! verdicts, the finished status report, the GitHub error taxonomy, and the
//! deterministic ordering applied to verdicts before presentation.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate performs no network I/O. It
//! defines the [`GitHubApi`] port; the `github` crate implements it over
//! HTTP and the `checker` crate consumes it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`PrNumber`, `ChannelName`, `CommitSha`) |
//! | [`types`] | Value types (`PullRequest`, `CompareResult`, `ChannelResult`, `PrStatus`) |
//! | [`errors`] | `ApiError`, its `ApiErrorKind`, and `RetryPolicy` |
//! | [`ordering`] | `sort_channel_results` |
//! | [`ports`] | The `GitHubApi` trait |
//! | [`cancel`] | `CancelSource` / `CancelToken` |

pub mod cancel;
pub mod errors;
pub mod identifiers;
pub mod ordering;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use cancel::{CancelSource, CancelToken};
pub use errors::{ApiError, ApiErrorKind, RetryPolicy};
pub use identifiers::{ChannelName, CommitSha, PrNumber};
pub use ordering::sort_channel_results;
pub use ports::GitHubApi;
pub use types::{ChannelResult, ChannelStatus, CompareResult, PrState, PrStatus, PullRequest};

/// Owner of the only repository this tool inspects.
pub const REPO_OWNER: &str = "NixOS";

/// Name of the only repository this tool inspects.
pub const REPO_NAME: &str = "nixpkgs";

/// Channels checked when the caller does not pick any, in presentation priority.
pub const DEFAULT_CHANNELS: [&str; 5] = [
    "master",
    "staging-next",
    "nixpkgs-unstable",
    "nixos-unstable-small",
    "nixos-unstable",
];
