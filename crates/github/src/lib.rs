//! nprt GitHub infrastructure adapter.
//!
//! Implements the [`tracker::GitHubApi`] port over the GitHub REST API using
//! [`reqwest`]. Two endpoints are used:
//!
//! - `GET /repos/NixOS/nixpkgs/pulls/{number}`
//! - `GET /repos/NixOS/nixpkgs/compare/{sha}...{branch}`
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL construction, authentication headers, JSON
//! decoding, and the mapping from HTTP status and rate-limit headers to
//! [`tracker::ApiErrorKind`] all live here. The checker never sees a status
//! code except through [`tracker::ApiError`].
//!
//! ## Error classification
//!
//! | Response | Kind |
//! |----------|------|
//! | 404 | `NotFound` |
//! | 403 with `X-RateLimit-Remaining: 0` | `RateLimited` |
//! | any other non-2xx | `Generic` (status + body message) |
//! | transport or decode failure | `Generic` (no status) |
//! | cancellation token fired | `Cancelled` |

mod classify;
mod client;
mod wire;

pub use client::{ClientError, RestClient, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT};
