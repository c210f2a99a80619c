//! Error and retry-policy types for the GitHub port.
//!
//! [`ApiError`] is the only error that crosses the [`crate::GitHubApi`]
//! boundary. It is a tagged value: callers branch on [`ApiErrorKind`], never
//! on the concrete transport error that caused it.
//!
//! [`RetryPolicy`] describes whether re-running the whole invocation could
//! help. Nothing in this workspace retries on its own; the policy is surfaced
//! to the user so automation can decide.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is worth retrying and, if so, after what delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may succeed if retried.
    Retryable {
        /// Minimum back-off before the next attempt, typically derived from
        /// the `X-RateLimit-Reset` response header. `None` means the caller
        /// applies its own schedule.
        after: Option<Duration>,
    },
    /// Retrying will not change the outcome.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// API errors
// ---------------------------------------------------------------------------

/// Classification of a failed GitHub API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiErrorKind {
    /// HTTP 404: the pull request, branch, or commit does not exist.
    NotFound,
    /// HTTP 403 with `X-RateLimit-Remaining: 0`: the quota is exhausted.
    RateLimited,
    /// Any other non-2xx response, transport failure, or undecodable body.
    Generic,
    /// The caller's cancellation token fired before the response was read.
    Cancelled,
}

/// A failed GitHub API call.
///
/// `Display` prints only the human-readable message, so the error can be
/// shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// What went wrong.
    pub kind: ApiErrorKind,
    /// HTTP status, when a response was received.
    pub status_code: Option<u16>,
    /// Human-readable cause.
    pub message: String,
    /// Time until the rate-limit window resets, when known.
    pub retry_after: Option<Duration>,
}

impl ApiError {
    /// Creates an error of the given kind.
    pub fn new(kind: ApiErrorKind, status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_code,
            message: message.into(),
            retry_after: None,
        }
    }

    /// HTTP 404 for `what` (e.g. `"pull request #42"`).
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::new(ApiErrorKind::NotFound, Some(404), format!("{what} not found"))
    }

    /// HTTP 403 with an exhausted quota.
    pub fn rate_limited(retry_after: Option<Duration>) -> Self {
        let mut message = String::from("GitHub API rate limit exceeded");
        if let Some(after) = retry_after {
            message.push_str(&format!(" (resets in {}s)", after.as_secs()));
        }
        message.push_str("; set GITHUB_TOKEN for a higher limit");

        Self {
            kind: ApiErrorKind::RateLimited,
            status_code: Some(403),
            message,
            retry_after,
        }
    }

    /// Any other non-2xx response.
    pub fn http(status_code: u16, body_message: &str) -> Self {
        let message = if body_message.is_empty() {
            format!("GitHub API returned status {status_code}")
        } else {
            format!("GitHub API returned status {status_code}: {body_message}")
        };
        Self::new(ApiErrorKind::Generic, Some(status_code), message)
    }

    /// A failure below HTTP: connection, TLS, or body decoding.
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::new(ApiErrorKind::Generic, None, format!("request to GitHub failed: {cause}"))
    }

    /// The cancellation token fired.
    pub fn cancelled() -> Self {
        Self::new(ApiErrorKind::Cancelled, None, "request cancelled")
    }

    /// Returns `true` for [`ApiErrorKind::RateLimited`].
    pub fn is_rate_limited(&self) -> bool {
        self.kind == ApiErrorKind::RateLimited
    }

    /// Returns `true` for [`ApiErrorKind::NotFound`].
    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }

    /// Returns `true` for [`ApiErrorKind::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        self.kind == ApiErrorKind::Cancelled
    }

    /// Whether re-running the invocation could succeed.
    ///
    /// Rate limits are retryable after the reset delay; server errors and
    /// transport failures are retryable immediately; everything else is not.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self.kind {
            ApiErrorKind::RateLimited => RetryPolicy::Retryable {
                after: self.retry_after,
            },
            ApiErrorKind::Generic => match self.status_code {
                None => RetryPolicy::Retryable { after: None },
                Some(code) if code >= 500 => RetryPolicy::Retryable { after: None },
                Some(_) => RetryPolicy::NonRetryable,
            },
            ApiErrorKind::NotFound | ApiErrorKind::Cancelled => RetryPolicy::NonRetryable,
        }
    }
}
