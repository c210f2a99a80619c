//! Port trait implemented by the GitHub infrastructure adapter.
//!
//! The checker depends only on this trait; the `github` crate supplies the
//! HTTP implementation and tests supply in-memory fakes.

use async_trait::async_trait;

use crate::{ApiError, CancelToken, ChannelName, CommitSha, CompareResult, PrNumber, PullRequest};

/// The two GitHub REST calls the membership check needs, scoped to
/// `NixOS/nixpkgs`.
///
/// Implementations must not retry. Every call must return
/// [`ApiError::cancelled`] promptly once `cancel` fires.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Fetches one pull request.
    ///
    /// # Errors
    ///
    /// - [`crate::ApiErrorKind::NotFound`] on HTTP 404.
    /// - [`crate::ApiErrorKind::RateLimited`] on HTTP 403 with an exhausted quota.
    /// - [`crate::ApiErrorKind::Generic`] for any other failure.
    /// - [`crate::ApiErrorKind::Cancelled`] if `cancel` fires first.
    async fn get_pull_request(
        &self,
        cancel: &CancelToken,
        number: PrNumber,
    ) -> Result<PullRequest, ApiError>;

    /// Compares `commit` against the head of `branch`.
    ///
    /// A result with `behind_by == 0` means `commit` is reachable from the
    /// branch head.
    ///
    /// # Errors
    ///
    /// Same classification as [`GitHubApi::get_pull_request`]; a 404 means the
    /// branch or the commit is unknown.
    async fn compare_commit_with_branch(
        &self,
        cancel: &CancelToken,
        commit: &CommitSha,
        branch: &ChannelName,
    ) -> Result<CompareResult, ApiError>;
}
