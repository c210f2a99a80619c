//! nprt channel checker.
//!
//! Turns a pull request number and a list of requested channels into a
//! complete [`PrStatus`]: one pull request fetch, then (for merged pull
//! requests) one ancestry comparison per channel, run concurrently and joined
//! before the report is assembled.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The checker sequences calls through the
//! [`GitHubApi`] port and applies the verdict rules. It knows nothing about
//! HTTP; the `github` crate does.
//!
//! ## Failure policy
//!
//! - The pull request fetch is all-or-nothing: its error is returned as-is.
//! - Channel comparisons are best-effort: a failed comparison becomes
//!   [`ChannelStatus::Unknown`] without affecting its siblings.
//! - Except: a rate-limited comparison fails the whole check, and so does
//!   cancellation. Pending comparisons are aborted and no partial report is
//!   returned.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};
use tracker::{
    sort_channel_results, ApiError, CancelToken, ChannelName, ChannelResult, ChannelStatus,
    CommitSha, GitHubApi, PrNumber, PrState, PrStatus,
};

/// Resolves channel membership for nixpkgs pull requests.
#[derive(Clone)]
pub struct Checker {
    api: Arc<dyn GitHubApi>,
}

impl Checker {
    /// Creates a checker that talks to GitHub through `api`.
    pub fn new(api: Arc<dyn GitHubApi>) -> Self {
        Self { api }
    }

    /// Checks which of `channels` contain pull request `number`.
    ///
    /// `channels` is expected to be non-empty and free of duplicates. The
    /// returned report has exactly one entry per requested channel, ordered
    /// by [`sort_channel_results`].
    ///
    /// # Errors
    ///
    /// Returns the pull request fetch error unchanged, a rate-limit error from
    /// any comparison, or [`ApiError::cancelled`] if `cancel` fires before all
    /// comparisons complete.
    #[instrument(skip_all, fields(pr = %number, channels = channels.len()))]
    pub async fn check_pr(
        &self,
        cancel: &CancelToken,
        number: PrNumber,
        channels: &[ChannelName],
    ) -> Result<PrStatus, ApiError> {
        debug!("fetching pull request");
        let pr = self.api.get_pull_request(cancel, number).await?;
        debug!(state = %pr.state, base = %pr.base_ref, "pull request fetched");

        let statuses = match (pr.state, &pr.merge_commit_sha) {
            (PrState::Merged, Some(commit)) => {
                self.compare_channels(cancel, commit, channels).await?
            }
            (PrState::Merged, None) => {
                warn!("merged pull request has no merge commit; channels cannot be checked");
                vec![ChannelStatus::Unknown; channels.len()]
            }
            // A closed, unmerged pull request never lands anywhere.
            (PrState::Closed, _) => vec![ChannelStatus::NotPresent; channels.len()],
            (PrState::Open | PrState::Draft, _) => vec![ChannelStatus::Unknown; channels.len()],
        };

        let results = channels
            .iter()
            .cloned()
            .zip(statuses)
            .map(|(name, status)| ChannelResult::new(name, status))
            .collect();

        Ok(PrStatus {
            number: pr.number,
            state: pr.state,
            merge_commit: pr.merge_commit_sha,
            channels: sort_channel_results(results),
        })
    }

    /// Runs one comparison per channel and returns verdicts in request order.
    async fn compare_channels(
        &self,
        cancel: &CancelToken,
        commit: &CommitSha,
        channels: &[ChannelName],
    ) -> Result<Vec<ChannelStatus>, ApiError> {
        let mut tasks = JoinSet::new();
        for (index, channel) in channels.iter().cloned().enumerate() {
            let api = Arc::clone(&self.api);
            let cancel = cancel.clone();
            let commit = commit.clone();
            tasks.spawn(async move {
                debug!(%channel, "comparing merge commit with channel");
                let outcome = api
                    .compare_commit_with_branch(&cancel, &commit, &channel)
                    .await;
                (index, channel, outcome)
            });
        }

        // Each slot is written once, by the collector, from the task that
        // owns that index. Dropping `tasks` on an early return aborts the rest.
        let collect = async move {
            let mut verdicts: Vec<Option<ChannelStatus>> = vec![None; channels.len()];
            while let Some(joined) = tasks.join_next().await {
                let (index, channel, outcome) = match joined {
                    Ok(done) => done,
                    Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                    Err(_) => continue,
                };

                let status = match outcome {
                    Ok(comparison) => {
                        let status = ChannelStatus::from(&comparison);
                        debug!(
                            %channel,
                            compare_status = %comparison.status,
                            ahead_by = comparison.ahead_by,
                            behind_by = comparison.behind_by,
                            ?status,
                            "comparison complete"
                        );
                        status
                    }
                    Err(err) if err.is_rate_limited() || err.is_cancelled() => return Err(err),
                    Err(err) => {
                        warn!(%channel, error = %err, "comparison failed; reporting unknown");
                        ChannelStatus::Unknown
                    }
                };
                verdicts[index] = Some(status);
            }

            Ok(verdicts
                .into_iter()
                .map(|v| v.unwrap_or(ChannelStatus::Unknown))
                .collect())
        };

        cancel.guard(collect).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tracker::{CancelSource, CompareResult, PullRequest};

    use super::*;

    // -----------------------------------------------------------------------
    // Test double
    // -----------------------------------------------------------------------

    enum Reply {
        Compare(CompareResult),
        Fail(ApiError),
        /// Never answers and ignores the cancellation token.
        Hang,
    }

    struct FakeApi {
        pr: Result<PullRequest, ApiError>,
        replies: HashMap<String, Reply>,
        compare_calls: AtomicUsize,
    }

    impl FakeApi {
        fn new(pr: Result<PullRequest, ApiError>) -> Self {
            Self {
                pr,
                replies: HashMap::new(),
                compare_calls: AtomicUsize::new(0),
            }
        }

        fn reply(mut self, channel: &str, reply: Reply) -> Self {
            self.replies.insert(channel.to_string(), reply);
            self
        }

        fn calls(&self) -> usize {
            self.compare_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GitHubApi for FakeApi {
        async fn get_pull_request(
            &self,
            _cancel: &CancelToken,
            _number: PrNumber,
        ) -> Result<PullRequest, ApiError> {
            self.pr.clone()
        }

        async fn compare_commit_with_branch(
            &self,
            _cancel: &CancelToken,
            _commit: &CommitSha,
            branch: &ChannelName,
        ) -> Result<CompareResult, ApiError> {
            self.compare_calls.fetch_add(1, Ordering::SeqCst);
            match self.replies.get(branch.as_str()) {
                Some(Reply::Compare(result)) => Ok(result.clone()),
                Some(Reply::Fail(err)) => Err(err.clone()),
                Some(Reply::Hang) => std::future::pending().await,
                None => Err(ApiError::not_found(format!("branch {branch}"))),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Fixtures
    // -----------------------------------------------------------------------

    fn number() -> PrNumber {
        PrNumber::new(476497).unwrap()
    }

    fn pull_request(api_state: &str, merged: bool, draft: bool) -> PullRequest {
        PullRequest::from_api(
            number(),
            api_state,
            merged,
            draft,
            Some("abc123def456".to_string()),
            "master".to_string(),
        )
    }

    fn ahead() -> Reply {
        Reply::Compare(CompareResult {
            status: "ahead".to_string(),
            ahead_by: 100,
            behind_by: 0,
        })
    }

    fn behind() -> Reply {
        Reply::Compare(CompareResult {
            status: "behind".to_string(),
            ahead_by: 0,
            behind_by: 5,
        })
    }

    fn channels(names: &[&str]) -> Vec<ChannelName> {
        names.iter().map(|n| ChannelName::new(*n).unwrap()).collect()
    }

    fn verdicts(status: &PrStatus) -> Vec<(&str, ChannelStatus)> {
        status
            .channels
            .iter()
            .map(|c| (c.name.as_str(), c.status))
            .collect()
    }

    async fn check(api: Arc<FakeApi>, names: &[&str]) -> Result<PrStatus, ApiError> {
        Checker::new(api)
            .check_pr(&CancelToken::never(), number(), &channels(names))
            .await
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn merged_pr_maps_comparisons_to_verdicts() {
        let api = Arc::new(
            FakeApi::new(Ok(pull_request("closed", true, false)))
                .reply("master", ahead())
                .reply("nixos-unstable", behind()),
        );

        let status = check(api.clone(), &["master", "nixos-unstable"]).await.unwrap();

        assert_eq!(status.state, PrState::Merged);
        assert_eq!(status.merge_commit.as_ref().unwrap().as_str(), "abc123def456");
        assert_eq!(
            verdicts(&status),
            [
                ("master", ChannelStatus::Present),
                ("nixos-unstable", ChannelStatus::NotPresent)
            ]
        );
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn failed_comparison_degrades_to_unknown() {
        let api = Arc::new(
            FakeApi::new(Ok(pull_request("closed", true, false)))
                .reply("master", ahead())
                .reply("staging-next", Reply::Fail(ApiError::http(502, "Bad Gateway")))
                .reply("nixos-unstable", behind()),
        );

        let status = check(
            api,
            &["staging-next", "no-such-branch", "master", "nixos-unstable"],
        )
        .await
        .unwrap();

        assert_eq!(
            verdicts(&status),
            [
                ("master", ChannelStatus::Present),
                ("nixos-unstable", ChannelStatus::NotPresent),
                ("no-such-branch", ChannelStatus::Unknown),
                ("staging-next", ChannelStatus::Unknown),
            ]
        );
    }

    #[tokio::test]
    async fn present_channels_keep_request_order() {
        let api = Arc::new(
            FakeApi::new(Ok(pull_request("closed", true, false)))
                .reply("nixos-unstable", ahead())
                .reply("master", ahead())
                .reply("alpha", behind()),
        );

        let status = check(api, &["nixos-unstable", "alpha", "master"]).await.unwrap();

        let names: Vec<_> = status.channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["nixos-unstable", "master", "alpha"]);
    }

    #[tokio::test]
    async fn closed_pr_is_not_present_everywhere_without_comparisons() {
        let api = Arc::new(FakeApi::new(Ok(pull_request("closed", false, false))));

        let status = check(api.clone(), &["nixos-unstable", "master"]).await.unwrap();

        assert_eq!(status.state, PrState::Closed);
        assert_eq!(status.merge_commit, None);
        assert_eq!(
            verdicts(&status),
            [
                ("master", ChannelStatus::NotPresent),
                ("nixos-unstable", ChannelStatus::NotPresent)
            ]
        );
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn open_and_draft_prs_are_unknown_without_comparisons() {
        for draft in [false, true] {
            let api = Arc::new(FakeApi::new(Ok(pull_request("open", false, draft))));

            let status = check(api.clone(), &["master", "nixos-unstable"]).await.unwrap();

            let expected = if draft { PrState::Draft } else { PrState::Open };
            assert_eq!(status.state, expected);
            assert!(status
                .channels
                .iter()
                .all(|c| c.status == ChannelStatus::Unknown));
            assert_eq!(status.channels.len(), 2);
            assert_eq!(api.calls(), 0);
        }
    }

    #[tokio::test]
    async fn pr_fetch_error_is_returned_unchanged() {
        let api = Arc::new(FakeApi::new(Err(ApiError::not_found("pull request #476497"))));

        let err = check(api.clone(), &["master"]).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("not found"));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn pr_fetch_rate_limit_keeps_status_code() {
        let api = Arc::new(FakeApi::new(Err(ApiError::rate_limited(None))));

        let err = check(api, &["master"]).await.unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(err.status_code, Some(403));
    }

    #[tokio::test]
    async fn rate_limited_comparison_fails_the_whole_check() {
        let api = Arc::new(
            FakeApi::new(Ok(pull_request("closed", true, false)))
                .reply("master", ahead())
                .reply("nixos-unstable", Reply::Fail(ApiError::rate_limited(None)))
                .reply("staging-next", Reply::Hang),
        );

        let err = check(api, &["master", "nixos-unstable", "staging-next"])
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert!(err.to_string().contains("rate limit"));
    }

    #[tokio::test]
    async fn cancellation_aborts_pending_comparisons() {
        let api = Arc::new(
            FakeApi::new(Ok(pull_request("closed", true, false)))
                .reply("master", ahead())
                .reply("nixos-unstable", Reply::Hang),
        );
        let source = CancelSource::new();
        let token = source.token();

        let checker = Checker::new(api.clone());
        let handle = tokio::spawn(async move {
            checker
                .check_pr(&token, number(), &channels(&["master", "nixos-unstable"]))
                .await
        });

        // Both comparisons must be in flight before the source fires.
        tokio::time::timeout(Duration::from_secs(5), async {
            while api.calls() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("comparisons never started");
        assert!(!handle.is_finished());

        source.cancel();
        let err = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("check did not stop after cancellation")
            .unwrap()
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn merged_pr_without_merge_commit_is_unknown() {
        let pr = PullRequest::from_api(
            number(),
            "closed",
            true,
            false,
            None,
            "master".to_string(),
        );
        let api = Arc::new(FakeApi::new(Ok(pr)));

        let status = check(api.clone(), &["master"]).await.unwrap();

        assert_eq!(verdicts(&status), [("master", ChannelStatus::Unknown)]);
        assert_eq!(api.calls(), 0);
    }
}
