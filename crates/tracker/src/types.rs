//! Shared value types for the channel-membership domain.
//!
//! Everything here is produced once and read afterwards: a [`PullRequest`] is
//! built from a single API response, a [`CompareResult`] from a single
//! comparison, and a [`PrStatus`] is the finished report handed to the
//! renderer.

use serde::{Deserialize, Serialize};

use crate::{ChannelName, CommitSha, PrNumber};

// ---------------------------------------------------------------------------
// Pull request state
// ---------------------------------------------------------------------------

/// Lifecycle state of a pull request as seen by a single fetch.
///
/// GitHub only exposes `open`/`closed` plus a `merged` flag and a `draft`
/// flag; [`PrState::classify`] folds those into one value. `Draft` and `Open`
/// can still move to `Merged` or `Closed`; the latter two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrState {
    /// Open and marked as a draft.
    Draft,
    /// Open and ready for review.
    Open,
    /// Merged into its base branch; a merge commit exists.
    Merged,
    /// Closed without being merged.
    Closed,
}

impl PrState {
    /// Derives the state from the raw API fields.
    ///
    /// Precedence: `merged` wins over everything, then a `"closed"` state,
    /// then the draft flag. Anything else is `Open`.
    pub fn classify(api_state: &str, merged: bool, draft: bool) -> Self {
        if merged {
            PrState::Merged
        } else if api_state == "closed" {
            PrState::Closed
        } else if draft {
            PrState::Draft
        } else {
            PrState::Open
        }
    }

    /// Returns the lowercase name used in JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            PrState::Draft => "draft",
            PrState::Open => "open",
            PrState::Merged => "merged",
            PrState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// API results
// ---------------------------------------------------------------------------

/// A nixpkgs pull request, decoded from `GET /repos/NixOS/nixpkgs/pulls/{n}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Pull request number.
    pub number: PrNumber,
    /// Derived lifecycle state.
    pub state: PrState,
    /// Raw `merged` flag from the API.
    pub merged: bool,
    /// Merge commit. Always `None` unless `merged` is `true`; GitHub reports a
    /// test-merge SHA for open pull requests which must not be used here.
    pub merge_commit_sha: Option<CommitSha>,
    /// Name of the branch the pull request targets.
    pub base_ref: String,
}

impl PullRequest {
    /// Builds a [`PullRequest`] from raw API fields, deriving the state and
    /// dropping any merge commit reported for an unmerged pull request.
    pub fn from_api(
        number: PrNumber,
        api_state: &str,
        merged: bool,
        draft: bool,
        merge_commit_sha: Option<String>,
        base_ref: String,
    ) -> Self {
        let merge_commit_sha = if merged {
            merge_commit_sha.and_then(CommitSha::new)
        } else {
            None
        };

        Self {
            number,
            state: PrState::classify(api_state, merged, draft),
            merged,
            merge_commit_sha,
            base_ref,
        }
    }
}

/// Ancestry relationship between a commit and a branch head, as reported by
/// the comparison endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareResult {
    /// `"ahead"`, `"behind"`, `"identical"` or `"diverged"`.
    pub status: String,
    /// Commits on the branch that the commit does not have.
    pub ahead_by: u64,
    /// Commits on the commit side that the branch does not have.
    pub behind_by: u64,
}

impl CompareResult {
    /// Returns `true` when the commit is reachable from the branch head.
    ///
    /// `behind_by == 0` is the only signal consulted; `status` is informative.
    pub fn contains_commit(&self) -> bool {
        self.behind_by == 0
    }
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Tri-state outcome of the membership test for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// The merge commit is an ancestor of the channel head.
    Present,
    /// The merge commit is not (yet) in the channel, or never will be.
    NotPresent,
    /// Membership could not be determined.
    Unknown,
}

impl From<&CompareResult> for ChannelStatus {
    fn from(result: &CompareResult) -> Self {
        if result.contains_commit() {
            ChannelStatus::Present
        } else {
            ChannelStatus::NotPresent
        }
    }
}

/// Verdict for one requested channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelResult {
    /// Channel name.
    pub name: ChannelName,
    /// Membership verdict.
    pub status: ChannelStatus,
}

impl ChannelResult {
    /// Creates a new [`ChannelResult`].
    pub fn new(name: ChannelName, status: ChannelStatus) -> Self {
        Self { name, status }
    }
}

/// The finished report for one pull request.
///
/// Serialises to the JSON shape consumed by scripts:
/// `{"pr", "state", "merge_commit"?, "channels": [{"name", "status"}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrStatus {
    /// Pull request number.
    #[serde(rename = "pr")]
    pub number: PrNumber,
    /// Lifecycle state.
    pub state: PrState,
    /// Merge commit; present if and only if `state` is `Merged`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_commit: Option<CommitSha>,
    /// One verdict per requested channel, in presentation order.
    pub channels: Vec<ChannelResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(n: u64) -> PrNumber {
        PrNumber::new(n).unwrap()
    }

    #[test]
    fn classify_merged_wins_over_closed() {
        assert_eq!(PrState::classify("closed", true, false), PrState::Merged);
        assert_eq!(PrState::classify("closed", true, true), PrState::Merged);
    }

    #[test]
    fn classify_closed_wins_over_draft() {
        assert_eq!(PrState::classify("closed", false, true), PrState::Closed);
    }

    #[test]
    fn classify_open_and_draft() {
        assert_eq!(PrState::classify("open", false, true), PrState::Draft);
        assert_eq!(PrState::classify("open", false, false), PrState::Open);
    }

    #[test]
    fn from_api_drops_merge_commit_of_unmerged_pr() {
        let open = PullRequest::from_api(
            pr(1),
            "open",
            false,
            false,
            Some("deadbeef".to_string()),
            "master".to_string(),
        );
        assert_eq!(open.merge_commit_sha, None);

        let merged = PullRequest::from_api(
            pr(2),
            "closed",
            true,
            false,
            Some("abc123def456".to_string()),
            "master".to_string(),
        );
        assert_eq!(merged.state, PrState::Merged);
        assert_eq!(merged.merge_commit_sha.unwrap().as_str(), "abc123def456");
    }

    #[test]
    fn compare_result_behind_by_zero_is_present() {
        let ahead = CompareResult {
            status: "ahead".to_string(),
            ahead_by: 100,
            behind_by: 0,
        };
        let behind = CompareResult {
            status: "behind".to_string(),
            ahead_by: 0,
            behind_by: 5,
        };
        assert_eq!(ChannelStatus::from(&ahead), ChannelStatus::Present);
        assert_eq!(ChannelStatus::from(&behind), ChannelStatus::NotPresent);
    }

    #[test]
    fn pr_status_json_omits_missing_merge_commit() {
        let status = PrStatus {
            number: pr(42),
            state: PrState::Open,
            merge_commit: None,
            channels: vec![ChannelResult::new(
                ChannelName::new("master").unwrap(),
                ChannelStatus::Unknown,
            )],
        };

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "pr": 42,
                "state": "open",
                "channels": [{"name": "master", "status": "unknown"}]
            })
        );
    }

    #[test]
    fn pr_status_json_includes_merge_commit() {
        let status = PrStatus {
            number: pr(476497),
            state: PrState::Merged,
            merge_commit: CommitSha::new("abc123"),
            channels: vec![ChannelResult::new(
                ChannelName::new("nixos-unstable").unwrap(),
                ChannelStatus::NotPresent,
            )],
        };

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["merge_commit"], "abc123");
        assert_eq!(json["state"], "merged");
        assert_eq!(json["channels"][0]["status"], "not_present");
    }
}
