//! JSON payloads as GitHub sends them.
//!
//! Only the fields the checker reads are declared; serde ignores the rest of
//! the (large) pull request and comparison documents.

use serde::Deserialize;
use tracker::{ApiError, PrNumber, PullRequest};

/// `GET /repos/{owner}/{repo}/pulls/{number}`
#[derive(Debug, Deserialize)]
pub(crate) struct PullRequestPayload {
    pub number: u64,
    pub state: String,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub draft: bool,
    pub merge_commit_sha: Option<String>,
    pub base: BaseRefPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BaseRefPayload {
    #[serde(rename = "ref")]
    pub name: String,
}

impl PullRequestPayload {
    pub fn into_domain(self) -> Result<PullRequest, ApiError> {
        let number = PrNumber::new(self.number).ok_or_else(|| {
            ApiError::transport("response carried pull request number 0")
        })?;

        Ok(PullRequest::from_api(
            number,
            &self.state,
            self.merged,
            self.draft,
            self.merge_commit_sha,
            self.base.name,
        ))
    }
}

/// Error body shared by all endpoints: `{"message": "...", "documentation_url": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use tracker::PrState;

    use super::*;

    #[test]
    fn decodes_merged_pull_request() {
        let payload: PullRequestPayload = serde_json::from_str(
            r#"{
                "number": 476497,
                "state": "closed",
                "title": "hello: 2.12 -> 2.12.1",
                "merged": true,
                "draft": false,
                "merge_commit_sha": "abc123def456",
                "base": {"ref": "master", "sha": "0000"}
            }"#,
        )
        .unwrap();

        let pr = payload.into_domain().unwrap();
        assert_eq!(pr.number.as_u64(), 476497);
        assert_eq!(pr.state, PrState::Merged);
        assert!(pr.merged);
        assert_eq!(pr.merge_commit_sha.unwrap().as_str(), "abc123def456");
        assert_eq!(pr.base_ref, "master");
    }

    #[test]
    fn missing_flags_and_null_sha_default() {
        let payload: PullRequestPayload = serde_json::from_str(
            r#"{"number": 1, "state": "open", "merge_commit_sha": null, "base": {"ref": "staging"}}"#,
        )
        .unwrap();

        let pr = payload.into_domain().unwrap();
        assert_eq!(pr.state, PrState::Open);
        assert!(!pr.merged);
        assert_eq!(pr.merge_commit_sha, None);
    }

    #[test]
    fn zero_number_is_rejected() {
        let payload: PullRequestPayload = serde_json::from_str(
            r#"{"number": 0, "state": "open", "merge_commit_sha": null, "base": {"ref": "master"}}"#,
        )
        .unwrap();

        assert!(payload.into_domain().is_err());
    }
}
