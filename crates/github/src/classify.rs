//! Mapping from non-2xx responses to [`ApiError`].

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use tracker::ApiError;

use crate::wire::ErrorPayload;

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Longest body excerpt carried into an error message.
const MAX_BODY_MESSAGE: usize = 200;

/// Classifies a failed response.
///
/// `subject` names what was requested (e.g. `"pull request #42"`) and is used
/// for the not-found message. A 403 is only treated as a rate limit when the
/// remaining quota header is exactly `"0"`; secondary rate limits and plain
/// permission failures stay generic.
pub(crate) fn classify_failure(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    subject: &str,
) -> ApiError {
    match status {
        StatusCode::NOT_FOUND => ApiError::not_found(subject),
        StatusCode::FORBIDDEN if quota_exhausted(headers) => {
            ApiError::rate_limited(reset_delay(headers, SystemTime::now()))
        }
        _ => ApiError::http(status.as_u16(), &body_message(body)),
    }
}

fn quota_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get(RATE_LIMIT_REMAINING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
}

/// Time until the quota window resets, from the epoch-seconds reset header.
fn reset_delay(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
    let reset_at = headers
        .get(RATE_LIMIT_RESET)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()?;
    let now = now.duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(Duration::from_secs(reset_at.saturating_sub(now)))
}

/// GitHub's `message` field if the body is a JSON error, else the raw text.
fn body_message(body: &str) -> String {
    let message = match serde_json::from_str::<ErrorPayload>(body) {
        Ok(payload) => payload.message,
        Err(_) => body.trim().to_string(),
    };

    if message.chars().count() > MAX_BODY_MESSAGE {
        let mut cut: String = message.chars().take(MAX_BODY_MESSAGE).collect();
        cut.push('…');
        cut
    } else {
        message
    }
}
