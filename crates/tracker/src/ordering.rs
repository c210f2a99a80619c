//! Presentation order for channel verdicts.

use std::cmp::Ordering;

use crate::{ChannelResult, ChannelStatus};

/// Orders verdicts as `Present ++ NotPresent ++ Unknown`.
///
/// Present entries keep the order they were requested in, so a caller that
/// lists `master` first sees it first. NotPresent and Unknown entries are
/// each sorted by name in byte order. The function is pure and idempotent.
pub fn sort_channel_results(mut results: Vec<ChannelResult>) -> Vec<ChannelResult> {
    // `sort_by` is stable, which is what keeps Present entries in request order.
    results.sort_by(compare);
    results
}

fn compare(a: &ChannelResult, b: &ChannelResult) -> Ordering {
    rank(a.status)
        .cmp(&rank(b.status))
        .then_with(|| match a.status {
            ChannelStatus::Present => Ordering::Equal,
            ChannelStatus::NotPresent | ChannelStatus::Unknown => a.name.cmp(&b.name),
        })
}

fn rank(status: ChannelStatus) -> u8 {
    match status {
        ChannelStatus::Present => 0,
        ChannelStatus::NotPresent => 1,
        ChannelStatus::Unknown => 2,
    }
}
