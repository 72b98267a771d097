//! Normalizes the platform's raw engagement counters for one message.

use lookout_types::{MessageStats, RawStats};

/// Extract statistics from a raw message. Counters the platform does not
/// expose for this message type become 0; reaction totals are summed across
/// all emoji buckets and the per-emoji breakdown is kept verbatim. This can
/// never fail a match: the decode layer already degraded anything malformed
/// to an absent counter.
pub fn extract(raw: &RawStats) -> MessageStats {
    let mut reactions_total: u32 = 0;
    let mut reactions_detail = std::collections::BTreeMap::new();
    for (emoji, count) in &raw.reactions {
        reactions_total = reactions_total.saturating_add(*count);
        reactions_detail.insert(emoji.clone(), *count);
    }

    MessageStats {
        views: raw.views.unwrap_or(0),
        forwards: raw.forwards.unwrap_or(0),
        replies: raw.replies.unwrap_or(0),
        reactions_total,
        reactions_detail,
    }
}
