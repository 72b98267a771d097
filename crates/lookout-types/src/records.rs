use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Normalized engagement statistics for one message. All-zero when the
/// platform exposes nothing for that message type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageStats {
    pub views: u32,
    pub forwards: u32,
    pub replies: u32,
    pub reactions_total: u32,
    pub reactions_detail: BTreeMap<String, u32>,
}

/// One matched message. Immutable once written; repeated scans of the same
/// window produce repeated rows (no cross-pass dedup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub tenant_id: Uuid,
    pub group_id: i64,
    pub group_name: String,
    pub message_id: i64,
    pub sender_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub found_keywords: Vec<String>,
    /// May contain duplicates: the plain-substring rule and the URL-entity
    /// rule can both capture the same link.
    pub found_links: Vec<String>,
    pub permalink: String,
    pub stats: MessageStats,
}

/// Additive per-tenant, per-calendar-day rollup of matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStatistic {
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub total_matches: u32,
    pub total_views: u32,
    pub total_forwards: u32,
    pub total_reactions: u32,
    pub keyword_stats: BTreeMap<String, u32>,
    pub link_stats: BTreeMap<String, u32>,
    pub updated_at: DateTime<Utc>,
}
