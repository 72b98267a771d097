//! Folds matches into per-tenant, per-calendar-day rollups.
//!
//! The fold itself is pure; lookout-db applies it inside the same transaction
//! that inserts the match row, so a failed upsert rolls the match back too.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use lookout_types::{DailyStatistic, MatchRecord};

/// The contribution of one match to its day's rollup.
#[derive(Debug, Clone)]
pub struct DailyDelta {
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub views: u32,
    pub forwards: u32,
    pub reactions: u32,
    pub keywords: Vec<String>,
    pub links: Vec<String>,
}

impl DailyDelta {
    /// Day assignment uses the message timestamp's UTC calendar date, not
    /// the time the scan ran.
    pub fn from_match(record: &MatchRecord) -> Self {
        Self {
            tenant_id: record.tenant_id,
            date: record.timestamp.date_naive(),
            views: record.stats.views,
            forwards: record.stats.forwards,
            reactions: record.stats.reactions_total,
            keywords: record.found_keywords.clone(),
            links: record.found_links.clone(),
        }
    }
}

/// First match of a `(tenant, date)` key: a fresh rollup seeded from this
/// delta alone.
pub fn seed(delta: &DailyDelta, now: DateTime<Utc>) -> DailyStatistic {
    let mut stat = DailyStatistic {
        tenant_id: delta.tenant_id,
        date: delta.date,
        total_matches: 0,
        total_views: 0,
        total_forwards: 0,
        total_reactions: 0,
        keyword_stats: BTreeMap::new(),
        link_stats: BTreeMap::new(),
        updated_at: now,
    };
    apply(&mut stat, delta, now);
    stat
}

/// Subsequent matches accumulate additively. Frequency maps count every
/// occurrence, including duplicate links from the URL-entity rule.
pub fn apply(stat: &mut DailyStatistic, delta: &DailyDelta, now: DateTime<Utc>) {
    stat.total_matches += 1;
    stat.total_views = stat.total_views.saturating_add(delta.views);
    stat.total_forwards = stat.total_forwards.saturating_add(delta.forwards);
    stat.total_reactions = stat.total_reactions.saturating_add(delta.reactions);

    for keyword in &delta.keywords {
        *stat.keyword_stats.entry(keyword.clone()).or_insert(0) += 1;
    }
    for link in &delta.links {
        *stat.link_stats.entry(link.clone()).or_insert(0) += 1;
    }

    stat.updated_at = now;
}
