use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use lookout_engine::aggregate::{self, DailyDelta};
use lookout_types::{DailyStatistic, Lookback, MatchRecord, Tenant, TenantConfig};

use crate::Database;
use crate::models::{DailyStatRow, MatchRow, TenantConfigRow, TenantRow};

impl Database {
    // -- Tenants --

    pub fn create_tenant(&self, tenant: &Tenant) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tenants (id, name, slug, active, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    tenant.id.to_string(),
                    tenant.name,
                    tenant.slug,
                    tenant.active,
                    tenant.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_tenant(&self, id: Uuid) -> Result<Option<Tenant>> {
        let row = self.with_conn(|conn| {
            let row = conn
                .prepare("SELECT id, name, slug, active, created_at FROM tenants WHERE id = ?1")?
                .query_row([id.to_string()], |row| {
                    Ok(TenantRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        slug: row.get(2)?,
                        active: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })
                .optional()?;
            Ok(row)
        })?;

        row.map(tenant_from_row).transpose()
    }

    // -- Tenant config --

    /// The admin layer's write path at its interface boundary; also used to
    /// seed tests.
    pub fn upsert_tenant_config(&self, config: &TenantConfig) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO tenant_configs
                    (tenant_id, api_id, api_hash, phone_number, session_path,
                     targets, keywords, links, lookback)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    config.tenant_id.to_string(),
                    config.api_id,
                    config.api_hash,
                    config.phone_number,
                    config.session_path,
                    serde_json::to_string(&config.targets)?,
                    serde_json::to_string(&config.keywords)?,
                    serde_json::to_string(&config.links)?,
                    config.lookback.as_str(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_tenant_config(&self, tenant_id: Uuid) -> Result<Option<TenantConfig>> {
        let row = self.with_conn(|conn| {
            let row = conn
                .prepare(
                    "SELECT tenant_id, api_id, api_hash, phone_number, session_path,
                            targets, keywords, links, lookback
                     FROM tenant_configs WHERE tenant_id = ?1",
                )?
                .query_row([tenant_id.to_string()], |row| {
                    Ok(TenantConfigRow {
                        tenant_id: row.get(0)?,
                        api_id: row.get(1)?,
                        api_hash: row.get(2)?,
                        phone_number: row.get(3)?,
                        session_path: row.get(4)?,
                        targets: row.get(5)?,
                        keywords: row.get(6)?,
                        links: row.get(7)?,
                        lookback: row.get(8)?,
                    })
                })
                .optional()?;
            Ok(row)
        })?;

        row.map(config_from_row).transpose()
    }

    // -- Matches + daily rollup --

    /// Persist one match and fold it into its day's rollup as a single
    /// transaction: if the rollup upsert fails, the match row rolls back
    /// with it.
    pub fn record_match(&self, record: &MatchRecord) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO matches
                    (tenant_id, group_id, group_name, message_id, sender_id, timestamp,
                     message_text, found_keywords, found_links, permalink,
                     views, forwards, reactions, reactions_detail, replies)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                rusqlite::params![
                    record.tenant_id.to_string(),
                    record.group_id,
                    record.group_name,
                    record.message_id,
                    record.sender_id,
                    record.timestamp.to_rfc3339(),
                    record.text,
                    serde_json::to_string(&record.found_keywords)?,
                    serde_json::to_string(&record.found_links)?,
                    record.permalink,
                    record.stats.views,
                    record.stats.forwards,
                    record.stats.reactions_total,
                    serde_json::to_string(&record.stats.reactions_detail)?,
                    record.stats.replies,
                ],
            )?;

            upsert_daily_stat(&tx, record)?;

            tx.commit()?;
            Ok(())
        })
    }

    /// Matches for the reporting layer, newest first, with an optional
    /// calendar-date range on the message timestamp.
    pub fn matches_for_tenant(
        &self,
        tenant_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<MatchRecord>> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT tenant_id, group_id, group_name, message_id, sender_id, timestamp,
                        message_text, found_keywords, found_links, permalink,
                        views, forwards, reactions, reactions_detail, replies
                 FROM matches
                 WHERE tenant_id = ?1
                   AND (?2 IS NULL OR timestamp >= ?2)
                   AND (?3 IS NULL OR timestamp <= ?3)
                 ORDER BY timestamp DESC",
            )?;

            let rows = stmt
                .query_map(
                    rusqlite::params![
                        tenant_id.to_string(),
                        from.map(day_lower_bound),
                        to.map(day_upper_bound),
                    ],
                    |row| {
                        Ok(MatchRow {
                            tenant_id: row.get(0)?,
                            group_id: row.get(1)?,
                            group_name: row.get(2)?,
                            message_id: row.get(3)?,
                            sender_id: row.get(4)?,
                            timestamp: row.get(5)?,
                            message_text: row.get(6)?,
                            found_keywords: row.get(7)?,
                            found_links: row.get(8)?,
                            permalink: row.get(9)?,
                            views: row.get(10)?,
                            forwards: row.get(11)?,
                            reactions: row.get(12)?,
                            reactions_detail: row.get(13)?,
                            replies: row.get(14)?,
                        })
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(match_from_row).collect()
    }

    pub fn daily_stats_for_tenant(
        &self,
        tenant_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyStatistic>> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT tenant_id, date, total_matches, total_views, total_forwards,
                        total_reactions, keyword_stats, link_stats, created_at, updated_at
                 FROM daily_stats
                 WHERE tenant_id = ?1
                   AND (?2 IS NULL OR date >= ?2)
                   AND (?3 IS NULL OR date <= ?3)
                 ORDER BY date",
            )?;

            let rows = stmt
                .query_map(
                    rusqlite::params![
                        tenant_id.to_string(),
                        from.map(|d| d.format("%Y-%m-%d").to_string()),
                        to.map(|d| d.format("%Y-%m-%d").to_string()),
                    ],
                    |row| {
                        Ok(DailyStatRow {
                            tenant_id: row.get(0)?,
                            date: row.get(1)?,
                            total_matches: row.get(2)?,
                            total_views: row.get(3)?,
                            total_forwards: row.get(4)?,
                            total_reactions: row.get(5)?,
                            keyword_stats: row.get(6)?,
                            link_stats: row.get(7)?,
                            created_at: row.get(8)?,
                            updated_at: row.get(9)?,
                        })
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(daily_from_row).collect()
    }
}

/// Read-modify-write on the `(tenant, date)` rollup, inside the caller's
/// transaction. Serialization across writers comes from the single-writer
/// connection; keys are tenant-scoped so sessions never contend on one row.
fn upsert_daily_stat(conn: &Connection, record: &MatchRecord) -> Result<()> {
    let delta = DailyDelta::from_match(record);
    let now = Utc::now();
    let date_str = delta.date.format("%Y-%m-%d").to_string();

    let existing = conn
        .prepare(
            "SELECT tenant_id, date, total_matches, total_views, total_forwards,
                    total_reactions, keyword_stats, link_stats, created_at, updated_at
             FROM daily_stats WHERE tenant_id = ?1 AND date = ?2",
        )?
        .query_row(
            rusqlite::params![record.tenant_id.to_string(), date_str],
            |row| {
                Ok(DailyStatRow {
                    tenant_id: row.get(0)?,
                    date: row.get(1)?,
                    total_matches: row.get(2)?,
                    total_views: row.get(3)?,
                    total_forwards: row.get(4)?,
                    total_reactions: row.get(5)?,
                    keyword_stats: row.get(6)?,
                    link_stats: row.get(7)?,
                    created_at: row.get(8)?,
                    updated_at: row.get(9)?,
                })
            },
        )
        .optional()?;

    let (stat, created_at) = match existing {
        Some(row) => {
            let created_at = row.created_at.clone();
            let mut stat = daily_from_row(row)?;
            aggregate::apply(&mut stat, &delta, now);
            (stat, created_at)
        }
        None => (aggregate::seed(&delta, now), now.to_rfc3339()),
    };

    conn.execute(
        "INSERT OR REPLACE INTO daily_stats
            (tenant_id, date, total_matches, total_views, total_forwards,
             total_reactions, keyword_stats, link_stats, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            stat.tenant_id.to_string(),
            date_str,
            stat.total_matches,
            stat.total_views,
            stat.total_forwards,
            stat.total_reactions,
            serde_json::to_string(&stat.keyword_stats)?,
            serde_json::to_string(&stat.link_stats)?,
            created_at,
            stat.updated_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

// -- Row conversions --

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("bad timestamp in db: {s}"))?
        .with_timezone(&Utc))
}

fn day_lower_bound(d: NaiveDate) -> String {
    format!("{}T00:00:00+00:00", d.format("%Y-%m-%d"))
}

fn day_upper_bound(d: NaiveDate) -> String {
    format!("{}T23:59:59.999999999+00:00", d.format("%Y-%m-%d"))
}

fn tenant_from_row(row: TenantRow) -> Result<Tenant> {
    Ok(Tenant {
        id: row.id.parse().context("bad tenant id in db")?,
        name: row.name,
        slug: row.slug,
        active: row.active,
        created_at: parse_ts(&row.created_at)?,
    })
}

fn config_from_row(row: TenantConfigRow) -> Result<TenantConfig> {
    Ok(TenantConfig {
        tenant_id: row.tenant_id.parse().context("bad tenant id in db")?,
        api_id: row.api_id,
        api_hash: row.api_hash,
        phone_number: row.phone_number,
        session_path: row.session_path,
        targets: serde_json::from_str(&row.targets).context("bad targets JSON")?,
        keywords: serde_json::from_str(&row.keywords).context("bad keywords JSON")?,
        links: serde_json::from_str(&row.links).context("bad links JSON")?,
        lookback: Lookback::parse(&row.lookback),
    })
}

fn match_from_row(row: MatchRow) -> Result<MatchRecord> {
    Ok(MatchRecord {
        tenant_id: row.tenant_id.parse().context("bad tenant id in db")?,
        group_id: row.group_id,
        group_name: row.group_name,
        message_id: row.message_id,
        sender_id: row.sender_id,
        timestamp: parse_ts(&row.timestamp)?,
        text: row.message_text,
        found_keywords: serde_json::from_str(&row.found_keywords).context("bad keywords JSON")?,
        found_links: serde_json::from_str(&row.found_links).context("bad links JSON")?,
        permalink: row.permalink,
        stats: lookout_types::MessageStats {
            views: row.views,
            forwards: row.forwards,
            replies: row.replies,
            reactions_total: row.reactions,
            reactions_detail: serde_json::from_str(&row.reactions_detail)
                .context("bad reactions JSON")?,
        },
    })
}

fn daily_from_row(row: DailyStatRow) -> Result<DailyStatistic> {
    Ok(DailyStatistic {
        tenant_id: row.tenant_id.parse().context("bad tenant id in db")?,
        date: NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").context("bad date in db")?,
        total_matches: row.total_matches,
        total_views: row.total_views,
        total_forwards: row.total_forwards,
        total_reactions: row.total_reactions,
        keyword_stats: serde_json::from_str(&row.keyword_stats).context("bad keyword stats JSON")?,
        link_stats: serde_json::from_str(&row.link_stats).context("bad link stats JSON")?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}
