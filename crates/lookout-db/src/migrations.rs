use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tenants (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            slug        TEXT NOT NULL UNIQUE,
            active      INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS tenant_configs (
            tenant_id       TEXT PRIMARY KEY REFERENCES tenants(id),
            api_id          TEXT,
            api_hash        TEXT,
            phone_number    TEXT,
            session_path    TEXT,
            targets         TEXT NOT NULL DEFAULT '[]',
            keywords        TEXT NOT NULL DEFAULT '[]',
            links           TEXT NOT NULL DEFAULT '[]',
            lookback        TEXT NOT NULL DEFAULT '7days'
        );

        CREATE TABLE IF NOT EXISTS matches (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id       TEXT NOT NULL REFERENCES tenants(id),
            group_id        INTEGER NOT NULL,
            group_name      TEXT NOT NULL,
            message_id      INTEGER NOT NULL,
            sender_id       INTEGER,
            timestamp       TEXT NOT NULL,
            message_text    TEXT NOT NULL,
            found_keywords  TEXT NOT NULL DEFAULT '[]',
            found_links     TEXT NOT NULL DEFAULT '[]',
            permalink       TEXT NOT NULL,
            views           INTEGER NOT NULL DEFAULT 0,
            forwards        INTEGER NOT NULL DEFAULT 0,
            reactions       INTEGER NOT NULL DEFAULT 0,
            reactions_detail TEXT NOT NULL DEFAULT '{}',
            replies         INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_matches_tenant_time
            ON matches(tenant_id, timestamp);

        -- Scoped but not unique: repeated scans of the same window are
        -- allowed to produce repeated rows.
        CREATE INDEX IF NOT EXISTS idx_matches_message
            ON matches(tenant_id, group_id, message_id);

        CREATE TABLE IF NOT EXISTS daily_stats (
            tenant_id       TEXT NOT NULL REFERENCES tenants(id),
            date            TEXT NOT NULL,
            total_matches   INTEGER NOT NULL DEFAULT 0,
            total_views     INTEGER NOT NULL DEFAULT 0,
            total_forwards  INTEGER NOT NULL DEFAULT 0,
            total_reactions INTEGER NOT NULL DEFAULT 0,
            keyword_stats   TEXT NOT NULL DEFAULT '{}',
            link_stats      TEXT NOT NULL DEFAULT '{}',
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (tenant_id, date)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
