mod replay;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::info;
use uuid::Uuid;

use lookout_db::{Database, SqliteMatchSink};
use lookout_engine::{GroupClient, TenantScanSession};

use crate::replay::ReplayClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lookout=info".into()),
        )
        .init();

    // The unit of work is one tenant, given as the single argument.
    let tenant_arg = std::env::args()
        .nth(1)
        .context("usage: lookout <tenant-id>")?;
    let tenant_id: Uuid = tenant_arg
        .parse()
        .with_context(|| format!("not a tenant id: {tenant_arg}"))?;

    let db_path = std::env::var("LOOKOUT_DB_PATH").unwrap_or_else(|_| "lookout.db".into());
    let db = Arc::new(Database::open(&PathBuf::from(&db_path))?);

    let tenant = db
        .get_tenant(tenant_id)?
        .with_context(|| format!("unknown tenant {tenant_id}"))?;
    let config = db
        .get_tenant_config(tenant_id)?
        .ok_or(lookout_engine::ScanError::ConfigMissing(tenant_id))?;

    let client = build_client()?;
    let sink = Arc::new(SqliteMatchSink::new(db));

    info!("starting scan for tenant {} ({})", tenant.slug, tenant_id);
    let session = TenantScanSession::new(tenant, config, client, sink)?;
    let summary = session.run().await?;

    info!(
        "done: {} targets scanned, {} skipped, {} failed, {} matches",
        summary.targets_scanned, summary.targets_skipped, summary.targets_failed,
        summary.matches_found,
    );
    Ok(())
}

/// The live platform connector ships separately; this binary only knows the
/// replay source.
fn build_client() -> anyhow::Result<Arc<dyn GroupClient>> {
    match std::env::var("LOOKOUT_REPLAY_PATH") {
        Ok(path) => Ok(Arc::new(ReplayClient::from_file(&PathBuf::from(path))?)),
        Err(_) => bail!(
            "no platform connector configured; set LOOKOUT_REPLAY_PATH to a captured history file"
        ),
    }
}
