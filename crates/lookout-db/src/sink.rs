use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use lookout_engine::{MatchSink, ScanError};
use lookout_types::MatchRecord;

use crate::Database;

/// The production match sink: one transaction per match covering the match
/// row and its daily rollup. Blocking rusqlite work runs off the async
/// runtime.
#[derive(Clone)]
pub struct SqliteMatchSink {
    db: Arc<Database>,
}

impl SqliteMatchSink {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MatchSink for SqliteMatchSink {
    async fn record(&self, record: &MatchRecord) -> Result<(), ScanError> {
        let db = self.db.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || db.record_match(&record))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ScanError::Persist(anyhow::anyhow!("persist task failed: {e}"))
            })?
            .map_err(ScanError::Persist)
    }
}
