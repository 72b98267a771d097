//! Seams to the two external collaborators: the messaging platform and the
//! match store. Implemented by the real connector / lookout-db in production
//! and by scripted fakes in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use lookout_types::{MatchRecord, Message};

use crate::error::ScanError;

/// A group the connected account can see.
#[derive(Debug, Clone)]
pub struct GroupInfo {
    pub id: i64,
    pub name: String,
}

/// Connection to the external messaging platform for one tenant's account.
///
/// `fetch_history` must return messages in reverse-chronological order
/// anchored at `anchor_end`; the scanner's stop/skip policy tolerates the
/// occasional out-of-window message but relies on the overall newest-to-oldest
/// direction to know when to stop.
#[async_trait]
pub trait GroupClient: Send + Sync {
    async fn connect(&self) -> Result<(), ScanError>;

    async fn is_authorized(&self) -> Result<bool, ScanError>;

    async fn list_groups(&self) -> Result<Vec<GroupInfo>, ScanError>;

    /// Display name for a group, if resolvable. Callers fall back to the
    /// bare id when this returns `None`.
    async fn group_name(&self, group_id: i64) -> Option<String>;

    /// One page of history for `group_id`, newest first, starting at
    /// `anchor_end` and continuing below message id `offset_id`
    /// (`offset_id == 0` means start at the anchor). A page shorter than
    /// `limit` means the history is exhausted.
    async fn fetch_history(
        &self,
        group_id: i64,
        anchor_end: DateTime<Utc>,
        offset_id: i64,
        limit: usize,
    ) -> Result<Vec<Message>, ScanError>;

    async fn disconnect(&self);
}

/// Where matched messages go. The production implementation persists the
/// match row and its daily-aggregate upsert as one transaction.
#[async_trait]
pub trait MatchSink: Send + Sync {
    async fn record(&self, record: &MatchRecord) -> Result<(), ScanError>;
}
