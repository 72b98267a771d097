//! Scripted fakes for the engine's two seams. Used by unit tests here and by
//! the integration tests in lookout-db; nothing in production paths touches
//! this module.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use lookout_types::{MatchRecord, Message, RawStats};

use crate::error::ScanError;
use crate::traits::{GroupClient, GroupInfo, MatchSink};

/// In-memory platform client serving pre-scripted group histories.
#[derive(Default)]
pub struct FakeGroupClient {
    groups: HashMap<i64, (String, Vec<Message>)>,
    failing: Vec<i64>,
    unauthorized: bool,
    fetch_calls: AtomicUsize,
}

impl FakeGroupClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a group's history. Messages are served newest-first regardless
    /// of the order given here.
    pub fn with_group(mut self, id: i64, name: &str, mut messages: Vec<Message>) -> Self {
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.groups.insert(id, (name.to_string(), messages));
        self
    }

    /// Script a group whose history fetch always fails.
    pub fn with_failing_group(mut self, id: i64) -> Self {
        self.failing.push(id);
        self
    }

    /// Simulate a dead session: connect succeeds, authorization fails.
    pub fn unauthorized(mut self) -> Self {
        self.unauthorized = true;
        self
    }

    /// Number of history pages requested so far, across all groups.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GroupClient for FakeGroupClient {
    async fn connect(&self) -> Result<(), ScanError> {
        Ok(())
    }

    async fn is_authorized(&self) -> Result<bool, ScanError> {
        Ok(!self.unauthorized)
    }

    async fn list_groups(&self) -> Result<Vec<GroupInfo>, ScanError> {
        Ok(self
            .groups
            .iter()
            .map(|(&id, (name, _))| GroupInfo { id, name: name.clone() })
            .collect())
    }

    async fn group_name(&self, group_id: i64) -> Option<String> {
        self.groups.get(&group_id).map(|(name, _)| name.clone())
    }

    async fn fetch_history(
        &self,
        group_id: i64,
        _anchor_end: DateTime<Utc>,
        offset_id: i64,
        limit: usize,
    ) -> Result<Vec<Message>, ScanError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&group_id) {
            return Err(ScanError::Fetch {
                group_id,
                source: anyhow::anyhow!("scripted fetch failure"),
            });
        }

        let Some((_, messages)) = self.groups.get(&group_id) else {
            return Ok(vec![]);
        };

        // Continuation is positional: serve everything after the message
        // carrying offset_id. The anchor is deliberately not used to filter,
        // so scanner tests can exercise the skip-above-end branch.
        let start = match offset_id {
            0 => 0,
            id => match messages.iter().position(|m| m.id == id) {
                Some(pos) => pos + 1,
                None => return Ok(vec![]),
            },
        };

        Ok(messages.iter().skip(start).take(limit).cloned().collect())
    }

    async fn disconnect(&self) {}
}

/// Collects records in memory; optionally fails every insert.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<MatchRecord>>,
    fail: bool,
}

impl MemorySink {
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn records(&self) -> Vec<MatchRecord> {
        self.records.lock().expect("sink lock").clone()
    }
}

#[async_trait]
impl MatchSink for MemorySink {
    async fn record(&self, record: &MatchRecord) -> Result<(), ScanError> {
        if self.fail {
            return Err(ScanError::Persist(anyhow::anyhow!("scripted persist failure")));
        }
        self.records.lock().expect("sink lock").push(record.clone());
        Ok(())
    }
}

/// A plain text message with no entities and no engagement counters.
pub fn message_at(id: i64, timestamp: DateTime<Utc>, text: &str) -> Message {
    Message {
        id,
        group_id: 0,
        sender_id: Some(1000 + id),
        timestamp,
        text: Some(text.to_string()),
        caption: None,
        entities: vec![],
        stats: RawStats::default(),
    }
}
