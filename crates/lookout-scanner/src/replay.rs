//! Replay connector: serves group histories captured to a JSON file through
//! the `GroupClient` seam. Used for offline runs and operator dry-runs; the
//! live platform connector is a separate deployable.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use lookout_engine::{GroupClient, GroupInfo, ScanError};
use lookout_types::Message;

#[derive(Deserialize)]
struct ReplayFile {
    groups: Vec<ReplayGroup>,
}

#[derive(Deserialize)]
struct ReplayGroup {
    id: i64,
    name: String,
    #[serde(default)]
    messages: Vec<Message>,
}

pub struct ReplayClient {
    groups: HashMap<i64, (String, Vec<Message>)>,
}

impl ReplayClient {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading replay file {}", path.display()))?;
        let file: ReplayFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing replay file {}", path.display()))?;

        let mut groups = HashMap::new();
        for group in file.groups {
            let mut messages = group.messages;
            messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            groups.insert(group.id, (group.name, messages));
        }
        Ok(Self { groups })
    }
}

#[async_trait]
impl GroupClient for ReplayClient {
    async fn connect(&self) -> Result<(), ScanError> {
        Ok(())
    }

    async fn is_authorized(&self) -> Result<bool, ScanError> {
        Ok(true)
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
        let Some((_, messages)) = self.groups.get(&group_id) else {
            return Err(ScanError::Fetch {
                group_id,
                source: anyhow::anyhow!("group not present in replay file"),
            });
        };

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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replay_file_roundtrip() {
        let json = r#"{
            "groups": [{
                "id": -100555,
                "name": "captured",
                "messages": [
                    {"id": 1, "group_id": -100555, "sender_id": 9,
                     "timestamp": "2024-03-10T10:00:00Z", "text": "older"},
                    {"id": 2, "group_id": -100555, "sender_id": 9,
                     "timestamp": "2024-03-10T11:00:00Z", "text": "newer"}
                ]
            }]
        }"#;
        let path = std::env::temp_dir().join(format!("lookout-replay-{}.json", std::process::id()));
        std::fs::write(&path, json).unwrap();

        let client = ReplayClient::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(client.group_name(-100555).await.as_deref(), Some("captured"));

        let page = client
            .fetch_history(-100555, Utc::now(), 0, 100)
            .await
            .unwrap();
        // Newest first regardless of file order.
        assert_eq!(page.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2, 1]);
    }
}
