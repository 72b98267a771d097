use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message as handed to us by the external platform client. Read-only input
/// to the scan engine; never persisted in this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub group_id: i64,
    pub sender_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    /// Body text. Absent for bare media messages.
    pub text: Option<String>,
    /// Media caption, used as the text fallback when `text` is absent.
    pub caption: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
    #[serde(default)]
    pub stats: RawStats,
}

impl Message {
    /// Text the match engine sees: body, else caption, else empty. Some
    /// connectors report bare media as an empty string rather than absent,
    /// so an empty body also falls through to the caption.
    pub fn effective_text(&self) -> &str {
        match self.text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => self.caption.as_deref().unwrap_or(""),
        }
    }
}

/// Typed spans the platform annotates onto message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageEntity {
    Url { offset: usize, length: usize },
    Mention { offset: usize, length: usize },
}

/// Engagement counters as reported by the platform. Any of these can be
/// missing depending on the message/chat type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStats {
    pub views: Option<u32>,
    pub forwards: Option<u32>,
    pub replies: Option<u32>,
    /// Per-emoji reaction buckets, verbatim from the platform.
    #[serde(default)]
    pub reactions: Vec<(String, u32)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn media_message(text: Option<&str>, caption: Option<&str>) -> Message {
        Message {
            id: 1,
            group_id: -1001,
            sender_id: None,
            timestamp: Utc::now(),
            text: text.map(str::to_string),
            caption: caption.map(str::to_string),
            entities: vec![],
            stats: RawStats::default(),
        }
    }

    #[test]
    fn test_effective_text_prefers_body() {
        let msg = media_message(Some("body"), Some("caption"));
        assert_eq!(msg.effective_text(), "body");
    }

    #[test]
    fn test_effective_text_falls_back_to_caption() {
        let msg = media_message(None, Some("big giveaway today"));
        assert_eq!(msg.effective_text(), "big giveaway today");
    }

    #[test]
    fn test_empty_body_falls_back_to_caption() {
        let msg = media_message(Some(""), Some("caption only"));
        assert_eq!(msg.effective_text(), "caption only");
    }

    #[test]
    fn test_bare_media_has_empty_text() {
        assert_eq!(media_message(None, None).effective_text(), "");
        assert_eq!(media_message(Some(""), None).effective_text(), "");
    }
}
