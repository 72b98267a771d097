//! Walks one group's message history newest-to-oldest inside a resolved
//! window, applying the stop/skip policy and feeding matches to the sink.

use tracing::warn;
use uuid::Uuid;

use lookout_types::{MatchRecord, Message};

use crate::error::{ErrorPolicy, ScanError};
use crate::matcher;
use crate::progress::Reporter;
use crate::stats;
use crate::traits::{GroupClient, MatchSink};
use crate::window::ResolvedWindow;

/// Page size for history fetches.
const FETCH_PAGE: usize = 100;

/// Progress line cadence, in evaluated messages.
const PROGRESS_EVERY: u64 = 50;

/// Counters for one finished target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetOutcome {
    pub messages_scanned: u64,
    pub matches_found: u64,
}

pub struct HistoryScanner<'a> {
    pub client: &'a dyn GroupClient,
    pub sink: &'a dyn MatchSink,
    pub reporter: &'a Reporter,
    pub tenant_id: Uuid,
    pub keywords: &'a [String],
    pub links: &'a [String],
}

impl HistoryScanner<'_> {
    /// Scan one group inside `window`. History arrives newest-first anchored
    /// at `window.end`; a message below `window.start` stops the traversal
    /// (history is effectively monotonic), while a message above `window.end`
    /// is skipped but traversal continues (strict monotonicity is not
    /// guaranteed). A persist failure skips that message only.
    pub async fn scan_target(
        &self,
        group_id: i64,
        window: ResolvedWindow,
    ) -> Result<TargetOutcome, ScanError> {
        let group_name = self
            .client
            .group_name(group_id)
            .await
            .unwrap_or_else(|| group_id.to_string());

        self.reporter.line(format!(
            "scanning {} ({} to {})",
            group_name,
            window.start.format("%Y-%m-%d"),
            window.end.format("%Y-%m-%d"),
        ));

        let mut outcome = TargetOutcome::default();
        let mut offset_id: i64 = 0;

        'pages: loop {
            let page = self
                .client
                .fetch_history(group_id, window.end, offset_id, FETCH_PAGE)
                .await?;
            if page.is_empty() {
                break;
            }
            let exhausted = page.len() < FETCH_PAGE;

            for message in &page {
                if message.timestamp < window.start {
                    break 'pages;
                }
                if message.timestamp > window.end {
                    continue;
                }

                outcome.messages_scanned += 1;
                self.reporter.progress.message_scanned();

                if self.evaluate_message(message, group_id, &group_name).await? {
                    outcome.matches_found += 1;
                    self.reporter.progress.match_found();
                }

                if outcome.messages_scanned % PROGRESS_EVERY == 0 {
                    self.reporter.line(format!(
                        "  {} messages scanned ({} matches)",
                        outcome.messages_scanned, outcome.matches_found,
                    ));
                }
            }

            if exhausted {
                break;
            }
            // Pages are newest-first, so the last id is the continuation point.
            match page.last() {
                Some(last) => offset_id = last.id,
                None => break,
            }
        }

        self.reporter.line(format!(
            "finished {}: {} messages scanned, {} matches",
            group_name, outcome.messages_scanned, outcome.matches_found,
        ));

        Ok(outcome)
    }

    /// Returns true when the message matched and was recorded. A failure
    /// whose policy is skip-message is logged here and swallowed; anything
    /// harsher propagates to the caller.
    async fn evaluate_message(
        &self,
        message: &Message,
        group_id: i64,
        group_name: &str,
    ) -> Result<bool, ScanError> {
        let text = message.effective_text();
        let found = matcher::evaluate(text, &message.entities, self.keywords, self.links);
        if !found.is_match() {
            return Ok(false);
        }

        let record = MatchRecord {
            tenant_id: self.tenant_id,
            group_id,
            group_name: group_name.to_string(),
            message_id: message.id,
            sender_id: message.sender_id,
            timestamp: message.timestamp,
            text: text.to_string(),
            found_keywords: found.keywords,
            found_links: found.links,
            permalink: permalink(group_id, message.id),
            stats: stats::extract(&message.stats),
        };

        match self.sink.record(&record).await {
            Ok(()) => Ok(true),
            Err(err) if err.policy() == ErrorPolicy::SkipMessage => {
                warn!(
                    message_id = message.id,
                    group_id, "match not recorded: {err}"
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

/// Public deep link to a group message. Supergroup ids carry a `-100` prefix
/// that the link format omits.
pub fn permalink(group_id: i64, message_id: i64) -> String {
    let id = group_id.to_string();
    let bare = id.strip_prefix("-100").unwrap_or(&id);
    format!("https://t.me/c/{}/{}", bare, message_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    use crate::testing::{FakeGroupClient, MemorySink, message_at};
    use crate::window::{WindowOutcome, resolve_window};
    use lookout_types::{Lookback, ScanTarget};

    #[test]
    fn test_permalink_strips_supergroup_prefix() {
        assert_eq!(permalink(-1001234, 7), "https://t.me/c/1234/7");
        assert_eq!(permalink(4321, 7), "https://t.me/c/4321/7");
    }

    #[tokio::test]
    async fn test_stop_and_skip_policy() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        // Newest-first: t5 > t4 > t3 > t2 > t1, window [t2, t4].
        let ts = |n: i64| t0 + Duration::hours(n);
        let messages = vec![
            message_at(5, ts(5), "acme five"),
            message_at(4, ts(4), "acme four"),
            message_at(3, ts(3), "nothing"),
            message_at(2, ts(2), "acme two"),
            message_at(1, ts(1), "acme one"),
        ];
        let client = FakeGroupClient::new().with_group(-100555, "room", messages);
        let sink = MemorySink::default();
        let reporter = Reporter::new();
        let keywords = vec!["acme".to_string()];

        let scanner = HistoryScanner {
            client: &client,
            sink: &sink,
            reporter: &reporter,
            tenant_id: Uuid::nil(),
            keywords: &keywords,
            links: &[],
        };

        let window = ResolvedWindow { start: ts(2), end: ts(4) };
        let outcome = scanner.scan_target(-100555, window).await.unwrap();

        // t5 skipped, t4/t3/t2 evaluated, t1 never reached.
        assert_eq!(outcome.messages_scanned, 3);
        assert_eq!(outcome.matches_found, 2);
        let recorded: Vec<i64> = sink.records().iter().map(|r| r.message_id).collect();
        assert_eq!(recorded, vec![4, 2]);
    }

    #[tokio::test]
    async fn test_match_record_fields() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let client =
            FakeGroupClient::new().with_group(-100777, "deals", vec![message_at(42, ts, "Big Acme drop")]);
        let sink = MemorySink::default();
        let reporter = Reporter::new();
        let keywords = vec!["acme".to_string()];

        let scanner = HistoryScanner {
            client: &client,
            sink: &sink,
            reporter: &reporter,
            tenant_id: Uuid::nil(),
            keywords: &keywords,
            links: &[],
        };

        let target = ScanTarget::Bare { group_id: -100777 };
        let WindowOutcome::Window(window) =
            resolve_window(&target, Lookback::SevenDays, ts + Duration::hours(1))
        else {
            panic!("expected a window");
        };
        scanner.scan_target(-100777, window).await.unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.group_name, "deals");
        assert_eq!(rec.found_keywords, vec!["acme"]);
        assert_eq!(rec.permalink, "https://t.me/c/777/42");
        assert_eq!(rec.timestamp, ts);
    }

    #[tokio::test]
    async fn test_caption_matches_when_body_absent() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut captioned = message_at(2, t0, "");
        captioned.text = None;
        captioned.caption = Some("Huge ACME giveaway".to_string());
        let mut bare_media = message_at(1, t0 - Duration::minutes(5), "");
        bare_media.text = None;

        let client = FakeGroupClient::new().with_group(-100555, "room", vec![captioned, bare_media]);
        let sink = MemorySink::default();
        let reporter = Reporter::new();
        let keywords = vec!["acme".to_string()];

        let scanner = HistoryScanner {
            client: &client,
            sink: &sink,
            reporter: &reporter,
            tenant_id: Uuid::nil(),
            keywords: &keywords,
            links: &[],
        };

        let window = ResolvedWindow { start: t0 - Duration::hours(1), end: t0 };
        let outcome = scanner.scan_target(-100555, window).await.unwrap();

        // The caption stands in for the body; bare media matches nothing.
        assert_eq!(outcome.messages_scanned, 2);
        assert_eq!(outcome.matches_found, 1);
        let records = sink.records();
        assert_eq!(records[0].message_id, 2);
        assert_eq!(records[0].text, "Huge ACME giveaway");
    }

    #[tokio::test]
    async fn test_sink_session_error_aborts_target_scan() {
        struct RevokedSink;

        #[async_trait::async_trait]
        impl crate::traits::MatchSink for RevokedSink {
            async fn record(&self, _record: &MatchRecord) -> Result<(), ScanError> {
                Err(ScanError::SessionInvalid)
            }
        }

        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let client = FakeGroupClient::new().with_group(-100555, "room", vec![message_at(1, t0, "acme")]);
        let sink = RevokedSink;
        let reporter = Reporter::new();
        let keywords = vec!["acme".to_string()];

        let scanner = HistoryScanner {
            client: &client,
            sink: &sink,
            reporter: &reporter,
            tenant_id: Uuid::nil(),
            keywords: &keywords,
            links: &[],
        };

        let window = ResolvedWindow { start: t0 - Duration::hours(1), end: t0 };
        let err = scanner.scan_target(-100555, window).await.unwrap_err();
        assert_eq!(err.policy(), ErrorPolicy::AbortTenant);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_as_abort_target() {
        let client = FakeGroupClient::new().with_failing_group(-100888);
        let sink = MemorySink::default();
        let reporter = Reporter::new();

        let scanner = HistoryScanner {
            client: &client,
            sink: &sink,
            reporter: &reporter,
            tenant_id: Uuid::nil(),
            keywords: &[],
            links: &[],
        };

        let now = Utc::now();
        let window = ResolvedWindow { start: now - Duration::days(1), end: now };
        let err = scanner.scan_target(-100888, window).await.unwrap_err();
        assert_eq!(err.policy(), ErrorPolicy::AbortTarget);
    }
}
