//! Externally observable scan progress: lock-free counters plus free-text
//! log lines pushed to whoever supervises the session.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::info;

/// Shared counters a supervisor can read while the traversal runs. Cloning
/// shares the underlying atomics.
#[derive(Debug, Clone, Default)]
pub struct ScanProgress {
    messages_scanned: Arc<AtomicU64>,
    matches_found: Arc<AtomicU64>,
}

impl ScanProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_scanned(&self) -> u64 {
        self.messages_scanned.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn match_found(&self) {
        self.matches_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn messages_scanned(&self) -> u64 {
        self.messages_scanned.load(Ordering::Relaxed)
    }

    pub fn matches_found(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }
}

/// Progress reporting handle handed to a session: counters plus an optional
/// line channel. Lines always also go to tracing, so a session run directly
/// from the binary is observable without a supervisor.
#[derive(Clone)]
pub struct Reporter {
    pub progress: ScanProgress,
    line_tx: Option<mpsc::UnboundedSender<String>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            progress: ScanProgress::new(),
            line_tx: None,
        }
    }

    pub fn with_lines(line_tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            progress: ScanProgress::new(),
            line_tx: Some(line_tx),
        }
    }

    pub fn line(&self, line: String) {
        info!("{}", line);
        if let Some(tx) = &self.line_tx {
            // Receiver gone means the supervisor stopped caring; the scan
            // itself must not fail over that.
            let _ = tx.send(line);
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}
