//! One tenant's scan pass: owns the platform connection lifecycle and walks
//! the configured targets strictly in order, one at a time.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use lookout_types::{Tenant, TenantConfig};

use crate::error::{ErrorPolicy, ScanError};
use crate::history::HistoryScanner;
use crate::progress::Reporter;
use crate::traits::{GroupClient, MatchSink};
use crate::window::{WindowOutcome, resolve_window};

/// Totals for one completed scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub targets_scanned: usize,
    pub targets_skipped: usize,
    pub targets_failed: usize,
    pub messages_scanned: u64,
    pub matches_found: u64,
}

pub struct TenantScanSession {
    tenant: Tenant,
    config: TenantConfig,
    client: Arc<dyn GroupClient>,
    sink: Arc<dyn MatchSink>,
    reporter: Reporter,
}

impl std::fmt::Debug for TenantScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantScanSession")
            .field("tenant", &self.tenant)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TenantScanSession {
    /// Credentials are validated here, before any connection attempt: a
    /// tenant without API credentials never reaches the platform.
    pub fn new(
        tenant: Tenant,
        config: TenantConfig,
        client: Arc<dyn GroupClient>,
        sink: Arc<dyn MatchSink>,
    ) -> Result<Self, ScanError> {
        if config.api_id.is_none() || config.api_hash.is_none() {
            return Err(ScanError::MissingCredentials);
        }
        Ok(Self {
            tenant,
            config,
            client,
            sink,
            reporter: Reporter::new(),
        })
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run the whole pass to completion. Fatal errors (dead session) abort
    /// before any target is scanned; a per-target failure abandons only that
    /// target. There is no retry and no checkpoint — a rerun covers the full
    /// window again.
    pub async fn run(&self) -> Result<ScanSummary, ScanError> {
        self.client.connect().await?;
        if !self.client.is_authorized().await? {
            self.client.disconnect().await;
            return Err(ScanError::SessionInvalid);
        }
        self.reporter
            .line(format!("connected for tenant {}", self.tenant.slug));

        let groups = self.client.list_groups().await?;
        self.reporter
            .line(format!("{} groups visible to this account", groups.len()));

        let keywords = self.config.normalized_keywords();
        let links = self.config.normalized_links();
        if keywords.is_empty() && links.is_empty() {
            self.reporter
                .line("no keywords or links configured; nothing can match".to_string());
        }

        let scanner = HistoryScanner {
            client: self.client.as_ref(),
            sink: self.sink.as_ref(),
            reporter: &self.reporter,
            tenant_id: self.tenant.id,
            keywords: &keywords,
            links: &links,
        };

        let mut summary = ScanSummary::default();

        for target in &self.config.targets {
            let group_id = target.group_id();
            match resolve_window(target, self.config.lookback, Utc::now()) {
                WindowOutcome::Future => {
                    self.reporter.line(format!(
                        "group {}: start date is in the future, skipping",
                        group_id
                    ));
                    summary.targets_skipped += 1;
                }
                WindowOutcome::Window(window) => match scanner.scan_target(group_id, window).await {
                    Ok(outcome) => {
                        summary.targets_scanned += 1;
                        summary.messages_scanned += outcome.messages_scanned;
                        summary.matches_found += outcome.matches_found;
                    }
                    Err(err) => match err.policy() {
                        ErrorPolicy::AbortTenant => {
                            self.client.disconnect().await;
                            return Err(err);
                        }
                        ErrorPolicy::AbortTarget | ErrorPolicy::SkipMessage => {
                            warn!(group_id, "target abandoned: {err}");
                            self.reporter
                                .line(format!("group {}: abandoned after error: {}", group_id, err));
                            summary.targets_failed += 1;
                        }
                    },
                },
            }
        }

        self.client.disconnect().await;
        self.reporter.line(format!(
            "scan complete: {} targets, {} messages, {} matches",
            summary.targets_scanned, summary.messages_scanned, summary.matches_found,
        ));

        Ok(summary)
    }
}
