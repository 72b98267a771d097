//! Supervises scan sessions: one tokio task per tenant, pull-based status and
//! a bounded log ring instead of shared mutable globals. Sessions of
//! different tenants are isolated; one tenant never has two sessions at once.

pub mod log_ring;

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use lookout_engine::{
    GroupClient, MatchSink, Reporter, ScanError, ScanProgress, TenantScanSession,
};
use lookout_types::{ScanPhase, ScanStatus, Tenant, TenantConfig};

use crate::log_ring::LogRing;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("a scan is already running for tenant {0}")]
    AlreadyRunning(Uuid),

    #[error("no scan session known for tenant {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Session(#[from] ScanError),
}

/// Lifecycle state shared between the session task and status readers.
struct PhaseInfo {
    phase: ScanPhase,
    finished_at: Option<DateTime<Utc>>,
}

struct TenantHandle {
    progress: ScanProgress,
    started_at: DateTime<Utc>,
    phase: Arc<StdMutex<PhaseInfo>>,
    logs: Arc<StdMutex<LogRing>>,
    task: Mutex<Option<JoinHandle<()>>>,
    finished: Arc<StdMutex<bool>>,
}

#[derive(Clone, Default)]
pub struct ScanSupervisor {
    inner: Arc<RwLock<HashMap<Uuid, TenantHandle>>>,
}

impl ScanSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a scan session for one tenant. Fails when a session for the
    /// same tenant is still running; a finished handle is replaced.
    pub async fn start(
        &self,
        tenant: Tenant,
        config: TenantConfig,
        client: Arc<dyn GroupClient>,
        sink: Arc<dyn MatchSink>,
    ) -> Result<(), SupervisorError> {
        let tenant_id = tenant.id;
        let mut tenants = self.inner.write().await;

        if let Some(existing) = tenants.get(&tenant_id) {
            if !*existing.finished.lock().expect("finished lock") {
                return Err(SupervisorError::AlreadyRunning(tenant_id));
            }
        }

        let (line_tx, mut line_rx) = mpsc::unbounded_channel();
        let reporter = Reporter::with_lines(line_tx);
        let progress = reporter.progress.clone();

        // Credential validation happens here, before anything is registered.
        let session = TenantScanSession::new(tenant, config, client, sink)?.with_reporter(reporter);

        let phase = Arc::new(StdMutex::new(PhaseInfo {
            phase: ScanPhase::Connecting,
            finished_at: None,
        }));
        let logs = Arc::new(StdMutex::new(LogRing::new()));
        let finished = Arc::new(StdMutex::new(false));

        // Drain progress lines into the ring; ends when the session's
        // reporter is dropped. The first line means the connect succeeded.
        let drain_phase = phase.clone();
        let drain_logs = logs.clone();
        tokio::spawn(async move {
            while let Some(line) = line_rx.recv().await {
                {
                    let mut info = drain_phase.lock().expect("phase lock");
                    if info.phase == ScanPhase::Connecting {
                        info.phase = ScanPhase::Scanning;
                    }
                }
                drain_logs.lock().expect("log lock").push(line);
            }
        });

        let task_phase = phase.clone();
        let task_finished = finished.clone();
        let task = tokio::spawn(async move {
            let result = session.run().await;
            let mut info = task_phase.lock().expect("phase lock");
            info.finished_at = Some(Utc::now());
            match result {
                Ok(summary) => {
                    info.phase = ScanPhase::Finished;
                    info!(
                        %tenant_id,
                        matches = summary.matches_found,
                        "scan session finished"
                    );
                }
                Err(err) => {
                    info.phase = ScanPhase::Failed;
                    error!(%tenant_id, "scan session failed: {err}");
                }
            }
            drop(info);
            *task_finished.lock().expect("finished lock") = true;
        });

        tenants.insert(
            tenant_id,
            TenantHandle {
                progress,
                started_at: Utc::now(),
                phase,
                logs,
                task: Mutex::new(Some(task)),
                finished,
            },
        );

        Ok(())
    }

    /// Pull a status snapshot. `None` means the tenant never had a session.
    pub async fn status(&self, tenant_id: Uuid) -> Option<ScanStatus> {
        let tenants = self.inner.read().await;
        let handle = tenants.get(&tenant_id)?;
        let info = handle.phase.lock().expect("phase lock");
        Some(ScanStatus {
            running: !*handle.finished.lock().expect("finished lock"),
            phase: info.phase,
            started_at: handle.started_at,
            finished_at: info.finished_at,
            messages_scanned: handle.progress.messages_scanned(),
            matches_found: handle.progress.matches_found(),
        })
    }

    /// The most recent `limit` progress lines for a tenant, oldest first.
    pub async fn logs(&self, tenant_id: Uuid, limit: usize) -> Option<Vec<String>> {
        let tenants = self.inner.read().await;
        let handle = tenants.get(&tenant_id)?;
        Some(handle.logs.lock().expect("log lock").tail(limit))
    }

    /// Hard-stop a running session. No checkpoint exists: a later run starts
    /// the whole resolved window over.
    pub async fn stop(&self, tenant_id: Uuid) -> Result<(), SupervisorError> {
        let tenants = self.inner.read().await;
        let handle = tenants
            .get(&tenant_id)
            .ok_or(SupervisorError::NotFound(tenant_id))?;

        if let Some(task) = handle.task.lock().await.as_ref() {
            task.abort();
        }
        let mut info = handle.phase.lock().expect("phase lock");
        if info.finished_at.is_none() {
            info.phase = ScanPhase::Failed;
            info.finished_at = Some(Utc::now());
        }
        *handle.finished.lock().expect("finished lock") = true;
        Ok(())
    }

    /// Wait for a tenant's session task to end. Used by the binary and by
    /// tests; status consumers poll instead.
    pub async fn join(&self, tenant_id: Uuid) -> Result<(), SupervisorError> {
        let task = {
            let tenants = self.inner.read().await;
            let handle = tenants
                .get(&tenant_id)
                .ok_or(SupervisorError::NotFound(tenant_id))?;
            handle.task.lock().await.take()
        };
        if let Some(task) = task {
            // A panicking or aborted session still counts as joined.
            let _ = task.await;
        }
        Ok(())
    }
}
