use thiserror::Error;
use uuid::Uuid;

/// Everything that can go wrong during a scan pass, by stage.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("tenant has no API credentials configured")]
    MissingCredentials,

    #[error("platform session is missing or no longer authorized")]
    SessionInvalid,

    #[error("no scan configuration for tenant {0}")]
    ConfigMissing(Uuid),

    #[error("fetching history for group {group_id}: {source}")]
    Fetch {
        group_id: i64,
        #[source]
        source: anyhow::Error,
    },

    #[error("analyzing message {message_id}: {source}")]
    Analyze {
        message_id: i64,
        #[source]
        source: anyhow::Error,
    },

    #[error("persisting match: {0}")]
    Persist(#[source] anyhow::Error),
}

/// What the enclosing loop does when a stage fails. There is no retry
/// anywhere: every failure is either skip-and-continue or abort-and-report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abort before (or instead of) scanning anything further for the tenant.
    AbortTenant,
    /// Abandon the current target, keep already-persisted matches, move on.
    AbortTarget,
    /// Treat the message as non-matching and continue with the next one.
    SkipMessage,
}

impl ScanError {
    pub fn policy(&self) -> ErrorPolicy {
        match self {
            ScanError::MissingCredentials
            | ScanError::SessionInvalid
            | ScanError::ConfigMissing(_) => ErrorPolicy::AbortTenant,
            ScanError::Fetch { .. } => ErrorPolicy::AbortTarget,
            ScanError::Analyze { .. } | ScanError::Persist(_) => ErrorPolicy::SkipMessage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        assert_eq!(ScanError::MissingCredentials.policy(), ErrorPolicy::AbortTenant);
        assert_eq!(ScanError::SessionInvalid.policy(), ErrorPolicy::AbortTenant);
        assert_eq!(
            ScanError::Fetch { group_id: 1, source: anyhow::anyhow!("flood wait") }.policy(),
            ErrorPolicy::AbortTarget
        );
        assert_eq!(
            ScanError::Analyze { message_id: 9, source: anyhow::anyhow!("bad span") }.policy(),
            ErrorPolicy::SkipMessage
        );
        assert_eq!(
            ScanError::Persist(anyhow::anyhow!("disk full")).policy(),
            ErrorPolicy::SkipMessage
        );
    }
}
