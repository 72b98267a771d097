//! The scan engine: window resolution, historical traversal with stop/skip
//! policy, match detection, statistic extraction, and daily aggregation.
//!
//! The external messaging platform and the match store sit behind the
//! `GroupClient` and `MatchSink` traits; everything else is exercised without
//! I/O. One `TenantScanSession` walks one tenant's targets sequentially.

pub mod aggregate;
pub mod error;
pub mod history;
pub mod matcher;
pub mod progress;
pub mod session;
pub mod stats;
pub mod testing;
pub mod traits;
pub mod window;

pub use error::{ErrorPolicy, ScanError};
pub use progress::{Reporter, ScanProgress};
pub use session::{ScanSummary, TenantScanSession};
pub use traits::{GroupClient, GroupInfo, MatchSink};
pub use window::{ResolvedWindow, WindowOutcome, resolve_window};
