pub mod config;
pub mod message;
pub mod records;
pub mod status;

pub use config::{Lookback, ScanTarget, Tenant, TenantConfig};
pub use message::{Message, MessageEntity, RawStats};
pub use records::{DailyStatistic, MatchRecord, MessageStats};
pub use status::{ScanPhase, ScanStatus};
