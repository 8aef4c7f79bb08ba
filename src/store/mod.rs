pub mod memory;

pub use memory::MemoryAccessStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AccessVisit, TrackedAccess};

/// What `record_access` did with a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Created,
    Updated,
}

/// Persistence for tracked accesses, keyed by (tracking_id, recipient_email)
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Atomically create the record for the visit's pair, or refresh the
    /// per-access fields of the existing one.
    async fn record_access(&self, visit: &AccessVisit) -> Result<RecordOutcome>;

    /// Read back one record. Request handling only writes; this is the
    /// inspection path for stored accesses.
    async fn find(&self, tracking_id: &str, recipient_email: &str)
        -> Result<Option<TrackedAccess>>;

    async fn health_check(&self) -> Result<bool>;
}
