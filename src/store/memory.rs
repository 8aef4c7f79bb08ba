use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{AccessStore, RecordOutcome};
use crate::error::Result;
use crate::models::{AccessVisit, TrackedAccess};

/// Process-local store, used for development and tests
#[derive(Debug, Default)]
pub struct MemoryAccessStore {
    records: DashMap<(String, String), TrackedAccess>,
}

impl MemoryAccessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl AccessStore for MemoryAccessStore {
    async fn record_access(&self, visit: &AccessVisit) -> Result<RecordOutcome> {
        let key = (visit.tracking_id.clone(), visit.recipient_email.clone());

        // The entry guard holds the shard lock for the whole read-modify-write.
        match self.records.entry(key) {
            Entry::Occupied(mut occupied) => {
                visit.apply_to(occupied.get_mut());
                Ok(RecordOutcome::Updated)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(visit.clone().into_record());
                Ok(RecordOutcome::Created)
            }
        }
    }

    async fn find(
        &self,
        tracking_id: &str,
        recipient_email: &str,
    ) -> Result<Option<TrackedAccess>> {
        Ok(self
            .records
            .get(&(tracking_id.to_string(), recipient_email.to_string()))
            .map(|r| r.value().clone()))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
