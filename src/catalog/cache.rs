//! Single-slot record cache with a fixed TTL.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use super::model::Record;
use crate::clock::Clock;

/// The most recently fetched record set.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Arc<Vec<Record>>,
    fetched_at: Instant,
}

impl Snapshot {
    /// Check if this snapshot is still fresh at `now`.
    pub fn is_valid(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Holds one snapshot, replaced wholesale on every refresh.
pub struct RecordCache {
    slot: RwLock<Option<Snapshot>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl RecordCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
            clock,
        }
    }

    /// Records from the current snapshot, if it has not expired.
    pub fn fresh(&self) -> Option<Arc<Vec<Record>>> {
        let now = self.clock.now();
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|snapshot| snapshot.is_valid(now, self.ttl))
            .map(|snapshot| Arc::clone(&snapshot.records))
    }

    /// Records from the current snapshot regardless of age.
    pub fn stale(&self) -> Option<Arc<Vec<Record>>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|snapshot| Arc::clone(&snapshot.records))
    }

    /// Replace the snapshot, stamping it with the current time.
    pub fn replace(&self, records: Vec<Record>) -> Arc<Vec<Record>> {
        let records = Arc::new(records);
        let snapshot = Snapshot {
            records: Arc::clone(&records),
            fetched_at: self.clock.now(),
        };
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
        records
    }
}
