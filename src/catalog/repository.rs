use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::cache::RecordCache;
use super::model::Record;
use crate::error::FetchError;
use crate::feishu::RawRecord;

/// Upstream listing of raw table rows.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>, FetchError>;
}

/// Read access to catalog records, backed by a [`RecordCache`].
///
/// Never fails: upstream errors are logged and that call gets an empty list.
/// The last good snapshot stays in the cache untouched.
pub struct RecordRepository {
    source: Arc<dyn RecordSource>,
    cache: RecordCache,
    refresh: Mutex<()>,
}

impl RecordRepository {
    pub fn new(source: Arc<dyn RecordSource>, cache: RecordCache) -> Self {
        Self {
            source,
            cache,
            refresh: Mutex::new(()),
        }
    }

    /// All records, in upstream order.
    pub async fn get_records(&self) -> Arc<Vec<Record>> {
        if let Some(records) = self.cache.fresh() {
            return records;
        }

        // Only one refresh runs at a time. Callers that arrive while it is in
        // flight get the stale snapshot rather than queueing behind it; a
        // failed refresh itself still answers empty.
        let _guard = match self.refresh.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                if let Some(stale) = self.cache.stale() {
                    debug!("Refresh in flight, serving stale records");
                    return stale;
                }
                self.refresh.lock().await
            }
        };

        if let Some(records) = self.cache.fresh() {
            return records;
        }

        match self.source.fetch_records().await {
            Ok(raw) => {
                let records: Vec<Record> = raw.iter().map(Record::from_raw).collect();
                info!(count = records.len(), "Refreshed catalog records");
                self.cache.replace(records)
            }
            Err(e) => {
                error!(error = %e, "Failed to refresh catalog records");
                Arc::default()
            }
        }
    }

    /// Look up a single record by its upstream id.
    pub async fn get_record(&self, record_id: &str) -> Option<Record> {
        self.get_records()
            .await
            .iter()
            .find(|r| r.record_id == record_id)
            .cloned()
    }
}
