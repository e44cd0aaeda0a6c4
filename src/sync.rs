//! Offline queue drain: replays pending writes against the durable store.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::workflow::{ComplianceStore, OfflineQueue, QueueError};

/// Outcome of one drain pass over the offline queue.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub replayed: usize,
    pub failed: usize,
    pub remaining: usize,
}

/// Replays queued compliance records, one direct write attempt each.
///
/// A pass is single-shot: entries that fail to replay stay queued for the
/// next invocation, there is no internal retry loop.
pub struct SyncProcessor {
    store: Arc<dyn ComplianceStore>,
    queue: Arc<dyn OfflineQueue>,
}

impl SyncProcessor {
    pub fn new(store: Arc<dyn ComplianceStore>, queue: Arc<dyn OfflineQueue>) -> Self {
        Self { store, queue }
    }

    pub async fn drain(&self) -> Result<SyncReport, QueueError> {
        let pending = self.queue.pending().await?;
        let mut replayed = 0;
        let mut failed = 0;

        for write in pending {
            let mut record = write.payload.clone();
            record.synced = true;

            match self.store.write_record(&record).await {
                Ok(()) => {
                    self.queue.remove(write.id).await?;
                    replayed += 1;
                    info!(
                        pending_id = %write.id,
                        record_id = %record.id,
                        "queued record replayed to durable store"
                    );
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        pending_id = %write.id,
                        error = %e,
                        "replay failed, entry stays queued"
                    );
                }
            }
        }

        let remaining = self.queue.pending().await?.len();
        info!(replayed, failed, remaining, "offline queue drain complete");

        Ok(SyncReport {
            replayed,
            failed,
            remaining,
        })
    }
}
