use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::record::{ComplianceRecord, PendingWrite};
use crate::workflow::{ComplianceStore, OfflineQueue, QueueError, StoreError};

/// Filesystem-backed durable store, one JSON file per compliance record.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-write never leaves a half-serialized record behind.
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into(),
        }
    }

    fn records_dir(&self) -> PathBuf {
        self.root.join("records")
    }

    fn record_path(&self, id: Uuid) -> PathBuf {
        self.records_dir().join(format!("{id}.record.json"))
    }
}

#[async_trait]
impl ComplianceStore for FileSystemStore {
    async fn write_record(&self, record: &ComplianceRecord) -> Result<(), StoreError> {
        fs::create_dir_all(self.records_dir()).await?;

        let path = self.record_path(record.id);
        let serialized = serde_json::to_string_pretty(record)?;
        write_atomic(&path, &serialized).await?;

        info!(
            record_id = %record.id,
            tech_id = %record.tech_id,
            delta_lbs = %record.delta(),
            file = ?path,
            "compliance record written"
        );

        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<ComplianceRecord>, StoreError> {
        let dir = self.records_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let contents = fs::read_to_string(&path).await?;
            match serde_json::from_str::<ComplianceRecord>(&contents) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(file = ?path, error = %e, "skipping unreadable record file");
                }
            }
        }

        records.sort_by(|a, b| b.logged_at.cmp(&a.logged_at));
        Ok(records)
    }
}

/// Filesystem-backed offline queue, one JSON file per pending write.
pub struct FileSystemQueue {
    root: PathBuf,
}

impl FileSystemQueue {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into(),
        }
    }

    fn queue_dir(&self) -> PathBuf {
        self.root.join("queue")
    }

    fn entry_path(&self, id: Uuid) -> PathBuf {
        self.queue_dir().join(format!("{id}.pending.json"))
    }
}

#[async_trait]
impl OfflineQueue for FileSystemQueue {
    async fn enqueue(&self, write: PendingWrite) -> Result<(), QueueError> {
        fs::create_dir_all(self.queue_dir()).await?;

        let path = self.entry_path(write.id);
        let serialized = serde_json::to_string_pretty(&write)?;
        write_atomic(&path, &serialized).await?;

        info!(
            pending_id = %write.id,
            tech_id = %write.tech_id,
            hostname = %write.origin.hostname,
            file = ?path,
            "pending write queued"
        );

        Ok(())
    }

    async fn pending(&self) -> Result<Vec<PendingWrite>, QueueError> {
        let dir = self.queue_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut writes = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let contents = fs::read_to_string(&path).await?;
            match serde_json::from_str::<PendingWrite>(&contents) {
                Ok(write) => writes.push(write),
                Err(e) => {
                    warn!(file = ?path, error = %e, "skipping unreadable queue entry");
                }
            }
        }

        writes.sort_by(|a, b| a.queued_at.cmp(&b.queued_at));
        Ok(writes)
    }

    async fn remove(&self, id: Uuid) -> Result<(), QueueError> {
        let path = self.entry_path(id);
        fs::remove_file(&path).await?;
        debug!(pending_id = %id, "queue entry removed");
        Ok(())
    }
}

/// Write to a temporary file then rename into place (atomic on one
/// filesystem).
async fn write_atomic(path: &Path, contents: &str) -> Result<(), std::io::Error> {
    let temp = path.with_extension("tmp");
    fs::write(&temp, contents).await?;
    fs::rename(&temp, path).await?;
    Ok(())
}
