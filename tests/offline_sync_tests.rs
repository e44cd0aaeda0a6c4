//! Integration tests for the offline queue drain
//!
//! Seeds the filesystem queue with pending writes and verifies they replay
//! into the durable store, including the case where the store is still
//! unreachable.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use fieldshield::{
    ComplianceRecord, ComplianceStore, FileSystemQueue, FileSystemStore, OfflineQueue,
    PendingWrite, StoreError, SyncProcessor, TechnicianId,
};

/// Store that refuses every write, standing in for an unreachable backend.
struct UnreachableStore;

#[async_trait]
impl ComplianceStore for UnreachableStore {
    async fn write_record(&self, _record: &ComplianceRecord) -> Result<(), StoreError> {
        Err(StoreError::WriteRejected {
            reason: "backend unreachable".to_string(),
        })
    }

    async fn list_records(&self) -> Result<Vec<ComplianceRecord>, StoreError> {
        Ok(Vec::new())
    }
}

fn queued_record(start: f64, end: f64) -> ComplianceRecord {
    ComplianceRecord {
        id: Uuid::new_v4(),
        cylinder_id: None,
        tech_id: "TECH-001".to_string(),
        start_weight_lbs: start,
        end_weight_lbs: end,
        delta_lbs: Some(start - end),
        photo_url: None,
        gps_latitude: Some(37.7749),
        gps_longitude: Some(-122.4194),
        logged_at: Utc::now(),
        synced: false,
    }
}

#[tokio::test]
async fn test_drain_replays_queue_into_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileSystemStore::new(temp_dir.path()));
    let queue = Arc::new(FileSystemQueue::new(temp_dir.path()));

    let tech = TechnicianId("TECH-001".to_string());
    queue
        .enqueue(PendingWrite::new(&tech, queued_record(50.0, 35.5)))
        .await
        .unwrap();
    queue
        .enqueue(PendingWrite::new(&tech, queued_record(20.0, 19.0)))
        .await
        .unwrap();

    let report = SyncProcessor::new(Arc::clone(&store) as Arc<dyn ComplianceStore>, Arc::clone(&queue) as Arc<dyn OfflineQueue>)
        .drain()
        .await
        .unwrap();

    assert_eq!(report.replayed, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.remaining, 0);

    // Replayed records land with the synced flag raised.
    let records = store.list_records().await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.synced));

    assert!(queue.pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_drain_against_unreachable_store_keeps_entries() {
    let temp_dir = TempDir::new().unwrap();
    let queue = Arc::new(FileSystemQueue::new(temp_dir.path()));

    let tech = TechnicianId("TECH-001".to_string());
    queue
        .enqueue(PendingWrite::new(&tech, queued_record(50.0, 35.5)))
        .await
        .unwrap();

    let report = SyncProcessor::new(
        Arc::new(UnreachableStore),
        Arc::clone(&queue) as Arc<dyn OfflineQueue>,
    )
    .drain()
    .await
    .unwrap();

    assert_eq!(report.replayed, 0);
    assert_eq!(report.failed, 1);
    assert_eq!(report.remaining, 1);
    assert_eq!(queue.pending().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_drain_is_repeatable_after_store_recovers() {
    let temp_dir = TempDir::new().unwrap();
    let queue = Arc::new(FileSystemQueue::new(temp_dir.path()));

    let tech = TechnicianId("TECH-001".to_string());
    queue
        .enqueue(PendingWrite::new(&tech, queued_record(50.0, 35.5)))
        .await
        .unwrap();

    // First pass: backend down, entry stays queued.
    SyncProcessor::new(
        Arc::new(UnreachableStore),
        Arc::clone(&queue) as Arc<dyn OfflineQueue>,
    )
    .drain()
    .await
    .unwrap();
    assert_eq!(queue.pending().await.unwrap().len(), 1);

    // Second pass: backend recovered, entry drains.
    let store = Arc::new(FileSystemStore::new(temp_dir.path()));
    let report = SyncProcessor::new(
        Arc::clone(&store) as Arc<dyn ComplianceStore>,
        Arc::clone(&queue) as Arc<dyn OfflineQueue>,
    )
    .drain()
    .await
    .unwrap();

    assert_eq!(report.replayed, 1);
    assert!(queue.pending().await.unwrap().is_empty());
    assert_eq!(store.list_records().await.unwrap().len(), 1);
}
