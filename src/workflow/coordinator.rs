use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::ports::{
    AssetCatalog, ComplianceStore, IdentityProvider, LocationService, LookupOutcome, OfflineQueue,
    QueueError,
};
use super::session::{
    Asset, CaptureError, CaptureEvent, CapturePhase, CaptureSession, GpsFix, SubmitOutcome,
};
use super::weight::WeightStep;
use crate::store::{ComplianceRecord, PendingWrite, PHOTO_ATTACHED_MARKER};

/// Tunables for a capture run.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Bound on the single geolocation attempt. A fix that misses the
    /// window leaves the session without location data.
    pub location_timeout: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            location_timeout: Duration::from_secs(5),
        }
    }
}

/// Errors surfaced by record submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The identity provider has no bound technician. Submission never
    /// proceeds anonymously.
    #[error("no technician identity bound to the session")]
    MissingIdentity,

    #[error("submission is only available from the evidence phase")]
    NotReady,

    /// Both the direct write and the fallback queue write failed. No
    /// further fallback exists.
    #[error("offline queue write failed after store failure: {0}")]
    QueueFailed(#[from] QueueError),

    #[error(transparent)]
    Session(#[from] CaptureError),
}

/// Drives one capture session against the injected collaborators.
///
/// Phase progression stays inside [`CaptureSession`]; the coordinator owns
/// the asynchronous edges: the catalog lookup, the background geolocation
/// fix, and the submit path with its offline-queue fallback.
pub struct CaptureCoordinator {
    session: CaptureSession,
    catalog: Arc<dyn AssetCatalog>,
    location: Arc<dyn LocationService>,
    store: Arc<dyn ComplianceStore>,
    queue: Arc<dyn OfflineQueue>,
    identity: Arc<dyn IdentityProvider>,
    location_fix: Arc<RwLock<Option<GpsFix>>>,
    location_task: Option<JoinHandle<()>>,
    config: CaptureConfig,
}

impl CaptureCoordinator {
    pub fn new(
        catalog: Arc<dyn AssetCatalog>,
        location: Arc<dyn LocationService>,
        store: Arc<dyn ComplianceStore>,
        queue: Arc<dyn OfflineQueue>,
        identity: Arc<dyn IdentityProvider>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            session: CaptureSession::new(),
            catalog,
            location,
            store,
            queue,
            identity,
            location_fix: Arc::new(RwLock::new(None)),
            location_task: None,
            config,
        }
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Best-effort location snapshot at this moment.
    pub async fn location_fix(&self) -> Option<GpsFix> {
        *self.location_fix.read().await
    }

    /// Start the single background geolocation attempt, bounded by the
    /// configured timeout. Idempotent; later calls are no-ops.
    pub fn begin_location_acquisition(&mut self) {
        if self.location_task.is_some() {
            return;
        }

        let service = Arc::clone(&self.location);
        let slot = Arc::clone(&self.location_fix);
        let timeout = self.config.location_timeout;

        self.location_task = Some(tokio::spawn(async move {
            match tokio::time::timeout(timeout, service.acquire_fix()).await {
                Ok(Ok(fix)) => {
                    info!(
                        latitude = fix.latitude,
                        longitude = fix.longitude,
                        "geolocation fix acquired"
                    );
                    *slot.write().await = Some(fix);
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "geolocation fix unavailable");
                }
                Err(_) => {
                    warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        "geolocation fix timed out"
                    );
                }
            }
        }));
    }

    /// Resolve the scanned cylinder and advance to StartWeight.
    ///
    /// A catalog miss or failure falls back to the well-known placeholder
    /// asset; the operator is never blocked on a missing backend record.
    pub async fn scan(&mut self) -> Result<Asset, CaptureError> {
        self.begin_location_acquisition();

        let asset = match self.catalog.lookup_asset().await {
            Ok(LookupOutcome::Found(asset)) => asset,
            Ok(LookupOutcome::NotFound) => {
                info!("catalog lookup returned no asset, binding placeholder");
                Asset::placeholder()
            }
            Err(e) => {
                warn!(error = %e, "catalog lookup failed, binding placeholder");
                Asset::placeholder()
            }
        };

        self.session.handle_event(CaptureEvent::AssetResolved {
            asset: asset.clone(),
        })?;
        Ok(asset)
    }

    pub fn adjust(&mut self, step: WeightStep) -> Result<(), CaptureError> {
        self.session.handle_event(CaptureEvent::Adjust { step })
    }

    pub fn clear_weight(&mut self) -> Result<(), CaptureError> {
        self.session.handle_event(CaptureEvent::ClearWeight)
    }

    pub fn confirm_weight(&mut self) -> Result<(), CaptureError> {
        self.session.handle_event(CaptureEvent::ConfirmWeight)
    }

    pub fn attach_photo(&mut self) -> Result<(), CaptureError> {
        self.session.handle_event(CaptureEvent::AttachPhoto)
    }

    /// Submit the frozen capture. One direct write attempt; on failure the
    /// same logical payload is queued and the submission still completes.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, SubmitError> {
        let technician = self
            .identity
            .current_technician()
            .ok_or(SubmitError::MissingIdentity)?;

        let (asset, start, end, delta, has_photo) = match self.session.phase() {
            CapturePhase::Evidence {
                asset,
                start,
                end,
                delta,
                has_photo,
            } => (asset.clone(), *start, *end, *delta, *has_photo),
            _ => return Err(SubmitError::NotReady),
        };

        let fix = self.location_fix().await;
        let record = ComplianceRecord {
            id: Uuid::new_v4(),
            cylinder_id: asset.id.clone(),
            tech_id: technician.0.clone(),
            start_weight_lbs: start.as_lbs(),
            end_weight_lbs: end.as_lbs(),
            delta_lbs: Some(delta.as_lbs()),
            photo_url: has_photo.then(|| PHOTO_ATTACHED_MARKER.to_string()),
            gps_latitude: fix.map(|f| f.latitude),
            gps_longitude: fix.map(|f| f.longitude),
            logged_at: Utc::now(),
            synced: true,
        };

        let outcome = match self.store.write_record(&record).await {
            Ok(()) => {
                info!(
                    record_id = %record.id,
                    tech_id = %record.tech_id,
                    delta_lbs = %record.delta(),
                    "compliance record certified"
                );
                SubmitOutcome::Persisted
            }
            Err(store_err) => {
                warn!(
                    record_id = %record.id,
                    error = %store_err,
                    "direct write failed, queueing for later sync"
                );

                let mut payload = record.clone();
                payload.synced = false;
                let pending = PendingWrite::new(&technician, payload);

                if let Err(queue_err) = self.queue.enqueue(pending).await {
                    error!(
                        record_id = %record.id,
                        error = %queue_err,
                        "offline queue write failed, no further fallback exists"
                    );
                    return Err(SubmitError::QueueFailed(queue_err));
                }

                SubmitOutcome::Queued
            }
        };

        self.session
            .handle_event(CaptureEvent::RecordSubmitted { outcome })?;
        Ok(outcome)
    }

    /// Discard the session and return to Identify. The location fix, once
    /// acquired, is kept for subsequent entries from the same spot.
    pub fn reset(&mut self) -> Result<(), CaptureError> {
        self.session.handle_event(CaptureEvent::Reset)
    }
}

impl Drop for CaptureCoordinator {
    fn drop(&mut self) {
        if let Some(handle) = self.location_task.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::ports::{
        CatalogError, LocationError, MockAssetCatalog, MockComplianceStore, MockIdentityProvider,
        MockLocationService, MockOfflineQueue, StoreError,
    };
    use crate::workflow::session::{TechnicianId, PLACEHOLDER_ASSET_CODE};
    use crate::workflow::weight::Weight;

    fn identity(tech: Option<&str>) -> Arc<dyn IdentityProvider> {
        let mut mock = MockIdentityProvider::new();
        let tech = tech.map(|t| TechnicianId(t.to_string()));
        mock.expect_current_technician().returning(move || tech.clone());
        Arc::new(mock)
    }

    fn instant_location() -> Arc<dyn LocationService> {
        let mut mock = MockLocationService::new();
        mock.expect_acquire_fix().returning(|| {
            Ok(GpsFix {
                latitude: 37.77,
                longitude: -122.41,
            })
        });
        Arc::new(mock)
    }

    fn catalog_not_found() -> Arc<dyn AssetCatalog> {
        let mut mock = MockAssetCatalog::new();
        mock.expect_lookup_asset()
            .returning(|| Ok(LookupOutcome::NotFound));
        Arc::new(mock)
    }

    fn coordinator_with_store_and_queue(
        store: MockComplianceStore,
        queue: MockOfflineQueue,
    ) -> CaptureCoordinator {
        CaptureCoordinator::new(
            catalog_not_found(),
            instant_location(),
            Arc::new(store),
            Arc::new(queue),
            identity(Some("TECH-001")),
            CaptureConfig::default(),
        )
    }

    async fn drive_to_evidence(coordinator: &mut CaptureCoordinator) {
        coordinator.scan().await.unwrap();
        for _ in 0..5 {
            coordinator.adjust(WeightStep::PlusTen).unwrap();
        }
        coordinator.confirm_weight().unwrap();
        for _ in 0..3 {
            coordinator.adjust(WeightStep::PlusTen).unwrap();
        }
        for _ in 0..5 {
            coordinator.adjust(WeightStep::PlusOne).unwrap();
        }
        for _ in 0..5 {
            coordinator.adjust(WeightStep::PlusTenth).unwrap();
        }
        coordinator.confirm_weight().unwrap();
        // Let the background geolocation task land its fix.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_scan_miss_binds_placeholder() {
        let mut store = MockComplianceStore::new();
        store.expect_write_record().never();
        let mut coordinator =
            coordinator_with_store_and_queue(store, MockOfflineQueue::new());

        let asset = coordinator.scan().await.unwrap();
        assert!(asset.is_placeholder());
        assert_eq!(asset.code, PLACEHOLDER_ASSET_CODE);
        assert_eq!(coordinator.session().phase().name(), "StartWeight");
    }

    #[tokio::test]
    async fn test_scan_failure_binds_placeholder() {
        let mut catalog = MockAssetCatalog::new();
        catalog.expect_lookup_asset().returning(|| {
            Err(CatalogError::Unavailable {
                reason: "backend offline".to_string(),
            })
        });

        let mut coordinator = CaptureCoordinator::new(
            Arc::new(catalog),
            instant_location(),
            Arc::new(MockComplianceStore::new()),
            Arc::new(MockOfflineQueue::new()),
            identity(Some("TECH-001")),
            CaptureConfig::default(),
        );

        let asset = coordinator.scan().await.unwrap();
        assert!(asset.is_placeholder());
        assert_eq!(coordinator.session().phase().name(), "StartWeight");
    }

    #[tokio::test]
    async fn test_scan_found_binds_catalog_asset() {
        let mut catalog = MockAssetCatalog::new();
        catalog.expect_lookup_asset().returning(|| {
            Ok(LookupOutcome::Found(Asset {
                id: Some("cyl-42".to_string()),
                code: "CYL-608-2025-0042".to_string(),
                refrigerant_type: "R-32".to_string(),
                last_known_weight: Weight::from_lbs(44.0),
            }))
        });

        let mut coordinator = CaptureCoordinator::new(
            Arc::new(catalog),
            instant_location(),
            Arc::new(MockComplianceStore::new()),
            Arc::new(MockOfflineQueue::new()),
            identity(Some("TECH-001")),
            CaptureConfig::default(),
        );

        let asset = coordinator.scan().await.unwrap();
        assert_eq!(asset.id.as_deref(), Some("cyl-42"));
        assert!(!asset.is_placeholder());
    }

    #[tokio::test]
    async fn test_submit_persists_directly() {
        let mut store = MockComplianceStore::new();
        store
            .expect_write_record()
            .withf(|record| {
                record.start_weight_lbs == 50.0
                    && record.end_weight_lbs == 35.5
                    && record.delta_lbs == Some(14.5)
                    && record.synced
                    && record.cylinder_id.is_none()
            })
            .times(1)
            .returning(|_| Ok(()));
        let mut queue = MockOfflineQueue::new();
        queue.expect_enqueue().never();

        let mut coordinator = coordinator_with_store_and_queue(store, queue);
        drive_to_evidence(&mut coordinator).await;

        let outcome = coordinator.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Persisted);
        assert!(matches!(
            coordinator.session().phase(),
            CapturePhase::Complete {
                outcome: SubmitOutcome::Persisted
            }
        ));
    }

    #[tokio::test]
    async fn test_submit_queues_on_store_failure() {
        let mut store = MockComplianceStore::new();
        store.expect_write_record().returning(|_| {
            Err(StoreError::WriteRejected {
                reason: "network unreachable".to_string(),
            })
        });
        let mut queue = MockOfflineQueue::new();
        queue
            .expect_enqueue()
            .withf(|pending| {
                pending.payload.start_weight_lbs == 50.0
                    && pending.payload.end_weight_lbs == 35.5
                    && !pending.payload.synced
                    && pending.payload.gps_latitude.is_some()
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut coordinator = coordinator_with_store_and_queue(store, queue);
        drive_to_evidence(&mut coordinator).await;

        let outcome = coordinator.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Queued);
        assert!(matches!(
            coordinator.session().phase(),
            CapturePhase::Complete {
                outcome: SubmitOutcome::Queued
            }
        ));
    }

    #[tokio::test]
    async fn test_submit_fails_when_queue_also_fails() {
        let mut store = MockComplianceStore::new();
        store.expect_write_record().returning(|_| {
            Err(StoreError::WriteRejected {
                reason: "network unreachable".to_string(),
            })
        });
        let mut queue = MockOfflineQueue::new();
        queue.expect_enqueue().returning(|_| {
            Err(QueueError::WriteRejected {
                reason: "disk full".to_string(),
            })
        });

        let mut coordinator = coordinator_with_store_and_queue(store, queue);
        drive_to_evidence(&mut coordinator).await;

        let result = coordinator.submit().await;
        assert!(matches!(result, Err(SubmitError::QueueFailed(_))));
        // The session stays in Evidence; the capture is not lost.
        assert_eq!(coordinator.session().phase().name(), "Evidence");
    }

    #[tokio::test]
    async fn test_submit_requires_identity() {
        let mut coordinator = CaptureCoordinator::new(
            catalog_not_found(),
            instant_location(),
            Arc::new(MockComplianceStore::new()),
            Arc::new(MockOfflineQueue::new()),
            identity(None),
            CaptureConfig::default(),
        );
        drive_to_evidence(&mut coordinator).await;

        let result = coordinator.submit().await;
        assert!(matches!(result, Err(SubmitError::MissingIdentity)));
    }

    #[tokio::test]
    async fn test_submit_rejected_outside_evidence() {
        let mut coordinator = coordinator_with_store_and_queue(
            MockComplianceStore::new(),
            MockOfflineQueue::new(),
        );
        coordinator.scan().await.unwrap();

        let result = coordinator.submit().await;
        assert!(matches!(result, Err(SubmitError::NotReady)));
    }

    #[tokio::test]
    async fn test_missing_fix_leaves_record_without_gps() {
        let mut location = MockLocationService::new();
        location.expect_acquire_fix().returning(|| {
            Err(LocationError::Unavailable {
                reason: "no signal".to_string(),
            })
        });

        let mut store = MockComplianceStore::new();
        store
            .expect_write_record()
            .withf(|record| record.gps_latitude.is_none() && record.gps_longitude.is_none())
            .returning(|_| Ok(()));

        let mut coordinator = CaptureCoordinator::new(
            catalog_not_found(),
            Arc::new(location),
            Arc::new(store),
            Arc::new(MockOfflineQueue::new()),
            identity(Some("TECH-001")),
            CaptureConfig {
                location_timeout: Duration::from_millis(10),
            },
        );
        drive_to_evidence(&mut coordinator).await;

        let outcome = coordinator.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Persisted);
    }
}
