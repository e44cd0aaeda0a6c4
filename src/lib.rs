// FieldShield Library - Refrigerant Compliance Field Capture
// This exposes the core components for testing and integration

pub mod config;
pub mod report;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use config::{config, init_config, FieldShieldConfig};
pub use report::{classify, AuditStatus, FleetReport, MAX_AUDIT_LEAK_RATE_PCT};
pub use store::{
    ComplianceRecord, FileSystemQueue, FileSystemStore, PendingWrite, QueueOrigin,
    PHOTO_ATTACHED_MARKER,
};
pub use sync::{SyncProcessor, SyncReport};
pub use telemetry::{generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use workflow::{
    Asset, AssetCatalog, CaptureConfig, CaptureCoordinator, CaptureError, CaptureEvent,
    CapturePhase, CaptureSession, ComplianceStore, GpsFix, IdentityProvider, LocationService,
    LookupOutcome, OfflineQueue, QueueError, SimulatedCatalog, SimulatedLocationService,
    StaticIdentity, StoreError, SubmitError, SubmitOutcome, TechnicianId, Weight, WeightStep,
    PLACEHOLDER_ASSET_CODE,
};
