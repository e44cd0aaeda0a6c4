//! Collaborator seams for the capture workflow.
//!
//! Every external dependency of the workflow (catalog lookup, device
//! geolocation, the durable store, the offline queue, the identity
//! provider) is injected through one of these traits rather than read
//! ambiently, so each can be substituted in tests.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

use super::session::{Asset, GpsFix, TechnicianId};
use crate::store::{ComplianceRecord, PendingWrite};

/// Result of a catalog lookup. The workflow, not the catalog, decides what
/// happens on a miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(Asset),
    NotFound,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {reason}")]
    Unavailable { reason: String },
}

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location fix unavailable: {reason}")]
    Unavailable { reason: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store rejected the write: {reason}")]
    WriteRejected { reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue rejected the write: {reason}")]
    WriteRejected { reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Catalog of provisioned cylinders, resolved from a scanned tag.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AssetCatalog: Send + Sync {
    async fn lookup_asset(&self) -> Result<LookupOutcome, CatalogError>;
}

/// Device geolocation service. A single best-effort attempt per session;
/// the caller bounds it with a timeout.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LocationService: Send + Sync {
    async fn acquire_fix(&self) -> Result<GpsFix, LocationError>;
}

/// Durable, append-only compliance record store.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ComplianceStore: Send + Sync {
    async fn write_record(&self, record: &ComplianceRecord) -> Result<(), StoreError>;

    /// Persisted records, newest first.
    async fn list_records(&self) -> Result<Vec<ComplianceRecord>, StoreError>;
}

/// Local fallback queue for writes that failed to reach the durable store.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OfflineQueue: Send + Sync {
    async fn enqueue(&self, write: PendingWrite) -> Result<(), QueueError>;

    /// Queued writes, oldest first (drain order).
    async fn pending(&self) -> Result<Vec<PendingWrite>, QueueError>;

    async fn remove(&self, id: Uuid) -> Result<(), QueueError>;
}

/// Session identity provider. Injected explicitly so tests can bind a
/// deterministic technician.
#[cfg_attr(test, automock)]
pub trait IdentityProvider: Send + Sync {
    fn current_technician(&self) -> Option<TechnicianId>;
}
