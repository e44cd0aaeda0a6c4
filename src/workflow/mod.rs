//! Compliance capture workflow for field technicians.
//!
//! This module provides the phase state machine and coordination logic for
//! capturing a refrigerant transfer against a physical cylinder.
//!
//! # Architecture
//!
//! The capture system consists of:
//! - **Session State Machine**: linear phase progression with validation
//!   gates at each confirm step (scan → start weight → end weight →
//!   evidence → complete)
//! - **Collaborator Ports**: injected seams for the asset catalog, device
//!   geolocation, durable store, offline queue, and identity provider
//! - **Coordinator**: drives a session against the collaborators, including
//!   the background geolocation fix and the submit fallback path
//!
//! # Key Features
//!
//! - Forward-only phases; a full reset is the only way back
//! - Exact tenth-of-a-pound weight arithmetic, clamped at zero
//! - Weights frozen at Evidence entry; the delta is computed once
//! - Placeholder fallback on catalog miss, so the operator is never blocked
//! - Dual-path submission: direct write or offline queue, both completing
//!   the session

pub mod coordinator;
pub mod ports;
pub mod session;
pub mod simulated;
pub mod weight;

pub use coordinator::{CaptureConfig, CaptureCoordinator, SubmitError};
pub use ports::{
    AssetCatalog, CatalogError, ComplianceStore, IdentityProvider, LocationError, LocationService,
    LookupOutcome, OfflineQueue, QueueError, StoreError,
};
pub use session::{
    Asset, CaptureError, CaptureEvent, CapturePhase, CaptureSession, GpsFix, SubmitOutcome,
    TechnicianId, TransitionRecord, PLACEHOLDER_ASSET_CODE,
};
pub use simulated::{SimulatedCatalog, SimulatedLocationService, StaticIdentity};
pub use weight::{Weight, WeightStep};
