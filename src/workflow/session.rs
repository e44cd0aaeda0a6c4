use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::weight::{Weight, WeightStep};

/// Cylinder code bound when the catalog cannot resolve a scan. The field
/// operator is never blocked by a missing backend record.
pub const PLACEHOLDER_ASSET_CODE: &str = "CYL-608-2024-0847";

/// Physical refrigerant cylinder as known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Catalog identifier; `None` for the placeholder asset, which has no
    /// persisted counterpart.
    pub id: Option<String>,
    /// Human-readable code printed on the cylinder tag.
    pub code: String,
    pub refrigerant_type: String,
    pub last_known_weight: Weight,
}

impl Asset {
    /// Well-known fallback asset used when a scan resolves nothing.
    pub fn placeholder() -> Self {
        Asset {
            id: None,
            code: PLACEHOLDER_ASSET_CODE.to_string(),
            refrigerant_type: "R-410A".to_string(),
            last_known_weight: Weight::from_lbs(50.0),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_none()
    }
}

/// Device geolocation fix, captured best-effort alongside the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
}

/// Authenticated operator performing the capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicianId(pub String);

impl std::fmt::Display for TechnicianId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a submission reached the Complete phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    /// The record reached the durable store directly.
    Persisted,
    /// The direct write failed and the record was parked in the offline
    /// queue for later sync.
    Queued,
}

/// Capture phases, transitioning strictly forward except for a full reset.
///
/// Weights live inside the phase that owns them: once the session leaves a
/// weight phase the confirmed value is frozen, and the delta shown in
/// Evidence is computed exactly once at phase entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapturePhase {
    /// Waiting for the operator to scan a cylinder.
    Identify,
    /// Adjusting the scale reading before refrigerant transfer.
    StartWeight { asset: Asset, start: Weight },
    /// Adjusting the scale reading after refrigerant transfer.
    EndWeight {
        asset: Asset,
        start: Weight,
        end: Weight,
    },
    /// Reviewing the derived delta and attaching optional evidence.
    Evidence {
        asset: Asset,
        start: Weight,
        end: Weight,
        delta: Weight,
        has_photo: bool,
    },
    /// Terminal display state; only an explicit reset leaves it.
    Complete { outcome: SubmitOutcome },
}

impl CapturePhase {
    pub fn name(&self) -> &'static str {
        match self {
            CapturePhase::Identify => "Identify",
            CapturePhase::StartWeight { .. } => "StartWeight",
            CapturePhase::EndWeight { .. } => "EndWeight",
            CapturePhase::Evidence { .. } => "Evidence",
            CapturePhase::Complete { .. } => "Complete",
        }
    }
}

/// Events that drive capture phase transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureEvent {
    /// Scan resolved (or fell back) to an asset.
    AssetResolved { asset: Asset },
    /// Keypad increment on the active weight.
    Adjust { step: WeightStep },
    /// Clear the active weight to zero.
    ClearWeight,
    /// Confirm the active weight and advance.
    ConfirmWeight,
    /// One-way photo evidence attach.
    AttachPhoto,
    /// Submission resolved to one of its two outcomes.
    RecordSubmitted { outcome: SubmitOutcome },
    /// Discard the session and return to Identify.
    Reset,
}

/// Errors surfaced by capture transitions.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Validation failure at a confirm gate. The phase is unchanged and no
    /// state is lost.
    #[error("invalid weight: {reason}")]
    InvalidWeight { reason: String },

    #[error("invalid transition: {event:?} not allowed in phase {phase}")]
    InvalidTransition {
        phase: &'static str,
        event: CaptureEvent,
    },
}

/// Audit trail entry for a single session event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from_phase: CapturePhase,
    pub to_phase: CapturePhase,
    pub event: CaptureEvent,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
}

/// In-memory capture session, one per workflow run.
///
/// The session owns phase progression and the validation gates; it has no
/// knowledge of collaborators. All transition logic is synchronous and runs
/// to completion before yielding.
#[derive(Debug)]
pub struct CaptureSession {
    phase: CapturePhase,
    history: Vec<TransitionRecord>,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            phase: CapturePhase::Identify,
            history: Vec::new(),
        }
    }

    pub fn phase(&self) -> &CapturePhase {
        &self.phase
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// Weight currently being adjusted, if the session is in a weight phase.
    pub fn active_weight(&self) -> Option<Weight> {
        match &self.phase {
            CapturePhase::StartWeight { start, .. } => Some(*start),
            CapturePhase::EndWeight { end, .. } => Some(*end),
            _ => None,
        }
    }

    /// Derived delta, available once Evidence has been entered.
    pub fn delta(&self) -> Option<Weight> {
        match &self.phase {
            CapturePhase::Evidence { delta, .. } => Some(*delta),
            _ => None,
        }
    }

    /// Main transition logic. Validation failures leave the phase in place;
    /// invalid transitions are rejected outright.
    pub fn handle_event(&mut self, event: CaptureEvent) -> Result<(), CaptureError> {
        let started = std::time::Instant::now();

        let new_phase = match (&self.phase, &event) {
            (CapturePhase::Identify, CaptureEvent::AssetResolved { asset }) => {
                CapturePhase::StartWeight {
                    asset: asset.clone(),
                    start: Weight::ZERO,
                }
            }

            (CapturePhase::StartWeight { asset, start }, CaptureEvent::Adjust { step }) => {
                CapturePhase::StartWeight {
                    asset: asset.clone(),
                    start: start.apply(*step),
                }
            }
            (CapturePhase::StartWeight { asset, .. }, CaptureEvent::ClearWeight) => {
                CapturePhase::StartWeight {
                    asset: asset.clone(),
                    start: Weight::ZERO,
                }
            }
            (CapturePhase::StartWeight { asset, start }, CaptureEvent::ConfirmWeight) => {
                if start.is_zero() {
                    warn!(phase = "StartWeight", "confirm rejected: zero starting weight");
                    return Err(CaptureError::InvalidWeight {
                        reason: "starting weight must be greater than zero".to_string(),
                    });
                }
                CapturePhase::EndWeight {
                    asset: asset.clone(),
                    start: *start,
                    end: Weight::ZERO,
                }
            }

            (CapturePhase::EndWeight { asset, start, end }, CaptureEvent::Adjust { step }) => {
                CapturePhase::EndWeight {
                    asset: asset.clone(),
                    start: *start,
                    end: end.apply(*step),
                }
            }
            (CapturePhase::EndWeight { asset, start, .. }, CaptureEvent::ClearWeight) => {
                CapturePhase::EndWeight {
                    asset: asset.clone(),
                    start: *start,
                    end: Weight::ZERO,
                }
            }
            (CapturePhase::EndWeight { asset, start, end }, CaptureEvent::ConfirmWeight) => {
                if end > start {
                    warn!(
                        phase = "EndWeight",
                        start = %start,
                        end = %end,
                        "confirm rejected: ending weight exceeds starting weight"
                    );
                    return Err(CaptureError::InvalidWeight {
                        reason: format!(
                            "ending weight {end} cannot be greater than starting weight {start}"
                        ),
                    });
                }
                // Both weights freeze here; the delta is computed exactly
                // once and never recomputed after this point.
                CapturePhase::Evidence {
                    asset: asset.clone(),
                    start: *start,
                    end: *end,
                    delta: start.saturating_sub(*end),
                    has_photo: false,
                }
            }

            (
                CapturePhase::Evidence {
                    asset,
                    start,
                    end,
                    delta,
                    ..
                },
                CaptureEvent::AttachPhoto,
            ) => CapturePhase::Evidence {
                asset: asset.clone(),
                start: *start,
                end: *end,
                delta: *delta,
                has_photo: true,
            },
            (CapturePhase::Evidence { .. }, CaptureEvent::RecordSubmitted { outcome }) => {
                CapturePhase::Complete { outcome: *outcome }
            }

            // Full reset discards the session from any phase.
            (_, CaptureEvent::Reset) => CapturePhase::Identify,

            (_, _) => {
                return Err(CaptureError::InvalidTransition {
                    phase: self.phase.name(),
                    event: event.clone(),
                });
            }
        };

        self.record_transition(new_phase, event, started.elapsed().as_millis() as u64);
        Ok(())
    }

    fn record_transition(&mut self, to: CapturePhase, event: CaptureEvent, duration_ms: u64) {
        let record = TransitionRecord {
            from_phase: self.phase.clone(),
            to_phase: to.clone(),
            event,
            timestamp: Utc::now(),
            duration_ms,
        };

        info!(
            from_phase = %record.from_phase.name(),
            to_phase = %record.to_phase.name(),
            event = ?record.event,
            "capture session transition"
        );

        self.history.push(record);
        self.phase = to;
    }
}
