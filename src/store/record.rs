use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::TechnicianId;

/// Marker stored in `photo_url` when the operator attached scale photo
/// evidence. The capture device keeps the image; the record only needs the
/// attestation.
pub const PHOTO_ATTACHED_MARKER: &str = "photo_attached";

/// One row of the append-only compliance log.
///
/// All fields are scalars; the GPS pair is the only multi-field structure
/// and both halves are optional together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    pub id: Uuid,
    /// Catalog id of the cylinder; `None` when the capture ran against the
    /// placeholder asset.
    pub cylinder_id: Option<String>,
    pub tech_id: String,
    pub start_weight_lbs: f64,
    pub end_weight_lbs: f64,
    /// Derived refrigerant quantity. Recoverable from the weights when not
    /// independently supplied.
    pub delta_lbs: Option<f64>,
    pub photo_url: Option<String>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub logged_at: DateTime<Utc>,
    pub synced: bool,
}

impl ComplianceRecord {
    /// Refrigerant delta in pounds, falling back to the weight difference
    /// rounded to one fractional digit when the stored value is absent.
    pub fn delta(&self) -> f64 {
        self.delta_lbs
            .unwrap_or_else(|| round_tenth(self.start_weight_lbs - self.end_weight_lbs))
    }

    pub fn has_photo_evidence(&self) -> bool {
        self.photo_url.is_some()
    }

    pub fn has_gps_fix(&self) -> bool {
        self.gps_latitude.is_some() && self.gps_longitude.is_some()
    }
}

pub(crate) fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Where a queued write was authored, for the sync processor and auditors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueOrigin {
    pub hostname: String,
    pub pid: u32,
}

impl QueueOrigin {
    pub fn local() -> Self {
        QueueOrigin {
            hostname: hostname::get()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            pid: std::process::id(),
        }
    }
}

/// A compliance record that failed its direct write, parked for later sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWrite {
    pub id: Uuid,
    pub tech_id: String,
    pub payload: ComplianceRecord,
    pub queued_at: DateTime<Utc>,
    pub origin: QueueOrigin,
}

impl PendingWrite {
    pub fn new(technician: &TechnicianId, payload: ComplianceRecord) -> Self {
        PendingWrite {
            id: Uuid::new_v4(),
            tech_id: technician.0.clone(),
            payload,
            queued_at: Utc::now(),
            origin: QueueOrigin::local(),
        }
    }
}
