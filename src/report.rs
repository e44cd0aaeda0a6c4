//! Audit classification over persisted compliance records.

use serde::Serialize;

use crate::store::record::round_tenth;
use crate::store::ComplianceRecord;

/// Leak rate (delta over starting weight, in percent) above which a record
/// is flagged even with full evidence attached.
pub const MAX_AUDIT_LEAK_RATE_PCT: f64 = 20.0;

/// Audit posture of a single compliance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditStatus {
    /// Photo evidence, a GPS pair, and a leak rate within bounds.
    AuditReady,
    /// Missing evidence or an out-of-bounds leak rate.
    AtRisk,
}

impl AuditStatus {
    pub fn label(self) -> &'static str {
        match self {
            AuditStatus::AuditReady => "audit-ready",
            AuditStatus::AtRisk => "risk",
        }
    }
}

pub fn classify(record: &ComplianceRecord) -> AuditStatus {
    let leak_rate = if record.start_weight_lbs > 0.0 {
        record.delta() / record.start_weight_lbs * 100.0
    } else {
        0.0
    };

    if record.has_photo_evidence()
        && record.has_gps_fix()
        && leak_rate <= MAX_AUDIT_LEAK_RATE_PCT
    {
        AuditStatus::AuditReady
    } else {
        AuditStatus::AtRisk
    }
}

/// Fleet-wide rollup for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct FleetReport {
    pub total_records: usize,
    pub audit_ready: usize,
    pub at_risk: usize,
    pub unsynced: usize,
    pub total_delta_lbs: f64,
}

impl FleetReport {
    pub fn from_records(records: &[ComplianceRecord]) -> Self {
        let audit_ready = records
            .iter()
            .filter(|r| classify(r) == AuditStatus::AuditReady)
            .count();
        let unsynced = records.iter().filter(|r| !r.synced).count();
        let total_delta_lbs = round_tenth(records.iter().map(ComplianceRecord::delta).sum());

        FleetReport {
            total_records: records.len(),
            audit_ready,
            at_risk: records.len() - audit_ready,
            unsynced,
            total_delta_lbs,
        }
    }
}
