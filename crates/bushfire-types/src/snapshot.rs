use crate::actor::Actor;
use crate::ids::{ReportId, SnapshotId};
use crate::report::Report;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which authorisation boundary a snapshot was taken at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotPhase {
    Initial,
    Final,
}

impl std::fmt::Display for SnapshotPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// An immutable, phase-tagged, point-in-time copy of a report.
///
/// Snapshots are created at authorisation boundaries, never mutated or
/// deleted by normal operation, and ordered by `taken_at`. The latest
/// snapshot of each phase is the authoritative one; older snapshots of the
/// same phase remain as history. `report_id` is the owning record and is the
/// one field a fork rewrites when history follows the living record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    /// Owning report. Rewritten in place by the fork protocol; everything
    /// else in the row is frozen as-at capture.
    pub report_id: ReportId,
    pub phase: SnapshotPhase,
    /// Free-text label naming the operation that took the snapshot
    /// ("submit", "authorise", "review", a district-change reason, ...).
    pub action: String,
    pub taken_by: Actor,
    pub taken_at: DateTime<Utc>,
    /// Fully-denormalized copy of the report's scalar state at capture time.
    pub report: Report,
}
