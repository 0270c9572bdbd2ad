use crate::actor::Actor;
use crate::ids::{ReportId, SnapshotId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Exclusive owner of a dependent-collection row.
///
/// A row is foreign-keyed to either a live report or a snapshot, never both
/// and never neither. Copy and move operations rewrite this field as their
/// final visible effect; a row left without a reachable owner is a bug, not
/// a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowOwner {
    Report(ReportId),
    Snapshot(SnapshotId),
}

/// Burnt area attributed to one land-tenure category, in hectares.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaBurnt {
    pub owner: RowOwner,
    pub tenure: String,
    pub area_ha: f64,
    pub created_by: Actor,
    pub modified_by: Actor,
}

/// Count of damaged assets of one damage kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Damage {
    pub owner: RowOwner,
    pub kind: String,
    pub count: u32,
    pub created_by: Actor,
    pub modified_by: Actor,
}

/// Count of injuries or fatalities of one injury kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injury {
    pub owner: RowOwner,
    pub kind: String,
    pub count: u32,
    pub created_by: Actor,
    pub modified_by: Actor,
}

/// Free-form named property: structured sub-objects too volatile to be
/// first-class report columns. The value is opaque JSON to the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub owner: RowOwner,
    pub key: String,
    pub value: Value,
    pub created_by: Actor,
    pub modified_by: Actor,
}

/// Per-collection row counts for one owner. Used by the mandatory-field
/// validator ("damages required unless none-to-report") and by snapshot and
/// fork conservation checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentCounts {
    pub areas_burnt: usize,
    pub damages: usize,
    pub injuries: usize,
    pub properties: usize,
}

impl DependentCounts {
    /// Sum across all four collections.
    pub fn total(&self) -> usize {
        self.areas_burnt + self.damages + self.injuries + self.properties
    }
}
