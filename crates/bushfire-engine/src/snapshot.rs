//! Snapshot capture.
//!
//! Snapshots freeze the legally-authorised view of a report at the
//! submission and authorisation/review boundaries. They are taken only by
//! the status machine, the forker and the consolidation linker — never on a
//! plain field edit — and always inside the caller's store transaction, so
//! a snapshot either lands complete with all of its collection copies or
//! not at all.

use bushfire_types::{Report, ReportId, RowOwner, SnapshotId, SnapshotPhase};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::LifecycleError;
use crate::store::StoreState;

/// Capture a snapshot of `report_id` at the given phase.
///
/// Copies the report's scalar state into a new snapshot row and every
/// current dependent row into the matching snapshot-scoped collection. The
/// audit fields on copied rows are inherited from the owning report's
/// current modifier, not from the original rows.
pub fn take(
    state: &mut StoreState,
    report_id: ReportId,
    phase: SnapshotPhase,
    action: &str,
    now: DateTime<Utc>,
) -> Result<SnapshotId, LifecycleError> {
    let report: Report = state.report(report_id)?.clone();
    let audit_actor = report.modified_by.clone();

    let snapshot_id = state.insert_snapshot(
        report_id,
        phase,
        action,
        audit_actor.clone(),
        now,
        report,
    );
    let target = RowOwner::Snapshot(snapshot_id);
    let source = RowOwner::Report(report_id);

    let areas: Vec<_> = state
        .areas_burnt(source)
        .map(|row| (row.tenure.clone(), row.area_ha))
        .collect();
    for (tenure, area_ha) in areas {
        state.add_area_burnt(target, &tenure, area_ha, &audit_actor);
    }

    let damages: Vec<_> = state
        .damages(source)
        .map(|row| (row.kind.clone(), row.count))
        .collect();
    for (kind, count) in damages {
        state.add_damage(target, &kind, count, &audit_actor);
    }

    let injuries: Vec<_> = state
        .injuries(source)
        .map(|row| (row.kind.clone(), row.count))
        .collect();
    for (kind, count) in injuries {
        state.add_injury(target, &kind, count, &audit_actor);
    }

    let properties: Vec<_> = state
        .properties(source)
        .map(|row| (row.key.clone(), row.value.clone()))
        .collect();
    for (key, value) in properties {
        state.add_property(target, &key, value, &audit_actor);
    }

    debug!(%report_id, %snapshot_id, %phase, action, "snapshot captured");
    Ok(snapshot_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bushfire_types::{Actor, District};
    use similar_asserts::assert_eq;

    #[test]
    fn snapshot_copies_every_collection_and_freezes_scalars() {
        let mut state = StoreState::default();
        let now = Utc::now();
        let actor = Actor::new("officer");
        let id = state.create_report(
            District::new("SWC", "Swan Coastal", "Swan"),
            actor.clone(),
            now,
        );
        state.report_mut(id).unwrap().name = Some("Yanchep fire".into());
        state.add_area_burnt(RowOwner::Report(id), "Crown land", 40.0, &actor);
        state.add_damage(RowOwner::Report(id), "Fences", 2, &actor);
        state.add_injury(RowOwner::Report(id), "Smoke inhalation", 1, &actor);
        state.add_property(
            RowOwner::Report(id),
            "origin_point",
            serde_json::json!({"lat": -31.5, "lon": 115.7}),
            &actor,
        );

        let snapshot_id = take(&mut state, id, SnapshotPhase::Initial, "submit", now).unwrap();

        let frozen = state.latest_snapshot(id, SnapshotPhase::Initial).unwrap();
        assert_eq!(frozen.id, snapshot_id);
        assert_eq!(frozen.action, "submit");
        assert_eq!(frozen.report.name.as_deref(), Some("Yanchep fire"));

        let snapshot_counts = state.dependent_counts(RowOwner::Snapshot(snapshot_id));
        let report_counts = state.dependent_counts(RowOwner::Report(id));
        assert_eq!(snapshot_counts, report_counts);
        assert_eq!(snapshot_counts.total(), 4);

        // Later edits to the live report do not touch the frozen copy.
        state.report_mut(id).unwrap().name = Some("renamed".into());
        let frozen = state.latest_snapshot(id, SnapshotPhase::Initial).unwrap();
        assert_eq!(frozen.report.name.as_deref(), Some("Yanchep fire"));
    }

    #[test]
    fn copied_rows_inherit_audit_from_current_modifier() {
        let mut state = StoreState::default();
        let now = Utc::now();
        let creator = Actor::new("creator");
        let id = state.create_report(
            District::new("SWC", "Swan Coastal", "Swan"),
            creator.clone(),
            now,
        );
        state.add_damage(RowOwner::Report(id), "Sheds", 1, &creator);
        state
            .report_mut(id)
            .unwrap()
            .touch(&Actor::new("editor"), now);

        let snapshot_id = take(&mut state, id, SnapshotPhase::Final, "authorise", now).unwrap();

        let copies: Vec<_> = state.damages(RowOwner::Snapshot(snapshot_id)).collect();
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].created_by, Actor::new("editor"));
        assert_eq!(copies[0].modified_by, Actor::new("editor"));
    }

    #[test]
    fn snapshot_of_missing_report_fails_cleanly() {
        let mut state = StoreState::default();
        let err = take(
            &mut state,
            ReportId(42),
            SnapshotPhase::Final,
            "authorise",
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, LifecycleError::ReportNotFound(ReportId(42)));
    }
}
