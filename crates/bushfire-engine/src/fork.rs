//! District-change fork.
//!
//! A report's district determines its report-number prefix, so a district
//! change cannot be an in-place edit: the current record is retired as
//! `Invalidated` and a successor is created under the new district, with
//! every dependent row, every historical snapshot, and every inbound
//! `valid_report` link re-homed onto the successor. All steps are one
//! atomic unit; the caller observes "nothing happened" or "fully forked".
//!
//! The chain stays acyclic by construction: the only forward link written
//! here points from the retiring record to a record that has no forward
//! link of its own.

use bushfire_types::{Actor, District, Report, ReportEdits, ReportId, ReportStatus, SnapshotPhase};
use chrono::{DateTime, Datelike, Utc};
use tracing::info;

use crate::error::LifecycleError;
use crate::snapshot;
use crate::store::StoreState;

/// Retire `report_id` and fork a successor into `new_district`.
///
/// `edits` is the caller's edited data, applied to the successor on top of
/// the *persisted* state of the retiring record — not to the retiring
/// record itself, which freezes as last persisted. Returns the successor's
/// id.
pub fn fork(
    state: &mut StoreState,
    report_id: ReportId,
    new_district: District,
    edits: &ReportEdits,
    reason: Option<String>,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<ReportId, LifecycleError> {
    // Step 1: the persisted version of the record is what retires.
    let retiring: Report = state.report(report_id)?.clone();
    if retiring.is_retired() {
        return Err(LifecycleError::NotInvalidatable {
            report: report_id,
            reason: format!("already superseded ({})", retiring.status),
        });
    }
    if retiring.district.code == new_district.code {
        return Err(LifecycleError::NotInvalidatable {
            report: report_id,
            reason: format!("district unchanged ({})", new_district.code),
        });
    }

    let reason = reason.unwrap_or_else(|| {
        format!(
            "moved from {} to {}",
            retiring.district.name, new_district.name
        )
    });

    // Step 3 (number first, so minting sees pre-fork state): reuse the
    // number of a placeholder sibling retired by the fork that created the
    // retiring record, or mint the next free number under the new district.
    // `forked_into` is the discriminator here, not `valid_report`: forward
    // links are re-pointed by cascades, so a merged or duplicated member —
    // or an invalidated record re-pointed past its own successor — can link
    // to the retiring record without ever having been forked into it.
    let placeholder = state
        .reports()
        .find(|r| {
            r.status == ReportStatus::Invalidated
                && r.forked_into == Some(report_id)
                && r.district.code == new_district.code
        })
        .map(|r| (r.id, r.number.clone()));
    let number = match &placeholder {
        Some((_, number)) => number.clone(),
        None => state.mint_number(&new_district.code, now.year() as u16),
    };
    if let Some((placeholder_id, _)) = placeholder {
        // Nothing links to the placeholder: its inbound links were
        // re-pointed when it was retired. Safe to delete outright.
        state.remove_report(placeholder_id);
    }

    // The successor carries the retiring record's persisted data plus the
    // caller's edits, under its own identity. It starts live: no
    // invalidation markers, no forward link.
    let new_id = state.next_report_id();
    let mut successor = retiring.clone();
    successor.id = new_id;
    successor.number = number;
    successor.district = new_district;
    successor.invalid_reason = None;
    successor.valid_report = None;
    successor.forked_into = None;
    edits.apply(&mut successor, actor, now);
    let successor_status = successor.status;
    state.insert_report(successor);

    // Step 2: retire the old record. The correlation id moves with
    // authority — the retired record is no longer the external system's
    // counterpart.
    {
        let old = state.report_mut(report_id)?;
        old.status = ReportStatus::Invalidated;
        old.invalid_reason = Some(reason.clone());
        old.external_incident_id = None;
        old.touch(actor, now);
    }

    // Steps 4–5: dependent rows and history are moved, not copied.
    state.rehome_dependents(report_id, new_id);
    state.rehome_snapshots(report_id, new_id);

    // Step 6: chains that ended at the retiring record now end at the
    // successor.
    state.repoint_valid_links(report_id, new_id);

    // Step 7: forward link from retired to successor, plus the permanent
    // record of which fork retired it.
    {
        let old = state.report_mut(report_id)?;
        old.valid_report = Some(new_id);
        old.forked_into = Some(new_id);
    }

    // Step 8: an already-authorised successor gets a fresh final snapshot
    // recording the district change.
    if successor_status.at_least_final_authorised() {
        snapshot::take(state, new_id, SnapshotPhase::Final, &reason, now)?;
    }

    info!(
        retired = %report_id,
        successor = %new_id,
        number = %state.report(new_id)?.number,
        %reason,
        "report forked"
    );
    Ok(new_id)
}
