//! Consolidation: merge and duplicate linking.
//!
//! Both kinds link member reports forward to a primary. Merge additionally
//! resets the primary's spatial footprint (the merged boundary union is
//! recomputed by an external collaborator) and rolls back its final
//! authorisation first when it has one. Members at or beyond final
//! authorisation get a last final-phase snapshot before they are retired.
//! The cascade re-points anything previously consolidated into a member so
//! every retirement chain still ends at a live record.

use bushfire_types::{Actor, ReportId, ReportStatus, SnapshotPhase};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::LifecycleError;
use crate::machine;
use crate::snapshot;
use crate::store::StoreState;

/// How members are linked to the primary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsolidationKind {
    /// Members are absorbed into the primary; the primary's footprint is
    /// reset for external recomputation.
    Merge,
    /// Members are marked as duplicate filings of the primary.
    Duplicate,
}

impl ConsolidationKind {
    fn retired_status(&self) -> ReportStatus {
        match self {
            Self::Merge => ReportStatus::Merged,
            Self::Duplicate => ReportStatus::Duplicated,
        }
    }
}

/// Link `members` into `primary` as one atomic unit.
///
/// Every participant must exist and not already be superseded; the primary
/// may not be one of the members. `reason` overrides the generated
/// explanatory text on each member.
pub fn consolidate(
    state: &mut StoreState,
    kind: ConsolidationKind,
    primary_id: ReportId,
    member_ids: &[ReportId],
    reason: Option<String>,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    check_eligibility(state, primary_id, member_ids)?;
    let primary_number = state.report(primary_id)?.number.clone();

    if kind == ConsolidationKind::Merge {
        // An authorised primary is rolled back before the reset so the
        // footprint change never edits an authorised record in place.
        if state.report(primary_id)?.status.at_least_final_authorised() {
            machine::rollback_final_authorisation(
                state,
                primary_id,
                "delete_final_authorisation_consolidation",
                actor,
                now,
            )?;
        }
        state.clear_areas_burnt(primary_id);
        let primary = state.report_mut(primary_id)?;
        primary.area_ha = None;
        primary.final_boundary = false;
        primary.touch(actor, now);
    }

    for &member_id in member_ids {
        let member_reason = reason.clone().unwrap_or_else(|| match kind {
            ConsolidationKind::Merge => format!("Merged with {primary_number}"),
            ConsolidationKind::Duplicate => format!("Duplicate of {primary_number}"),
        });

        // Freeze the authorised view of the member before retiring it.
        if state.report(member_id)?.status.at_least_final_authorised() {
            snapshot::take(state, member_id, SnapshotPhase::Final, &member_reason, now)?;
        }

        {
            let member = state.report_mut(member_id)?;
            member.status = kind.retired_status();
            member.invalid_reason = Some(member_reason);
            member.valid_report = Some(primary_id);
            member.touch(actor, now);
        }

        // Cascade: anything previously consolidated into this member now
        // points at the new primary.
        state.repoint_valid_links(member_id, primary_id);
    }

    info!(
        primary = %primary_id,
        number = %primary_number,
        members = member_ids.len(),
        ?kind,
        "reports consolidated"
    );
    Ok(())
}

/// Preconditions for the whole unit, checked before any write.
fn check_eligibility(
    state: &StoreState,
    primary_id: ReportId,
    member_ids: &[ReportId],
) -> Result<(), LifecycleError> {
    if member_ids.is_empty() {
        return Err(LifecycleError::IneligibleForConsolidation {
            report: primary_id,
            reason: "no member reports given".into(),
        });
    }
    let primary = state
        .report(primary_id)
        .map_err(|_| LifecycleError::IneligibleForConsolidation {
            report: primary_id,
            reason: "primary does not exist".into(),
        })?;
    if primary.is_retired() {
        return Err(LifecycleError::IneligibleForConsolidation {
            report: primary_id,
            reason: format!("primary already superseded ({})", primary.status),
        });
    }
    for (index, &member_id) in member_ids.iter().enumerate() {
        if member_id == primary_id {
            return Err(LifecycleError::IneligibleForConsolidation {
                report: member_id,
                reason: "primary cannot be consolidated into itself".into(),
            });
        }
        if member_ids[..index].contains(&member_id) {
            return Err(LifecycleError::IneligibleForConsolidation {
                report: member_id,
                reason: "member listed twice".into(),
            });
        }
        let member =
            state
                .report(member_id)
                .map_err(|_| LifecycleError::IneligibleForConsolidation {
                    report: member_id,
                    reason: "member does not exist".into(),
                })?;
        if member.is_retired() {
            return Err(LifecycleError::IneligibleForConsolidation {
                report: member_id,
                reason: format!("member already superseded ({})", member.status),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bushfire_types::{District, RowOwner};
    use chrono::Utc;

    fn actor() -> Actor {
        Actor::new("officer")
    }

    fn district() -> District {
        District::new("SWC", "Swan Coastal", "Swan")
    }

    fn state_with_reports(count: usize) -> (StoreState, Vec<ReportId>) {
        let mut state = StoreState::default();
        let ids = (0..count)
            .map(|_| state.create_report(district(), actor(), Utc::now()))
            .collect();
        (state, ids)
    }

    fn authorise(state: &mut StoreState, id: ReportId) {
        let report = state.report_mut(id).unwrap();
        report.status = ReportStatus::FinalAuthorised;
        report.area_ha = Some(30.0);
        report.final_boundary = true;
    }

    #[test]
    fn duplicate_marks_members_and_links_them_forward() {
        let (mut state, ids) = state_with_reports(3);
        let (primary, m1, m2) = (ids[0], ids[1], ids[2]);

        consolidate(
            &mut state,
            ConsolidationKind::Duplicate,
            primary,
            &[m1, m2],
            None,
            &actor(),
            Utc::now(),
        )
        .unwrap();

        let primary_number = state.report(primary).unwrap().number.clone();
        for member in [m1, m2] {
            let report = state.report(member).unwrap();
            assert_eq!(report.status, ReportStatus::Duplicated);
            assert_eq!(report.valid_report, Some(primary));
            assert_eq!(
                report.invalid_reason.as_deref(),
                Some(format!("Duplicate of {primary_number}").as_str())
            );
        }
        assert_eq!(state.report(primary).unwrap().status, ReportStatus::Initial);
    }

    #[test]
    fn merge_resets_primary_footprint_and_rolls_back_authorisation() {
        let (mut state, ids) = state_with_reports(2);
        let (primary, member) = (ids[0], ids[1]);
        authorise(&mut state, primary);
        state.add_area_burnt(RowOwner::Report(primary), "Crown land", 30.0, &actor());

        consolidate(
            &mut state,
            ConsolidationKind::Merge,
            primary,
            &[member],
            None,
            &actor(),
            Utc::now(),
        )
        .unwrap();

        let report = state.report(primary).unwrap();
        assert_eq!(report.status, ReportStatus::InitialAuthorised);
        assert!(report.area_ha.is_none());
        assert!(!report.final_boundary);
        assert_eq!(state.dependent_counts(RowOwner::Report(primary)).areas_burnt, 0);
        // The rollback recorded its final snapshot.
        assert!(
            state
                .latest_snapshot(primary, SnapshotPhase::Final)
                .is_some_and(|s| s.action == "delete_final_authorisation_consolidation")
        );
    }

    #[test]
    fn authorised_member_is_snapshotted_before_retirement() {
        let (mut state, ids) = state_with_reports(3);
        let (primary, m1, m2) = (ids[0], ids[1], ids[2]);
        authorise(&mut state, m1);

        consolidate(
            &mut state,
            ConsolidationKind::Merge,
            primary,
            &[m1, m2],
            None,
            &actor(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(state.report(m1).unwrap().status, ReportStatus::Merged);
        assert_eq!(state.report(m1).unwrap().valid_report, Some(primary));
        let finals: Vec<_> = state
            .snapshots_for(m1)
            .filter(|s| s.phase == SnapshotPhase::Final)
            .collect();
        assert_eq!(finals.len(), 1);
        // An unauthorised member retires without one.
        assert_eq!(state.snapshots_for(m2).count(), 0);
    }

    #[test]
    fn cascade_repoints_previously_consolidated_reports() {
        let (mut state, ids) = state_with_reports(3);
        let (oldest, middle, primary) = (ids[0], ids[1], ids[2]);

        consolidate(
            &mut state,
            ConsolidationKind::Duplicate,
            middle,
            &[oldest],
            None,
            &actor(),
            Utc::now(),
        )
        .unwrap();
        consolidate(
            &mut state,
            ConsolidationKind::Duplicate,
            primary,
            &[middle],
            None,
            &actor(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(state.report(oldest).unwrap().valid_report, Some(primary));
        assert_eq!(state.report(middle).unwrap().valid_report, Some(primary));
        assert!(state.report(primary).unwrap().valid_report.is_none());
    }

    #[test]
    fn retired_participants_are_rejected_by_name() {
        let (mut state, ids) = state_with_reports(3);
        let (primary, m1, m2) = (ids[0], ids[1], ids[2]);
        state.report_mut(m2).unwrap().status = ReportStatus::Invalidated;

        let err = consolidate(
            &mut state,
            ConsolidationKind::Merge,
            primary,
            &[m1, m2],
            None,
            &actor(),
            Utc::now(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            LifecycleError::IneligibleForConsolidation {
                report: m2,
                reason: "member already superseded (Invalidated)".into(),
            }
        );
        // Precondition failure stages nothing for the other member.
        assert_eq!(state.report(m1).unwrap().status, ReportStatus::Initial);
    }

    #[test]
    fn self_empty_and_duplicate_member_lists_are_rejected() {
        let (mut state, ids) = state_with_reports(2);
        let (primary, member) = (ids[0], ids[1]);

        for member_ids in [vec![], vec![primary], vec![member, member]] {
            let err = consolidate(
                &mut state,
                ConsolidationKind::Duplicate,
                primary,
                &member_ids,
                None,
                &actor(),
                Utc::now(),
            )
            .unwrap_err();
            assert!(matches!(
                err,
                LifecycleError::IneligibleForConsolidation { .. }
            ));
        }
    }

    #[test]
    fn custom_reason_overrides_generated_text() {
        let (mut state, ids) = state_with_reports(2);
        consolidate(
            &mut state,
            ConsolidationKind::Merge,
            ids[0],
            &[ids[1]],
            Some("same ignition, two crews".into()),
            &actor(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(
            state.report(ids[1]).unwrap().invalid_reason.as_deref(),
            Some("same ignition, two crews")
        );
    }
}
