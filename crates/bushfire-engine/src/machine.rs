//! The status machine.
//!
//! One function, [`transition`], validates and applies a named transition:
//! optimistic-concurrency re-check against the persisted status, legality
//! check for the action, caller edits, mandatory-field validation at the
//! authorisation boundaries, the transition's field effects, and the
//! boundary snapshot. Everything runs against the caller's open store
//! transaction, so a rejected transition stages nothing.
//!
//! The machine returns a [`NotificationPlan`]: tagged intents describing
//! which downstream side effects the caller should attempt. Delivery is an
//! external collaborator's job; the engine never sends anything.

use bushfire_types::{
    Actor, Report, ReportEdits, ReportId, ReportNumber, ReportStatus, RowOwner, SnapshotPhase,
};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::LifecycleError;
use crate::mandatory::{self, ValidatedAction};
use crate::snapshot;
use crate::store::StoreState;

/// Why a final authorisation is being rolled back. The three variants are
/// the three action labels the rollback is recorded under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthRollback {
    /// An authorising officer withdrew the authorisation.
    Manual,
    /// The fire boundary was re-uploaded after authorisation.
    BoundaryEdited,
    /// A merge consolidation reset the primary's spatial footprint.
    Consolidation,
}

/// A named lifecycle transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionAction {
    Submit,
    Authorise,
    MarkReviewed,
    DeleteReview,
    DeleteFinalAuthorisation(AuthRollback),
    Archive,
    Unarchive,
}

impl TransitionAction {
    /// Action label recorded on snapshots and in rejection errors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Authorise => "authorise",
            Self::MarkReviewed => "review",
            Self::DeleteReview => "delete_review",
            Self::DeleteFinalAuthorisation(AuthRollback::Manual) => "delete_final_authorisation",
            Self::DeleteFinalAuthorisation(AuthRollback::BoundaryEdited) => {
                "delete_final_authorisation_boundary_edited"
            }
            Self::DeleteFinalAuthorisation(AuthRollback::Consolidation) => {
                "delete_final_authorisation_consolidation"
            }
            Self::Archive => "archive",
            Self::Unarchive => "unarchive",
        }
    }
}

/// One downstream side effect the caller should attempt after a successful
/// transition. Intents are descriptions, not calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationIntent {
    /// Email the duty roster that an initial report was submitted.
    NotifyDutyRoster { report: ReportNumber },
    /// Notify police: the submitted report requires investigation.
    NotifyPoliceInvestigation { report: ReportNumber },
    /// Register the incident with the external incident system and write
    /// the correlation id back via a later edit.
    RegisterExternalIncident { report: ReportId },
}

/// Ordered side-effect intents for the caller.
pub type NotificationPlan = Vec<NotificationIntent>;

/// Validate and apply `action` to `report_id`.
///
/// `observed` is the status the caller last read; if the persisted status
/// differs the whole operation fails with `ConcurrentModification` before
/// anything is staged. Edits are applied before mandatory-field validation
/// so a caller can correct input and transition in one unit.
pub fn transition(
    state: &mut StoreState,
    report_id: ReportId,
    action: TransitionAction,
    observed: ReportStatus,
    edits: &ReportEdits,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<NotificationPlan, LifecycleError> {
    let persisted = state.report(report_id)?.status;
    if persisted != observed {
        return Err(LifecycleError::ConcurrentModification {
            report: report_id,
            observed,
            found: persisted,
        });
    }
    check_precondition(state.report(report_id)?, action)?;

    {
        let report = state.report_mut(report_id)?;
        edits.apply(report, actor, now);
    }
    validate_mandatory(state, report_id, action)?;

    let plan = apply_effects(state, report_id, action, actor, now)?;
    let report = state.report(report_id)?;
    info!(
        %report_id,
        number = %report.number,
        action = action.label(),
        status = %report.status,
        "transition applied"
    );
    Ok(plan)
}

/// Legality of `action` from the report's persisted state.
///
/// Status gating plus the review-specific field preconditions (a review
/// needs a burnt area, a final boundary, and an actual fire).
fn check_precondition(report: &Report, action: TransitionAction) -> Result<(), LifecycleError> {
    let status = report.status;
    let legal = match action {
        TransitionAction::Submit => status == ReportStatus::Initial,
        TransitionAction::Authorise => status == ReportStatus::InitialAuthorised,
        TransitionAction::MarkReviewed => {
            status == ReportStatus::FinalAuthorised
                && report.area_ha.is_some()
                && report.final_boundary
                && !report.fire_not_found
        }
        TransitionAction::DeleteReview => status == ReportStatus::Reviewed,
        TransitionAction::DeleteFinalAuthorisation(_) => status == ReportStatus::FinalAuthorised,
        TransitionAction::Archive => status.at_least_final_authorised() && !report.archived,
        TransitionAction::Unarchive => report.archived,
    };
    if legal {
        Ok(())
    } else {
        Err(LifecycleError::invalid(action.label(), status))
    }
}

/// Run the action's mandatory-field table, if it has one.
fn validate_mandatory(
    state: &StoreState,
    report_id: ReportId,
    action: TransitionAction,
) -> Result<(), LifecycleError> {
    let validated = match action {
        TransitionAction::Submit => ValidatedAction::Submit,
        TransitionAction::Authorise => ValidatedAction::Authorise,
        _ => return Ok(()),
    };
    let report = state.report(report_id)?;
    let counts = state.dependent_counts(RowOwner::Report(report_id));
    let fields = mandatory::missing_fields(report, &counts, validated);
    if fields.is_empty() {
        Ok(())
    } else {
        Err(LifecycleError::MissingMandatoryFields { fields })
    }
}

/// The transition's field effects plus its boundary snapshot.
/// Preconditions have already passed; this only writes.
fn apply_effects(
    state: &mut StoreState,
    report_id: ReportId,
    action: TransitionAction,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<NotificationPlan, LifecycleError> {
    match action {
        TransitionAction::Submit => {
            {
                let report = state.report_mut(report_id)?;
                report.status = ReportStatus::InitialAuthorised;
                report.initial_authorised_by = Some(actor.clone());
                report.initial_authorised_at = Some(now);
                // The authorised record starts its final phase clean.
                report.area_ha = None;
                report.final_boundary = false;
                report.touch(actor, now);
            }
            snapshot::take(state, report_id, SnapshotPhase::Initial, action.label(), now)?;

            let report = state.report(report_id)?;
            let mut plan = vec![NotificationIntent::NotifyDutyRoster {
                report: report.number.clone(),
            }];
            if report.investigation_required == Some(true) {
                plan.push(NotificationIntent::NotifyPoliceInvestigation {
                    report: report.number.clone(),
                });
            }
            if report.external_incident_id.is_none() {
                plan.push(NotificationIntent::RegisterExternalIncident { report: report_id });
            }
            Ok(plan)
        }
        TransitionAction::Authorise => {
            {
                let report = state.report_mut(report_id)?;
                report.status = ReportStatus::FinalAuthorised;
                report.final_authorised_by = Some(actor.clone());
                report.final_authorised_at = Some(now);
                report.touch(actor, now);
            }
            snapshot::take(state, report_id, SnapshotPhase::Final, action.label(), now)?;
            Ok(Vec::new())
        }
        TransitionAction::MarkReviewed => {
            {
                let report = state.report_mut(report_id)?;
                report.status = ReportStatus::Reviewed;
                report.reviewed_by = Some(actor.clone());
                report.reviewed_at = Some(now);
                report.touch(actor, now);
            }
            snapshot::take(state, report_id, SnapshotPhase::Final, action.label(), now)?;
            Ok(Vec::new())
        }
        TransitionAction::DeleteReview => {
            {
                let report = state.report_mut(report_id)?;
                report.status = ReportStatus::FinalAuthorised;
                report.reviewed_by = None;
                report.reviewed_at = None;
                report.touch(actor, now);
            }
            snapshot::take(state, report_id, SnapshotPhase::Final, action.label(), now)?;
            Ok(Vec::new())
        }
        TransitionAction::DeleteFinalAuthorisation(_) => {
            rollback_final_authorisation(state, report_id, action.label(), actor, now)?;
            Ok(Vec::new())
        }
        TransitionAction::Archive => {
            let report = state.report_mut(report_id)?;
            report.archived = true;
            report.archived_at = Some(now);
            report.touch(actor, now);
            Ok(Vec::new())
        }
        TransitionAction::Unarchive => {
            let report = state.report_mut(report_id)?;
            report.archived = false;
            report.archived_at = None;
            report.touch(actor, now);
            Ok(Vec::new())
        }
    }
}

/// Roll a finally-authorised report back to initial-authorised.
///
/// Clears the final authorisation stamps, any review stamps, the boundary
/// flag when no area figure remains, and the archive flag; then takes the
/// final-phase snapshot recording the rollback. Shared with the merge path,
/// which rolls back an authorised primary before resetting its footprint.
pub(crate) fn rollback_final_authorisation(
    state: &mut StoreState,
    report_id: ReportId,
    label: &str,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    {
        let report = state.report_mut(report_id)?;
        report.status = ReportStatus::InitialAuthorised;
        report.final_authorised_by = None;
        report.final_authorised_at = None;
        if report.reviewed_by.is_some() || report.reviewed_at.is_some() {
            report.reviewed_by = None;
            report.reviewed_at = None;
        }
        if report.area_ha.is_none() {
            report.final_boundary = false;
        }
        if report.archived {
            report.archived = false;
            report.archived_at = None;
        }
        report.touch(actor, now);
    }
    snapshot::take(state, report_id, SnapshotPhase::Final, label, now)?;
    Ok(())
}
