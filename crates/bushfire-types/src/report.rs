use crate::actor::Actor;
use crate::district::District;
use crate::ids::ReportId;
use crate::report_number::ReportNumber;
use crate::status::ReportStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The mutable incident-report entity under lifecycle control.
/// Persistence-level struct: every field is a column.
///
/// Identity (`id`, `number`) is assigned once at first persist. Status moves
/// through the workflow monotonically except for the explicit
/// delete-authorisation / delete-review rollbacks. `valid_report` is the
/// forward link written by fork and consolidation when this record is
/// superseded; `None` means the record is authoritative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub number: ReportNumber,
    pub status: ReportStatus,
    pub district: District,

    // ── Initial-report fields ──
    pub name: Option<String>,
    pub duty_officer: Option<String>,
    pub cause: Option<String>,
    /// When the fire was first detected.
    pub detected_at: Option<DateTime<Utc>>,
    pub investigation_required: Option<bool>,
    /// Whether the primary agency dispatched resources. When `Some(true)`,
    /// `agency_dispatched_at` becomes mandatory for submission.
    pub agency_dispatched: Option<bool>,
    pub agency_dispatched_at: Option<DateTime<Utc>>,
    /// Report filed but no fire found on the ground. Relaxes most
    /// mandatory-field rules and blocks review.
    pub fire_not_found: bool,

    // ── Final-report fields ──
    pub area_ha: Option<f64>,
    /// Whether the final fire boundary has been captured.
    pub final_boundary: bool,
    pub no_damage_to_report: bool,
    pub no_injuries_to_report: bool,

    /// Correlation id in the external incident-registration system. Recorded
    /// only; the engine never calls out to obtain one. Cleared when the
    /// record is retired by a fork.
    pub external_incident_id: Option<String>,

    // ── Archive ──
    pub archived: bool,
    pub archived_at: Option<DateTime<Utc>>,

    // ── Invalidation / consolidation ──
    pub invalid_reason: Option<String>,
    /// Forward link to the record that superseded this one. Re-pointed by
    /// later forks and consolidations so every chain ends at a live record.
    pub valid_report: Option<ReportId>,
    /// Direct successor minted by the fork that retired this record, when
    /// the retirement was a fork. Never re-pointed afterwards: this is the
    /// marker that identifies the retirement event, which is the only event
    /// allowed to reclaim this record's report number.
    pub forked_into: Option<ReportId>,

    // ── Authorisation stamps ──
    pub initial_authorised_by: Option<Actor>,
    pub initial_authorised_at: Option<DateTime<Utc>>,
    pub final_authorised_by: Option<Actor>,
    pub final_authorised_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Actor>,
    pub reviewed_at: Option<DateTime<Utc>>,

    // ── Audit ──
    pub created_by: Actor,
    pub created_at: DateTime<Utc>,
    pub modified_by: Actor,
    pub modified_at: DateTime<Utc>,
}

impl Report {
    /// A fresh record in `Initial` status with all workflow fields clear.
    pub fn new(
        id: ReportId,
        number: ReportNumber,
        district: District,
        created_by: Actor,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            number,
            status: ReportStatus::Initial,
            district,
            name: None,
            duty_officer: None,
            cause: None,
            detected_at: None,
            investigation_required: None,
            agency_dispatched: None,
            agency_dispatched_at: None,
            fire_not_found: false,
            area_ha: None,
            final_boundary: false,
            no_damage_to_report: false,
            no_injuries_to_report: false,
            external_incident_id: None,
            archived: false,
            archived_at: None,
            invalid_reason: None,
            valid_report: None,
            forked_into: None,
            initial_authorised_by: None,
            initial_authorised_at: None,
            final_authorised_by: None,
            final_authorised_at: None,
            reviewed_by: None,
            reviewed_at: None,
            created_by: created_by.clone(),
            created_at: now,
            modified_by: created_by,
            modified_at: now,
        }
    }

    /// Stamp the audit trail for a persisted mutation.
    pub fn touch(&mut self, actor: &Actor, now: DateTime<Utc>) {
        self.modified_by = actor.clone();
        self.modified_at = now;
    }

    /// Whether this record has been superseded.
    pub fn is_retired(&self) -> bool {
        self.status.is_retired()
    }
}

/// Caller-supplied field edits, applied inside the same transaction as a
/// transition. Only fields present (`Some`) are written.
///
/// Deliberately has no district field: a district change retires the record
/// and must travel through the fork protocol, never through a transition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportEdits {
    pub name: Option<String>,
    pub duty_officer: Option<String>,
    pub cause: Option<String>,
    pub detected_at: Option<DateTime<Utc>>,
    pub investigation_required: Option<bool>,
    pub agency_dispatched: Option<bool>,
    pub agency_dispatched_at: Option<DateTime<Utc>>,
    pub fire_not_found: Option<bool>,
    pub area_ha: Option<f64>,
    pub final_boundary: Option<bool>,
    pub no_damage_to_report: Option<bool>,
    pub no_injuries_to_report: Option<bool>,
    pub external_incident_id: Option<String>,
}

impl ReportEdits {
    /// Write the present fields onto `report` and stamp the audit trail.
    pub fn apply(&self, report: &mut Report, actor: &Actor, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            report.name = Some(name.clone());
        }
        if let Some(duty_officer) = &self.duty_officer {
            report.duty_officer = Some(duty_officer.clone());
        }
        if let Some(cause) = &self.cause {
            report.cause = Some(cause.clone());
        }
        if let Some(detected_at) = self.detected_at {
            report.detected_at = Some(detected_at);
        }
        if let Some(investigation_required) = self.investigation_required {
            report.investigation_required = Some(investigation_required);
        }
        if let Some(agency_dispatched) = self.agency_dispatched {
            report.agency_dispatched = Some(agency_dispatched);
        }
        if let Some(agency_dispatched_at) = self.agency_dispatched_at {
            report.agency_dispatched_at = Some(agency_dispatched_at);
        }
        if let Some(fire_not_found) = self.fire_not_found {
            report.fire_not_found = fire_not_found;
        }
        if let Some(area_ha) = self.area_ha {
            report.area_ha = Some(area_ha);
        }
        if let Some(final_boundary) = self.final_boundary {
            report.final_boundary = final_boundary;
        }
        if let Some(no_damage_to_report) = self.no_damage_to_report {
            report.no_damage_to_report = no_damage_to_report;
        }
        if let Some(no_injuries_to_report) = self.no_injuries_to_report {
            report.no_injuries_to_report = no_injuries_to_report;
        }
        if let Some(external_incident_id) = &self.external_incident_id {
            report.external_incident_id = Some(external_incident_id.clone());
        }
        report.touch(actor, now);
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ReportId;

    fn report() -> Report {
        Report::new(
            ReportId(1),
            ReportNumber::new(2016, "SWC", 1),
            District::new("SWC", "Swan Coastal", "Swan"),
            Actor::new("creator"),
            Utc::now(),
        )
    }

    #[test]
    fn new_report_starts_initial_with_clear_workflow_fields() {
        let report = report();
        assert_eq!(report.status, ReportStatus::Initial);
        assert!(report.valid_report.is_none());
        assert!(report.forked_into.is_none());
        assert!(report.invalid_reason.is_none());
        assert!(report.initial_authorised_by.is_none());
        assert!(!report.archived);
        assert!(!report.final_boundary);
    }

    #[test]
    fn apply_writes_only_present_fields_and_stamps_modifier() {
        let mut report = report();
        let now = Utc::now();
        let edits = ReportEdits {
            investigation_required: Some(true),
            area_ha: Some(12.5),
            ..Default::default()
        };

        // Everything absent from the edits stays byte-for-byte as it was.
        let mut expected = report.clone();
        expected.investigation_required = Some(true);
        expected.area_ha = Some(12.5);
        expected.modified_by = Actor::new("editor");
        expected.modified_at = now;

        edits.apply(&mut report, &Actor::new("editor"), now);

        similar_asserts::assert_eq!(report, expected);
        assert_eq!(report.created_by, Actor::new("creator"));
    }

    #[test]
    fn empty_edits_report_as_empty() {
        assert!(ReportEdits::default().is_empty());
        let edits = ReportEdits {
            name: Some("x".into()),
            ..Default::default()
        };
        assert!(!edits.is_empty());
    }
}
