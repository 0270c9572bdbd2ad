//! Mandatory-field validation.
//!
//! Pure rule evaluation: no state, no side effects. Each authorisation
//! boundary has a fixed, ordered rule table; a transition is eligible only
//! when its table reports nothing missing. Rules are data, not generated
//! types — the tables below are the complete requirement set.
//!
//! "Fire not found" reports are a special case: the field crew confirmed
//! there was nothing on the ground, so cause and the final-report
//! collections are exempt while the identifying fields stay mandatory.

use bushfire_types::{DependentCounts, Report};

/// Actions with a mandatory-field rule set. The remaining transitions
/// (review, rollbacks, archive) gate on status and specific fields in the
/// status machine itself, not on a rule table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidatedAction {
    /// Initial authorisation boundary (`submit`).
    Submit,
    /// Final authorisation boundary (`authorise`).
    Authorise,
}

/// One scalar-field requirement.
///
/// `missing` is the violation predicate: true when the field is not
/// populated. `exempt_when_fire_not_found` drops the rule for
/// fire-not-found reports.
struct FieldRule {
    label: &'static str,
    missing: fn(&Report) -> bool,
    exempt_when_fire_not_found: bool,
}

/// One dependent-collection requirement, evaluated against row counts.
struct CollectionRule {
    label: &'static str,
    missing: fn(&Report, &DependentCounts) -> bool,
    exempt_when_fire_not_found: bool,
}

/// Scalar requirements for `submit`, in reporting order.
const SUBMIT_FIELDS: &[FieldRule] = &[
    FieldRule {
        label: "Name",
        missing: |r| r.name.is_none(),
        exempt_when_fire_not_found: false,
    },
    FieldRule {
        label: "Fire Detected Date",
        missing: |r| r.detected_at.is_none(),
        exempt_when_fire_not_found: false,
    },
    FieldRule {
        label: "Duty Officer",
        missing: |r| r.duty_officer.is_none(),
        exempt_when_fire_not_found: false,
    },
    FieldRule {
        label: "Investigation Required",
        missing: |r| r.investigation_required.is_none(),
        exempt_when_fire_not_found: false,
    },
    FieldRule {
        label: "Cause",
        missing: |r| r.cause.is_none(),
        exempt_when_fire_not_found: true,
    },
    // Conditional: only when the primary agency reported a dispatch.
    FieldRule {
        label: "Dispatch Time",
        missing: |r| r.agency_dispatched == Some(true) && r.agency_dispatched_at.is_none(),
        exempt_when_fire_not_found: false,
    },
];

/// Scalar requirements for `authorise`, in reporting order.
const AUTHORISE_FIELDS: &[FieldRule] = &[
    FieldRule {
        label: "Area Burnt",
        missing: |r| r.area_ha.is_none(),
        exempt_when_fire_not_found: true,
    },
    FieldRule {
        label: "Final Fire Boundary",
        missing: |r| !r.final_boundary,
        exempt_when_fire_not_found: true,
    },
    FieldRule {
        label: "Investigation Required",
        missing: |r| r.investigation_required.is_none(),
        exempt_when_fire_not_found: false,
    },
];

/// Collection requirements for `authorise`, in reporting order. `submit`
/// has none: damage, injury and burnt-area figures are final-report data.
const AUTHORISE_COLLECTIONS: &[CollectionRule] = &[
    CollectionRule {
        label: "Burnt Area by Tenure",
        missing: |_, counts| counts.areas_burnt == 0,
        exempt_when_fire_not_found: true,
    },
    CollectionRule {
        label: "Damage Entries",
        missing: |r, counts| !r.no_damage_to_report && counts.damages == 0,
        exempt_when_fire_not_found: true,
    },
    CollectionRule {
        label: "Injury Entries",
        missing: |r, counts| !r.no_injuries_to_report && counts.injuries == 0,
        exempt_when_fire_not_found: true,
    },
];

/// Evaluate the rule table for `action` against a report and its current
/// dependent-row counts.
///
/// Returns the ordered list of human-readable labels for everything still
/// missing; empty means the report is eligible for the action.
pub fn missing_fields(
    report: &Report,
    counts: &DependentCounts,
    action: ValidatedAction,
) -> Vec<String> {
    let (fields, collections): (&[FieldRule], &[CollectionRule]) = match action {
        ValidatedAction::Submit => (SUBMIT_FIELDS, &[]),
        ValidatedAction::Authorise => (AUTHORISE_FIELDS, AUTHORISE_COLLECTIONS),
    };

    let mut missing = Vec::new();
    for rule in fields {
        if report.fire_not_found && rule.exempt_when_fire_not_found {
            continue;
        }
        if (rule.missing)(report) {
            missing.push(rule.label.to_string());
        }
    }
    for rule in collections {
        if report.fire_not_found && rule.exempt_when_fire_not_found {
            continue;
        }
        if (rule.missing)(report, counts) {
            missing.push(rule.label.to_string());
        }
    }
    missing
}
