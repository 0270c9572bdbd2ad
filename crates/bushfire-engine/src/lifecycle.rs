//! Public entry points.
//!
//! [`Lifecycle`] wraps the store and exposes the four operations a caller
//! (the UI/API layer) drives: `transition`, `fork`, `consolidate`, and the
//! read-only `missing_fields` check, plus report creation. Each mutating
//! call is exactly one store transaction; timestamps are taken once per
//! call so every stamp inside a unit agrees.

use bushfire_types::{Actor, District, ReportEdits, ReportId, ReportStatus, RowOwner};
use chrono::Utc;

use crate::consolidate::{self, ConsolidationKind};
use crate::error::LifecycleError;
use crate::fork;
use crate::machine::{self, NotificationPlan, TransitionAction};
use crate::mandatory::{self, ValidatedAction};
use crate::store::Store;

/// The lifecycle engine over one store.
#[derive(Debug, Default)]
pub struct Lifecycle {
    store: Store,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct store access for reads and test seeding.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Create a fresh report in `Initial` status, minting its identity and
    /// report number, with the caller's initial field values applied.
    pub fn create_report(
        &self,
        district: District,
        edits: &ReportEdits,
        actor: &Actor,
    ) -> Result<ReportId, LifecycleError> {
        let now = Utc::now();
        self.store.atomically(|state| {
            let id = state.create_report(district.clone(), actor.clone(), now);
            edits.apply(state.report_mut(id)?, actor, now);
            Ok(id)
        })
    }

    /// Apply one named transition. `observed` is the status the caller last
    /// read; a mismatch with the persisted status fails the whole unit with
    /// `ConcurrentModification`.
    pub fn transition(
        &self,
        report_id: ReportId,
        action: TransitionAction,
        observed: ReportStatus,
        edits: &ReportEdits,
        actor: &Actor,
    ) -> Result<NotificationPlan, LifecycleError> {
        let now = Utc::now();
        self.store
            .atomically(|state| machine::transition(state, report_id, action, observed, edits, actor, now))
    }

    /// Retire `report_id` over a district change and fork its successor.
    /// Returns the successor's id.
    pub fn fork(
        &self,
        report_id: ReportId,
        new_district: District,
        edits: &ReportEdits,
        reason: Option<String>,
        actor: &Actor,
    ) -> Result<ReportId, LifecycleError> {
        let now = Utc::now();
        self.store.atomically(|state| {
            fork::fork(state, report_id, new_district.clone(), edits, reason.clone(), actor, now)
        })
    }

    /// Link members into a primary for merge or duplicate marking.
    pub fn consolidate(
        &self,
        kind: ConsolidationKind,
        primary_id: ReportId,
        member_ids: &[ReportId],
        reason: Option<String>,
        actor: &Actor,
    ) -> Result<(), LifecycleError> {
        let now = Utc::now();
        self.store.atomically(|state| {
            consolidate::consolidate(
                state,
                kind,
                primary_id,
                member_ids,
                reason.clone(),
                actor,
                now,
            )
        })
    }

    /// Read-only eligibility check: the ordered list of mandatory fields
    /// still missing for `action`. Empty means the transition would pass
    /// validation. Exposed so the caller can render a "cannot proceed"
    /// page without attempting the transition.
    pub fn missing_fields(
        &self,
        report_id: ReportId,
        action: ValidatedAction,
    ) -> Result<Vec<String>, LifecycleError> {
        self.store.read(|state| {
            let report = state.report(report_id)?;
            let counts = state.dependent_counts(RowOwner::Report(report_id));
            Ok(mandatory::missing_fields(report, &counts, action))
        })
    }
}
