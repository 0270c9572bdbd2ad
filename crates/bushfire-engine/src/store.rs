//! In-memory transactional store.
//!
//! The lifecycle protocol assumes a transactional relational store; its
//! internals are out of scope, so this module stands in with the smallest
//! thing that honours the protocol: one state struct holding every table,
//! and a copy-on-write transaction that either commits the whole unit or
//! leaves the state untouched.
//!
//! All mutation helpers live on [`StoreState`] so that every write path is
//! visible in one place; the engine modules are read-mostly callers that
//! compose these helpers inside a single [`Store::atomically`] unit.

use std::collections::BTreeMap;
use std::sync::RwLock;

use bushfire_types::{
    Actor, AreaBurnt, Damage, DependentCounts, District, Injury, Property, Report, ReportId,
    ReportNumber, RowId, RowOwner, Snapshot, SnapshotId, SnapshotPhase,
};
use chrono::{DateTime, Datelike, Utc};

use crate::error::LifecycleError;

/// Every table in the store, in one cloneable value.
///
/// `reports` is keyed by id with report-number uniqueness enforced on insert,
/// scoped to non-retired statuses. The four dependent-row tables are keyed by
/// [`RowId`] and carry their owner in the row itself, so re-homing a
/// collection is a rewrite of owner fields, never a copy.
#[derive(Clone, Debug, Default)]
pub struct StoreState {
    next_report: u64,
    next_snapshot: u64,
    next_row: u64,
    reports: BTreeMap<ReportId, Report>,
    snapshots: BTreeMap<SnapshotId, Snapshot>,
    areas_burnt: BTreeMap<RowId, AreaBurnt>,
    damages: BTreeMap<RowId, Damage>,
    injuries: BTreeMap<RowId, Injury>,
    properties: BTreeMap<RowId, Property>,
}

impl StoreState {
    // ── Reports ──

    pub fn report(&self, id: ReportId) -> Result<&Report, LifecycleError> {
        self.reports
            .get(&id)
            .ok_or(LifecycleError::ReportNotFound(id))
    }

    pub fn report_mut(&mut self, id: ReportId) -> Result<&mut Report, LifecycleError> {
        self.reports
            .get_mut(&id)
            .ok_or(LifecycleError::ReportNotFound(id))
    }

    pub fn reports(&self) -> impl Iterator<Item = &Report> {
        self.reports.values()
    }

    /// Mint identity and number for a fresh record and insert it.
    pub fn create_report(
        &mut self,
        district: District,
        created_by: Actor,
        now: DateTime<Utc>,
    ) -> ReportId {
        let number = self.mint_number(&district.code, now.year() as u16);
        let id = self.next_report_id();
        let report = Report::new(id, number, district, created_by, now);
        self.insert_report(report);
        id
    }

    /// Next free report number for a district and year.
    ///
    /// The scan includes retired records: a retired number may only ever be
    /// reassigned through the fork placeholder-reuse path, never re-minted.
    pub fn mint_number(&self, district_code: &str, year: u16) -> ReportNumber {
        let next_sequence = self
            .reports
            .values()
            .filter(|r| r.number.district_code() == district_code && r.number.year() == year)
            .map(|r| r.number.sequence())
            .max()
            .unwrap_or(0)
            + 1;
        ReportNumber::new(year, district_code, next_sequence)
    }

    pub fn next_report_id(&mut self) -> ReportId {
        self.next_report += 1;
        ReportId(self.next_report)
    }

    /// Insert a report row. Report numbers must be unique among non-retired
    /// records; a collision here is a protocol bug upstream, not caller input.
    pub fn insert_report(&mut self, report: Report) {
        debug_assert!(
            report.is_retired()
                || !self
                    .reports
                    .values()
                    .any(|r| !r.is_retired() && r.number == report.number),
            "duplicate live report number {}",
            report.number,
        );
        self.reports.insert(report.id, report);
    }

    /// Re-point every report whose `valid_report` links to `from` so that it
    /// links to `to`, preserving the retirement chain's terminal target.
    /// `to` must be a live record, which keeps the chain acyclic: a live
    /// record has no forward link of its own.
    pub fn repoint_valid_links(&mut self, from: ReportId, to: ReportId) {
        for report in self.reports.values_mut() {
            if report.valid_report == Some(from) {
                report.valid_report = Some(to);
            }
        }
    }

    /// Delete a report row outright. Used only for the fork protocol's
    /// placeholder-sibling removal; live records are retired, never deleted.
    pub fn remove_report(&mut self, id: ReportId) {
        self.reports.remove(&id);
        let owner = RowOwner::Report(id);
        self.areas_burnt.retain(|_, row| row.owner != owner);
        self.damages.retain(|_, row| row.owner != owner);
        self.injuries.retain(|_, row| row.owner != owner);
        self.properties.retain(|_, row| row.owner != owner);
    }

    // ── Snapshots ──

    pub fn insert_snapshot(
        &mut self,
        report_id: ReportId,
        phase: SnapshotPhase,
        action: impl Into<String>,
        taken_by: Actor,
        taken_at: DateTime<Utc>,
        report: Report,
    ) -> SnapshotId {
        self.next_snapshot += 1;
        let id = SnapshotId(self.next_snapshot);
        self.snapshots.insert(
            id,
            Snapshot {
                id,
                report_id,
                phase,
                action: action.into(),
                taken_by,
                taken_at,
                report,
            },
        );
        id
    }

    pub fn snapshots_for(&self, report_id: ReportId) -> impl Iterator<Item = &Snapshot> {
        self.snapshots
            .values()
            .filter(move |s| s.report_id == report_id)
    }

    /// The authoritative snapshot of a phase: latest by capture time, ties
    /// broken by id (insertion order).
    pub fn latest_snapshot(&self, report_id: ReportId, phase: SnapshotPhase) -> Option<&Snapshot> {
        self.snapshots_for(report_id)
            .filter(|s| s.phase == phase)
            .max_by_key(|s| (s.taken_at, s.id))
    }

    /// Re-home every historical snapshot of `from` onto `to`.
    /// History follows the living record across a fork.
    pub fn rehome_snapshots(&mut self, from: ReportId, to: ReportId) {
        for snapshot in self.snapshots.values_mut() {
            if snapshot.report_id == from {
                snapshot.report_id = to;
            }
        }
    }

    // ── Dependent collections ──

    pub fn next_row_id(&mut self) -> RowId {
        self.next_row += 1;
        RowId(self.next_row)
    }

    pub fn add_area_burnt(&mut self, owner: RowOwner, tenure: &str, area_ha: f64, actor: &Actor) {
        let id = self.next_row_id();
        self.areas_burnt.insert(
            id,
            AreaBurnt {
                owner,
                tenure: tenure.to_string(),
                area_ha,
                created_by: actor.clone(),
                modified_by: actor.clone(),
            },
        );
    }

    pub fn add_damage(&mut self, owner: RowOwner, kind: &str, count: u32, actor: &Actor) {
        let id = self.next_row_id();
        self.damages.insert(
            id,
            Damage {
                owner,
                kind: kind.to_string(),
                count,
                created_by: actor.clone(),
                modified_by: actor.clone(),
            },
        );
    }

    pub fn add_injury(&mut self, owner: RowOwner, kind: &str, count: u32, actor: &Actor) {
        let id = self.next_row_id();
        self.injuries.insert(
            id,
            Injury {
                owner,
                kind: kind.to_string(),
                count,
                created_by: actor.clone(),
                modified_by: actor.clone(),
            },
        );
    }

    pub fn add_property(
        &mut self,
        owner: RowOwner,
        key: &str,
        value: serde_json::Value,
        actor: &Actor,
    ) {
        let id = self.next_row_id();
        self.properties.insert(
            id,
            Property {
                owner,
                key: key.to_string(),
                value,
                created_by: actor.clone(),
                modified_by: actor.clone(),
            },
        );
    }

    pub fn areas_burnt(&self, owner: RowOwner) -> impl Iterator<Item = &AreaBurnt> {
        self.areas_burnt.values().filter(move |r| r.owner == owner)
    }

    pub fn damages(&self, owner: RowOwner) -> impl Iterator<Item = &Damage> {
        self.damages.values().filter(move |r| r.owner == owner)
    }

    pub fn injuries(&self, owner: RowOwner) -> impl Iterator<Item = &Injury> {
        self.injuries.values().filter(move |r| r.owner == owner)
    }

    pub fn properties(&self, owner: RowOwner) -> impl Iterator<Item = &Property> {
        self.properties.values().filter(move |r| r.owner == owner)
    }

    /// Row counts across all four collections for one owner.
    pub fn dependent_counts(&self, owner: RowOwner) -> DependentCounts {
        DependentCounts {
            areas_burnt: self.areas_burnt(owner).count(),
            damages: self.damages(owner).count(),
            injuries: self.injuries(owner).count(),
            properties: self.properties(owner).count(),
        }
    }

    /// Move (not copy) every dependent row of one report to another.
    /// Used by the fork protocol: the retiring record no longer needs them.
    pub fn rehome_dependents(&mut self, from: ReportId, to: ReportId) {
        let from = RowOwner::Report(from);
        let to = RowOwner::Report(to);
        for row in self.areas_burnt.values_mut() {
            if row.owner == from {
                row.owner = to;
            }
        }
        for row in self.damages.values_mut() {
            if row.owner == from {
                row.owner = to;
            }
        }
        for row in self.injuries.values_mut() {
            if row.owner == from {
                row.owner = to;
            }
        }
        for row in self.properties.values_mut() {
            if row.owner == from {
                row.owner = to;
            }
        }
    }

    /// Delete a report's burnt-area rows. Used by merge: the primary's
    /// spatial footprint is recomputed externally from the union.
    pub fn clear_areas_burnt(&mut self, report_id: ReportId) {
        let owner = RowOwner::Report(report_id);
        self.areas_burnt.retain(|_, row| row.owner != owner);
    }
}

/// Handle over the shared state. One write lock serialises every atomic
/// unit, so two units touching the same report can never interleave; this is
/// also what keeps fork and consolidation mutually exclusive on a record.
#[derive(Debug, Default)]
pub struct Store {
    state: RwLock<StoreState>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one all-or-nothing unit.
    ///
    /// The closure mutates a clone of the state; the clone replaces the
    /// state only when the closure returns `Ok`. On `Err` every staged
    /// write is discarded, so callers observe "nothing happened" or
    /// "fully applied" and never a partial unit.
    pub fn atomically<T>(
        &self,
        op: impl FnOnce(&mut StoreState) -> Result<T, LifecycleError>,
    ) -> Result<T, LifecycleError> {
        let mut guard = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut draft = guard.clone();
        let out = op(&mut draft)?;
        *guard = draft;
        Ok(out)
    }

    /// Read-only access to current committed state.
    pub fn read<T>(&self, op: impl FnOnce(&StoreState) -> T) -> T {
        let guard = match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        op(&guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bushfire_types::ReportStatus;

    fn district() -> District {
        District::new("SWC", "Swan Coastal", "Swan")
    }

    fn actor() -> Actor {
        Actor::new("tester")
    }

    #[test]
    fn create_report_mints_sequential_numbers_per_district_and_year() {
        let mut state = StoreState::default();
        let now = Utc::now();
        let a = state.create_report(district(), actor(), now);
        let b = state.create_report(district(), actor(), now);
        let c = state.create_report(District::new("PHS", "Perth Hills", "Swan"), actor(), now);

        assert_eq!(state.report(a).unwrap().number.sequence(), 1);
        assert_eq!(state.report(b).unwrap().number.sequence(), 2);
        assert_eq!(state.report(c).unwrap().number.sequence(), 1);
        assert_eq!(state.report(c).unwrap().number.district_code(), "PHS");
    }

    #[test]
    fn failed_unit_leaves_no_trace() {
        let store = Store::new();
        let id = store
            .atomically(|state| Ok(state.create_report(district(), actor(), Utc::now())))
            .unwrap();

        let result: Result<(), _> = store.atomically(|state| {
            state.report_mut(id)?.status = ReportStatus::InitialAuthorised;
            state.add_damage(RowOwner::Report(id), "Fences", 3, &actor());
            Err(LifecycleError::ReportNotFound(ReportId(9999)))
        });

        assert!(result.is_err());
        store.read(|state| {
            assert_eq!(state.report(id).unwrap().status, ReportStatus::Initial);
            assert_eq!(state.dependent_counts(RowOwner::Report(id)).total(), 0);
        });
    }

    #[test]
    fn rehome_moves_rows_without_copying() {
        let mut state = StoreState::default();
        let now = Utc::now();
        let a = state.create_report(district(), actor(), now);
        let b = state.create_report(district(), actor(), now);
        state.add_damage(RowOwner::Report(a), "Sheds", 1, &actor());
        state.add_injury(RowOwner::Report(a), "Minor burns", 2, &actor());

        state.rehome_dependents(a, b);

        assert_eq!(state.dependent_counts(RowOwner::Report(a)).total(), 0);
        assert_eq!(state.dependent_counts(RowOwner::Report(b)).total(), 2);
    }

    #[test]
    fn latest_snapshot_prefers_newest_of_requested_phase() {
        let mut state = StoreState::default();
        let now = Utc::now();
        let id = state.create_report(district(), actor(), now);
        let report = state.report(id).unwrap().clone();

        state.insert_snapshot(
            id,
            SnapshotPhase::Initial,
            "submit",
            actor(),
            now,
            report.clone(),
        );
        let later = now + chrono::Duration::seconds(5);
        let newest = state.insert_snapshot(
            id,
            SnapshotPhase::Final,
            "authorise",
            actor(),
            later,
            report.clone(),
        );
        state.insert_snapshot(id, SnapshotPhase::Final, "authorise", actor(), now, report);

        let authoritative = state.latest_snapshot(id, SnapshotPhase::Final).unwrap();
        assert_eq!(authoritative.id, newest);
        assert_eq!(state.snapshots_for(id).count(), 3);
    }
}
