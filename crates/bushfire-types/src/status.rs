use serde::{Deserialize, Serialize};

/// Stored report status. Ordinal values advance monotonically through the
/// authorisation workflow except for the explicit delete-authorisation and
/// delete-review rollbacks.
///
/// `Invalidated`, `Merged` and `Duplicated` are terminal: the record has been
/// superseded and its `valid_report` link points at its successor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    Initial = 1,
    InitialAuthorised = 2,
    FinalAuthorised = 3,
    Reviewed = 4,
    Invalidated = 5,
    Merged = 100,
    Duplicated = 101,
}

impl ReportStatus {
    /// Whether the record has been superseded (invalidated, merged or
    /// duplicated). Retired records never transition again and their report
    /// number no longer participates in the uniqueness constraint.
    pub fn is_retired(&self) -> bool {
        matches!(self, Self::Invalidated | Self::Merged | Self::Duplicated)
    }

    /// Whether the report has passed the final authorisation boundary.
    /// Retired statuses are not "authorised" in any sense.
    pub fn at_least_final_authorised(&self) -> bool {
        matches!(self, Self::FinalAuthorised | Self::Reviewed)
    }

    /// Whether the report has passed the initial authorisation boundary.
    pub fn at_least_initial_authorised(&self) -> bool {
        matches!(
            self,
            Self::InitialAuthorised | Self::FinalAuthorised | Self::Reviewed
        )
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial => write!(f, "Initial"),
            Self::InitialAuthorised => write!(f, "Initial Authorised"),
            Self::FinalAuthorised => write!(f, "Final Authorised"),
            Self::Reviewed => write!(f, "Reviewed"),
            Self::Invalidated => write!(f, "Invalidated"),
            Self::Merged => write!(f, "Merged"),
            Self::Duplicated => write!(f, "Duplicated"),
        }
    }
}

/// Query-side status filter. Extends the stored statuses with
/// `MissingFinal` — "initial-authorised but never finally authorised" —
/// which is a list-filter value only and is never persisted on a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusFilter {
    Stored(ReportStatus),
    MissingFinal,
}

impl StatusFilter {
    /// Whether a report with the given stored status matches this filter.
    pub fn matches(&self, status: ReportStatus) -> bool {
        match self {
            Self::Stored(wanted) => status == *wanted,
            Self::MissingFinal => status == ReportStatus::InitialAuthorised,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retired_statuses_are_exactly_the_superseded_ones() {
        assert!(ReportStatus::Invalidated.is_retired());
        assert!(ReportStatus::Merged.is_retired());
        assert!(ReportStatus::Duplicated.is_retired());
        assert!(!ReportStatus::Initial.is_retired());
        assert!(!ReportStatus::InitialAuthorised.is_retired());
        assert!(!ReportStatus::FinalAuthorised.is_retired());
        assert!(!ReportStatus::Reviewed.is_retired());
    }

    #[test]
    fn final_authorisation_boundary_excludes_retired() {
        assert!(ReportStatus::FinalAuthorised.at_least_final_authorised());
        assert!(ReportStatus::Reviewed.at_least_final_authorised());
        assert!(!ReportStatus::Merged.at_least_final_authorised());
        assert!(!ReportStatus::InitialAuthorised.at_least_final_authorised());
    }

    #[test]
    fn missing_final_filter_selects_only_initial_authorised() {
        let filter = StatusFilter::MissingFinal;
        assert!(filter.matches(ReportStatus::InitialAuthorised));
        assert!(!filter.matches(ReportStatus::Initial));
        assert!(!filter.matches(ReportStatus::FinalAuthorised));
        assert!(!filter.matches(ReportStatus::Reviewed));
    }

    #[test]
    fn display_labels_match_workflow_wording() {
        assert_eq!(ReportStatus::InitialAuthorised.to_string(), "Initial Authorised");
        assert_eq!(ReportStatus::Reviewed.to_string(), "Reviewed");
    }
}
