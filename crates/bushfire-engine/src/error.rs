use bushfire_types::{ReportId, ReportStatus};

/// Rejection taxonomy for lifecycle operations.
///
/// Every variant is an expected, recoverable-by-the-caller condition: the
/// caller shows the structured detail to a human, who corrects input and
/// retries. Partial application is never an error kind — any failure inside
/// an atomic unit rolls the whole unit back.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// The requested action is not legal from the report's current status.
    #[error("action '{action}' is not legal from status '{status}'")]
    InvalidTransition { action: String, status: ReportStatus },

    /// The persisted status changed between the caller's read and the write.
    /// Surface to a human; they re-load and retry. The engine never retries.
    #[error("{report}: persisted status '{found}' no longer matches observed status '{observed}'")]
    ConcurrentModification {
        report: ReportId,
        observed: ReportStatus,
        found: ReportStatus,
    },

    /// Mandatory fields for the attempted action are not populated.
    /// Carries the ordered list of human-readable field labels.
    #[error("mandatory fields missing: {}", fields.join(", "))]
    MissingMandatoryFields { fields: Vec<String> },

    /// A consolidation primary or member fails the "must exist and not be
    /// already superseded" precondition.
    #[error("{report} is not eligible for consolidation: {reason}")]
    IneligibleForConsolidation { report: ReportId, reason: String },

    /// Fork attempted on a record that cannot be retired (already superseded).
    #[error("{report} cannot be invalidated: {reason}")]
    NotInvalidatable { report: ReportId, reason: String },

    /// No report row exists for the given id.
    #[error("{0} does not exist")]
    ReportNotFound(ReportId),
}

impl LifecycleError {
    /// Shorthand used by every precondition check.
    pub(crate) fn invalid(action: &str, status: ReportStatus) -> Self {
        Self::InvalidTransition {
            action: action.to_string(),
            status,
        }
    }
}
