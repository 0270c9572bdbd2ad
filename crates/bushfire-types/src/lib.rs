pub mod actor;
pub mod collections;
pub mod district;
pub mod error;
pub mod ids;
pub mod report;
pub mod report_number;
pub mod snapshot;
pub mod status;

pub use actor::Actor;
pub use collections::{AreaBurnt, Damage, DependentCounts, Injury, Property, RowOwner};
pub use district::District;
pub use error::DomainError;
pub use ids::{ReportId, RowId, SnapshotId};
pub use report::{Report, ReportEdits};
pub use report_number::ReportNumber;
pub use snapshot::{Snapshot, SnapshotPhase};
pub use status::{ReportStatus, StatusFilter};
