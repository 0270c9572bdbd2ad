//! Bushfire report lifecycle engine.
//!
//! The core of the reporting system: the status machine that moves a report
//! through submission, authorisation and review; the snapshot engine that
//! freezes the authorised view at each boundary; the fork protocol that
//! retires a record over a district change; and the consolidation linker
//! for merge/duplicate marking. Everything mutates through one
//! transactional store, one all-or-nothing unit per operation.
//!
//! Rendering, spatial computation, notification delivery and external
//! incident registration are the caller's collaborators; the engine only
//! returns intents describing them.

pub mod consolidate;
pub mod error;
pub mod fork;
pub mod lifecycle;
pub mod machine;
pub mod mandatory;
pub mod snapshot;
pub mod store;

pub use consolidate::ConsolidationKind;
pub use error::LifecycleError;
pub use lifecycle::Lifecycle;
pub use machine::{AuthRollback, NotificationIntent, NotificationPlan, TransitionAction};
pub use mandatory::ValidatedAction;
pub use store::{Store, StoreState};
