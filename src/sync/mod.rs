pub mod reconcile;
pub mod report;

pub use reconcile::Reconciler;
pub use report::{EntityKind, PhaseReport, SkipReason, SkippedEntity, SyncFailure, SyncReport};
