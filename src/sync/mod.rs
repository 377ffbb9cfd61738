//! Relationship consistency maintenance.
//!
//! Single-sided relationship writes enter as explicit mutation events; the
//! maintainer derives the reciprocal edits, applies them transactionally,
//! and surfaces contradictions instead of overwriting anyone's data.

mod event;
mod maintainer;

pub use event::{AppliedChange, MutationOp, RelationKind, RelationshipMutation};
pub use maintainer::{ConsistencyMaintainer, RepairReport};
