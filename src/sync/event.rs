//! Relationship mutation events.
//!
//! Every relationship change flows through the engine as an explicit event:
//! {subject, relation kind, target, operation}. Reciprocal changes are
//! events too, so a caller can audit exactly what a write rippled into
//! rather than discovering side effects after the fact.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::person::PersonId;

/// Which relationship field an event touches on the subject record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Father,
    Mother,
    Spouse,
    Child,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationKind::Father => "father",
            RelationKind::Mother => "mother",
            RelationKind::Spouse => "spouse",
            RelationKind::Child => "child",
        };
        write!(f, "{name}")
    }
}

/// Whether a relationship is being asserted or retracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOp {
    Add,
    Remove,
}

/// A one-sided relationship write requested by a caller.
///
/// The subject is the record being edited; the maintainer derives the
/// reciprocal writes on the other endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMutation {
    /// Record whose relationship field is edited.
    pub subject: PersonId,
    /// Field being edited.
    pub kind: RelationKind,
    /// The other endpoint of the relationship.
    pub target: PersonId,
    /// Assert or retract.
    pub op: MutationOp,
}

impl RelationshipMutation {
    pub fn add(subject: impl Into<PersonId>, kind: RelationKind, target: impl Into<PersonId>) -> Self {
        Self {
            subject: subject.into(),
            kind,
            target: target.into(),
            op: MutationOp::Add,
        }
    }

    pub fn remove(
        subject: impl Into<PersonId>,
        kind: RelationKind,
        target: impl Into<PersonId>,
    ) -> Self {
        Self {
            subject: subject.into(),
            kind,
            target: target.into(),
            op: MutationOp::Remove,
        }
    }

    /// The exact inverse event: applying a mutation then its inverse
    /// restores the prior relationship content.
    pub fn inverse(&self) -> Self {
        Self {
            subject: self.subject.clone(),
            kind: self.kind,
            target: self.target.clone(),
            op: match self.op {
                MutationOp::Add => MutationOp::Remove,
                MutationOp::Remove => MutationOp::Add,
            },
        }
    }
}

impl fmt::Display for RelationshipMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.op {
            MutationOp::Add => "add",
            MutationOp::Remove => "remove",
        };
        write!(f, "{} {} `{}` on `{}`", verb, self.kind, self.target, self.subject)
    }
}

/// One write that was actually applied to the store, primary or reciprocal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedChange {
    /// Record that changed.
    pub subject: PersonId,
    /// Field that changed.
    pub kind: RelationKind,
    /// The other endpoint.
    pub target: PersonId,
    /// Assert or retract.
    pub op: MutationOp,
    /// True when this change was derived from another, not requested
    /// directly.
    pub reciprocal: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_flips_op() {
        let m = RelationshipMutation::add("a", RelationKind::Father, "b");
        let inv = m.inverse();
        assert_eq!(inv.op, MutationOp::Remove);
        assert_eq!(inv.subject, m.subject);
        assert_eq!(inv.inverse(), m);
    }
}
