//! Error and warning taxonomy.
//!
//! Only a missing root is fatal to a layout request. Everything the
//! traversal and generation layers encounter (cycles, dangling references)
//! degrades to warnings carried on the result, so a caller always gets a
//! best-effort layout alongside its diagnostics. Relationship conflicts are
//! surfaced for external resolution, never auto-resolved in favor of either
//! side.

use serde::Serialize;
use thiserror::Error;

use crate::person::PersonId;
use crate::sync::RelationKind;

/// Fatal failures of a layout request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    /// The requested root identifier is not present in the record store.
    /// No layout is produced.
    #[error("root person `{0}` not found in the record store")]
    RootNotFound(PersonId),
}

/// A reciprocal write would contradict an existing, different value.
///
/// The maintainer refuses to overwrite: the conflicting mutation is blocked
/// in full (nothing applied) and both claimed values are reported for
/// manual resolution.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("relationship conflict on `{subject}` ({kind}): existing `{existing}`, proposed `{proposed}`")]
pub struct RelationshipConflict {
    /// Record whose field holds the conflicting value.
    pub subject: PersonId,
    /// The contested field.
    pub kind: RelationKind,
    /// Value already recorded.
    pub existing: PersonId,
    /// Value the blocked mutation would have written.
    pub proposed: PersonId,
}

/// Failures of a single relationship mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// The mutation would contradict recorded data; nothing was applied.
    #[error(transparent)]
    Conflict(#[from] RelationshipConflict),
    /// Subject or target of the mutation is not in the store.
    #[error("person `{0}` not found in the record store")]
    UnknownPerson(PersonId),
}

/// Non-fatal conditions collected onto results instead of being thrown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutWarning {
    /// A node was reached as its own ancestor or descendant. Traversal
    /// stopped at the repeated identifier; the members listed were excluded
    /// from further expansion.
    Cycle { members: Vec<PersonId> },
    /// A relationship field names a record that does not exist. The edge
    /// was skipped.
    DanglingReference { subject: PersonId, missing: PersonId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_names_both_values() {
        let conflict = RelationshipConflict {
            subject: "x".into(),
            kind: RelationKind::Father,
            existing: "f1".into(),
            proposed: "f2".into(),
        };
        let msg = conflict.to_string();
        assert!(msg.contains("f1"), "message should name the existing value: {msg}");
        assert!(msg.contains("f2"), "message should name the proposed value: {msg}");
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = LayoutWarning::Cycle {
            members: vec!["a".into(), "b".into()],
        };
        let json = serde_json::to_value(&warning).expect("serialize");
        assert_eq!(json["kind"], "cycle");
        assert_eq!(json["members"][0], "a");
    }
}
