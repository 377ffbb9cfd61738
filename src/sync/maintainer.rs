//! Consistency maintainer - reciprocal relationship sync.
//!
//! Callers issue one-sided relationship mutations; the maintainer derives
//! the matching reciprocal writes so the bidirectional invariant holds
//! after every edit, without the caller knowing which side is
//! authoritative. Validation happens before anything is written, so a
//! mutation either applies in full (primary + reciprocals) or not at all.
//!
//! A reciprocal write that would contradict an existing, different value is
//! never applied silently: the mutation is rejected with a
//! `RelationshipConflict` carrying both claimed values. Overwriting a third
//! party's data on a tie is worse than surfacing the ambiguity.

use tracing::debug;

use crate::error::{RelationshipConflict, SyncError};
use crate::person::{PersonId, PersonStore, Sex, SpouseLink};

use super::event::{AppliedChange, MutationOp, RelationKind, RelationshipMutation};

/// Derives and applies reciprocal relationship edits.
#[derive(Debug, Default)]
pub struct ConsistencyMaintainer;

/// A validated write, ready to apply.
#[derive(Debug, Clone)]
struct PlannedWrite {
    subject: PersonId,
    kind: RelationKind,
    target: PersonId,
    op: MutationOp,
    reciprocal: bool,
}

impl PlannedWrite {
    fn into_change(self) -> AppliedChange {
        AppliedChange {
            subject: self.subject,
            kind: self.kind,
            target: self.target,
            op: self.op,
            reciprocal: self.reciprocal,
        }
    }
}

/// Everything a repair pass did and everything it refused to touch.
#[derive(Debug, Clone, Default)]
pub struct RepairReport {
    /// Reciprocal writes synthesized for one-sided edges.
    pub changes: Vec<AppliedChange>,
    /// Contradictory edges found; left untouched for manual resolution.
    pub conflicts: Vec<RelationshipConflict>,
}

impl RepairReport {
    /// True when the pass found nothing to do and nothing contradictory.
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty() && self.conflicts.is_empty()
    }
}

impl ConsistencyMaintainer {
    pub fn new() -> Self {
        Self
    }

    /// Apply one mutation and its reciprocals, transactionally.
    ///
    /// Returns every write performed (empty when the relationship already
    /// held). On conflict nothing is applied at all.
    pub fn apply(
        &self,
        store: &mut PersonStore,
        mutation: &RelationshipMutation,
    ) -> Result<Vec<AppliedChange>, SyncError> {
        if !store.contains(&mutation.subject) {
            return Err(SyncError::UnknownPerson(mutation.subject.clone()));
        }
        if !store.contains(&mutation.target) {
            return Err(SyncError::UnknownPerson(mutation.target.clone()));
        }

        let plan = self.plan(store, mutation)?;
        let mut applied = Vec::with_capacity(plan.len());
        for write in plan {
            let changed = match (write.kind, write.op) {
                // Spouse adds mirror metadata from the already-recorded side.
                (RelationKind::Spouse, MutationOp::Add) => {
                    let link = store
                        .get(&write.target)
                        .and_then(|p| p.spouse_link(&write.subject))
                        .map(|l| l.mirrored(&write.target))
                        .unwrap_or_else(|| SpouseLink::new(write.target.clone()));
                    store.add_spouse_link(&write.subject, link)
                }
                _ => store.set_relationship(&write.subject, write.kind, &write.target, write.op),
            };
            if changed {
                debug!(
                    subject = %write.subject,
                    kind = %write.kind,
                    target = %write.target,
                    reciprocal = write.reciprocal,
                    "relationship write applied"
                );
                applied.push(write.into_change());
            }
        }
        Ok(applied)
    }

    /// Compute the full write set for a mutation, or the conflict that
    /// blocks it. Pure - reads the store, writes nothing.
    fn plan(
        &self,
        store: &PersonStore,
        mutation: &RelationshipMutation,
    ) -> Result<Vec<PlannedWrite>, SyncError> {
        let subject = &mutation.subject;
        let target = &mutation.target;
        let mut plan = Vec::new();

        let primary = |plan: &mut Vec<PlannedWrite>| {
            plan.push(PlannedWrite {
                subject: subject.clone(),
                kind: mutation.kind,
                target: target.clone(),
                op: mutation.op,
                reciprocal: false,
            });
        };

        match (mutation.kind, mutation.op) {
            (RelationKind::Father | RelationKind::Mother, MutationOp::Add) => {
                let slot = store.get(subject).and_then(|p| match mutation.kind {
                    RelationKind::Father => p.father.clone(),
                    _ => p.mother.clone(),
                });
                match slot {
                    Some(existing) if &existing != target => {
                        return Err(RelationshipConflict {
                            subject: subject.clone(),
                            kind: mutation.kind,
                            existing,
                            proposed: target.clone(),
                        }
                        .into());
                    }
                    Some(_) => {}
                    None => primary(&mut plan),
                }
                if !store.get(target).is_some_and(|p| p.has_child(subject)) {
                    plan.push(PlannedWrite {
                        subject: target.clone(),
                        kind: RelationKind::Child,
                        target: subject.clone(),
                        op: MutationOp::Add,
                        reciprocal: true,
                    });
                }
            }
            (RelationKind::Father | RelationKind::Mother, MutationOp::Remove) => {
                let slot = store.get(subject).and_then(|p| match mutation.kind {
                    RelationKind::Father => p.father.clone(),
                    _ => p.mother.clone(),
                });
                if slot.as_ref() == Some(target) {
                    primary(&mut plan);
                    if store.get(target).is_some_and(|p| p.has_child(subject)) {
                        plan.push(PlannedWrite {
                            subject: target.clone(),
                            kind: RelationKind::Child,
                            target: subject.clone(),
                            op: MutationOp::Remove,
                            reciprocal: true,
                        });
                    }
                }
                // Removing an absent relationship is a no-op, not an error.
            }
            (RelationKind::Child, MutationOp::Add) => {
                if let Some(write) = parent_slot_write(store, subject, target)? {
                    plan.push(write);
                }
                if !store.get(subject).is_some_and(|p| p.has_child(target)) {
                    primary(&mut plan);
                }
            }
            (RelationKind::Child, MutationOp::Remove) => {
                if store.get(subject).is_some_and(|p| p.has_child(target)) {
                    primary(&mut plan);
                }
                let child = store.get(target);
                if child.is_some_and(|c| c.father.as_ref() == Some(subject)) {
                    plan.push(PlannedWrite {
                        subject: target.clone(),
                        kind: RelationKind::Father,
                        target: subject.clone(),
                        op: MutationOp::Remove,
                        reciprocal: true,
                    });
                } else if child.is_some_and(|c| c.mother.as_ref() == Some(subject)) {
                    plan.push(PlannedWrite {
                        subject: target.clone(),
                        kind: RelationKind::Mother,
                        target: subject.clone(),
                        op: MutationOp::Remove,
                        reciprocal: true,
                    });
                }
            }
            (RelationKind::Spouse, MutationOp::Add) => {
                if !store.get(subject).is_some_and(|p| p.has_spouse(target)) {
                    primary(&mut plan);
                }
                if !store.get(target).is_some_and(|p| p.has_spouse(subject)) {
                    plan.push(PlannedWrite {
                        subject: target.clone(),
                        kind: RelationKind::Spouse,
                        target: subject.clone(),
                        op: MutationOp::Add,
                        reciprocal: true,
                    });
                }
            }
            (RelationKind::Spouse, MutationOp::Remove) => {
                if store.get(subject).is_some_and(|p| p.has_spouse(target)) {
                    primary(&mut plan);
                }
                if store.get(target).is_some_and(|p| p.has_spouse(subject)) {
                    plan.push(PlannedWrite {
                        subject: target.clone(),
                        kind: RelationKind::Spouse,
                        target: subject.clone(),
                        op: MutationOp::Remove,
                        reciprocal: true,
                    });
                }
            }
        }

        Ok(plan)
    }

    /// Whole-graph repair: synthesize missing reciprocals for one-sided
    /// edges. Idempotent - a second run reports no changes - and every
    /// write and every contradiction is reported, never performed silently.
    pub fn repair(&self, store: &mut PersonStore) -> RepairReport {
        let mut report = RepairReport::default();
        let ids: Vec<PersonId> = store.ids().cloned().collect();

        for id in &ids {
            let Some(person) = store.get(id) else { continue };
            let father = person.father.clone();
            let mother = person.mother.clone();
            let children = person.children.clone();
            let spouse_links = person.spouses.clone();

            // Parent slots missing the child-list reciprocal.
            for parent in [father, mother].into_iter().flatten() {
                if store.get(&parent).is_some_and(|p| !p.has_child(id)) {
                    store.set_relationship(&parent, RelationKind::Child, id, MutationOp::Add);
                    report.changes.push(AppliedChange {
                        subject: parent.clone(),
                        kind: RelationKind::Child,
                        target: id.clone(),
                        op: MutationOp::Add,
                        reciprocal: true,
                    });
                }
            }

            // Child lists whose members do not point back.
            for child in &children {
                if !store.contains(child) {
                    continue;
                }
                match parent_slot_write(store, id, child) {
                    Ok(Some(write)) => {
                        store.set_relationship(&write.subject, write.kind, &write.target, write.op);
                        report.changes.push(write.into_change());
                    }
                    Ok(None) => {}
                    Err(SyncError::Conflict(conflict)) => report.conflicts.push(conflict),
                    Err(_) => {}
                }
            }

            // Spouse links missing their mirror. Metadata is copied over.
            for link in &spouse_links {
                if store.get(&link.spouse).is_some_and(|s| !s.has_spouse(id)) {
                    let mirrored = link.mirrored(id);
                    let spouse = link.spouse.clone();
                    store.add_spouse_link(&spouse, mirrored);
                    report.changes.push(AppliedChange {
                        subject: spouse,
                        kind: RelationKind::Spouse,
                        target: id.clone(),
                        op: MutationOp::Add,
                        reciprocal: true,
                    });
                }
            }
        }

        debug!(
            changes = report.changes.len(),
            conflicts = report.conflicts.len(),
            "repair pass complete"
        );
        report
    }
}

/// Plan the write that records `parent` in the right parent slot of
/// `child`, or the conflict preventing it. `None` when the slot already
/// points back. The slot comes from the parent's recorded sex; with sex
/// unrecorded, the first empty slot (father, then mother); with both slots
/// held by others, a conflict.
fn parent_slot_write(
    store: &PersonStore,
    parent: &PersonId,
    child: &PersonId,
) -> Result<Option<PlannedWrite>, SyncError> {
    let record = store
        .get(child)
        .ok_or_else(|| SyncError::UnknownPerson(child.clone()))?;
    if record.father.as_ref() == Some(parent) || record.mother.as_ref() == Some(parent) {
        return Ok(None);
    }

    let preferred = match store.get(parent).and_then(|p| p.sex) {
        Some(Sex::Male) => Some(RelationKind::Father),
        Some(Sex::Female) => Some(RelationKind::Mother),
        _ => None,
    };

    let slot = match preferred {
        Some(RelationKind::Father) => match &record.father {
            None => RelationKind::Father,
            Some(existing) => {
                return Err(RelationshipConflict {
                    subject: child.clone(),
                    kind: RelationKind::Father,
                    existing: existing.clone(),
                    proposed: parent.clone(),
                }
                .into());
            }
        },
        Some(RelationKind::Mother) => match &record.mother {
            None => RelationKind::Mother,
            Some(existing) => {
                return Err(RelationshipConflict {
                    subject: child.clone(),
                    kind: RelationKind::Mother,
                    existing: existing.clone(),
                    proposed: parent.clone(),
                }
                .into());
            }
        },
        // Sex unrecorded: first empty slot, father then mother.
        _ => match (&record.father, &record.mother) {
            (None, _) => RelationKind::Father,
            (Some(_), None) => RelationKind::Mother,
            (Some(existing), Some(_)) => {
                return Err(RelationshipConflict {
                    subject: child.clone(),
                    kind: RelationKind::Father,
                    existing: existing.clone(),
                    proposed: parent.clone(),
                }
                .into());
            }
        },
    };

    Ok(Some(PlannedWrite {
        subject: child.clone(),
        kind: slot,
        target: parent.clone(),
        op: MutationOp::Add,
        reciprocal: true,
    }))
}
