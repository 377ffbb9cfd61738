//! In-memory person record store.
//!
//! The store is the queryable record collection the rest of the engine runs
//! against: the family graph snapshots it, the consistency maintainer writes
//! through it. Records are keyed by identifier in a sorted map so every
//! whole-store pass (repair, component discovery) is deterministic.
//!
//! `set_relationship` is the single-sided write contract: it applies exactly
//! one field edit and nothing else. Reciprocal edits and conflict checks are
//! the consistency maintainer's job, which validates before it writes.

use std::collections::BTreeMap;

use crate::sync::{MutationOp, RelationKind};

use super::record::{Person, PersonId, SpouseLink};

/// Queryable collection of person records.
#[derive(Debug, Clone, Default)]
pub struct PersonStore {
    records: BTreeMap<PersonId, Person>,
}

impl PersonStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Insert or replace a record, keyed by its identifier.
    pub fn insert(&mut self, person: Person) {
        self.records.insert(person.id.clone(), person);
    }

    /// Look up a record.
    pub fn get(&self, id: &PersonId) -> Option<&Person> {
        self.records.get(id)
    }

    /// Look up a record mutably.
    pub fn get_mut(&mut self, id: &PersonId) -> Option<&mut Person> {
        self.records.get_mut(id)
    }

    /// Whether a record with this identifier exists.
    pub fn contains(&self, id: &PersonId) -> bool {
        self.records.contains_key(id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.records.values()
    }

    /// Iterate identifiers in order.
    pub fn ids(&self) -> impl Iterator<Item = &PersonId> {
        self.records.keys()
    }

    /// Apply one single-sided relationship edit.
    ///
    /// Returns `true` if the record changed, `false` for a no-op (subject
    /// missing, value already present/absent). Add on the father/mother slot
    /// overwrites; callers that must not overwrite check first.
    pub fn set_relationship(
        &mut self,
        id: &PersonId,
        kind: RelationKind,
        target: &PersonId,
        op: MutationOp,
    ) -> bool {
        let Some(person) = self.records.get_mut(id) else {
            return false;
        };

        match (kind, op) {
            (RelationKind::Father, MutationOp::Add) => {
                if person.father.as_ref() == Some(target) {
                    return false;
                }
                person.father = Some(target.clone());
                true
            }
            (RelationKind::Father, MutationOp::Remove) => {
                if person.father.as_ref() == Some(target) {
                    person.father = None;
                    true
                } else {
                    false
                }
            }
            (RelationKind::Mother, MutationOp::Add) => {
                if person.mother.as_ref() == Some(target) {
                    return false;
                }
                person.mother = Some(target.clone());
                true
            }
            (RelationKind::Mother, MutationOp::Remove) => {
                if person.mother.as_ref() == Some(target) {
                    person.mother = None;
                    true
                } else {
                    false
                }
            }
            (RelationKind::Child, MutationOp::Add) => {
                if person.children.contains(target) {
                    return false;
                }
                person.children.push(target.clone());
                true
            }
            (RelationKind::Child, MutationOp::Remove) => {
                let before = person.children.len();
                person.children.retain(|c| c != target);
                person.children.len() != before
            }
            (RelationKind::Spouse, MutationOp::Add) => {
                if person.has_spouse(target) {
                    return false;
                }
                person.spouses.push(SpouseLink::new(target.clone()));
                true
            }
            (RelationKind::Spouse, MutationOp::Remove) => {
                let before = person.spouses.len();
                person.spouses.retain(|link| &link.spouse != target);
                person.spouses.len() != before
            }
        }
    }

    /// Append a fully-specified spouse link (used when mirroring metadata).
    ///
    /// Returns `false` if the subject is missing or already linked.
    pub fn add_spouse_link(&mut self, id: &PersonId, link: SpouseLink) -> bool {
        let Some(person) = self.records.get_mut(id) else {
            return false;
        };
        if person.has_spouse(&link.spouse) {
            return false;
        }
        person.spouses.push(link);
        true
    }
}

impl FromIterator<Person> for PersonStore {
    fn from_iter<T: IntoIterator<Item = Person>>(iter: T) -> Self {
        let mut store = Self::new();
        for person in iter {
            store.insert(person);
        }
        store
    }
}
