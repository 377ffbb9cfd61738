//! Person records and their relationship fields.
//!
//! A `Person` is a node in the family graph. Relationship fields (father,
//! mother, children, spouses) reference other persons by stable identifier,
//! never by live pointer, so a malformed graph is at worst a set of repeated
//! or dangling identifiers - detectable, never a memory hazard.
//!
//! The fixed relationship schema is all the engine ever reads. Arbitrary
//! user-defined properties live in the `extra` map and pass through
//! untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::date::DateInfo;

/// Stable person identifier.
///
/// An opaque string, unique within a record store. Identifiers survive every
/// graph mutation; a "cycle" in a malformed graph is just a repeated
/// identifier along a traversal chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    /// Create a new PersonId from a raw string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw identifier.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PersonId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PersonId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Recorded sex, used to pick the father/mother slot when syncing a
/// child-of relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    Other,
}

/// Status of a spouse relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpouseStatus {
    Current,
    Divorced,
    Widowed,
    Separated,
    Annulled,
}

/// One spouse relationship with its marriage metadata.
///
/// A person may carry several spouse links, concurrent or historical; they
/// are ordered by position in the list and each carries independent metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpouseLink {
    /// The other endpoint of the relationship.
    pub spouse: PersonId,
    /// Marriage date, when recorded.
    pub marriage: Option<DateInfo>,
    /// Divorce date, when recorded.
    pub divorce: Option<DateInfo>,
    /// Marriage location, when recorded.
    pub location: Option<String>,
    /// Relationship status.
    pub status: SpouseStatus,
}

impl SpouseLink {
    /// Create a bare spouse link with no metadata.
    pub fn new(spouse: impl Into<PersonId>) -> Self {
        Self {
            spouse: spouse.into(),
            marriage: None,
            divorce: None,
            location: None,
            status: SpouseStatus::Current,
        }
    }

    /// Copy of this link pointing back at `reciprocal_of`, same metadata.
    pub fn mirrored(&self, reciprocal_of: &PersonId) -> Self {
        Self {
            spouse: reciprocal_of.clone(),
            marriage: self.marriage,
            divorce: self.divorce,
            location: self.location.clone(),
            status: self.status,
        }
    }
}

/// A person record: identity, vital dates, and relationship fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Stable identifier, unique within the store.
    pub id: PersonId,
    /// Display name.
    pub name: String,
    /// Birth date, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth: Option<DateInfo>,
    /// Death date, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death: Option<DateInfo>,
    /// Recorded sex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    /// Father reference (0 or 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father: Option<PersonId>,
    /// Mother reference (0 or 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother: Option<PersonId>,
    /// Ordered child references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PersonId>,
    /// Ordered spouse links.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spouses: Vec<SpouseLink>,
    /// User-defined extension fields. Validated elsewhere; never interpreted
    /// by the engine.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Person {
    /// Create a person with no relationships recorded.
    pub fn new(id: impl Into<PersonId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            birth: None,
            death: None,
            sex: None,
            father: None,
            mother: None,
            children: Vec::new(),
            spouses: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Find the spouse link to `other`, if one is recorded.
    pub fn spouse_link(&self, other: &PersonId) -> Option<&SpouseLink> {
        self.spouses.iter().find(|link| &link.spouse == other)
    }

    /// Whether a spouse link to `other` is recorded on this side.
    pub fn has_spouse(&self, other: &PersonId) -> bool {
        self.spouse_link(other).is_some()
    }

    /// Whether `other` appears in the ordered child list.
    pub fn has_child(&self, other: &PersonId) -> bool {
        self.children.contains(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_id_display_and_from() {
        let id: PersonId = "p-001".into();
        assert_eq!(id.as_str(), "p-001");
        assert_eq!(format!("{id}"), "p-001");
    }

    #[test]
    fn test_new_person_has_no_relationships() {
        let p = Person::new("p1", "Alice");
        assert!(p.father.is_none());
        assert!(p.mother.is_none());
        assert!(p.children.is_empty());
        assert!(p.spouses.is_empty());
    }

    #[test]
    fn test_spouse_link_lookup() {
        let mut p = Person::new("p1", "Alice");
        p.spouses.push(SpouseLink::new("p2"));
        assert!(p.has_spouse(&"p2".into()));
        assert!(!p.has_spouse(&"p3".into()));
    }

    #[test]
    fn test_mirrored_spouse_link_keeps_metadata() {
        let link = SpouseLink {
            spouse: "p2".into(),
            marriage: Some(DateInfo::year(1901)),
            divorce: None,
            location: Some("Springfield".to_string()),
            status: SpouseStatus::Divorced,
        };
        let back = link.mirrored(&"p1".into());
        assert_eq!(back.spouse, "p1".into());
        assert_eq!(back.marriage, Some(DateInfo::year(1901)));
        assert_eq!(back.location.as_deref(), Some("Springfield"));
        assert_eq!(back.status, SpouseStatus::Divorced);
    }

    #[test]
    fn test_person_serde_round_trip() {
        let mut p = Person::new("p1", "Alice");
        p.birth = Some(DateInfo::year(1900));
        p.father = Some("p0".into());
        p.children.push("p2".into());
        let json = serde_json::to_string(&p).expect("serialize");
        let back: Person = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, p);
    }
}
