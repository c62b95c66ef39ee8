//! Data types for entity/relation ids, triples, labels and known-fact sets.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Dense id of an entity in an [`crate::EntityIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Dense id of a relation type in a [`crate::RelationIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationId(pub u32);

/// Ids handed out densely from zero by a name index.
pub trait DenseId: Copy + Eq + std::hash::Hash + fmt::Debug {
    /// Build an id from its position in the index.
    fn from_index(index: usize) -> Self;
    /// Position of this id in the index (row in an embedding table).
    fn index(self) -> usize;
}

impl DenseId for EntityId {
    fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl DenseId for RelationId {
    fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A (subject, relation, object) fact over dense ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: EntityId,
    pub relation: RelationId,
    pub object: EntityId,
}

impl Triple {
    pub fn new(subject: u32, relation: u32, object: u32) -> Self {
        Self {
            subject: EntityId(subject),
            relation: RelationId(relation),
            object: EntityId(object),
        }
    }

    /// Number of positions in which `self` and `other` differ.
    pub fn fields_differing(&self, other: &Triple) -> usize {
        usize::from(self.subject != other.subject)
            + usize::from(self.relation != other.relation)
            + usize::from(self.object != other.object)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.relation, self.object)
    }
}

/// A position inside a triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Subject,
    Relation,
    Object,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subject => write!(f, "subject"),
            Self::Relation => write!(f, "relation"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// Which entity side of a triple is hidden when ranking candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeldOut {
    Subject,
    Object,
}

impl HeldOut {
    /// Both sides, subject first.
    pub const BOTH: [HeldOut; 2] = [HeldOut::Subject, HeldOut::Object];

    /// The true entity at the held-out position.
    pub fn answer(self, triple: &Triple) -> EntityId {
        match self {
            Self::Subject => triple.subject,
            Self::Object => triple.object,
        }
    }

    /// `triple` with the held-out position replaced by `candidate`.
    pub fn substitute(self, triple: &Triple, candidate: EntityId) -> Triple {
        match self {
            Self::Subject => Triple { subject: candidate, ..*triple },
            Self::Object => Triple { object: candidate, ..*triple },
        }
    }

    pub fn field(self) -> Field {
        match self {
            Self::Subject => Field::Subject,
            Self::Object => Field::Object,
        }
    }
}

impl fmt::Display for HeldOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.field().fmt(f)
    }
}

/// Truth label of a triple in a classification or training set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactLabel {
    Positive,
    Negative,
}

impl FactLabel {
    pub fn is_positive(self) -> bool {
        self == Self::Positive
    }

    /// Numeric training label: 1.0 for positives, 0.0 for negatives.
    pub fn as_f32(self) -> f32 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => 0.0,
        }
    }
}

impl fmt::Display for FactLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

/// A triple together with its truth label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledTriple {
    pub triple: Triple,
    pub label: FactLabel,
}

impl LabeledTriple {
    pub fn positive(triple: Triple) -> Self {
        Self { triple, label: FactLabel::Positive }
    }

    pub fn negative(triple: Triple) -> Self {
        Self { triple, label: FactLabel::Negative }
    }
}

/// Set of triples known to be true.
///
/// Serves as the forbidden set for negative sampling and as ground truth for
/// filtered ranking.
#[derive(Debug, Clone, Default)]
pub struct KnownFactSet {
    facts: HashSet<Triple>,
}

impl KnownFactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.facts.contains(triple)
    }

    /// Insert a fact. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.facts.insert(triple)
    }

    pub fn extend_from(&mut self, triples: &[Triple]) {
        self.facts.extend(triples.iter().copied());
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.facts.iter()
    }
}

impl FromIterator<Triple> for KnownFactSet {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self { facts: iter.into_iter().collect() }
    }
}

impl<'a> FromIterator<&'a Triple> for KnownFactSet {
    fn from_iter<I: IntoIterator<Item = &'a Triple>>(iter: I) -> Self {
        Self { facts: iter.into_iter().copied().collect() }
    }
}

/// A triple still expressed in names, as read from a TSV file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedTriple {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

impl NamedTriple {
    pub fn new(subject: &str, relation: &str, object: &str) -> Self {
        Self {
            subject: subject.to_string(),
            relation: relation.to_string(),
            object: object.to_string(),
        }
    }
}
