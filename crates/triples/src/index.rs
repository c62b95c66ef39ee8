//! Bidirectional name ↔ dense id indices for entities and relations.
//!
//! An index is assembled once through a [`NameIndexBuilder`] and then frozen.
//! The frozen [`NameIndex`] has no mutating methods, so ids stay stable for
//! every component that receives it.

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::types::{DenseId, EntityId, NamedTriple, RelationId, Triple};

/// Immutable, bijective mapping between names and dense ids.
#[derive(Debug, Clone)]
pub struct NameIndex<I> {
    names: Vec<String>,
    ids: HashMap<String, usize>,
    _id: PhantomData<I>,
}

/// Index of entity names.
pub type EntityIndex = NameIndex<EntityId>;
/// Index of relation names.
pub type RelationIndex = NameIndex<RelationId>;

impl<I: DenseId> NameIndex<I> {
    /// Id of `name`, if it was seen while building.
    pub fn id(&self, name: &str) -> Option<I> {
        self.ids.get(name).map(|&i| I::from_index(i))
    }

    /// Name of `id`, if it is within range.
    pub fn name(&self, id: I) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        (0..self.names.len()).map(I::from_index)
    }

    /// All `(id, name)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (I::from_index(i), name.as_str()))
    }
}

/// Mutable builder assigning ids in order of first appearance.
#[derive(Debug)]
pub struct NameIndexBuilder<I> {
    names: Vec<String>,
    ids: HashMap<String, usize>,
    _id: PhantomData<I>,
}

impl<I: DenseId> Default for NameIndexBuilder<I> {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            ids: HashMap::new(),
            _id: PhantomData,
        }
    }
}

impl<I: DenseId> NameIndexBuilder<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, assigning the next free id on first sight.
    pub fn intern(&mut self, name: &str) -> I {
        if let Some(&i) = self.ids.get(name) {
            return I::from_index(i);
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), i);
        I::from_index(i)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Freeze into an immutable index.
    pub fn build(self) -> NameIndex<I> {
        NameIndex {
            names: self.names,
            ids: self.ids,
            _id: PhantomData,
        }
    }
}

/// Entity and relation indices built together from one corpus.
#[derive(Debug, Clone)]
pub struct GraphIndex {
    pub entities: EntityIndex,
    pub relations: RelationIndex,
}

impl GraphIndex {
    /// Build both indices from named triples, in order of first appearance.
    ///
    /// Within a triple the subject is interned before the object.
    pub fn from_named(triples: &[NamedTriple]) -> Self {
        let mut entities = NameIndexBuilder::<EntityId>::new();
        let mut relations = NameIndexBuilder::<RelationId>::new();
        for t in triples {
            entities.intern(&t.subject);
            relations.intern(&t.relation);
            entities.intern(&t.object);
        }
        let index = Self {
            entities: entities.build(),
            relations: relations.build(),
        };
        tracing::debug!(
            entities = index.entities.len(),
            relations = index.relations.len(),
            "Built graph index"
        );
        index
    }

    /// Translate a named triple into ids. `None` if any name is unknown.
    pub fn encode(&self, triple: &NamedTriple) -> Option<Triple> {
        Some(Triple {
            subject: self.entities.id(&triple.subject)?,
            relation: self.relations.id(&triple.relation)?,
            object: self.entities.id(&triple.object)?,
        })
    }

    /// Translate every named triple, failing on the first unknown name.
    pub fn encode_all(&self, triples: &[NamedTriple]) -> anyhow::Result<Vec<Triple>> {
        triples
            .iter()
            .map(|t| {
                self.encode(t).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Triple ({}, {}, {}) has a name missing from the index",
                        t.subject,
                        t.relation,
                        t.object
                    )
                })
            })
            .collect()
    }

    /// Translate an id triple back into names.
    pub fn decode(&self, triple: &Triple) -> Option<NamedTriple> {
        Some(NamedTriple::new(
            self.entities.name(triple.subject)?,
            self.relations.name(triple.relation)?,
            self.entities.name(triple.object)?,
        ))
    }
}
