//! Negative sampling by single-field corruption.
//!
//! A corruption replaces exactly one position of a true triple with a
//! uniformly drawn element of that position's replacement pool, rejecting
//! candidates that are known facts. Randomness comes only from the caller's RNG.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use triples::{EntityId, Field, KnownFactSet, LabeledTriple, RelationId, Triple};

use crate::error::KgeError;

/// Default retry budget for [`corrupt`].
pub const DEFAULT_MAX_TRIES: usize = 1000;
/// Default corruptible positions.
pub const DEFAULT_FIELDS: [Field; 2] = [Field::Subject, Field::Object];

/// Replacement candidates for each triple position.
#[derive(Debug, Clone, Default)]
pub struct ReplacementPools {
    pub subjects: Vec<EntityId>,
    pub relations: Vec<RelationId>,
    pub objects: Vec<EntityId>,
}

impl ReplacementPools {
    /// Distinct ids observed in `triples`, in ascending order.
    ///
    /// With `separate_head_tail` subjects are replaced only by ids seen as
    /// subjects and objects only by ids seen as objects. Otherwise both
    /// positions share the union of all entities.
    pub fn from_triples(triples: &[Triple], separate_head_tail: bool) -> Self {
        let subjects: BTreeSet<EntityId> = triples.iter().map(|t| t.subject).collect();
        let objects: BTreeSet<EntityId> = triples.iter().map(|t| t.object).collect();
        let relations: BTreeSet<RelationId> = triples.iter().map(|t| t.relation).collect();

        if separate_head_tail {
            Self {
                subjects: subjects.into_iter().collect(),
                relations: relations.into_iter().collect(),
                objects: objects.into_iter().collect(),
            }
        } else {
            let all: Vec<EntityId> = subjects.union(&objects).copied().collect();
            Self {
                subjects: all.clone(),
                relations: relations.into_iter().collect(),
                objects: all,
            }
        }
    }

    pub fn len(&self, field: Field) -> usize {
        match field {
            Field::Subject => self.subjects.len(),
            Field::Relation => self.relations.len(),
            Field::Object => self.objects.len(),
        }
    }

    /// Replace `field` of `triple` with a uniformly drawn pool element.
    ///
    /// Returns `None` when the pool for `field` is empty.
    fn replace(&self, triple: &Triple, field: Field, rng: &mut impl Rng) -> Option<Triple> {
        Some(match field {
            Field::Subject => Triple { subject: *self.subjects.choose(rng)?, ..*triple },
            Field::Relation => Triple { relation: *self.relations.choose(rng)?, ..*triple },
            Field::Object => Triple { object: *self.objects.choose(rng)?, ..*triple },
        })
    }
}

/// Corrupt one field of `triple`, avoiding `forbidden`.
///
/// Up to `max_tries` times, picks one of `fields` uniformly and replaces it
/// from `pools`. The first candidate that differs from `triple` and is not in
/// `forbidden` is returned. Fails with [`KgeError::SamplingExhausted`] after
/// exactly `max_tries` rejected attempts.
pub fn corrupt(
    triple: &Triple,
    pools: &ReplacementPools,
    forbidden: &KnownFactSet,
    rng: &mut impl Rng,
    fields: &[Field],
    max_tries: usize,
) -> Result<Triple, KgeError> {
    if fields.is_empty() {
        return Err(KgeError::InvalidConfig("no fields eligible for corruption".to_string()));
    }
    if let Some(&empty) = fields.iter().find(|&&f| pools.len(f) == 0) {
        return Err(KgeError::EmptyReplacementPool(empty));
    }

    for _ in 0..max_tries {
        let field = fields[rng.gen_range(0..fields.len())];
        let Some(candidate) = pools.replace(triple, field, rng) else {
            return Err(KgeError::EmptyReplacementPool(field));
        };
        if candidate != *triple && !forbidden.contains(&candidate) {
            return Ok(candidate);
        }
    }

    Err(KgeError::SamplingExhausted { triple: *triple, attempts: max_tries })
}

/// Single-field corruptor with fixed pools, fields and retry budget.
#[derive(Debug, Clone)]
pub struct Corruptor {
    pools: ReplacementPools,
    fields: Vec<Field>,
    max_tries: usize,
}

impl Corruptor {
    /// Corruptor over subject and object with the default retry budget.
    pub fn new(pools: ReplacementPools) -> Self {
        Self {
            pools,
            fields: DEFAULT_FIELDS.to_vec(),
            max_tries: DEFAULT_MAX_TRIES,
        }
    }

    pub fn with_fields(mut self, fields: &[Field]) -> Self {
        self.fields = fields.to_vec();
        self
    }

    pub fn with_max_tries(mut self, max_tries: usize) -> Self {
        self.max_tries = max_tries;
        self
    }

    pub fn corrupt(
        &self,
        triple: &Triple,
        forbidden: &KnownFactSet,
        rng: &mut impl Rng,
    ) -> Result<Triple, KgeError> {
        corrupt(triple, &self.pools, forbidden, rng, &self.fields, self.max_tries)
    }
}

/// Interleave each true triple with one corruption: `[p1, n1, p2, n2, …]`.
///
/// Used to turn validation/test triples into classification sets. The subject
/// pool is the distinct subjects of `triples`, the object pool their distinct
/// objects; relations are never corrupted. `known` is the forbidden set.
pub fn contrastive_pairs(
    triples: &[Triple],
    known: &KnownFactSet,
    rng: &mut impl Rng,
    max_tries: usize,
) -> Result<Vec<LabeledTriple>, KgeError> {
    let corruptor = Corruptor::new(ReplacementPools::from_triples(triples, true))
        .with_max_tries(max_tries);
    let mut rows = Vec::with_capacity(triples.len() * 2);
    for t in triples {
        let negative = corruptor.corrupt(t, known, rng)?;
        rows.push(LabeledTriple::positive(*t));
        rows.push(LabeledTriple::negative(negative));
    }
    Ok(rows)
}
