//! Candidate ranking for one held-out side of a triple.
//!
//! Candidates are ordered by ascending energy (most plausible first); equal
//! energies are ordered by ascending entity id so rankings are reproducible.

use ordered_float::OrderedFloat;
use triples::{DenseId, EntityId, HeldOut, KnownFactSet, Triple};

use crate::model::embeddings::EmbeddingModel;

/// One candidate entity and the energy of the triple it completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedCandidate {
    pub entity: EntityId,
    pub energy: f32,
}

/// Sorted candidates for `triple` with `held_out` replaced.
#[derive(Debug, Clone)]
pub struct Ranking {
    triple: Triple,
    held_out: HeldOut,
    candidates: Vec<RankedCandidate>,
}

impl Ranking {
    /// Sort `candidates` into canonical order: energy ascending, then id ascending.
    pub fn new(triple: Triple, held_out: HeldOut, mut candidates: Vec<RankedCandidate>) -> Self {
        candidates.sort_by_key(|c| (OrderedFloat(c.energy), c.entity));
        Self { triple, held_out, candidates }
    }

    pub fn triple(&self) -> &Triple {
        &self.triple
    }

    pub fn held_out(&self) -> HeldOut {
        self.held_out
    }

    /// The entity that actually completes the evaluated triple.
    pub fn answer(&self) -> EntityId {
        self.held_out.answer(&self.triple)
    }

    pub fn candidates(&self) -> &[RankedCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// 0-based position of `entity`, if it was ranked.
    pub fn position_of(&self, entity: EntityId) -> Option<usize> {
        self.candidates.iter().position(|c| c.entity == entity)
    }

    /// Whether substituting `entity` at the held-out side yields a known fact.
    pub fn forms_known_fact(&self, entity: EntityId, known: &KnownFactSet) -> bool {
        known.contains(&self.held_out.substitute(&self.triple, entity))
    }
}

/// Produces a full candidate ranking for one held-out side.
///
/// With `forbidden`, candidates that recreate a known triple other than the
/// evaluated one are left out. The held-out answer is always kept.
pub trait CandidateRanker: Sync {
    fn rank(&self, triple: &Triple, held_out: HeldOut, forbidden: Option<&KnownFactSet>) -> Ranking;
}

/// Scores every entity in the model.
pub struct ExhaustiveRanker<'a, M: EmbeddingModel + ?Sized> {
    model: &'a M,
}

impl<'a, M: EmbeddingModel + ?Sized> ExhaustiveRanker<'a, M> {
    pub fn new(model: &'a M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        self.model
    }
}

impl<M: EmbeddingModel + ?Sized> CandidateRanker for ExhaustiveRanker<'_, M> {
    fn rank(&self, triple: &Triple, held_out: HeldOut, forbidden: Option<&KnownFactSet>) -> Ranking {
        rank_all_entities(self.model, triple, held_out, forbidden)
    }
}

/// Rank every entity of `model` as the held-out side of `triple`.
pub fn rank_all_entities<M: EmbeddingModel + ?Sized>(
    model: &M,
    triple: &Triple,
    held_out: HeldOut,
    forbidden: Option<&KnownFactSet>,
) -> Ranking {
    let answer = held_out.answer(triple);
    let candidates = model
        .candidate_energies(triple, held_out)
        .into_iter()
        .enumerate()
        .map(|(i, energy)| RankedCandidate { entity: EntityId::from_index(i), energy })
        .filter(|c| match forbidden {
            Some(set) => c.entity == answer || !set.contains(&held_out.substitute(triple, c.entity)),
            None => true,
        })
        .collect();
    Ranking::new(*triple, held_out, candidates)
}
