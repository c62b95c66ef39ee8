//! Per-ranking metrics: filtered rank, precision@k, ranking accuracy,
//! average precision and the best known-fact rank.
//!
//! "Relevant" always means the candidate completes a triple in the
//! known-fact set.

use triples::KnownFactSet;

use crate::error::KgeError;
use crate::evaluation::ranking::Ranking;

/// 1-based rank of the answer after skipping other known facts ranked above it.
///
/// Returns `None` when the answer is not among the candidates.
pub fn filtered_rank(ranking: &Ranking, known: &KnownFactSet) -> Option<usize> {
    let answer = ranking.answer();
    let mut rank = 1;
    for c in ranking.candidates() {
        if c.entity == answer {
            return Some(rank);
        }
        if !ranking.forms_known_fact(c.entity, known) {
            rank += 1;
        }
    }
    None
}

/// Fraction of the top `k` candidates that form a known fact, divided by `k`.
pub fn precision_at_k(k: usize, ranking: &Ranking, known: &KnownFactSet) -> Result<f64, KgeError> {
    if k == 0 {
        return Err(KgeError::InvalidConfig("precision@k needs k > 0".to_string()));
    }
    let hits = ranking
        .candidates()
        .iter()
        .take(k)
        .filter(|c| ranking.forms_known_fact(c.entity, known))
        .count();
    Ok(hits as f64 / k as f64)
}

/// Share of Boltzmann mass `exp(-(E - E_min))` placed on known-fact candidates.
///
/// Fails with [`KgeError::DegenerateDistribution`] when the total mass is
/// zero or not finite (e.g. an empty ranking or non-finite energies).
pub fn ranking_accuracy(ranking: &Ranking, known: &KnownFactSet) -> Result<f64, KgeError> {
    let degenerate = || KgeError::DegenerateDistribution {
        triple: *ranking.triple(),
        held_out: ranking.held_out(),
    };
    let min_energy = ranking.candidates().first().ok_or_else(degenerate)?.energy as f64;

    let mut total = 0.0;
    let mut relevant = 0.0;
    for c in ranking.candidates() {
        let mass = (-(c.energy as f64 - min_energy)).exp();
        total += mass;
        if ranking.forms_known_fact(c.entity, known) {
            relevant += mass;
        }
    }
    if !(total.is_finite() && total > 0.0) {
        return Err(degenerate());
    }
    Ok(relevant / total)
}

/// Average of precision@i over every position `i` holding a known fact.
///
/// Zero relevant candidates gives 0.
pub fn average_precision(ranking: &Ranking, known: &KnownFactSet) -> f64 {
    let mut hits = 0usize;
    let mut sum = 0.0;
    for (i, c) in ranking.candidates().iter().enumerate() {
        if ranking.forms_known_fact(c.entity, known) {
            hits += 1;
            sum += hits as f64 / (i + 1) as f64;
        }
    }
    if hits == 0 {
        0.0
    } else {
        sum / hits as f64
    }
}

/// First 1-based position of any known fact in the subject-held-out ranking,
/// improved by an earlier known fact in the object-held-out ranking.
///
/// Both rankings must be unfiltered. Falls back to the number of candidates
/// when neither ranking holds a known fact.
pub fn best_known_rank(subject_side: &Ranking, object_side: &Ranking, known: &KnownFactSet) -> usize {
    let first_known = |ranking: &Ranking| {
        ranking
            .candidates()
            .iter()
            .position(|c| ranking.forms_known_fact(c.entity, known))
            .map(|p| p + 1)
    };
    let fallback = subject_side.len().max(object_side.len());
    let subject_rank = first_known(subject_side).unwrap_or(fallback);
    match first_known(object_side) {
        Some(r) if r < subject_rank => r,
        _ => subject_rank,
    }
}
