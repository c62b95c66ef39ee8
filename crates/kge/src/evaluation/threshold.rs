//! Per-relation decision thresholds for triple classification.
//!
//! Scores are plausibility scores (negated energies): a triple is classified
//! true when its score is strictly above its relation's threshold.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use triples::RelationId;

use crate::error::KgeError;

/// Threshold maximizing accuracy on `scores`/`truth`, and that accuracy.
///
/// Candidates are tried in order: `min - 1`, the midpoint between each pair
/// of adjacent distinct scores (ascending), then `max + 1`. The first
/// candidate reaching the best accuracy wins.
pub fn find_threshold(scores: &[f64], truth: &[bool]) -> Result<(f64, f64), KgeError> {
    if scores.is_empty() {
        return Err(KgeError::InvalidConfig("cannot calibrate a threshold on no scores".to_string()));
    }
    if scores.len() != truth.len() {
        return Err(KgeError::InvalidConfig(format!(
            "{} scores but {} truth labels",
            scores.len(),
            truth.len()
        )));
    }
    if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
        return Err(KgeError::InvalidConfig(format!("non-finite score {bad}")));
    }

    let mut pairs: Vec<(f64, bool)> = scores.iter().copied().zip(truth.iter().copied()).collect();
    pairs.sort_by_key(|&(s, _)| OrderedFloat(s));

    // Below every score, everything is predicted true.
    let mut correct = truth.iter().filter(|&&t| t).count();
    let mut best = (pairs[0].0 - 1.0, correct);

    let mut i = 0;
    while i < pairs.len() {
        let value = pairs[i].0;
        while i < pairs.len() && pairs[i].0 == value {
            if pairs[i].1 {
                correct -= 1;
            } else {
                correct += 1;
            }
            i += 1;
        }
        let threshold = match pairs.get(i) {
            Some(&(next, _)) => (value + next) / 2.0,
            None => value + 1.0,
        };
        if correct > best.1 {
            best = (threshold, correct);
        }
    }

    Ok((best.0, best.1 as f64 / pairs.len() as f64))
}

/// Relation → threshold, computed once from validation data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdMap {
    thresholds: BTreeMap<RelationId, f64>,
}

impl ThresholdMap {
    /// One threshold per relation present in the validation rows.
    pub fn calibrate(relations: &[RelationId], scores: &[f64], truth: &[bool]) -> Result<Self, KgeError> {
        if relations.len() != scores.len() || scores.len() != truth.len() {
            return Err(KgeError::InvalidConfig(format!(
                "calibration inputs differ in length: {} relations, {} scores, {} labels",
                relations.len(),
                scores.len(),
                truth.len()
            )));
        }

        let mut grouped: BTreeMap<RelationId, (Vec<f64>, Vec<bool>)> = BTreeMap::new();
        for ((&r, &s), &t) in relations.iter().zip(scores).zip(truth) {
            let entry = grouped.entry(r).or_default();
            entry.0.push(s);
            entry.1.push(t);
        }

        let mut thresholds = BTreeMap::new();
        for (relation, (s, t)) in grouped {
            let (threshold, accuracy) = find_threshold(&s, &t)?;
            tracing::debug!(%relation, threshold, accuracy, rows = s.len(), "Calibrated threshold");
            thresholds.insert(relation, threshold);
        }
        tracing::info!(relations = thresholds.len(), "Calibrated classification thresholds");
        Ok(Self { thresholds })
    }

    pub fn get(&self, relation: RelationId) -> Option<f64> {
        self.thresholds.get(&relation).copied()
    }

    pub fn insert(&mut self, relation: RelationId, threshold: f64) {
        self.thresholds.insert(relation, threshold);
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RelationId, f64)> + '_ {
        self.thresholds.iter().map(|(&r, &t)| (r, t))
    }

    /// `score > threshold(relation)` for one row.
    pub fn classify_one(&self, relation: RelationId, score: f64) -> Result<bool, KgeError> {
        let threshold = self.get(relation).ok_or(KgeError::NoThresholdForRelation(relation))?;
        Ok(score > threshold)
    }

    /// [`Self::classify_one`] for every row.
    ///
    /// A row whose relation was never calibrated gets its own error; the other
    /// rows are still classified. Only mismatched input lengths fail the call.
    pub fn classify(
        &self,
        relations: &[RelationId],
        scores: &[f64],
    ) -> Result<Vec<Result<bool, KgeError>>, KgeError> {
        if relations.len() != scores.len() {
            return Err(KgeError::InvalidConfig(format!(
                "{} relations but {} scores",
                relations.len(),
                scores.len()
            )));
        }
        Ok(relations
            .iter()
            .zip(scores)
            .map(|(&r, &s)| self.classify_one(r, s))
            .collect())
    }
}

/// Fraction of predictions equal to the truth labels (0 for no rows).
pub fn classification_accuracy(predictions: &[bool], truth: &[bool]) -> Result<f64, KgeError> {
    if predictions.len() != truth.len() {
        return Err(KgeError::InvalidConfig(format!(
            "{} predictions but {} truth labels",
            predictions.len(),
            truth.len()
        )));
    }
    if predictions.is_empty() {
        return Ok(0.0);
    }
    let correct = predictions.iter().zip(truth).filter(|(p, t)| p == t).count();
    Ok(correct as f64 / predictions.len() as f64)
}
