//! Link-prediction evaluation over a set of test triples.
//!
//! Every test triple is ranked twice (subject held out, object held out)
//! against all entities. Triples are independent and evaluated in parallel;
//! summaries only use order-independent sums.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use triples::{HeldOut, KnownFactSet, Triple};

use crate::error::KgeError;
use crate::evaluation::metrics::{
    average_precision, best_known_rank, filtered_rank, precision_at_k, ranking_accuracy,
};
use crate::evaluation::ranking::{CandidateRanker, Ranking};

/// Metrics for one held-out side of one triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideEvaluation {
    pub held_out: HeldOut,
    /// Filtered 1-based rank of the answer.
    pub rank: usize,
    /// Candidates left after filtering other known facts (the answer included).
    pub candidates: usize,
    pub precision_at_10: f64,
    pub precision_at_100: f64,
    /// `None` when the mass distribution was degenerate.
    pub ranking_accuracy: Option<f64>,
    /// Only computed when average precision was requested.
    pub average_precision: Option<f64>,
}

/// Both sides of one evaluated triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripleEvaluation {
    pub triple: Triple,
    pub subject: SideEvaluation,
    pub object: SideEvaluation,
    /// Best known-fact rank across both unfiltered rankings.
    pub best_known_rank: usize,
}

impl TripleEvaluation {
    pub fn sides(&self) -> [&SideEvaluation; 2] {
        [&self.subject, &self.object]
    }
}

/// Corpus-level ranking metrics over the union of both held-out sides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingSummary {
    pub num_triples: usize,
    /// Number of ranks (two per triple).
    pub num_ranks: usize,
    pub mean_rank: f64,
    pub mean_reciprocal_rank: f64,
    pub hits_at_10: f64,
    pub hits_at_100: f64,
    pub precision_at_10: f64,
    pub precision_at_100: f64,
    /// Mean over computable values only.
    pub ranking_accuracy: f64,
    /// Sides whose ranking accuracy was not computable.
    pub ranking_accuracy_excluded: usize,
    pub mean_average_precision: Option<f64>,
}

impl RankingSummary {
    /// Summarize any collection of triple evaluations.
    pub fn from_evaluations<'a>(evaluations: impl IntoIterator<Item = &'a TripleEvaluation>) -> Self {
        let mut s = Self::default();
        let mut rank_sum = 0.0;
        let mut rr_sum = 0.0;
        let mut h10 = 0usize;
        let mut h100 = 0usize;
        let mut p10 = 0.0;
        let mut p100 = 0.0;
        let mut acc_sum = 0.0;
        let mut acc_n = 0usize;
        let mut ap_sum = 0.0;
        let mut ap_n = 0usize;

        for e in evaluations {
            s.num_triples += 1;
            for side in e.sides() {
                s.num_ranks += 1;
                rank_sum += side.rank as f64;
                rr_sum += 1.0 / side.rank as f64;
                h10 += usize::from(side.rank <= 10);
                h100 += usize::from(side.rank <= 100);
                p10 += side.precision_at_10;
                p100 += side.precision_at_100;
                match side.ranking_accuracy {
                    Some(a) => {
                        acc_sum += a;
                        acc_n += 1;
                    }
                    None => s.ranking_accuracy_excluded += 1,
                }
                if let Some(ap) = side.average_precision {
                    ap_sum += ap;
                    ap_n += 1;
                }
            }
        }

        if s.num_ranks > 0 {
            let n = s.num_ranks as f64;
            s.mean_rank = rank_sum / n;
            s.mean_reciprocal_rank = rr_sum / n;
            s.hits_at_10 = h10 as f64 / n;
            s.hits_at_100 = h100 as f64 / n;
            s.precision_at_10 = p10 / n;
            s.precision_at_100 = p100 / n;
        }
        if acc_n > 0 {
            s.ranking_accuracy = acc_sum / acc_n as f64;
        }
        if ap_n > 0 {
            s.mean_average_precision = Some(ap_sum / ap_n as f64);
        }
        s
    }

    pub fn summary(&self) -> String {
        format!(
            "MR: {:.2} | MRR: {:.4} | H@10: {:.3} | H@100: {:.3} | P@10: {:.3} | P@100: {:.3} | RA: {:.3} (n={})",
            self.mean_rank,
            self.mean_reciprocal_rank,
            self.hits_at_10,
            self.hits_at_100,
            self.precision_at_10,
            self.precision_at_100,
            self.ranking_accuracy,
            self.num_triples,
        )
    }
}

/// Per-triple results plus their corpus summary.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub triples: Vec<TripleEvaluation>,
    pub summary: RankingSummary,
}

/// Filtered link-prediction evaluator.
pub struct RankingEvaluator<'a, R: CandidateRanker> {
    ranker: R,
    known: &'a KnownFactSet,
}

impl<'a, R: CandidateRanker> RankingEvaluator<'a, R> {
    /// `known` holds every true triple (train, validation and test).
    pub fn new(ranker: R, known: &'a KnownFactSet) -> Self {
        Self { ranker, known }
    }

    /// Evaluate one triple on both held-out sides.
    pub fn evaluate_triple(&self, triple: &Triple, calc_map: bool) -> Result<TripleEvaluation, KgeError> {
        let subject_ranking = self.ranker.rank(triple, HeldOut::Subject, None);
        let object_ranking = self.ranker.rank(triple, HeldOut::Object, None);

        let side = |ranking: &Ranking| -> Result<SideEvaluation, KgeError> {
            let rank = filtered_rank(ranking, self.known).ok_or_else(|| {
                KgeError::InvalidConfig(format!(
                    "answer of {triple} with {} held out is not a ranked candidate",
                    ranking.held_out()
                ))
            })?;
            let others = ranking
                .candidates()
                .iter()
                .filter(|c| c.entity != ranking.answer() && ranking.forms_known_fact(c.entity, self.known))
                .count();
            let accuracy = match ranking_accuracy(ranking, self.known) {
                Ok(a) => Some(a),
                Err(e) => {
                    tracing::warn!(error = %e, "ranking accuracy not computable");
                    None
                }
            };
            Ok(SideEvaluation {
                held_out: ranking.held_out(),
                rank,
                candidates: ranking.len() - others,
                precision_at_10: precision_at_k(10, ranking, self.known)?,
                precision_at_100: precision_at_k(100, ranking, self.known)?,
                ranking_accuracy: accuracy,
                average_precision: calc_map.then(|| average_precision(ranking, self.known)),
            })
        };

        Ok(TripleEvaluation {
            triple: *triple,
            subject: side(&subject_ranking)?,
            object: side(&object_ranking)?,
            best_known_rank: best_known_rank(&subject_ranking, &object_ranking, self.known),
        })
    }

    /// Evaluate all `test_triples` in parallel and summarize.
    pub fn evaluate(&self, test_triples: &[Triple], calc_map: bool) -> Result<Evaluation, KgeError> {
        self.evaluate_with_progress(test_triples, calc_map, || {})
    }

    /// Like [`evaluate`](Self::evaluate), calling `on_triple` after each triple.
    pub fn evaluate_with_progress<F>(
        &self,
        test_triples: &[Triple],
        calc_map: bool,
        on_triple: F,
    ) -> Result<Evaluation, KgeError>
    where
        F: Fn() + Sync,
    {
        let start = Instant::now();
        tracing::info!(triples = test_triples.len(), calc_map, "Starting ranking evaluation");

        let triples = test_triples
            .par_iter()
            .map(|t| {
                let result = self.evaluate_triple(t, calc_map);
                on_triple();
                result
            })
            .collect::<Result<Vec<_>, _>>()?;

        let summary = RankingSummary::from_evaluations(&triples);
        tracing::info!(
            elapsed_secs = format!("{:.1}", start.elapsed().as_secs_f64()),
            excluded = summary.ranking_accuracy_excluded,
            "Evaluation complete: {}",
            summary.summary()
        );
        Ok(Evaluation { triples, summary })
    }
}
