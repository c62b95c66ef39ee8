//! Corpus and per-relation summaries of ranking and classification results.
//!
//! Pure aggregation: nothing is kept between calls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use triples::{RelationId, RelationIndex, Triple};

use crate::evaluation::evaluator::{RankingSummary, TripleEvaluation};

/// Default best-known-rank ceiling for the capped MRR.
pub const DEFAULT_RANK_CAP: usize = 100;

/// Outcome of classifying one labeled triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedTriple {
    pub triple: Triple,
    pub truth: bool,
    pub predicted: bool,
}

impl ClassifiedTriple {
    pub fn is_correct(&self) -> bool {
        self.truth == self.predicted
    }
}

/// Classification and ranking metrics restricted to one relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationReport {
    pub relation: RelationId,
    /// Classified rows (positives and their corruptions).
    pub classified: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub ranking: RankingSummary,
}

/// Mean reciprocal rank of one relation over triples under the cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CappedRelationMrr {
    pub relation: RelationId,
    pub mrr: f64,
    pub mean_rank: f64,
    /// Triples whose best known-fact rank stayed under the cap.
    pub size: usize,
}

/// MRR computed on best known-fact ranks, ignoring ranks at or above `cap`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CappedMrr {
    pub cap: usize,
    pub relations: Vec<CappedRelationMrr>,
    pub total_mrr: f64,
}

/// Everything an evaluation run reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// `None` when nothing was classified.
    pub classification_accuracy: Option<f64>,
    pub corpus: RankingSummary,
    pub relations: Vec<RelationReport>,
    pub capped_mrr: CappedMrr,
    /// Rows left out of classification because their relation had no threshold.
    #[serde(default)]
    pub unclassified: usize,
}

/// Builds [`AggregateReport`]s.
#[derive(Debug, Clone, Copy)]
pub struct AggregateReporter {
    rank_cap: usize,
}

impl Default for AggregateReporter {
    fn default() -> Self {
        Self { rank_cap: DEFAULT_RANK_CAP }
    }
}

impl AggregateReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rank_cap(mut self, rank_cap: usize) -> Self {
        self.rank_cap = rank_cap;
        self
    }

    /// Capped MRR per relation and in total.
    pub fn capped_mrr(&self, evaluations: &[TripleEvaluation]) -> CappedMrr {
        // relation -> (sum of reciprocals, sum of ranks, count)
        let mut acc: BTreeMap<RelationId, (f64, usize, usize)> = BTreeMap::new();
        for e in evaluations {
            let entry = acc.entry(e.triple.relation).or_default();
            let rank = e.best_known_rank.max(1);
            if rank < self.rank_cap {
                entry.0 += 1.0 / rank as f64;
                entry.1 += rank;
                entry.2 += 1;
            }
        }

        let total_rr: f64 = acc.values().map(|v| v.0).sum();
        let total_n: usize = acc.values().map(|v| v.2).sum();
        let relations = acc
            .into_iter()
            .map(|(relation, (rr, ranks, n))| CappedRelationMrr {
                relation,
                mrr: rr / n.max(1) as f64,
                mean_rank: ranks as f64 / n.max(1) as f64,
                size: n,
            })
            .collect();

        CappedMrr {
            cap: self.rank_cap,
            relations,
            total_mrr: if total_n == 0 { 0.0 } else { total_rr / total_n as f64 },
        }
    }

    /// Corpus summary, per-relation breakdown and capped MRR.
    ///
    /// Relations appear if they occur in either input, in id order.
    pub fn report(&self, evaluations: &[TripleEvaluation], classified: &[ClassifiedTriple]) -> AggregateReport {
        let mut by_relation: BTreeMap<RelationId, (Vec<&TripleEvaluation>, usize, usize)> = BTreeMap::new();
        for e in evaluations {
            by_relation.entry(e.triple.relation).or_default().0.push(e);
        }
        for c in classified {
            let entry = by_relation.entry(c.triple.relation).or_default();
            entry.1 += 1;
            entry.2 += usize::from(c.is_correct());
        }

        let relations = by_relation
            .into_iter()
            .map(|(relation, (evals, n, correct))| RelationReport {
                relation,
                classified: n,
                correct,
                accuracy: if n == 0 { 0.0 } else { correct as f64 / n as f64 },
                ranking: RankingSummary::from_evaluations(evals),
            })
            .collect();

        let classification_accuracy = (!classified.is_empty()).then(|| {
            classified.iter().filter(|c| c.is_correct()).count() as f64 / classified.len() as f64
        });

        AggregateReport {
            classification_accuracy,
            corpus: RankingSummary::from_evaluations(evaluations),
            relations,
            capped_mrr: self.capped_mrr(evaluations),
            unclassified: 0,
        }
    }
}

fn pct(x: f64) -> String {
    format!("{:.2}%", 100.0 * x)
}

fn relation_name(relations: &RelationIndex, id: RelationId) -> String {
    relations.name(id).map(str::to_string).unwrap_or_else(|| id.to_string())
}

/// One row of the per-relation CSV table; metric columns are percentages.
#[derive(Serialize)]
struct CsvRow {
    relation: String,
    classified: usize,
    correct: usize,
    accuracy: String,
    mean_rank: String,
    hits_at_10: String,
    hits_at_100: String,
    precision_at_10: String,
    precision_at_100: String,
    ranking_accuracy: String,
    map: Option<String>,
}

const CSV_HEADER: [&str; 11] = [
    "relation",
    "classified",
    "correct",
    "accuracy",
    "mean_rank",
    "hits_at_10",
    "hits_at_100",
    "precision_at_10",
    "precision_at_100",
    "ranking_accuracy",
    "map",
];

fn two_places(x: f64) -> String {
    format!("{x:.2}")
}

impl AggregateReport {
    /// Human-readable report lines, percentages with two decimals.
    pub fn render_text(&self, relations: &RelationIndex) -> Vec<String> {
        let c = &self.corpus;
        let mut lines = Vec::new();
        if let Some(acc) = self.classification_accuracy {
            lines.push(format!("Test set accuracy: {}", pct(acc)));
        }
        if self.unclassified > 0 {
            lines.push(format!("Rows without a calibrated threshold: {}", self.unclassified));
        }
        lines.push(format!("Test average rank: {:.2}", c.mean_rank));
        lines.push(format!("Test hits at 10: {}", pct(c.hits_at_10)));
        lines.push(format!("Test hits at 100: {}", pct(c.hits_at_100)));
        lines.push(format!("Test precision at 10: {}", pct(c.precision_at_10)));
        lines.push(format!("Test precision at 100: {}", pct(c.precision_at_100)));
        lines.push(format!("Test ranking accuracy: {}", pct(c.ranking_accuracy)));
        if c.ranking_accuracy_excluded > 0 {
            lines.push(format!("Ranking accuracy not computable for {} rankings", c.ranking_accuracy_excluded));
        }
        if let Some(map) = c.mean_average_precision {
            lines.push(format!("Mean Average Precision: {}", pct(map)));
        }

        lines.push("Relationship breakdown:".to_string());
        for r in &self.relations {
            let k = &r.ranking;
            lines.push(format!(
                "acc: {} rel: {}, {} / {}, avg_rank: {:.2}, hits@10: {}, hits@100: {}, p@10: {}, p@100: {}, ranking_acc: {}, map: {}",
                pct(r.accuracy),
                relation_name(relations, r.relation),
                r.correct,
                r.classified,
                k.mean_rank,
                pct(k.hits_at_10),
                pct(k.hits_at_100),
                pct(k.precision_at_10),
                pct(k.precision_at_100),
                pct(k.ranking_accuracy),
                k.mean_average_precision.map(pct).unwrap_or_else(|| "n/a".to_string()),
            ));
        }

        lines.push(format!("Mean reciprocal rank (best known-fact rank < {}):", self.capped_mrr.cap));
        for m in &self.capped_mrr.relations {
            lines.push(format!(
                "rel: {}, mrr: {}, mean_rank: {:.2}, size: {}",
                relation_name(relations, m.relation),
                pct(m.mrr),
                m.mean_rank,
                m.size
            ));
        }
        lines.push(format!("Total MRR: {}", pct(self.capped_mrr.total_mrr)));
        lines
    }

    /// Per-relation table as CSV; metric columns are percentages.
    pub fn render_csv(&self, relations: &RelationIndex) -> anyhow::Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        // Serialized rows bring their own header; an empty table still gets one.
        if self.relations.is_empty() {
            writer.write_record(CSV_HEADER)?;
        }
        for r in &self.relations {
            let k = &r.ranking;
            writer.serialize(CsvRow {
                relation: relation_name(relations, r.relation),
                classified: r.classified,
                correct: r.correct,
                accuracy: two_places(100.0 * r.accuracy),
                mean_rank: two_places(k.mean_rank),
                hits_at_10: two_places(100.0 * k.hits_at_10),
                hits_at_100: two_places(100.0 * k.hits_at_100),
                precision_at_10: two_places(100.0 * k.precision_at_10),
                precision_at_100: two_places(100.0 * k.precision_at_100),
                ranking_accuracy: two_places(100.0 * k.ranking_accuracy),
                map: k.mean_average_precision.map(|m| two_places(100.0 * m)),
            })?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e.error()))?;
        Ok(String::from_utf8(bytes)?)
    }
}
