//! Result types written by `evaluate` and read back by `summary`.

use kge::evaluation::{AggregateReport, RankingSummary, ThresholdMap};
use serde::{Deserialize, Serialize};
use triples::RelationIndex;

/// Results from evaluating one pair of embedding files on a test set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Path of the entity embedding file.
    pub entity_embeddings: String,
    /// Path of the relation embedding file.
    pub relation_embeddings: String,
    /// Energy function used for ranking.
    pub distance: String,
    pub num_entities: usize,
    pub num_relations: usize,
    /// Test triples that were ranked.
    pub test_triples: usize,
    /// Test triples skipped because a name had no vector.
    pub skipped_triples: usize,
    /// Overall threshold classification accuracy, if classification ran.
    pub classification_accuracy: Option<f64>,
    /// Classification rows skipped because their relation had no threshold.
    #[serde(default)]
    pub unclassified_rows: usize,
    /// Corpus-level ranking metrics.
    pub ranking: RankingSummary,
    /// MRR over best known-fact ranks under the cap.
    pub capped_mrr: f64,
    pub rank_cap: usize,
    /// Per-relation breakdown, in relation id order.
    pub per_relation: Vec<RelationResult>,
}

/// Result for a single relation type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationResult {
    /// Relation name.
    pub name: String,
    /// Classified rows (positives and their corruptions).
    pub classified: usize,
    pub correct: usize,
    pub accuracy: f64,
    /// Calibrated plausibility threshold, if any.
    #[serde(default)]
    pub threshold: Option<f64>,
    pub ranking: RankingSummary,
    /// Capped MRR and how many triples it covers.
    #[serde(default)]
    pub capped_mrr: f64,
    #[serde(default)]
    pub capped_size: usize,
}

/// Thresholds and accuracy written by `classify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Rows in the calibration set (validation positives and corruptions).
    pub calibration_rows: usize,
    /// Rows classified on the test set.
    pub test_rows: usize,
    /// Test rows skipped because their relation had no threshold.
    #[serde(default)]
    pub unclassified_rows: usize,
    pub accuracy: f64,
    pub thresholds: Vec<RelationThreshold>,
}

/// Calibrated threshold of one relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationThreshold {
    pub name: String,
    pub threshold: f64,
}

impl EvaluationResult {
    /// Attach names and thresholds to an aggregate report.
    pub fn per_relation(
        report: &AggregateReport,
        relations: &RelationIndex,
        thresholds: Option<&ThresholdMap>,
    ) -> Vec<RelationResult> {
        report
            .relations
            .iter()
            .map(|r| {
                let capped = report.capped_mrr.relations.iter().find(|m| m.relation == r.relation);
                RelationResult {
                    name: relations
                        .name(r.relation)
                        .map(str::to_string)
                        .unwrap_or_else(|| r.relation.to_string()),
                    classified: r.classified,
                    correct: r.correct,
                    accuracy: r.accuracy,
                    threshold: thresholds.and_then(|t| t.get(r.relation)),
                    ranking: r.ranking.clone(),
                    capped_mrr: capped.map_or(0.0, |m| m.mrr),
                    capped_size: capped.map_or(0, |m| m.size),
                }
            })
            .collect()
    }

    /// Load a result file written by `evaluate`.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", path.display()))?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kge::evaluation::{AggregateReporter, SideEvaluation, TripleEvaluation};
    use triples::{HeldOut, NameIndexBuilder, RelationId, Triple};

    fn sample_result() -> EvaluationResult {
        EvaluationResult {
            entity_embeddings: "out/entity_embeddings.tsv".to_string(),
            relation_embeddings: "out/relation_embeddings.tsv".to_string(),
            distance: "euclidean".to_string(),
            num_entities: 40,
            num_relations: 3,
            test_triples: 12,
            skipped_triples: 1,
            classification_accuracy: Some(0.75),
            unclassified_rows: 0,
            ranking: RankingSummary { num_triples: 12, mean_rank: 4.5, ..Default::default() },
            capped_mrr: 0.4,
            rank_cap: 100,
            per_relation: vec![RelationResult {
                name: "has_part".to_string(),
                classified: 8,
                correct: 6,
                accuracy: 0.75,
                threshold: Some(-1.25),
                ranking: RankingSummary::default(),
                capped_mrr: 0.4,
                capped_size: 4,
            }],
        }
    }

    #[test]
    fn test_evaluation_result_serde_roundtrip() {
        let result = sample_result();
        let json = serde_json::to_string_pretty(&result).unwrap();
        let loaded: EvaluationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.num_entities, 40);
        assert_eq!(loaded.skipped_triples, 1);
        assert_eq!(loaded.ranking.num_triples, 12);
        assert_eq!(loaded.per_relation[0].name, "has_part");
        assert_eq!(loaded.per_relation[0].threshold, Some(-1.25));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("eval.json");
        std::fs::write(&path, serde_json::to_string(&sample_result()).unwrap()).unwrap();
        let loaded = EvaluationResult::load(&path).unwrap();
        assert_eq!(loaded.test_triples, 12);
        assert!(EvaluationResult::load(&tmp.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_classification_result_serde_roundtrip() {
        let result = ClassificationResult {
            calibration_rows: 20,
            test_rows: 24,
            unclassified_rows: 2,
            accuracy: 0.875,
            thresholds: vec![RelationThreshold { name: "part_of".to_string(), threshold: -0.4 }],
        };
        let json = serde_json::to_string(&result).unwrap();
        let loaded: ClassificationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.test_rows, 24);
        assert_eq!(loaded.unclassified_rows, 2);
        assert_eq!(loaded.thresholds[0].name, "part_of");
        assert!((loaded.thresholds[0].threshold + 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_per_relation_attaches_names_and_thresholds() {
        let side = |held_out| SideEvaluation {
            held_out,
            rank: 2,
            candidates: 10,
            precision_at_10: 0.1,
            precision_at_100: 0.01,
            ranking_accuracy: Some(0.3),
            average_precision: None,
        };
        let evals = vec![TripleEvaluation {
            triple: Triple::new(0, 1, 2),
            subject: side(HeldOut::Subject),
            object: side(HeldOut::Object),
            best_known_rank: 2,
        }];
        let report = AggregateReporter::new().report(&evals, &[]);

        let mut b = NameIndexBuilder::<RelationId>::new();
        b.intern("treats");
        b.intern("causes");
        let relations: RelationIndex = b.build();
        let mut thresholds = ThresholdMap::default();
        thresholds.insert(RelationId(1), 0.5);

        let rows = EvaluationResult::per_relation(&report, &relations, Some(&thresholds));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "causes");
        assert_eq!(rows[0].threshold, Some(0.5));
        assert!((rows[0].capped_mrr - 0.5).abs() < 1e-12);
        assert_eq!(rows[0].capped_size, 1);
    }
}
