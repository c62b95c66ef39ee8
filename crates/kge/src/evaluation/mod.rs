//! Ranking evaluation: candidate rankers, per-ranking metrics, the parallel
//! link-prediction evaluator, threshold calibration for triple
//! classification, and aggregate reports.

pub mod evaluator;
pub mod metrics;
pub mod ranking;
pub mod report;
pub mod threshold;

pub use evaluator::{Evaluation, RankingEvaluator, RankingSummary, SideEvaluation, TripleEvaluation};
pub use ranking::{rank_all_entities, CandidateRanker, ExhaustiveRanker, RankedCandidate, Ranking};
pub use report::{AggregateReport, AggregateReporter, CappedMrr, ClassifiedTriple, RelationReport};
pub use threshold::{classification_accuracy, find_threshold, ThresholdMap};
