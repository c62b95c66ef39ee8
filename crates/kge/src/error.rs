//! Error taxonomy for sampling, ranking, calibration and model loading.

use triples::{Field, HeldOut, RelationId, Triple};

/// Errors raised by the embedding harness.
///
/// Each variant aborts the current unit of work (one batch item, one metric,
/// one classification) and carries enough context to reproduce it.
#[derive(Debug, thiserror::Error)]
pub enum KgeError {
    /// No acceptable corruption found within the retry budget.
    #[error("no valid corruption of {triple} after {attempts} attempts")]
    SamplingExhausted { triple: Triple, attempts: usize },
    /// Ranking accuracy mass was zero or not finite.
    #[error("degenerate ranking distribution for {triple} with {held_out} held out")]
    DegenerateDistribution { triple: Triple, held_out: HeldOut },
    /// A test relation has no calibrated threshold.
    #[error("no threshold calibrated for relation {0}")]
    NoThresholdForRelation(RelationId),
    /// Embedding dimensionality disagrees with the configured size.
    #[error("embedding dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// A field eligible for corruption has nothing to replace it with.
    #[error("replacement pool for {0} is empty")]
    EmptyReplacementPool(Field),
    /// Invalid hyperparameter or input shape.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
