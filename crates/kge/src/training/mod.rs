//! Embedding training pipeline: single-field corruption, epoch-shuffled
//! batches, margin ranking loss, metrics with health checks, and the
//! optimizer loop with epoch checkpoints.

pub mod corrupt;
pub mod loss;
pub mod metrics;
pub mod provider;
pub mod trainer;

pub use corrupt::{contrastive_pairs, Corruptor, ReplacementPools};
pub use provider::{TrainingBatch, TrainingBatchProvider};
pub use trainer::{train, KgeTrainingConfig, OptimizerKind};
