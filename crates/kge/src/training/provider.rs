//! Epoch-shuffled training batches of alternating positives and corruptions.

use rand::seq::SliceRandom;
use rand::Rng;
use triples::{FactLabel, Field, KnownFactSet, Triple};

use crate::error::KgeError;
use crate::training::corrupt::{Corruptor, ReplacementPools};

/// One training batch: rows `[pos, neg, pos, neg, …]` with labels `[1, 0, 1, 0, …]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingBatch {
    pub triples: Vec<Triple>,
    pub labels: Vec<f32>,
}

impl TrainingBatch {
    /// Number of rows (twice the number of positives).
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Positive rows (even positions).
    pub fn positives(&self) -> Vec<Triple> {
        self.triples.iter().step_by(2).copied().collect()
    }

    /// Negative rows (odd positions).
    pub fn negatives(&self) -> Vec<Triple> {
        self.triples.iter().skip(1).step_by(2).copied().collect()
    }
}

/// Cycles through a shuffled positive pool, pairing each positive with a corruption.
#[derive(Debug)]
pub struct TrainingBatchProvider {
    pool: Vec<Triple>,
    forbidden: KnownFactSet,
    corruptor: Corruptor,
    batch_size: usize,
    cursor: usize,
    epochs: usize,
    drop_partial_epoch: bool,
}

impl TrainingBatchProvider {
    /// Build a provider over `pool` and shuffle it once with `rng`.
    ///
    /// `batch_size` counts positives and must lie in `1..=pool.len()`.
    pub fn new(
        mut pool: Vec<Triple>,
        batch_size: usize,
        separate_head_tail: bool,
        rng: &mut impl Rng,
    ) -> Result<Self, KgeError> {
        if pool.is_empty() {
            return Err(KgeError::InvalidConfig("training pool is empty".to_string()));
        }
        if batch_size == 0 || batch_size > pool.len() {
            return Err(KgeError::InvalidConfig(format!(
                "batch size {batch_size} must be between 1 and the pool size {}",
                pool.len()
            )));
        }
        let forbidden: KnownFactSet = pool.iter().collect();
        let pools = ReplacementPools::from_triples(&pool, separate_head_tail);
        pool.shuffle(rng);

        tracing::info!(
            pool = pool.len(),
            batch_size,
            subjects = pools.subjects.len(),
            objects = pools.objects.len(),
            relations = pools.relations.len(),
            separate_head_tail,
            "Training batch provider ready"
        );

        Ok(Self {
            pool,
            forbidden,
            corruptor: Corruptor::new(pools),
            batch_size,
            cursor: 0,
            epochs: 0,
            drop_partial_epoch: true,
        })
    }

    /// Keep (`false`) or drop (`true`, the default) the tail of an epoch that
    /// is shorter than a batch.
    pub fn with_drop_partial_epoch(mut self, drop_partial_epoch: bool) -> Self {
        self.drop_partial_epoch = drop_partial_epoch;
        self
    }

    pub fn with_fields(mut self, fields: &[Field]) -> Self {
        self.corruptor = self.corruptor.with_fields(fields);
        self
    }

    pub fn with_max_tries(mut self, max_tries: usize) -> Self {
        self.corruptor = self.corruptor.with_max_tries(max_tries);
        self
    }

    /// Next batch of `batch_size` positives interleaved with their corruptions.
    ///
    /// When fewer than `batch_size` positives remain, the epoch counter is
    /// incremented and the pool reshuffled. The leftovers are dropped, or
    /// open the batch when `drop_partial_epoch` is off.
    pub fn next_batch(&mut self, rng: &mut impl Rng) -> Result<TrainingBatch, KgeError> {
        let mut positives = Vec::with_capacity(self.batch_size);
        let remaining = self.pool.len() - self.cursor;

        if remaining < self.batch_size {
            if !self.drop_partial_epoch {
                positives.extend_from_slice(&self.pool[self.cursor..]);
            }
            self.start_epoch(rng);
        }

        let take = self.batch_size - positives.len();
        positives.extend_from_slice(&self.pool[self.cursor..self.cursor + take]);
        self.cursor += take;

        let mut triples = Vec::with_capacity(self.batch_size * 2);
        let mut labels = Vec::with_capacity(self.batch_size * 2);
        for p in positives {
            let n = self.corruptor.corrupt(&p, &self.forbidden, rng)?;
            triples.push(p);
            labels.push(FactLabel::Positive.as_f32());
            triples.push(n);
            labels.push(FactLabel::Negative.as_f32());
        }
        Ok(TrainingBatch { triples, labels })
    }

    fn start_epoch(&mut self, rng: &mut impl Rng) {
        self.epochs += 1;
        self.cursor = 0;
        self.pool.shuffle(rng);
        tracing::debug!(epoch = self.epochs, "Epoch complete, reshuffled pool");
    }

    /// True when the next call to [`next_batch`](Self::next_batch) starts a new epoch.
    pub fn epoch_exhausted(&self) -> bool {
        self.pool.len() - self.cursor < self.batch_size
    }

    /// Number of times the pool has been exhausted and reshuffled.
    pub fn epochs_completed(&self) -> usize {
        self.epochs
    }
}
