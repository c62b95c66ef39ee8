//! Train / validation / test splitting and leakage cleanup.

use std::collections::HashSet;

use crate::types::{EntityId, KnownFactSet, Triple};

/// A corpus split into training, validation and test triples.
#[derive(Debug, Clone, Default)]
pub struct DataSplit {
    pub train: Vec<Triple>,
    pub val: Vec<Triple>,
    pub test: Vec<Triple>,
}

/// Counts of triples removed by [`DataSplit::preprocess`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreprocessStats {
    pub train_dropped: usize,
    pub val_dropped: usize,
    pub test_dropped: usize,
}

impl DataSplit {
    /// Split off the last `num_test` triples as test and the `num_val` before
    /// them as validation. Everything earlier is training data.
    pub fn split_tail(triples: &[Triple], num_val: usize, num_test: usize) -> anyhow::Result<Self> {
        let held = num_val + num_test;
        if held > triples.len() {
            anyhow::bail!(
                "cannot hold out {held} triples (val={num_val}, test={num_test}) from {}",
                triples.len()
            );
        }
        let num_train = triples.len() - held;
        Ok(Self {
            train: triples[..num_train].to_vec(),
            val: triples[num_train..num_train + num_val].to_vec(),
            test: triples[num_train + num_val..].to_vec(),
        })
    }

    /// Remove leakage between splits.
    ///
    /// Training triples whose (subject, object) pair appears in either
    /// direction in validation or test are dropped. Afterwards validation and
    /// test triples are dropped when their subject never occurs as a training
    /// subject or their object never occurs as a training object.
    pub fn preprocess(self) -> (Self, PreprocessStats) {
        let held_pairs: HashSet<(EntityId, EntityId)> = self
            .val
            .iter()
            .chain(&self.test)
            .flat_map(|t| [(t.subject, t.object), (t.object, t.subject)])
            .collect();

        let train_before = self.train.len();
        let train: Vec<Triple> = self
            .train
            .into_iter()
            .filter(|t| !held_pairs.contains(&(t.subject, t.object)))
            .collect();

        let subjects: HashSet<EntityId> = train.iter().map(|t| t.subject).collect();
        let objects: HashSet<EntityId> = train.iter().map(|t| t.object).collect();
        let seen = |t: &Triple| subjects.contains(&t.subject) && objects.contains(&t.object);

        let val_before = self.val.len();
        let val: Vec<Triple> = self.val.into_iter().filter(|t| seen(t)).collect();
        let test_before = self.test.len();
        let test: Vec<Triple> = self.test.into_iter().filter(|t| seen(t)).collect();

        let stats = PreprocessStats {
            train_dropped: train_before - train.len(),
            val_dropped: val_before - val.len(),
            test_dropped: test_before - test.len(),
        };
        tracing::info!(
            train = train.len(),
            val = val.len(),
            test = test.len(),
            train_dropped = stats.train_dropped,
            val_dropped = stats.val_dropped,
            test_dropped = stats.test_dropped,
            "Preprocessed split"
        );
        (Self { train, val, test }, stats)
    }

    /// Every triple of every split as one known-fact set.
    pub fn known_facts(&self) -> KnownFactSet {
        self.train.iter().chain(&self.val).chain(&self.test).collect()
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
