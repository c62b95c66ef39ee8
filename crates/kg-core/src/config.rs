//! TOML config loading for the embedding CLI.
//!
//! Deserializes `configs/train.toml` which has `[data]`, `[model]` and
//! `[training]` sections, then merges with CLI overrides.

use std::path::{Path, PathBuf};

use kge::training::{KgeTrainingConfig, OptimizerKind};
use kge::Distance;
use serde::Deserialize;

/// Top-level structure matching `configs/train.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct TrainToml {
    /// Splitting and preprocessing of the triple corpus.
    #[serde(default)]
    pub data: DataSection,
    /// Embedding table shape and energy function.
    #[serde(default)]
    pub model: ModelSection,
    /// Optimizer and loop overrides; unset fields keep the trainer defaults.
    #[serde(default)]
    pub training: TrainingOverrides,
}

#[derive(Debug, Deserialize)]
pub struct DataSection {
    /// Validation triples split off before the test tail.
    #[serde(default = "default_num_val")]
    pub num_val: usize,
    /// Test triples taken from the end of the corpus.
    #[serde(default = "default_num_test")]
    pub num_test: usize,
    /// Drop leakage between splits and unseen validation/test entities.
    #[serde(default = "default_true")]
    pub preprocess: bool,
    /// Separate subject and object replacement pools.
    #[serde(default)]
    pub separate_head_tail: bool,
    /// Optional entity vectors used to initialize the entity table.
    #[serde(default)]
    pub seed_embeddings: Option<PathBuf>,
}

fn default_num_val() -> usize {
    500
}

fn default_num_test() -> usize {
    500
}

fn default_true() -> bool {
    true
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            num_val: default_num_val(),
            num_test: default_num_test(),
            preprocess: true,
            separate_head_tail: false,
            seed_embeddings: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ModelSection {
    #[serde(default = "default_dim")]
    pub dim: usize,
    #[serde(default)]
    pub distance: Distance,
}

fn default_dim() -> usize {
    100
}

impl Default for ModelSection {
    fn default() -> Self {
        Self { dim: default_dim(), distance: Distance::default() }
    }
}

/// Optional overrides for `KgeTrainingConfig` fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainingOverrides {
    pub lr: Option<f64>,
    pub margin: Option<f64>,
    pub optimizer: Option<OptimizerKind>,
    pub max_entity_norm: Option<f64>,
    pub total_steps: Option<usize>,
    pub batch_size: Option<usize>,
    pub drop_partial_epoch: Option<bool>,
    pub max_tries: Option<usize>,
    pub log_interval: Option<usize>,
    pub validation_interval: Option<usize>,
    pub checkpoint_every_epochs: Option<usize>,
    pub seed: Option<u64>,
}

/// Load and deserialize a `TrainToml` from a TOML file.
pub fn load_train_toml(path: &Path) -> anyhow::Result<TrainToml> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {e}", path.display()))?;
    let config: TrainToml = toml::from_str(&contents)?;
    tracing::info!(path = %path.display(), "Loaded training config");
    Ok(config)
}

/// Build a `KgeTrainingConfig` from defaults, TOML overrides, and CLI flags.
///
/// Priority chain: `KgeTrainingConfig::new()` defaults < TOML values < CLI.
pub fn build_training_config(
    toml: &TrainToml,
    cli: &TrainingOverrides,
    distance: Distance,
    checkpoint_dir: &Path,
) -> KgeTrainingConfig {
    let mut config = KgeTrainingConfig::new()
        .with_distance(distance)
        .with_separate_head_tail(toml.data.separate_head_tail)
        .with_checkpoint_dir(checkpoint_dir.to_string_lossy().into_owned());

    for o in [&toml.training, cli] {
        if let Some(v) = o.lr {
            config.lr = v;
        }
        if let Some(v) = o.margin {
            config.margin = v;
        }
        if let Some(v) = o.optimizer {
            config.optimizer = v;
        }
        if let Some(v) = o.max_entity_norm {
            config.max_entity_norm = v;
        }
        if let Some(v) = o.total_steps {
            config.total_steps = v;
        }
        if let Some(v) = o.batch_size {
            config.batch_size = v;
        }
        if let Some(v) = o.drop_partial_epoch {
            config.drop_partial_epoch = v;
        }
        if let Some(v) = o.max_tries {
            config.max_tries = v;
        }
        if let Some(v) = o.log_interval {
            config.log_interval = v;
        }
        if let Some(v) = o.validation_interval {
            config.validation_interval = v;
        }
        if let Some(v) = o.checkpoint_every_epochs {
            config.checkpoint_every_epochs = v;
        }
        if let Some(v) = o.seed {
            config.seed = v;
        }
    }

    config
}
