//! TransE training loop with margin ranking loss and a selectable optimizer.
//!
//! Ties together the batch provider, the TransE module, the margin loss and
//! metrics. Entity rows are projected back onto the max-norm ball after every
//! step. Checkpoints are written at epoch boundaries, never mid-batch.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use burn::module::AutodiffModule;
use burn::optim::{AdaGradConfig, AdamConfig, GradientsParams, Optimizer, SgdConfig};
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::backend::AutodiffBackend;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use triples::{LabeledTriple, Triple};

use crate::error::KgeError;
use crate::model::bridge::{tensor_to_f64, tensor_to_vec, TripleTensors};
use crate::model::distance::Distance;
use crate::model::transe::{TransE, TransEConfig};
use crate::training::loss::margin_ranking_loss;
use crate::training::metrics::{pair_ranking_accuracy, TrainingMetrics};
use crate::training::provider::TrainingBatchProvider;

/// Metadata saved alongside each checkpoint for resuming training.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CheckpointMeta {
    pub step: usize,
    pub epochs_completed: usize,
    /// Seed the run was started with; the RNG at `step` is derived from it.
    #[serde(default)]
    pub seed: u64,
}

/// RNG for a run with `seed` that starts (or resumes) at `step`.
///
/// Step 0 is plain `seed_from_u64(seed)`. Later steps get an independent
/// stream, so a resumed run does not replay the opening shuffle.
pub fn training_rng(seed: u64, step: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (step as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Gradient-based optimizer used for the embedding tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    AdaGrad,
    Sgd,
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adam => write!(f, "adam"),
            Self::AdaGrad => write!(f, "adagrad"),
            Self::Sgd => write!(f, "sgd"),
        }
    }
}

impl FromStr for OptimizerKind {
    type Err = KgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adam" => Ok(Self::Adam),
            "adagrad" => Ok(Self::AdaGrad),
            "sgd" | "gd" => Ok(Self::Sgd),
            other => Err(KgeError::InvalidConfig(format!("unknown optimizer '{other}'"))),
        }
    }
}

/// Configuration for embedding training.
#[derive(Config, Debug)]
pub struct KgeTrainingConfig {
    /// Learning rate passed to the optimizer every step.
    #[config(default = 1.0)]
    pub lr: f64,
    /// Margin of the ranking loss.
    #[config(default = 1.0)]
    pub margin: f64,
    /// Energy function; must have a tensor form.
    #[config(default = "Distance::Euclidean")]
    pub distance: Distance,
    /// Optimizer for both embedding tables.
    #[config(default = "OptimizerKind::AdaGrad")]
    pub optimizer: OptimizerKind,
    /// Entity rows are rescaled onto this L2 ball after each step.
    #[config(default = 1.0)]
    pub max_entity_norm: f64,
    /// Total number of training steps (batches).
    #[config(default = 100_000)]
    pub total_steps: usize,
    /// Positives per batch; each is paired with one corruption.
    #[config(default = 100)]
    pub batch_size: usize,
    /// Replace subjects only by subjects and objects only by objects.
    #[config(default = false)]
    pub separate_head_tail: bool,
    /// Drop the tail of an epoch that is shorter than a batch.
    #[config(default = true)]
    pub drop_partial_epoch: bool,
    /// Retry budget for each corruption.
    #[config(default = 1000)]
    pub max_tries: usize,
    /// Steps between metric logging.
    #[config(default = 1000)]
    pub log_interval: usize,
    /// Steps between validation passes.
    #[config(default = 5000)]
    pub validation_interval: usize,
    /// Epochs between checkpoints (0 disables epoch checkpoints).
    #[config(default = 1)]
    pub checkpoint_every_epochs: usize,
    /// Seed for shuffling and negative sampling.
    #[config(default = 1337)]
    pub seed: u64,
    /// Directory for saving checkpoints.
    #[config(default = "String::from(\"checkpoints/kge\")")]
    pub checkpoint_dir: String,
}

impl KgeTrainingConfig {
    /// Reject settings the training loop cannot run with.
    pub fn validate(&self) -> Result<(), KgeError> {
        if !self.distance.supports_training() {
            return Err(KgeError::InvalidConfig(format!(
                "distance '{}' cannot be used for training",
                self.distance
            )));
        }
        if self.max_entity_norm <= 0.0 {
            return Err(KgeError::InvalidConfig("max_entity_norm must be > 0".to_string()));
        }
        if self.lr <= 0.0 {
            return Err(KgeError::InvalidConfig("lr must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Validation outcome on labeled `[pos, neg, …]` pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationMetrics {
    pub loss: f64,
    pub pair_accuracy: f64,
}

/// Score labeled validation pairs without gradients.
pub fn validate<B: Backend>(
    model: &TransE<B>,
    pairs: &[LabeledTriple],
    distance: Distance,
    margin: f64,
    device: &B::Device,
) -> anyhow::Result<ValidationMetrics> {
    if pairs.len() < 2 {
        anyhow::bail!("validation needs at least one (positive, negative) pair");
    }
    let triples: Vec<Triple> = pairs.iter().map(|p| p.triple).collect();
    let energy = model.forward(TripleTensors::from_triples(&triples, device), distance)?;
    let energies = tensor_to_vec(energy)?;

    let mut loss = 0.0;
    for pair in energies.chunks_exact(2) {
        loss += (margin + pair[0] - pair[1]).max(0.0);
    }
    Ok(ValidationMetrics {
        loss,
        pair_accuracy: pair_ranking_accuracy(&energies),
    })
}

/// Running average accumulator for training metrics over a logging interval.
struct RunningAvg {
    loss: f64,
    acc: f64,
    gap: f64,
    pos_e: f64,
    neg_e: f64,
    count: usize,
}

impl RunningAvg {
    fn new() -> Self {
        Self { loss: 0.0, acc: 0.0, gap: 0.0, pos_e: 0.0, neg_e: 0.0, count: 0 }
    }

    fn update(&mut self, m: &TrainingMetrics) {
        self.loss += m.loss;
        self.acc += m.pair_accuracy;
        self.gap += m.energy_gap;
        self.pos_e += m.pos_energy_mean;
        self.neg_e += m.neg_energy_mean;
        self.count += 1;
    }

    fn display(&self) -> String {
        if self.count == 0 {
            return "no data".to_string();
        }
        let n = self.count as f64;
        format!(
            "loss={:.4} pair_acc={:.3} gap={:.3} pos_e={:.3} neg_e={:.3}",
            self.loss / n, self.acc / n, self.gap / n, self.pos_e / n, self.neg_e / n,
        )
    }

    fn avg_metrics(&self) -> Option<TrainingMetrics> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(TrainingMetrics {
            loss: self.loss / n,
            pair_accuracy: self.acc / n,
            energy_gap: self.gap / n,
            pos_energy_mean: self.pos_e / n,
            neg_energy_mean: self.neg_e / n,
        })
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Run the embedding training loop.
///
/// # Arguments
/// - `config`: training hyperparameters
/// - `model`: initialized TransE model (consumed and returned updated)
/// - `train_triples`: positive pool for the batch provider
/// - `validation`: optional labeled `[pos, neg, …]` pairs scored every
///   `validation_interval` steps
/// - `device`: burn device for tensor operations
/// - `resume_step`: if `Some(step)`, load optimizer state and metadata from
///   `{checkpoint_dir}/step_{step}/` and continue from that step
///
/// # Returns
/// The trained model.
pub fn train<B: AutodiffBackend>(
    config: &KgeTrainingConfig,
    model: TransE<B>,
    train_triples: &[Triple],
    validation: Option<&[LabeledTriple]>,
    device: &B::Device,
    resume_step: Option<usize>,
) -> anyhow::Result<TransE<B>> {
    config.validate()?;
    std::fs::create_dir_all(&config.checkpoint_dir)?;

    tracing::info!(
        optimizer = %config.optimizer,
        distance = %config.distance,
        margin = config.margin,
        lr = config.lr,
        "Training TransE"
    );

    match config.optimizer {
        OptimizerKind::Adam => run_loop(config, model, AdamConfig::new().init(), train_triples, validation, device, resume_step),
        OptimizerKind::AdaGrad => run_loop(config, model, AdaGradConfig::new().init(), train_triples, validation, device, resume_step),
        OptimizerKind::Sgd => run_loop(config, model, SgdConfig::new().init(), train_triples, validation, device, resume_step),
    }
}

fn run_loop<B, O>(
    config: &KgeTrainingConfig,
    mut model: TransE<B>,
    mut optimizer: O,
    train_triples: &[Triple],
    validation: Option<&[LabeledTriple]>,
    device: &B::Device,
    resume_step: Option<usize>,
) -> anyhow::Result<TransE<B>>
where
    B: AutodiffBackend,
    O: Optimizer<TransE<B>, B>,
{
    let mut running_avg = RunningAvg::new();
    let train_start = Instant::now();
    let mut epochs_offset = 0;
    let start_step: usize;

    // Resume from checkpoint if requested
    if let Some(step) = resume_step {
        let step_dir = format!("{}/step_{step}", config.checkpoint_dir);
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();

        let optim_path = format!("{step_dir}/optimizer");
        let optim_record = recorder
            .load(optim_path.into(), device)
            .map_err(|e| anyhow::anyhow!("Failed to load optimizer from {step_dir}: {e}"))?;
        optimizer = optimizer.load_record(optim_record);

        let meta_path = format!("{step_dir}/meta.json");
        let meta: CheckpointMeta = serde_json::from_reader(
            std::fs::File::open(&meta_path)
                .map_err(|e| anyhow::anyhow!("Failed to open {meta_path}: {e}"))?,
        )
        .map_err(|e| anyhow::anyhow!("Failed to parse {meta_path}: {e}"))?;
        epochs_offset = meta.epochs_completed;
        start_step = meta.step;
        if meta.seed != config.seed {
            tracing::warn!(
                checkpoint_seed = meta.seed,
                config_seed = config.seed,
                "Resuming with a different seed than the checkpointed run"
            );
        }

        tracing::info!(start_step, epochs_completed = epochs_offset, "Resumed training from checkpoint");
    } else {
        start_step = 0;
    }

    let mut rng = training_rng(config.seed, start_step);
    let mut provider = TrainingBatchProvider::new(
        train_triples.to_vec(),
        config.batch_size,
        config.separate_head_tail,
        &mut rng,
    )?
    .with_drop_partial_epoch(config.drop_partial_epoch)
    .with_max_tries(config.max_tries);

    for step in start_step..config.total_steps {
        // Save checkpoint at epoch boundaries, before the next epoch's first batch
        if provider.epoch_exhausted() && step > start_step {
            let epoch = epochs_offset + provider.epochs_completed() + 1;
            if config.checkpoint_every_epochs > 0 && epoch % config.checkpoint_every_epochs == 0 {
                let step_dir = format!("{}/step_{step}", config.checkpoint_dir);
                save_checkpoint(&step_dir, &model, &optimizer, &CheckpointMeta { step, epochs_completed: epoch, seed: config.seed })?;
                tracing::info!(step, epoch, "Checkpoint saved (model + optimizer + meta)");
            }
        }

        let batch = provider.next_batch(&mut rng).map_err(|e| {
            tracing::error!(step, error = %e, "Batch construction failed");
            e
        })?;

        let pos = TripleTensors::from_triples(&batch.positives(), device);
        let neg = TripleTensors::from_triples(&batch.negatives(), device);
        let pos_energy = model.forward(pos, config.distance)?;
        let neg_energy = model.forward(neg, config.distance)?;

        // Values for metrics (before backward consumes the graph)
        let pos_values = tensor_to_vec(pos_energy.clone())?;
        let neg_values = tensor_to_vec(neg_energy.clone())?;

        let loss = margin_ranking_loss(pos_energy, neg_energy, config.margin);
        let loss_val = tensor_to_f64(loss.clone());

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optimizer.step(config.lr, model, grads);
        model = model.project_entities(config.max_entity_norm);

        running_avg.update(&TrainingMetrics::compute(&pos_values, &neg_values, loss_val));

        // Log metrics at intervals
        if config.log_interval > 0 && step % config.log_interval == 0 {
            if let Some(m) = running_avg.avg_metrics() {
                let warnings = m.health_check();
                if !warnings.is_empty() {
                    tracing::warn!(step, "Health check warnings: {:?}", warnings);
                }
            }
            let elapsed = train_start.elapsed().as_secs_f64();
            let done = step + 1 - start_step;
            let remaining = elapsed * (config.total_steps - step - 1) as f64 / done as f64;
            let eta = if remaining < 60.0 {
                format!("{:.0}s", remaining)
            } else if remaining < 3600.0 {
                format!("{:.0}m", remaining / 60.0)
            } else {
                format!("{:.1}h", remaining / 3600.0)
            };
            let epoch = epochs_offset + provider.epochs_completed();
            tracing::info!(step, epoch, eta, "avg({}) {}", running_avg.count, running_avg.display());
            running_avg.reset();
        }

        // Validation at intervals
        if let Some(pairs) = validation {
            if config.validation_interval > 0 && step > 0 && step % config.validation_interval == 0 {
                let v = validate(&model.valid(), pairs, config.distance, config.margin, device)?;
                tracing::info!(
                    step,
                    val_loss = format!("{:.4}", v.loss),
                    val_pair_acc = format!("{:.4}", v.pair_accuracy),
                    "Validation"
                );
            }
        }
    }

    let epochs_completed = epochs_offset + provider.epochs_completed();
    tracing::info!(
        steps = config.total_steps.saturating_sub(start_step),
        epochs_completed,
        elapsed_secs = format!("{:.1}", train_start.elapsed().as_secs_f64()),
        "Training loop finished"
    );

    let final_dir = format!("{}/final", config.checkpoint_dir);
    save_checkpoint(
        &final_dir,
        &model,
        &optimizer,
        &CheckpointMeta { step: config.total_steps, epochs_completed, seed: config.seed },
    )?;
    tracing::info!("Training complete. Final checkpoint saved (model + optimizer + meta).");

    Ok(model)
}

fn save_checkpoint<B, O>(
    dir: &str,
    model: &TransE<B>,
    optimizer: &O,
    meta: &CheckpointMeta,
) -> anyhow::Result<()>
where
    B: AutodiffBackend,
    O: Optimizer<TransE<B>, B>,
{
    std::fs::create_dir_all(dir)?;
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();

    let model_path = format!("{dir}/model");
    model
        .clone()
        .save_file(&model_path, &recorder)
        .map_err(|e| anyhow::anyhow!("Failed to save model to {dir}: {e}"))?;

    let optim_path = format!("{dir}/optimizer");
    recorder
        .record(optimizer.to_record(), optim_path.into())
        .map_err(|e| anyhow::anyhow!("Failed to save optimizer to {dir}: {e}"))?;

    let meta_path = format!("{dir}/meta.json");
    serde_json::to_writer(std::fs::File::create(&meta_path)?, meta)?;
    Ok(())
}

/// Load a TransE model from a checkpoint file.
///
/// Creates a fresh model from config, then loads saved weights on top.
pub fn resume_from_checkpoint<B: Backend>(
    path: &Path,
    config: &TransEConfig,
    device: &B::Device,
) -> anyhow::Result<TransE<B>> {
    let model = config
        .init::<B>(device)
        .load_file(path, &NamedMpkFileRecorder::<FullPrecisionSettings>::new(), device)
        .map_err(|e| anyhow::anyhow!("Failed to load checkpoint from {}: {e}", path.display()))?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::embeddings::EmbeddingModel;
    use burn::backend::ndarray::NdArray;
    use burn::backend::Autodiff;
    use tempfile::TempDir;

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<NdArray<f32>>;

    /// `0 -> 1 -> … -> n-1` under relation 0.
    fn chain(n: u32) -> Vec<Triple> {
        (0..n - 1).map(|i| Triple::new(i, 0, i + 1)).collect()
    }

    #[test]
    fn test_optimizer_kind_parse() {
        assert_eq!("adam".parse::<OptimizerKind>().unwrap(), OptimizerKind::Adam);
        assert_eq!("AdaGrad".parse::<OptimizerKind>().unwrap(), OptimizerKind::AdaGrad);
        assert_eq!("gd".parse::<OptimizerKind>().unwrap(), OptimizerKind::Sgd);
        assert!("rmsprop".parse::<OptimizerKind>().is_err());
        assert_eq!(OptimizerKind::AdaGrad.to_string(), "adagrad");
    }

    #[test]
    fn test_config_validate() {
        assert!(KgeTrainingConfig::new().validate().is_ok());
        assert!(KgeTrainingConfig::new().with_distance(Distance::Angular).validate().is_err());
        assert!(KgeTrainingConfig::new().with_max_entity_norm(0.0).validate().is_err());
    }

    #[test]
    fn test_validate_pairs() {
        let device = Default::default();
        let host = crate::model::KgEmbeddings::new(
            1,
            vec![0.0, 1.0, 5.0],
            vec![1.0],
            Distance::SqEuclidean,
        )
        .unwrap();
        let model = TransE::<TestBackend>::from_embeddings(&host, &device);
        // (0 + 1 -> 1) has energy 0, (0 + 1 -> 2) has energy 16.
        let pairs = vec![
            LabeledTriple::positive(Triple::new(0, 0, 1)),
            LabeledTriple::negative(Triple::new(0, 0, 2)),
        ];
        let v = validate(&model, &pairs, Distance::SqEuclidean, 1.0, &device).unwrap();
        assert!((v.pair_accuracy - 1.0).abs() < 1e-9);
        assert!(v.loss.abs() < 1e-9);
        assert!(validate(&model, &pairs[..1], Distance::SqEuclidean, 1.0, &device).is_err());
    }

    #[test]
    fn test_training_separates_positives_and_writes_checkpoints() {
        let tmp = TempDir::new().unwrap();
        let device = Default::default();
        let triples = chain(8);
        let config = KgeTrainingConfig::new()
            .with_total_steps(300)
            .with_batch_size(4)
            .with_lr(0.05)
            .with_margin(0.5)
            .with_optimizer(OptimizerKind::Adam)
            .with_distance(Distance::SqEuclidean)
            .with_log_interval(100)
            .with_validation_interval(100)
            .with_checkpoint_every_epochs(50)
            .with_checkpoint_dir(tmp.path().join("ckpt").to_string_lossy().into_owned());

        let model = TransEConfig::new(8, 1).with_dim(8).init::<TestAutodiffBackend>(&device);
        let mut rng = StdRng::seed_from_u64(1);
        let known: triples::KnownFactSet = triples.iter().collect();
        let val = crate::training::corrupt::contrastive_pairs(&triples, &known, &mut rng, 100).unwrap();

        let trained = train(&config, model, &triples, Some(&val), &device, None).unwrap();

        let v = validate(&trained.valid(), &val, Distance::SqEuclidean, 1.0, &device).unwrap();
        assert!(v.pair_accuracy >= 0.75, "pair accuracy after training: {}", v.pair_accuracy);

        let final_dir = tmp.path().join("ckpt/final");
        assert!(final_dir.join("model.mpk").exists());
        let meta: CheckpointMeta =
            serde_json::from_reader(std::fs::File::open(final_dir.join("meta.json")).unwrap()).unwrap();
        assert_eq!(meta.step, 300);
        // 7 positives, batch of 4, partial tail dropped: one batch per epoch.
        assert_eq!(meta.epochs_completed, 299);
        assert!(tmp.path().join("ckpt/step_100/meta.json").exists());
        assert!(!tmp.path().join("ckpt/step_99").exists());

        let snap = trained.snapshot(Distance::SqEuclidean).unwrap();
        for row in snap.entity_table().chunks(snap.dim()) {
            let norm: f32 = row.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!(norm <= 1.0 + 1e-4, "entity norm {norm} exceeds max");
        }

        let reloaded = resume_from_checkpoint::<TestBackend>(
            &final_dir.join("model"),
            &TransEConfig::new(8, 1).with_dim(8),
            &device,
        )
        .unwrap();
        let reloaded_snap = reloaded.snapshot(Distance::SqEuclidean).unwrap();
        assert_eq!(reloaded_snap.entity_table(), snap.entity_table());
    }

    #[test]
    fn test_training_rng_depends_on_start_step() {
        use rand::Rng;
        let draw = |mut rng: StdRng| (0..8).map(|_| rng.gen::<u64>()).collect::<Vec<_>>();

        assert_eq!(draw(training_rng(7, 0)), draw(StdRng::seed_from_u64(7)));
        assert_eq!(draw(training_rng(7, 6)), draw(training_rng(7, 6)));
        assert_ne!(draw(training_rng(7, 6)), draw(training_rng(7, 0)));
        assert_ne!(draw(training_rng(7, 6)), draw(training_rng(8, 6)));

        // A resumed provider does not start from the opening shuffle.
        let fresh = TrainingBatchProvider::new(chain(8), 4, false, &mut training_rng(7, 0))
            .unwrap()
            .next_batch(&mut training_rng(7, 0))
            .unwrap();
        let resumed = TrainingBatchProvider::new(chain(8), 4, false, &mut training_rng(7, 10))
            .unwrap()
            .next_batch(&mut training_rng(7, 10))
            .unwrap();
        assert_ne!(fresh.triples, resumed.triples);
    }

    #[test]
    fn test_resume_is_reproducible_and_records_seed() {
        let tmp = TempDir::new().unwrap();
        let device = Default::default();
        let triples = chain(8);
        let ckpt = tmp.path().join("ckpt");
        let config = KgeTrainingConfig::new()
            .with_total_steps(20)
            .with_batch_size(4)
            .with_lr(0.05)
            .with_optimizer(OptimizerKind::Adam)
            .with_distance(Distance::SqEuclidean)
            .with_log_interval(0)
            .with_checkpoint_every_epochs(1)
            .with_seed(5)
            .with_checkpoint_dir(ckpt.to_string_lossy().into_owned());

        let model = TransEConfig::new(8, 1).with_dim(4).init::<TestAutodiffBackend>(&device);
        train(&config, model, &triples, None, &device, None).unwrap();

        let meta: CheckpointMeta =
            serde_json::from_reader(std::fs::File::open(ckpt.join("step_10/meta.json")).unwrap()).unwrap();
        assert_eq!(meta.step, 10);
        assert_eq!(meta.seed, 5);

        let resume = || {
            let model = resume_from_checkpoint::<TestAutodiffBackend>(
                &ckpt.join("step_10/model"),
                &TransEConfig::new(8, 1).with_dim(4),
                &device,
            )
            .unwrap();
            let trained = train(&config, model, &triples, None, &device, Some(10)).unwrap();
            trained.valid().snapshot(Distance::SqEuclidean).unwrap()
        };
        let first = resume();
        let second = resume();
        for (a, b) in first.entity_table().iter().zip(second.entity_table()) {
            assert!((a - b).abs() < 1e-6);
        }

        let last: CheckpointMeta =
            serde_json::from_reader(std::fs::File::open(ckpt.join("final/meta.json")).unwrap()).unwrap();
        assert_eq!(last.step, 20);
        assert_eq!(last.seed, 5);
    }

    #[test]
    fn test_checkpoint_meta_without_seed_still_parses() {
        let meta: CheckpointMeta = serde_json::from_str(r#"{"step":3,"epochs_completed":1}"#).unwrap();
        assert_eq!(meta, CheckpointMeta { step: 3, epochs_completed: 1, seed: 0 });
    }

    #[test]
    fn test_training_rejects_angular() {
        let device = Default::default();
        let model = TransEConfig::new(4, 1).with_dim(2).init::<TestAutodiffBackend>(&device);
        let config = KgeTrainingConfig::new().with_distance(Distance::Angular);
        assert!(train(&config, model, &chain(4), None, &device, None).is_err());
    }
}
