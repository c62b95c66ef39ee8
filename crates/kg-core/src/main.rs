use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kg_core::config::TrainingOverrides;
use kg_core::pipeline::{self, ClassifyArgs, EvaluateArgs, SummaryArgs, TrainArgs};
use kge::evaluation::report::DEFAULT_RANK_CAP;
use kge::training::corrupt::DEFAULT_MAX_TRIES;
use kge::training::OptimizerKind;
use kge::Distance;

/// kg-embed: train and evaluate translational knowledge-graph embeddings.
#[derive(Parser)]
#[command(name = "kg-embed", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands for training, ranking evaluation, classification and summaries.
#[derive(Subcommand)]
enum Command {
    /// Train TransE embeddings on one or more triple files.
    Train {
        /// Path to training config TOML file.
        #[arg(long, default_value = "configs/train.toml")]
        config: PathBuf,
        /// Triple TSV files, concatenated in order before splitting.
        #[arg(long, required = true, num_args = 1..)]
        triples: Vec<PathBuf>,
        /// Directory for embeddings, split files and checkpoints.
        #[arg(long, default_value = "output/kge")]
        output_dir: PathBuf,
        /// Override embedding dimension.
        #[arg(long)]
        dim: Option<usize>,
        /// Override energy function (euclidean, sq_euclidean, manhattan).
        #[arg(long)]
        distance: Option<Distance>,
        /// Override optimizer (adam, adagrad, sgd).
        #[arg(long)]
        optimizer: Option<OptimizerKind>,
        /// Override learning rate.
        #[arg(long)]
        lr: Option<f64>,
        /// Override hinge margin.
        #[arg(long)]
        margin: Option<f64>,
        /// Override total training steps.
        #[arg(long)]
        steps: Option<usize>,
        /// Override batch size.
        #[arg(long)]
        batch_size: Option<usize>,
        /// Override random seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Resume from the checkpoint saved at this step.
        #[arg(long)]
        resume_from: Option<usize>,
    },
    /// Rank test triples against every entity and report metrics.
    Evaluate {
        /// Entity embedding TSV file.
        #[arg(long)]
        entity_embeddings: PathBuf,
        /// Relation embedding TSV file.
        #[arg(long)]
        relation_embeddings: PathBuf,
        /// Test triple TSV file.
        #[arg(long)]
        test: PathBuf,
        /// Further known-fact files (train, validation) used for filtering.
        #[arg(long, num_args = 0..)]
        known: Vec<PathBuf>,
        /// Validation triples; enables threshold classification.
        #[arg(long)]
        validation: Option<PathBuf>,
        /// Energy function (euclidean, sq_euclidean, manhattan, angular).
        #[arg(long, default_value = "euclidean")]
        distance: Distance,
        /// Also compute mean average precision.
        #[arg(long)]
        map: bool,
        /// Best known-fact rank ceiling for the capped MRR.
        #[arg(long, default_value_t = DEFAULT_RANK_CAP)]
        rank_cap: usize,
        /// Seed for drawing corruptions.
        #[arg(long, default_value_t = 1337)]
        seed: u64,
        /// Maximum draws per corruption.
        #[arg(long, default_value_t = DEFAULT_MAX_TRIES)]
        max_tries: usize,
        /// Path to write JSON evaluation results.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Path to write the per-relation CSV table.
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Directory to write true/false triple energies.
        #[arg(long)]
        energies_dir: Option<PathBuf>,
    },
    /// Calibrate per-relation thresholds and classify test triples.
    Classify {
        /// Entity embedding TSV file.
        #[arg(long)]
        entity_embeddings: PathBuf,
        /// Relation embedding TSV file.
        #[arg(long)]
        relation_embeddings: PathBuf,
        /// Validation triples for calibration.
        #[arg(long)]
        validation: PathBuf,
        /// Test triples to classify.
        #[arg(long)]
        test: PathBuf,
        /// Further known-fact files excluded from corruptions.
        #[arg(long, num_args = 0..)]
        known: Vec<PathBuf>,
        /// Energy function.
        #[arg(long, default_value = "euclidean")]
        distance: Distance,
        /// Seed for drawing corruptions.
        #[arg(long, default_value_t = 1337)]
        seed: u64,
        /// Maximum draws per corruption.
        #[arg(long, default_value_t = DEFAULT_MAX_TRIES)]
        max_tries: usize,
        /// Path to write JSON classification results.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print headline metrics from evaluation result files.
    Summary {
        /// Paths to evaluation result JSON files.
        #[arg(long, required = true, num_args = 1..)]
        results: Vec<PathBuf>,
        /// Output as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            config,
            triples,
            output_dir,
            dim,
            distance,
            optimizer,
            lr,
            margin,
            steps,
            batch_size,
            seed,
            resume_from,
        } => pipeline::run_train(TrainArgs {
            config,
            triples,
            output_dir,
            overrides: TrainingOverrides {
                lr,
                margin,
                optimizer,
                total_steps: steps,
                batch_size,
                seed,
                ..Default::default()
            },
            dim,
            distance,
            resume_from,
        }),
        Command::Evaluate {
            entity_embeddings,
            relation_embeddings,
            test,
            known,
            validation,
            distance,
            map,
            rank_cap,
            seed,
            max_tries,
            output,
            csv,
            energies_dir,
        } => pipeline::run_evaluate(EvaluateArgs {
            entity_embeddings,
            relation_embeddings,
            test,
            known,
            validation,
            distance,
            calc_map: map,
            rank_cap,
            seed,
            max_tries,
            output,
            csv,
            energies_dir,
        }),
        Command::Classify {
            entity_embeddings,
            relation_embeddings,
            validation,
            test,
            known,
            distance,
            seed,
            max_tries,
            output,
        } => pipeline::run_classify(ClassifyArgs {
            entity_embeddings,
            relation_embeddings,
            validation,
            test,
            known,
            distance,
            seed,
            max_tries,
            output,
        }),
        Command::Summary { results, json } => pipeline::run_summary(SummaryArgs {
            inputs: results,
            json,
        }),
    }
}
