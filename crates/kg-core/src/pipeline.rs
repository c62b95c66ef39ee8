//! Training, evaluation and classification pipelines for the `kg-embed` CLI.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use burn::backend::ndarray::{NdArray, NdArrayDevice};
use burn::backend::Autodiff;
use burn::module::AutodiffModule;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;

use kge::evaluation::{
    AggregateReporter, ClassifiedTriple, ExhaustiveRanker, RankingEvaluator, ThresholdMap,
};
use kge::model::init::{gaussian_table, seeded_entity_table};
use kge::training::trainer::resume_from_checkpoint;
use kge::training::{contrastive_pairs, train};
use kge::{Distance, EmbeddingModel, KgEmbeddings, TransE, TransEConfig};
use triples::{
    DataSplit, GraphIndex, KnownFactSet, LabeledTriple, NamedTriple, NamedVectors, RelationId,
    Triple, TripleReader, TripleWriter,
};

use crate::config::{build_training_config, load_train_toml, TrainingOverrides};
use crate::results::{ClassificationResult, EvaluationResult, RelationThreshold};

type TrainBackend = Autodiff<NdArray<f32>>;

/// Arguments for the `train` subcommand.
#[derive(Debug)]
pub struct TrainArgs {
    /// Path to the training config TOML file.
    pub config: PathBuf,
    /// Triple files, concatenated in order before splitting.
    pub triples: Vec<PathBuf>,
    /// Directory for embeddings, split files and checkpoints.
    pub output_dir: PathBuf,
    /// CLI overrides for the `[training]` section.
    pub overrides: TrainingOverrides,
    /// Override `[model] dim`.
    pub dim: Option<usize>,
    /// Override `[model] distance`.
    pub distance: Option<Distance>,
    /// Resume from `checkpoints/step_{n}`.
    pub resume_from: Option<usize>,
}

/// Arguments for the `evaluate` subcommand.
#[derive(Debug)]
pub struct EvaluateArgs {
    pub entity_embeddings: PathBuf,
    pub relation_embeddings: PathBuf,
    /// Test triples to rank.
    pub test: PathBuf,
    /// Additional known facts for the filtered rank (train/validation files).
    pub known: Vec<PathBuf>,
    /// Validation triples; enables threshold classification when present.
    pub validation: Option<PathBuf>,
    pub distance: Distance,
    /// Compute average precision per ranking.
    pub calc_map: bool,
    /// Best known-fact ranks at or above this are left out of the capped MRR.
    pub rank_cap: usize,
    /// Seed for drawing corruptions.
    pub seed: u64,
    pub max_tries: usize,
    /// Path to write the JSON result.
    pub output: Option<PathBuf>,
    /// Path to write the per-relation CSV table.
    pub csv: Option<PathBuf>,
    /// Directory for `true_energies.tsv` and `false_energies.tsv`.
    pub energies_dir: Option<PathBuf>,
}

/// Arguments for the `classify` subcommand.
#[derive(Debug)]
pub struct ClassifyArgs {
    pub entity_embeddings: PathBuf,
    pub relation_embeddings: PathBuf,
    /// Validation triples used to calibrate thresholds.
    pub validation: PathBuf,
    /// Test triples to classify.
    pub test: PathBuf,
    /// Additional known facts excluded from corruptions.
    pub known: Vec<PathBuf>,
    pub distance: Distance,
    pub seed: u64,
    pub max_tries: usize,
    /// Path to write the JSON result.
    pub output: Option<PathBuf>,
}

/// Arguments for the `summary` subcommand.
#[derive(Debug)]
pub struct SummaryArgs {
    /// Evaluation result JSON files.
    pub inputs: Vec<PathBuf>,
    /// Output as JSON instead of human-readable text.
    pub json: bool,
}

/// Train TransE embeddings on a triple corpus and write them as TSV files.
pub fn run_train(args: TrainArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    // 1. Load config
    let toml = load_train_toml(&args.config)?;
    let dim = args.dim.unwrap_or(toml.model.dim);
    let distance = args.distance.unwrap_or(toml.model.distance);
    let checkpoint_dir = args.output_dir.join("checkpoints");
    let config = build_training_config(&toml, &args.overrides, distance, &checkpoint_dir);
    config.validate()?;

    // 2. Load and index triples
    let named = TripleReader::read_multiple(&args.triples)?;
    let index = GraphIndex::from_named(&named);
    let encoded = index.encode_all(&named)?;
    tracing::info!(
        triples = encoded.len(),
        entities = index.entities.len(),
        relations = index.relations.len(),
        "Indexed corpus"
    );

    // 3. Split
    let mut split = DataSplit::split_tail(&encoded, toml.data.num_val, toml.data.num_test)?;
    if toml.data.preprocess {
        split = split.preprocess().0;
    }
    if split.train.is_empty() {
        anyhow::bail!("no training triples left after splitting {} triples", encoded.len());
    }

    // 4. Initial tables
    let mut rng = StdRng::seed_from_u64(config.seed);
    let entity_table = match &toml.data.seed_embeddings {
        Some(path) => {
            let seeds = NamedVectors::read(path)?;
            seeded_entity_table(&index.entities, &seeds, dim, &mut rng)?
        }
        None => gaussian_table(index.entities.len(), dim, &mut rng)?,
    };
    let relation_table = gaussian_table(index.relations.len(), dim, &mut rng)?;
    let initial = KgEmbeddings::new(dim, entity_table, relation_table, distance)?;

    let device = NdArrayDevice::default();
    let model: TransE<TrainBackend> = match args.resume_from {
        Some(step) => {
            let path = checkpoint_dir.join(format!("step_{step}")).join("model");
            let model_config = TransEConfig::new(index.entities.len(), index.relations.len()).with_dim(dim);
            resume_from_checkpoint(&path, &model_config, &device)?
        }
        None => TransE::from_embeddings(&initial, &device),
    };

    // 5. Validation pairs
    let validation = if split.val.is_empty() {
        None
    } else {
        Some(contrastive_pairs(&split.val, &split.known_facts(), &mut rng, config.max_tries)?)
    };

    // 6. Train
    let trained = train::<TrainBackend>(
        &config,
        model,
        &split.train,
        validation.as_deref(),
        &device,
        args.resume_from,
    )?;

    // 7. Write embeddings and splits
    std::fs::create_dir_all(&args.output_dir)?;
    let entity_path = args.output_dir.join("entity_embeddings.tsv");
    let relation_path = args.output_dir.join("relation_embeddings.tsv");
    trained
        .valid()
        .snapshot(distance)?
        .write_files(&index, &entity_path, &relation_path)?;

    for (name, triples) in [("train", &split.train), ("val", &split.val), ("test", &split.test)] {
        let mut writer = TripleWriter::new(args.output_dir.join(format!("{name}.tsv")));
        for t in triples {
            writer.record(decode(&index, t)?);
        }
        writer.finish()?;
    }

    // 8. Print summary
    println!("\n--- Training Summary ---");
    println!("Entities: {}", index.entities.len());
    println!("Relations: {}", index.relations.len());
    println!("Train / val / test: {} / {} / {}", split.train.len(), split.val.len(), split.test.len());
    println!("Steps: {}", config.total_steps);
    println!("Entity embeddings: {}", entity_path.display());
    println!("Relation embeddings: {}", relation_path.display());
    println!("Elapsed: {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}

/// Rank test triples against every entity and report aggregate metrics.
pub fn run_evaluate(args: EvaluateArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    // 1. Load embeddings; the index covers exactly the names with a vector
    let (embeddings, index) =
        KgEmbeddings::from_files(&args.entity_embeddings, &args.relation_embeddings, args.distance)?;
    tracing::info!(
        entities = embeddings.num_entities(),
        relations = embeddings.num_relations(),
        dim = embeddings.dim(),
        distance = %args.distance,
        "Loaded embeddings"
    );

    // 2. Load triples
    let (test, skipped) = load_encoded(&index, &args.test, "test")?;
    if test.is_empty() {
        anyhow::bail!("no test triples left in {} after dropping unknown names", args.test.display());
    }
    let validation = match &args.validation {
        Some(path) => Some(load_encoded(&index, path, "validation")?.0),
        None => None,
    };
    let mut known = load_known(&index, &args.known)?;
    known.extend_from(&test);
    if let Some(val) = &validation {
        known.extend_from(val);
    }

    // 3. Rank with progress bar
    let evaluator = RankingEvaluator::new(ExhaustiveRanker::new(&embeddings), &known);
    let pb = progress_bar(test.len());
    let evaluation = evaluator.evaluate_with_progress(&test, args.calc_map, || pb.inc(1))?;
    pb.finish_with_message("done");

    // 4. Optional classification
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut test_pairs = None;
    let mut thresholds = None;
    let mut classified = Vec::new();
    let mut unclassified = 0;
    if let Some(val) = &validation {
        let outcome = classify(&embeddings, val, &test, &known, &mut rng, args.max_tries)?;
        unclassified = outcome.unclassified;
        classified = outcome.classified;
        thresholds = Some(outcome.thresholds);
        test_pairs = Some(outcome.test_pairs);
    }

    // 5. Aggregate and print
    let mut report = AggregateReporter::new()
        .with_rank_cap(args.rank_cap)
        .report(&evaluation.triples, &classified);
    report.unclassified = unclassified;
    println!();
    for line in report.render_text(&index.relations) {
        println!("{line}");
    }

    if let Some(path) = &args.csv {
        std::fs::write(path, report.render_csv(&index.relations)?)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote per-relation CSV");
    }

    // 6. Optional energy dump
    if let Some(dir) = &args.energies_dir {
        let pairs = match test_pairs {
            Some(pairs) => pairs,
            None => contrastive_pairs(&test, &known, &mut rng, args.max_tries)?,
        };
        dump_energies(&embeddings, &index, &pairs, dir)?;
    }

    // 7. Optional JSON result
    if let Some(path) = &args.output {
        let result = EvaluationResult {
            entity_embeddings: args.entity_embeddings.display().to_string(),
            relation_embeddings: args.relation_embeddings.display().to_string(),
            distance: args.distance.to_string(),
            num_entities: embeddings.num_entities(),
            num_relations: embeddings.num_relations(),
            test_triples: test.len(),
            skipped_triples: skipped,
            classification_accuracy: report.classification_accuracy,
            unclassified_rows: report.unclassified,
            ranking: report.corpus.clone(),
            capped_mrr: report.capped_mrr.total_mrr,
            rank_cap: report.capped_mrr.cap,
            per_relation: EvaluationResult::per_relation(&report, &index.relations, thresholds.as_ref()),
        };
        write_json(path, &result)?;
    }

    println!("Elapsed: {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Calibrate per-relation thresholds on validation data and classify test triples.
pub fn run_classify(args: ClassifyArgs) -> anyhow::Result<()> {
    let (embeddings, index) =
        KgEmbeddings::from_files(&args.entity_embeddings, &args.relation_embeddings, args.distance)?;

    let (val, _) = load_encoded(&index, &args.validation, "validation")?;
    let (test, _) = load_encoded(&index, &args.test, "test")?;
    if val.is_empty() || test.is_empty() {
        anyhow::bail!("classification needs non-empty validation and test sets");
    }
    let mut known = load_known(&index, &args.known)?;
    known.extend_from(&val);
    known.extend_from(&test);

    let mut rng = StdRng::seed_from_u64(args.seed);
    let outcome = classify(&embeddings, &val, &test, &known, &mut rng, args.max_tries)?;
    let correct = outcome.classified.iter().filter(|c| c.is_correct()).count();
    let accuracy = if outcome.classified.is_empty() {
        tracing::warn!("No test row had a calibrated threshold");
        0.0
    } else {
        correct as f64 / outcome.classified.len() as f64
    };

    let thresholds: Vec<RelationThreshold> = outcome
        .thresholds
        .iter()
        .map(|(relation, threshold)| RelationThreshold {
            name: relation_name(&index, relation),
            threshold,
        })
        .collect();

    println!("--- Classification Summary ---");
    println!("Calibration rows: {}", outcome.calibration_rows);
    println!("Test rows: {}", outcome.classified.len());
    if outcome.unclassified > 0 {
        println!("Rows without a calibrated threshold: {}", outcome.unclassified);
    }
    println!("Test set accuracy: {:.2}%", accuracy * 100.0);
    for t in &thresholds {
        println!("  rel: {}, threshold: {:.4}", t.name, t.threshold);
    }

    if let Some(path) = &args.output {
        let result = ClassificationResult {
            calibration_rows: outcome.calibration_rows,
            test_rows: outcome.classified.len(),
            unclassified_rows: outcome.unclassified,
            accuracy,
            thresholds,
        };
        write_json(path, &result)?;
    }

    Ok(())
}

/// Print headline metrics from one or more evaluation result files.
pub fn run_summary(args: SummaryArgs) -> anyhow::Result<()> {
    let results = args
        .inputs
        .iter()
        .map(|p| EvaluationResult::load(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for (path, r) in args.inputs.iter().zip(&results) {
        println!("--- Evaluation Summary ---");
        println!("File: {}", path.display());
        println!("Embeddings: {} / {}", r.entity_embeddings, r.relation_embeddings);
        println!("Distance: {}", r.distance);
        println!("Entities: {}  Relations: {}", r.num_entities, r.num_relations);
        println!("Test triples: {} (skipped {})", r.test_triples, r.skipped_triples);
        if let Some(acc) = r.classification_accuracy {
            println!("Classification accuracy: {:.2}%", acc * 100.0);
        }
        println!("Mean rank: {:.2}", r.ranking.mean_rank);
        println!("MRR: {:.4}", r.ranking.mean_reciprocal_rank);
        println!("Hits@10: {:.2}%", r.ranking.hits_at_10 * 100.0);
        println!("Capped MRR (< {}): {:.2}%", r.rank_cap, r.capped_mrr * 100.0);
        println!();
    }

    if results.len() > 1 {
        println!("{:<40} {:>10} {:>8} {:>9}", "File", "MeanRank", "MRR", "Hits@10");
        for (path, r) in args.inputs.iter().zip(&results) {
            println!(
                "{:<40} {:>10.2} {:>8.4} {:>8.2}%",
                path.display().to_string(),
                r.ranking.mean_rank,
                r.ranking.mean_reciprocal_rank,
                r.ranking.hits_at_10 * 100.0
            );
        }
    }

    Ok(())
}

/// Thresholds from validation pairs plus classified test pairs.
struct ClassificationOutcome {
    thresholds: ThresholdMap,
    calibration_rows: usize,
    test_pairs: Vec<LabeledTriple>,
    classified: Vec<ClassifiedTriple>,
    /// Test rows whose relation got no threshold; left out of `classified`.
    unclassified: usize,
}

fn classify(
    model: &KgEmbeddings,
    val: &[Triple],
    test: &[Triple],
    known: &KnownFactSet,
    rng: &mut StdRng,
    max_tries: usize,
) -> anyhow::Result<ClassificationOutcome> {
    let val_pairs = contrastive_pairs(val, known, rng, max_tries)?;
    let (relations, scores, truth) = score_rows(model, &val_pairs);
    let thresholds = ThresholdMap::calibrate(&relations, &scores, &truth)?;

    let test_pairs = contrastive_pairs(test, known, rng, max_tries)?;
    let (relations, scores, truth) = score_rows(model, &test_pairs);
    let predicted = thresholds.classify(&relations, &scores)?;

    let mut classified = Vec::with_capacity(test_pairs.len());
    let mut unclassified = 0;
    for ((row, truth), predicted) in test_pairs.iter().zip(truth).zip(predicted) {
        match predicted {
            Ok(predicted) => classified.push(ClassifiedTriple { triple: row.triple, truth, predicted }),
            Err(e) => {
                tracing::warn!(triple = %row.triple, label = %row.label, error = %e, "Skipping unclassifiable row");
                unclassified += 1;
            }
        }
    }
    if unclassified > 0 {
        tracing::warn!(unclassified, classified = classified.len(), "Some test rows had no calibrated threshold");
    }

    Ok(ClassificationOutcome {
        thresholds,
        calibration_rows: val_pairs.len(),
        test_pairs,
        classified,
        unclassified,
    })
}

/// Relation, plausibility score (negated energy) and truth label per row.
fn score_rows(model: &impl EmbeddingModel, rows: &[LabeledTriple]) -> (Vec<RelationId>, Vec<f64>, Vec<bool>) {
    let relations = rows.iter().map(|r| r.triple.relation).collect();
    let scores = rows.iter().map(|r| -(model.energy(&r.triple) as f64)).collect();
    let truth = rows.iter().map(|r| r.label.is_positive()).collect();
    (relations, scores, truth)
}

/// Write distinct true and false triples with their energies, most plausible first.
fn dump_energies(
    model: &KgEmbeddings,
    index: &GraphIndex,
    pairs: &[LabeledTriple],
    dir: &Path,
) -> anyhow::Result<()> {
    let mut true_rows: BTreeMap<Triple, f32> = BTreeMap::new();
    let mut false_rows: BTreeMap<Triple, f32> = BTreeMap::new();
    for row in pairs {
        let target = if row.label.is_positive() { &mut true_rows } else { &mut false_rows };
        target.entry(row.triple).or_insert_with(|| model.energy(&row.triple));
    }

    for (file, rows) in [("true_energies.tsv", true_rows), ("false_energies.tsv", false_rows)] {
        let mut rows: Vec<(Triple, f32)> = rows.into_iter().collect();
        rows.sort_by(|a, b| a.1.total_cmp(&b.1));
        let mut writer = TripleWriter::new(dir.join(file));
        for (t, energy) in rows {
            writer.record_energy(decode(index, &t)?, energy as f64);
        }
        writer.finish()?;
    }
    Ok(())
}

/// Read a triple file and encode it, skipping triples with a name that has no vector.
///
/// Returns the encoded triples and how many were skipped.
fn load_encoded(index: &GraphIndex, path: &Path, what: &str) -> anyhow::Result<(Vec<Triple>, usize)> {
    let named = TripleReader::read_all(path)?;
    let mut encoded = Vec::with_capacity(named.len());
    let mut skipped = 0;
    for t in &named {
        match index.encode(t) {
            Some(triple) => encoded.push(triple),
            None => {
                tracing::warn!(
                    subject = %t.subject,
                    relation = %t.relation,
                    object = %t.object,
                    "No vector for a member of this {what} triple, skipping"
                );
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        tracing::warn!(what, skipped, kept = encoded.len(), "Skipped triples with missing vectors");
    }
    Ok((encoded, skipped))
}

fn load_known(index: &GraphIndex, paths: &[PathBuf]) -> anyhow::Result<KnownFactSet> {
    let mut known = KnownFactSet::new();
    for path in paths {
        known.extend_from(&load_encoded(index, path, "known")?.0);
    }
    Ok(known)
}

fn decode(index: &GraphIndex, triple: &Triple) -> anyhow::Result<NamedTriple> {
    index
        .decode(triple)
        .ok_or_else(|| anyhow::anyhow!("triple {triple} is outside the index"))
}

fn relation_name(index: &GraphIndex, relation: RelationId) -> String {
    index
        .relations
        .name(relation)
        .map(str::to_string)
        .unwrap_or_else(|| relation.to_string())
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .expect("valid progress bar template")
            .progress_chars("=> "),
    );
    pb
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
    tracing::info!(path = %path.display(), "Results written");
    Ok(())
}
