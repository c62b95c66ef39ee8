//! End-to-end tests for the `kg-embed` pipelines on a small synthetic corpus.

use std::path::{Path, PathBuf};

use kg_core::config::{load_train_toml, TrainingOverrides};
use kg_core::pipeline::{
    run_classify, run_evaluate, run_summary, run_train, ClassifyArgs, EvaluateArgs, SummaryArgs,
    TrainArgs,
};
use kg_core::results::{ClassificationResult, EvaluationResult};
use kge::training::trainer::CheckpointMeta;
use kge::Distance;
use triples::TripleReader;

/// 17 triples over e0..e9: `next` links i -> i+1, `skip` links i -> i+2.
///
/// The last four rows become validation (2) and test (2).
fn write_corpus(dir: &Path) -> PathBuf {
    let mut lines = Vec::new();
    for i in 0..9 {
        if i != 3 && i != 5 {
            lines.push(format!("e{i}\tnext\te{}", i + 1));
        }
    }
    for i in 1..8 {
        if i != 6 {
            lines.push(format!("e{i}\tskip\te{}", i + 2));
        }
    }
    lines.push("e3\tnext\te4".to_string());
    lines.push("e6\tskip\te8".to_string());
    lines.push("e5\tnext\te6".to_string());
    lines.push("e0\tskip\te2".to_string());
    assert_eq!(lines.len(), 17);

    let path = dir.join("corpus.tsv");
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("train.toml");
    std::fs::write(
        &path,
        r#"
[data]
num_val = 2
num_test = 2
preprocess = false

[model]
dim = 8
distance = "euclidean"

[training]
optimizer = "adam"
lr = 0.05
margin = 1.0
total_steps = 12
batch_size = 4
log_interval = 4
validation_interval = 5
checkpoint_every_epochs = 1
seed = 7
"#,
    )
    .unwrap();
    path
}

fn train_args(tmp: &Path, resume_from: Option<usize>) -> TrainArgs {
    TrainArgs {
        config: write_config(tmp),
        triples: vec![write_corpus(tmp)],
        output_dir: tmp.join("out"),
        overrides: TrainingOverrides::default(),
        dim: None,
        distance: None,
        resume_from,
    }
}

fn read_meta(path: &Path) -> CheckpointMeta {
    serde_json::from_reader(std::fs::File::open(path).unwrap()).unwrap()
}

#[test]
fn test_train_writes_embeddings_splits_and_checkpoints() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_train(train_args(tmp.path(), None)).unwrap();
    let out = tmp.path().join("out");

    assert_eq!(TripleReader::read_all(&out.join("train.tsv")).unwrap().len(), 13);
    let val = TripleReader::read_all(&out.join("val.tsv")).unwrap();
    assert_eq!(val.len(), 2);
    assert_eq!(val[0].subject, "e3");
    assert_eq!(TripleReader::read_all(&out.join("test.tsv")).unwrap().len(), 2);

    let entities = triples::NamedVectors::read(&out.join("entity_embeddings.tsv")).unwrap();
    assert_eq!(entities.len(), 10);
    assert_eq!(entities.dim(), Some(8));
    let relations = triples::NamedVectors::read(&out.join("relation_embeddings.tsv")).unwrap();
    assert_eq!(relations.len(), 2);

    // 13 training triples, batch of 4: three batches per epoch.
    let ckpt = out.join("checkpoints");
    assert!(ckpt.join("step_3/meta.json").exists());
    assert!(ckpt.join("step_6/meta.json").exists());
    assert!(ckpt.join("step_9/meta.json").exists());
    assert!(!ckpt.join("step_4").exists());
    let meta = read_meta(&ckpt.join("final/meta.json"));
    assert_eq!(meta.step, 12);
    assert_eq!(meta.epochs_completed, 3);
    assert_eq!(read_meta(&ckpt.join("step_6/meta.json")).epochs_completed, 2);
}

#[test]
fn test_train_resumes_from_checkpoint() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_train(train_args(tmp.path(), None)).unwrap();
    run_train(train_args(tmp.path(), Some(6))).unwrap();

    let meta = read_meta(&tmp.path().join("out/checkpoints/final/meta.json"));
    assert_eq!(meta.step, 12);
    assert_eq!(meta.epochs_completed, 3);
}

#[test]
fn test_train_rejects_angular_distance() {
    let tmp = tempfile::TempDir::new().unwrap();
    let mut args = train_args(tmp.path(), None);
    args.distance = Some(Distance::Angular);
    assert!(run_train(args).is_err());
}

#[test]
fn test_evaluate_classify_and_summarize_trained_embeddings() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_train(train_args(tmp.path(), None)).unwrap();
    let out = tmp.path().join("out");

    // A test row naming an entity without a vector is skipped, not fatal.
    let test_path = tmp.path().join("test_with_unknown.tsv");
    let mut test = std::fs::read_to_string(out.join("test.tsv")).unwrap();
    test.push_str("e0\tnext\tnowhere\n");
    std::fs::write(&test_path, test).unwrap();

    let eval_json = tmp.path().join("eval/result.json");
    let csv = tmp.path().join("eval/relations.csv");
    let energies = tmp.path().join("eval/energies");
    std::fs::create_dir_all(tmp.path().join("eval")).unwrap();

    run_evaluate(EvaluateArgs {
        entity_embeddings: out.join("entity_embeddings.tsv"),
        relation_embeddings: out.join("relation_embeddings.tsv"),
        test: test_path,
        known: vec![out.join("train.tsv"), out.join("val.tsv")],
        validation: Some(out.join("val.tsv")),
        distance: Distance::Euclidean,
        calc_map: true,
        rank_cap: 100,
        seed: 3,
        max_tries: 1000,
        output: Some(eval_json.clone()),
        csv: Some(csv.clone()),
        energies_dir: Some(energies.clone()),
    })
    .unwrap();

    let result = EvaluationResult::load(&eval_json).unwrap();
    assert_eq!(result.num_entities, 10);
    assert_eq!(result.num_relations, 2);
    assert_eq!(result.test_triples, 2);
    assert_eq!(result.skipped_triples, 1);
    assert_eq!(result.ranking.num_ranks, 4);
    assert!(result.ranking.mean_rank >= 1.0 && result.ranking.mean_rank <= 10.0);
    // Ten candidates per ranking: every rank is a hit at 10.
    assert!((result.ranking.hits_at_10 - 1.0).abs() < 1e-12);
    assert!(result.ranking.mean_average_precision.is_some());
    assert!(result.classification_accuracy.is_some());
    assert_eq!(result.unclassified_rows, 0);
    assert_eq!(result.per_relation.len(), 2);
    assert!(result.per_relation.iter().all(|r| r.threshold.is_some()));
    assert_eq!(result.per_relation.iter().map(|r| r.classified).sum::<usize>(), 4);

    let csv_text = std::fs::read_to_string(&csv).unwrap();
    assert!(csv_text.starts_with("relation,"));
    assert_eq!(csv_text.lines().count(), 3);

    let true_rows = std::fs::read_to_string(energies.join("true_energies.tsv")).unwrap();
    assert_eq!(true_rows.lines().count(), 2);
    let energies_col: Vec<f64> = true_rows
        .lines()
        .map(|l| l.split('\t').nth(3).unwrap().parse().unwrap())
        .collect();
    assert!(energies_col[0] <= energies_col[1]);
    assert!(energies.join("false_energies.tsv").exists());

    let class_json = tmp.path().join("eval/classify.json");
    run_classify(ClassifyArgs {
        entity_embeddings: out.join("entity_embeddings.tsv"),
        relation_embeddings: out.join("relation_embeddings.tsv"),
        validation: out.join("val.tsv"),
        test: out.join("test.tsv"),
        known: vec![out.join("train.tsv")],
        distance: Distance::Euclidean,
        seed: 3,
        max_tries: 1000,
        output: Some(class_json.clone()),
    })
    .unwrap();
    let classification: ClassificationResult =
        serde_json::from_str(&std::fs::read_to_string(&class_json).unwrap()).unwrap();
    assert_eq!(classification.calibration_rows, 4);
    assert_eq!(classification.test_rows, 4);
    assert_eq!(classification.unclassified_rows, 0);
    assert_eq!(classification.thresholds.len(), 2);
    assert!((0.0..=1.0).contains(&classification.accuracy));

    run_summary(SummaryArgs { inputs: vec![eval_json.clone()], json: false }).unwrap();
    run_summary(SummaryArgs { inputs: vec![eval_json.clone(), eval_json], json: true }).unwrap();
    assert!(run_summary(SummaryArgs { inputs: vec![tmp.path().join("missing.json")], json: false }).is_err());
}

#[test]
fn test_relation_missing_from_validation_skips_only_its_rows() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_train(train_args(tmp.path(), None)).unwrap();
    let out = tmp.path().join("out");

    // Validation only covers `next`; the test set also holds a `skip` triple.
    let val_path = tmp.path().join("val_next_only.tsv");
    std::fs::write(&val_path, "e3\tnext\te4\ne1\tnext\te2\n").unwrap();

    let eval_json = tmp.path().join("partial/result.json");
    let csv = tmp.path().join("relations.csv");
    run_evaluate(EvaluateArgs {
        entity_embeddings: out.join("entity_embeddings.tsv"),
        relation_embeddings: out.join("relation_embeddings.tsv"),
        test: out.join("test.tsv"),
        known: vec![out.join("train.tsv")],
        validation: Some(val_path.clone()),
        distance: Distance::Euclidean,
        calc_map: false,
        rank_cap: 100,
        seed: 3,
        max_tries: 1000,
        output: Some(eval_json.clone()),
        csv: Some(csv.clone()),
        energies_dir: None,
    })
    .unwrap();

    let result = EvaluationResult::load(&eval_json).unwrap();
    // Ranking covers both test triples regardless of classification.
    assert_eq!(result.test_triples, 2);
    assert_eq!(result.ranking.num_ranks, 4);
    // The `skip` positive and its corruption have no threshold.
    assert_eq!(result.unclassified_rows, 2);
    assert!(result.classification_accuracy.is_some());
    let next = result.per_relation.iter().find(|r| r.name == "next").unwrap();
    assert_eq!(next.classified, 2);
    assert!(next.threshold.is_some());
    let skip = result.per_relation.iter().find(|r| r.name == "skip").unwrap();
    assert_eq!(skip.classified, 0);
    assert_eq!(skip.threshold, None);
    assert_eq!(skip.ranking.num_triples, 1);
    assert_eq!(std::fs::read_to_string(&csv).unwrap().lines().count(), 3);

    let class_json = tmp.path().join("partial/classify.json");
    run_classify(ClassifyArgs {
        entity_embeddings: out.join("entity_embeddings.tsv"),
        relation_embeddings: out.join("relation_embeddings.tsv"),
        validation: val_path,
        test: out.join("test.tsv"),
        known: vec![out.join("train.tsv")],
        distance: Distance::Euclidean,
        seed: 3,
        max_tries: 1000,
        output: Some(class_json.clone()),
    })
    .unwrap();
    let classification: ClassificationResult =
        serde_json::from_str(&std::fs::read_to_string(&class_json).unwrap()).unwrap();
    assert_eq!(classification.test_rows, 2);
    assert_eq!(classification.unclassified_rows, 2);
    assert_eq!(classification.thresholds.len(), 1);
    assert_eq!(classification.thresholds[0].name, "next");
}

/// The shipped training config must parse.
#[test]
fn test_train_config_parses() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).parent().unwrap().parent().unwrap();
    let config = load_train_toml(&root.join("configs/train.toml")).unwrap();
    assert_eq!(config.model.dim, 100);
    assert_eq!(config.model.distance, Distance::Euclidean);
    assert_eq!(config.training.batch_size, Some(100));
}
