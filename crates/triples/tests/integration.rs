//! Integration tests for the triples crate.
//!
//! These test full pipelines: TSV → index → split → preprocess → TSV.
//! No model or training involved.

use std::io::Write;
use tempfile::TempDir;
use triples::{DataSplit, GraphIndex, NamedTriple, NamedVectors, TripleReader, TripleWriter};

fn write_corpus(dir: &std::path::Path, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.join("triples.tsv");
    let mut f = std::fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(f, "{line}").unwrap();
    }
    path
}

/// Read → index → encode → split → preprocess → decode → write → read.
#[test]
fn test_corpus_roundtrip_through_split() {
    let tmp = TempDir::new().unwrap();
    let path = write_corpus(
        tmp.path(),
        &[
            "spike\tOCCURS_WITH\tsharp_wave",
            "sharp_wave\tOCCURS_WITH\tslowing",
            "spike\tEVOKES\tepilepsy",
            "slowing\tEVOKES\tencephalopathy",
            "keppra\tTREATMENT_FOR\tepilepsy",
            "spike\tEVOKES\tencephalopathy",
            "sharp_wave\tEVOKES\tepilepsy",
        ],
    );

    let named = TripleReader::read_all(&path).unwrap();
    assert_eq!(named.len(), 7);

    let index = GraphIndex::from_named(&named);
    assert_eq!(index.relations.len(), 3);
    assert_eq!(index.entities.len(), 6);

    let triples = index.encode_all(&named).unwrap();
    let split = DataSplit::split_tail(&triples, 1, 1).unwrap();
    assert_eq!(split.train.len(), 5);

    let (clean, stats) = split.preprocess();
    // Val (spike, encephalopathy) and test (sharp_wave, epilepsy) leak no train pairs.
    assert_eq!(stats.train_dropped, 0);
    assert_eq!(clean.val.len(), 1);
    assert_eq!(clean.test.len(), 1);

    let out = tmp.path().join("out/test.tsv");
    let mut writer = TripleWriter::new(out.clone());
    writer.record_all(clean.test.iter().map(|t| index.decode(t).unwrap()).collect());
    writer.finish().unwrap();

    let back = TripleReader::read_all(&out).unwrap();
    assert_eq!(back, vec![NamedTriple::new("sharp_wave", "EVOKES", "epilepsy")]);
}

/// Embeddings written for an index can be read back and aligned by name.
#[test]
fn test_embeddings_align_with_index() {
    let tmp = TempDir::new().unwrap();
    let named = vec![NamedTriple::new("a", "r", "b"), NamedTriple::new("b", "r", "c")];
    let index = GraphIndex::from_named(&named);

    let table: Vec<Vec<f32>> = (0..index.entities.len())
        .map(|i| vec![i as f32, -(i as f32)])
        .collect();
    let path = tmp.path().join("entities.tsv");
    NamedVectors::write(
        &path,
        index.entities.iter().map(|(id, name)| (name, table[id.0 as usize].as_slice())),
    )
    .unwrap();

    let loaded = NamedVectors::read(&path).unwrap();
    for (id, name) in index.entities.iter() {
        assert_eq!(loaded.get(name).unwrap(), table[id.0 as usize].as_slice());
    }
}
