//! Writes named triples and per-triple energies as TSV files.

use crate::types::NamedTriple;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Buffers triples (optionally with an energy column) and writes them to a TSV file.
pub struct TripleWriter {
    rows: Vec<(NamedTriple, Option<f64>)>,
    output_path: PathBuf,
}

impl TripleWriter {
    /// Create a new writer that will write to the given path.
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            rows: Vec::new(),
            output_path,
        }
    }

    /// Buffer a single triple.
    pub fn record(&mut self, triple: NamedTriple) {
        self.rows.push((triple, None));
    }

    /// Buffer multiple triples.
    pub fn record_all(&mut self, triples: Vec<NamedTriple>) {
        self.rows.extend(triples.into_iter().map(|t| (t, None)));
    }

    /// Buffer a triple with its energy; written as a fourth column.
    pub fn record_energy(&mut self, triple: NamedTriple, energy: f64) {
        self.rows.push((triple, Some(energy)));
    }

    /// Number of buffered rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write all buffered rows and return the output path.
    pub fn finish(self) -> anyhow::Result<PathBuf> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(&self.output_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", self.output_path.display()))?;
        let mut out = BufWriter::new(file);
        for (t, energy) in &self.rows {
            match energy {
                Some(e) => writeln!(out, "{}\t{}\t{}\t{e}", t.subject, t.relation, t.object)?,
                None => writeln!(out, "{}\t{}\t{}", t.subject, t.relation, t.object)?,
            }
        }
        out.flush()?;

        tracing::info!(
            count = self.rows.len(),
            path = %self.output_path.display(),
            "Wrote triples"
        );

        Ok(self.output_path)
    }
}
