//! Tab-separated embedding files: `<name>\t<v1>\t…\t<vD>` per line.
//!
//! The reader tolerates empty fields (older exports wrote a stray empty column
//! between the name and the vector). A name without a parseable vector is
//! logged as "no vector for X" and skipped.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Vectors keyed by entity or relation name, in file order.
#[derive(Debug, Clone, Default)]
pub struct NamedVectors {
    entries: Vec<(String, Vec<f32>)>,
    lookup: HashMap<String, usize>,
    missing: Vec<String>,
}

impl NamedVectors {
    /// Read an embedding file.
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", path.display()))?;
        let vectors = Self::read_from(BufReader::new(file))
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
        tracing::info!(
            count = vectors.len(),
            dim = vectors.dim().unwrap_or(0),
            missing = vectors.missing.len(),
            path = %path.display(),
            "Loaded embeddings"
        );
        Ok(vectors)
    }

    /// Parse an embedding file from any buffered reader.
    ///
    /// All parsed vectors must share one dimension.
    pub fn read_from<R: BufRead>(reader: R) -> anyhow::Result<Self> {
        let mut vectors = Self::default();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split('\t').map(str::trim).filter(|f| !f.is_empty());
            let Some(name) = fields.next() else {
                continue;
            };
            let values: Result<Vec<f32>, _> = fields.map(str::parse::<f32>).collect();
            match values {
                Ok(v) if !v.is_empty() => {
                    if let Some(dim) = vectors.dim() {
                        if v.len() != dim {
                            anyhow::bail!(
                                "line {}: vector for {name} has {} values, expected {dim}",
                                line_no + 1,
                                v.len()
                            );
                        }
                    }
                    vectors.insert(name.to_string(), v);
                }
                _ => {
                    tracing::warn!(entry = name, line = line_no + 1, "no vector for {name}");
                    vectors.missing.push(name.to_string());
                }
            }
        }
        Ok(vectors)
    }

    /// Insert or replace the vector for `name`.
    pub fn insert(&mut self, name: String, vector: Vec<f32>) {
        match self.lookup.get(&name) {
            Some(&i) => self.entries[i].1 = vector,
            None => {
                self.lookup.insert(name.clone(), self.entries.len());
                self.entries.push((name, vector));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f32]> {
        self.lookup.get(name).map(|&i| self.entries[i].1.as_slice())
    }

    /// Dimension of the stored vectors, `None` when empty.
    pub fn dim(&self) -> Option<usize> {
        self.entries.first().map(|(_, v)| v.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names that appeared in the file without a parseable vector.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Write vectors to `path`, one line per name.
    pub fn write<'a, I>(path: &Path, rows: I) -> anyhow::Result<usize>
    where
        I: IntoIterator<Item = (&'a str, &'a [f32])>,
    {
        let file = std::fs::File::create(path)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", path.display()))?;
        let mut out = BufWriter::new(file);
        let mut count = 0;
        for (name, vector) in rows {
            write!(out, "{name}")?;
            for v in vector {
                write!(out, "\t{v}")?;
            }
            writeln!(out)?;
            count += 1;
        }
        out.flush()?;
        tracing::info!(count, path = %path.display(), "Wrote embeddings");
        Ok(count)
    }
}
