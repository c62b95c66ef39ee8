//! Reads named triples from tab-separated files.

use crate::types::NamedTriple;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Static methods for reading `<subject>\t<relation>\t<object>` files.
pub struct TripleReader;

impl TripleReader {
    /// Read all triples from a TSV file. Blank lines are skipped.
    pub fn read_all(path: &Path) -> anyhow::Result<Vec<NamedTriple>> {
        let file = std::fs::File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", path.display()))?;
        let triples = Self::read_from(BufReader::new(file))
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;

        tracing::debug!(
            count = triples.len(),
            path = %path.display(),
            "Read triples"
        );

        Ok(triples)
    }

    /// Read triples from multiple TSV files, concatenated in order.
    pub fn read_multiple(paths: &[PathBuf]) -> anyhow::Result<Vec<NamedTriple>> {
        let mut all_triples = Vec::new();
        for path in paths {
            let mut triples = Self::read_all(path)?;
            all_triples.append(&mut triples);
        }
        Ok(all_triples)
    }

    /// Parse triples from any buffered reader.
    pub fn read_from<R: BufRead>(reader: R) -> anyhow::Result<Vec<NamedTriple>> {
        let mut triples = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }
            triples.push(parse_line(line, line_no + 1)?);
        }
        Ok(triples)
    }
}

fn parse_line(line: &str, line_no: usize) -> anyhow::Result<NamedTriple> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() != 3 {
        anyhow::bail!(
            "line {line_no}: expected 3 tab-separated fields, found {}",
            fields.len()
        );
    }
    if fields.iter().any(|f| f.is_empty()) {
        anyhow::bail!("line {line_no}: empty field in {line:?}");
    }
    Ok(NamedTriple::new(fields[0], fields[1], fields[2]))
}
