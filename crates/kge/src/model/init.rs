//! Initial embedding tables: Gaussian draws, optionally seeded from a file.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use triples::{EntityIndex, NamedVectors};

use crate::error::KgeError;

/// Row-major `rows × dim` table drawn from N(0, 1/sqrt(dim)).
pub fn gaussian_table(rows: usize, dim: usize, rng: &mut impl Rng) -> Result<Vec<f32>, KgeError> {
    let normal = normal_for(dim)?;
    Ok((0..rows * dim).map(|_| normal.sample(rng)).collect())
}

/// Entity table where names present in `seeds` take the seed vector and all
/// other rows are drawn from N(0, 1/sqrt(dim)).
///
/// A seed file of another dimension is rejected outright.
pub fn seeded_entity_table(
    index: &EntityIndex,
    seeds: &NamedVectors,
    dim: usize,
    rng: &mut impl Rng,
) -> Result<Vec<f32>, KgeError> {
    if let Some(found) = seeds.dim() {
        if found != dim {
            return Err(KgeError::DimensionMismatch { expected: dim, found });
        }
    }
    let normal = normal_for(dim)?;

    let mut table = Vec::with_capacity(index.len() * dim);
    let mut seeded = 0;
    for (_, name) in index.iter() {
        match seeds.get(name) {
            Some(v) => {
                table.extend_from_slice(v);
                seeded += 1;
            }
            None => table.extend((0..dim).map(|_| normal.sample(rng))),
        }
    }
    tracing::info!(
        seeded,
        random = index.len() - seeded,
        dim,
        "Initialized entity embeddings"
    );
    Ok(table)
}

fn normal_for(dim: usize) -> Result<Normal<f32>, KgeError> {
    if dim == 0 {
        return Err(KgeError::InvalidConfig("embedding dimension must be > 0".to_string()));
    }
    Normal::new(0.0, 1.0 / (dim as f32).sqrt())
        .map_err(|e| KgeError::InvalidConfig(format!("bad init distribution: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use triples::{EntityId, NameIndexBuilder};

    fn index(names: &[&str]) -> EntityIndex {
        let mut b = NameIndexBuilder::<EntityId>::new();
        for n in names {
            b.intern(n);
        }
        b.build()
    }

    #[test]
    fn test_gaussian_table_scale() {
        let mut rng = StdRng::seed_from_u64(7);
        let dim = 64;
        let table = gaussian_table(200, dim, &mut rng).unwrap();
        assert_eq!(table.len(), 200 * dim);
        let mean: f32 = table.iter().sum::<f32>() / table.len() as f32;
        let var: f32 = table.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / table.len() as f32;
        let expected_std = 1.0 / (dim as f32).sqrt();
        assert!(mean.abs() < 0.01, "mean {mean}");
        assert!((var.sqrt() - expected_std).abs() < 0.01, "std {}", var.sqrt());
    }

    #[test]
    fn test_seeded_rows_copied() {
        let mut seeds = NamedVectors::default();
        seeds.insert("b".to_string(), vec![9.0, 8.0]);
        let idx = index(&["a", "b", "c"]);
        let mut rng = StdRng::seed_from_u64(1);
        let table = seeded_entity_table(&idx, &seeds, 2, &mut rng).unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(&table[2..4], &[9.0, 8.0]);
        assert_ne!(&table[0..2], &[9.0, 8.0]);
    }

    #[test]
    fn test_seed_dimension_mismatch_is_fatal() {
        let mut seeds = NamedVectors::default();
        seeds.insert("a".to_string(), vec![1.0, 2.0, 3.0]);
        let idx = index(&["a"]);
        let mut rng = StdRng::seed_from_u64(1);
        let err = seeded_entity_table(&idx, &seeds, 2, &mut rng).unwrap_err();
        assert!(matches!(err, KgeError::DimensionMismatch { expected: 2, found: 3 }));
    }

    #[test]
    fn test_same_seed_same_table() {
        let a = gaussian_table(4, 3, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = gaussian_table(4, 3, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }
}
